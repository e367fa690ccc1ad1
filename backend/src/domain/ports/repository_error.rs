//! Error shared by the persistence ports.

use super::define_port_error;

define_port_error! {
    /// Failures raised by repository adapters.
    pub enum RepositoryError {
        /// Store unreachable or the pool could not hand out a connection.
        Connection { message: String } => transient "repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "repository query failed: {message}",
        /// A uniqueness rule or state precondition was violated.
        Conflict { message: String } => "repository conflict: {message}",
        /// The record addressed by a mutation does not exist.
        Missing { message: String } => "repository record missing: {message}",
    }
}
