//! bb8 pool of `diesel-async` PostgreSQL connections.
//!
//! Repositories only ever see [`RepositoryError::Connection`] from here: an
//! exhausted or unreachable pool is a transient failure that the services
//! answer with 503.

use std::time::Duration;

use diesel_async::AsyncPgConnection;
use diesel_async::pooled_connection::AsyncDieselConnectionManager;
use diesel_async::pooled_connection::bb8::{Pool, PooledConnection};

use crate::domain::ports::RepositoryError;

/// Checked-out connection borrowed from a [`DbPool`].
pub(crate) type Connection<'a> = PooledConnection<'a, AsyncPgConnection>;

/// Where to connect and how many connections to keep.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolConfig {
    url: String,
    max_size: u32,
    checkout_timeout: Duration,
}

impl PoolConfig {
    const DEFAULT_MAX_SIZE: u32 = 10;
    const DEFAULT_CHECKOUT_TIMEOUT: Duration = Duration::from_secs(5);

    /// Ten connections and a five second checkout timeout.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            max_size: Self::DEFAULT_MAX_SIZE,
            checkout_timeout: Self::DEFAULT_CHECKOUT_TIMEOUT,
        }
    }

    /// Cap on open connections; zero is raised to one.
    #[must_use]
    pub fn with_max_size(mut self, max_size: u32) -> Self {
        self.max_size = max_size.max(1);
        self
    }

    /// How long a request waits for a free connection.
    #[must_use]
    pub fn with_checkout_timeout(mut self, timeout: Duration) -> Self {
        self.checkout_timeout = timeout;
        self
    }
}

/// Cloneable handle shared by all Diesel repositories.
#[derive(Clone)]
pub struct DbPool(Pool<AsyncPgConnection>);

impl DbPool {
    /// Open the pool. Connections are established lazily on first checkout.
    pub async fn connect(config: PoolConfig) -> Result<Self, RepositoryError> {
        let manager = AsyncDieselConnectionManager::<AsyncPgConnection>::new(config.url);
        Pool::builder()
            .max_size(config.max_size)
            .min_idle(None)
            .connection_timeout(config.checkout_timeout)
            .build(manager)
            .await
            .map(Self)
            .map_err(|err| RepositoryError::connection(format!("pool setup: {err}")))
    }

    /// Borrow a connection for one repository call.
    pub(crate) async fn connection(&self) -> Result<Connection<'_>, RepositoryError> {
        self.0
            .get()
            .await
            .map_err(|err| RepositoryError::connection(format!("pool checkout: {err}")))
    }
}
