//! PostgreSQL persistence adapters using Diesel ORM.
//!
//! Repositories implement the domain ports over `diesel-async` with `bb8`
//! pooling. Row structs (`models.rs`) and table definitions (`schema.rs`)
//! stay private to this module; rows are converted to domain types, and
//! every failure is mapped to
//! [`RepositoryError`](crate::domain::ports::RepositoryError).
//!
//! ```ignore
//! use khidma::outbound::persistence::{DbPool, DieselUserRepository, PoolConfig};
//!
//! let pool = DbPool::connect(PoolConfig::new("postgres://localhost/khidma")).await?;
//! let users = DieselUserRepository::new(pool);
//! ```

mod diesel_application_repository;
mod diesel_booking_repository;
mod diesel_notification_repository;
mod diesel_payment_repository;
mod diesel_review_repository;
mod diesel_service_repository;
mod diesel_user_repository;
mod error_mapping;
mod migrations;
mod models;
mod pool;
mod schema;

pub use diesel_application_repository::DieselApplicationRepository;
pub use diesel_booking_repository::DieselBookingRepository;
pub use diesel_notification_repository::DieselNotificationRepository;
pub use diesel_payment_repository::DieselPaymentRepository;
pub use diesel_review_repository::DieselReviewRepository;
pub use diesel_service_repository::DieselServiceRepository;
pub use diesel_user_repository::DieselUserRepository;
pub use migrations::run_migrations;
pub use pool::{DbPool, PoolConfig};
