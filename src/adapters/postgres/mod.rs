//! PostgreSQL adapters for the persistence ports.

mod batch_repository;
mod lock_store;
mod payment_repository;
mod user_repository;

pub use batch_repository::PostgresBatchRepository;
pub use lock_store::PostgresLockStore;
pub use payment_repository::PostgresPaymentRepository;
pub use user_repository::PostgresUserRepository;
