//! Entity store
//!
//! Transactional access to vehicles, drivers, trips and maintenance logs,
//! with a PostgreSQL backend and an in-memory one.

pub mod memory;
pub mod postgres;
pub mod store;

pub use memory::InMemoryEntityStore;
pub use postgres::PgEntityStore;
pub use store::{finish, EntityStore, StoreTransaction};
