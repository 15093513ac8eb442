//! Database module
//!
//! Pool creation and schema migrations for PostgreSQL.

pub mod connection;

pub use connection::DatabaseConnection;
