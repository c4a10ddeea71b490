//! # Database
//!
//! PostgreSQL connection management. Row queries live in [`crate::models`] and
//! are reached through [`crate::store::PgEntityStore`].

pub mod connection;

pub use connection::DatabaseConnection;
