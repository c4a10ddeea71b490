#![allow(clippy::doc_markdown)] // Allow technical terms like PostgreSQL, SQLx in docs
#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Gangkeeper Core
//!
//! Derived-cost cache for a tabletop gang management application.
//!
//! ## Overview
//!
//! Gang ratings and fighter costs are sums over an ownership graph
//! (gang → fighters → {equipment, skills, effects, vehicles → {equipment,
//! effects}}). This crate computes them, caches the results without expiry
//! under dependency tags, and purges exactly the affected entries when any
//! part of the graph changes.
//!
//! ## Module Organization
//!
//! - [`models`] - row types and SQLx queries
//! - [`store`] - `EntityStore` read contract (PostgreSQL and in-memory)
//! - [`rating`] - exclusion policies, loadouts, the pure cost aggregator
//! - [`cache`] - tags, keys, backends, read-through layer, invalidation
//! - [`services`] - `RatingService`, the API used by handlers and pages
//! - [`config`] - layered configuration
//! - [`database`] - connection pool and migrations
//! - [`error`] - structured error handling
//! - [`logging`] - structured logging setup
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use gangkeeper_core::config::ConfigLoader;
//! use gangkeeper_core::database::DatabaseConnection;
//! use gangkeeper_core::services::RatingService;
//! use gangkeeper_core::store::PgEntityStore;
//! use std::sync::Arc;
//! use uuid::Uuid;
//!
//! # async fn example(gang_id: Uuid, fighter_id: Uuid) -> Result<(), Box<dyn std::error::Error>> {
//! let config = ConfigLoader::load()?;
//! let db = DatabaseConnection::new(&config.database).await?;
//! let ratings = RatingService::from_config(Arc::new(PgEntityStore::new(db.pool().clone())), &config);
//!
//! let rating = ratings.get_gang_rating(gang_id).await?;
//!
//! // after a mutation handler commits its write:
//! ratings.invalidate_fighter(fighter_id, gang_id).await;
//! # Ok(())
//! # }
//! ```
//!
//! ## Testing
//!
//! Unit tests live next to the code. Integration tests under `tests/` run
//! against `InMemoryEntityStore`; PostgreSQL tests use `#[sqlx::test]` and
//! are ignored unless a database is available.

pub mod cache;
pub mod config;
pub mod database;
pub mod error;
pub mod logging;
pub mod models;
pub mod rating;
pub mod services;
pub mod store;

pub use cache::{CacheProvider, CacheTag, EntityChange, EntityKind, ParentIds, TagSet};
pub use config::{ConfigLoader, GangkeeperConfig};
pub use error::{GangkeeperError, Result};
pub use rating::{CostBreakdown, ExclusionPolicy};
pub use services::{CampaignOverview, MembershipChange, RatingService};
pub use store::{EntityStore, InMemoryEntityStore, PgEntityStore};
