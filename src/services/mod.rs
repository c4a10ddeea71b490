//! # Services
//!
//! Entry points consumed by route handlers and page renderers.

pub mod campaign_overview;
pub mod rating_service;

pub use crate::cache::MembershipChange;
pub use campaign_overview::CampaignOverview;
pub use rating_service::{RatingReconciliation, RatingService};
