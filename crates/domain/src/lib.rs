//! Domain layer for Loot Tracker.
//!
//! This crate contains:
//! - Domain models (Campaign, Membership, Invite, CatalogItem)
//! - The `CampaignStore` persistence seam and an in-memory implementation
//! - Business logic services for invites and campaign membership
//! - Domain error types

pub mod error;
pub mod models;
pub mod services;
pub mod store;

pub use error::CampaignError;
pub use store::CampaignStore;
