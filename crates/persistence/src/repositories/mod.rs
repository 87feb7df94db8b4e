//! Repository implementations.

pub mod campaign_store;

pub use campaign_store::PgCampaignStore;
