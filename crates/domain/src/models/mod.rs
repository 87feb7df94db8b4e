//! Domain models for Loot Tracker.

pub mod campaign;
pub mod catalog;
pub mod invite;
pub mod membership;

pub use campaign::{
    Campaign, CampaignDetail, CampaignRole, CampaignSummary, Capability, GameSystem, PartyFund,
    PermissionPolicy,
};
pub use catalog::{CatalogItem, CatalogSource};
pub use invite::{
    CreatedInvite, Invite, InviteDelivery, InviteLookup, InvitePreview, InviteRole, InviteStatus,
};
pub use membership::{MemberView, Membership, UserProfile};
