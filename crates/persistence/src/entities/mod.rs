//! Database entity definitions (row mappings).

pub mod campaign;
pub mod invite;

pub use campaign::{
    CampaignEntity, CampaignRoleDb, CampaignSummaryEntity, MembershipEntity, PartyFundEntity,
};
pub use invite::{InviteEntity, InviteStatusDb, InviteWithCampaignEntity};
