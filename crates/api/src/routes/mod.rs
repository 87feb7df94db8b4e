//! HTTP route handlers.

pub mod campaigns;
pub mod health;
pub mod invites;
pub mod items;
pub mod members;
