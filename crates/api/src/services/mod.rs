//! External service integrations.

pub mod email;
pub mod item_catalog;

pub use email::EmailService;
pub use item_catalog::ItemCatalog;
