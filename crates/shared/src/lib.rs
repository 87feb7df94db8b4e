//! Shared utilities and common types for the Loot Tracker backend.
//!
//! This crate provides common functionality used across all other crates:
//! - Cryptographic utilities (invite tokens, hashing)
//! - Session token verification
//! - Common validation logic

pub mod crypto;
pub mod jwt;
pub mod validation;
