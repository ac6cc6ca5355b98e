//! Shared utilities and common types for the Huddle backend.
//!
//! This crate provides common functionality used across all other crates:
//! - Access token verification
//! - Page/size pagination
//! - Common validation logic

pub mod jwt;
pub mod pagination;
pub mod validation;
