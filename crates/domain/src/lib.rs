//! Domain layer for the Huddle backend.
//!
//! This crate contains:
//! - Domain models (SportEvent, Participant, Conversation, Message)
//! - The error taxonomy shared by every service
//! - Storage ports and an in-memory implementation
//! - Core services: participation ledger, conversation registry,
//!   message service, event catalog and nearby search

pub mod error;
pub mod models;
pub mod ports;
pub mod services;

pub use error::{CoreError, CoreResult, ErrorKind, FieldError};
