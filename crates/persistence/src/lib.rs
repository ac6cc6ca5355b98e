//! Persistence layer for the Huddle backend.
//!
//! This crate contains:
//! - Database connection management and migrations
//! - Entity definitions (database row mappings)
//! - PostgreSQL implementations of the domain storage ports
//! - Query timing metrics

pub mod db;
pub mod entities;
pub mod metrics;
pub mod repositories;

pub use repositories::{
    ConversationRepository, EventRepository, MessageRepository, ParticipantRepository,
    UserRepository,
};
