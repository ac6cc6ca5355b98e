//! HTTP surface of the Huddle backend: configuration, routing, auth
//! extraction, realtime fan-out and the wiring of domain services.

pub mod app;
pub mod config;
pub mod error;
pub mod extractors;
pub mod middleware;
pub mod realtime;
pub mod routes;
pub mod services;
