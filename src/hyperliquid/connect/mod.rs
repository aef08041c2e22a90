//! Async HTTP client and venue REST surface.
//!
//! This module contains everything the connector needs to talk to the venue
//! over HTTPS: endpoint configuration, account credentials, the shared
//! `HttpClient`, the `/info` and `/exchange` API groups, and the wire data
//! models they exchange.
//!
pub mod api;

pub mod client;

pub mod config;

pub mod credentials;

pub mod models;
