//! thumbsense - YouTube comment sentiment scoring service.
//!
//! Core library: the comment pipeline, its storage and queue, the HTTP API,
//! and the clients for the external services it depends on.

pub mod config;
pub mod error;
pub mod migrations;
pub mod models;
pub mod pipeline;
pub mod repository;
pub mod schema;
pub mod server;
pub mod services;
pub mod work_queue;
