//! Core library for the `routebench` CLI.
//!
//! Probes several endpoints that serve the same streaming chat-completion
//! API, bounded per route and across routes, and ranks them by success and
//! time to first byte. The binary is a thin shell over [`entry::run`].
pub mod args;
pub mod auth;
pub mod config;
pub mod entry;
pub mod error;
pub mod logger;
pub mod probe;
pub mod report;
pub mod shutdown;
pub mod shutdown_handlers;
pub mod stats;
