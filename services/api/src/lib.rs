//! Progress API service library crate.
//!
//! # Purpose
//! Exposes the progress report HTTP surface, actor resolution, configuration
//! and storage implementations for use by the binary and tests.
pub mod api;
pub mod app;
pub mod auth;
pub mod config;
pub mod model;
pub mod observability;
pub mod store;

#[cfg(test)]
mod test_env;
