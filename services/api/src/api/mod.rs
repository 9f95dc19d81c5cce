//! Progress API HTTP handlers.
//!
//! # Purpose
//! Exposes route handler modules plus the shared error and payload types.
pub mod bootstrap;
pub mod error;
pub mod openapi;
pub mod progress_reports;
pub mod registry;
pub mod system;
pub mod types;
