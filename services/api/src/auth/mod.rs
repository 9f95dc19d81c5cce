//! Request authentication.
//!
//! # Purpose
//! Resolves the acting identity for each request from the bearer token and
//! the user registry.
pub mod actor;
