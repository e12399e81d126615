//! Mercato Storefront library.
//!
//! This crate provides the storefront API as a library, allowing it to be
//! tested and reused. The binary in `main.rs` wires it to `PostgreSQL`, the
//! configured cache, and Sentry.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cache;
pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
