//! Mercato Core - Shared types and pure pricing logic.
//!
//! This crate provides the pieces every Mercato component agrees on:
//! - `storefront` - HTTP API for the single-page storefront
//! - `cli` - Command-line tools for migrations and store management
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no database
//! access, no HTTP. Cart totals are computed here so the server and any other
//! consumer derive them the same way.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for ids, emails, roles, and discounts
//! - [`cart`] - Cart state and the pricing engine that derives its totals

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod types;

pub use cart::{
    AppliedCoupon, Cart, CartError, CartTotals, LineItem, MAX_QUANTITY, calculate_totals,
};
pub use types::*;
