//! Core types for Mercato.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod discount;
pub mod email;
pub mod id;
pub mod role;

pub use discount::{DiscountError, DiscountPercent};
pub use email::{Email, EmailError};
pub use id::*;
pub use role::{RoleParseError, UserRole};
