//! Domain models for the storefront.
//!
//! These are validated domain objects, separate from the database row types
//! in [`crate::db`] and the request bodies in [`crate::routes`].

pub mod analytics;
pub mod cart;
pub mod coupon;
pub mod product;
pub mod user;

pub use analytics::{AnalyticsSummary, DailySales, SalesTotals};
pub use cart::CartView;
pub use coupon::{Coupon, NewCoupon, ValidCoupon};
pub use product::{MAX_PRICE, NewProduct, Product};
pub use user::{NewUser, User, UserCredentials, UserProfile};
