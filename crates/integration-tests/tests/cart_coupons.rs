//! Integration tests for the cart and coupons.

use axum::http::{Method, StatusCode};
use chrono::{TimeDelta, Utc};
use rust_decimal::Decimal;
use serde_json::json;

use mercato_core::{DiscountPercent, Email, ProductId, UserId};
use mercato_integration_tests::{TestContext, money};
use mercato_storefront::db::{ProductStore, UserStore};
use mercato_storefront::models::{NewCoupon, NewProduct};
use mercato_storefront::services::CouponService;

async fn product(ctx: &TestContext, name: &str, price: i64) -> ProductId {
    ProductStore::create(
        ctx.store.as_ref(),
        NewProduct {
            name: name.to_owned(),
            description: format!("{name} description"),
            price: Decimal::from(price),
            image: "https://img.example.com/p.png".to_owned(),
            category: "apparel".to_owned(),
        },
    )
    .await
    .unwrap()
    .id
}

async fn user_id(ctx: &TestContext, email: &str) -> UserId {
    UserStore::find_credentials(ctx.store.as_ref(), &Email::parse(email).unwrap())
        .await
        .unwrap()
        .unwrap()
        .user
        .id
}

async fn issue_coupon(ctx: &TestContext, user: UserId, code: &str, expires_in: TimeDelta) {
    CouponService::new(ctx.store.as_ref())
        .issue(NewCoupon {
            code: code.to_owned(),
            user_id: user,
            discount_percentage: DiscountPercent::new(20).unwrap(),
            expiration_date: Utc::now() + expires_in,
        })
        .await
        .unwrap();
}

// =============================================================================
// Cart
// =============================================================================

#[tokio::test]
async fn test_cart_requires_authentication() {
    let ctx = TestContext::new();
    let response = ctx.get("/api/cart", None).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_twenty_percent_coupon_on_twenty_five() {
    let ctx = TestContext::new();
    let session = ctx.signup("Ada", "ada@example.com").await;
    let user = user_id(&ctx, "ada@example.com").await;
    let ten = product(&ctx, "Tee", 10).await;
    let five = product(&ctx, "Socks", 5).await;

    ctx.post("/api/cart", json!({ "productId": ten }), Some(&session))
        .await;
    ctx.post("/api/cart", json!({ "productId": ten }), Some(&session))
        .await;
    let cart = ctx
        .post("/api/cart", json!({ "productId": five }), Some(&session))
        .await;
    assert_eq!(cart.status, StatusCode::OK);
    assert_eq!(cart.body["items"].as_array().unwrap().len(), 2);
    assert_eq!(cart.body["itemCount"], 3);
    assert_eq!(money(&cart.body["subtotal"]), Decimal::from(25));
    assert_eq!(money(&cart.body["total"]), Decimal::from(25));

    issue_coupon(&ctx, user, "TWENTY", TimeDelta::days(7)).await;
    let cart = ctx
        .post("/api/cart/coupon", json!({ "code": "TWENTY" }), Some(&session))
        .await;
    assert_eq!(cart.status, StatusCode::OK);
    assert_eq!(cart.body["coupon"]["code"], "TWENTY");
    assert_eq!(money(&cart.body["subtotal"]), Decimal::from(25));
    assert_eq!(money(&cart.body["discount"]), Decimal::from(5));
    assert_eq!(money(&cart.body["total"]), Decimal::from(20));

    let removed = ctx
        .send(Method::DELETE, "/api/cart/coupon", None, Some(&session))
        .await;
    assert!(removed.body["coupon"].is_null());
    assert_eq!(money(&removed.body["total"]), Decimal::from(25));
}

#[tokio::test]
async fn test_quantity_updates_and_removal() {
    let ctx = TestContext::new();
    let session = ctx.signup("Ada", "ada@example.com").await;
    let tee = product(&ctx, "Tee", 10).await;
    let hat = product(&ctx, "Hat", 7).await;
    ctx.post("/api/cart", json!({ "productId": tee }), Some(&session))
        .await;
    ctx.post("/api/cart", json!({ "productId": hat }), Some(&session))
        .await;

    let updated = ctx
        .send(
            Method::PUT,
            &format!("/api/cart/{tee}"),
            Some(json!({ "quantity": 3 })),
            Some(&session),
        )
        .await;
    assert_eq!(updated.status, StatusCode::OK);
    assert_eq!(money(&updated.body["subtotal"]), Decimal::from(37));

    // Zero removes the line.
    let zeroed = ctx
        .send(
            Method::PUT,
            &format!("/api/cart/{tee}"),
            Some(json!({ "quantity": 0 })),
            Some(&session),
        )
        .await;
    assert_eq!(zeroed.body["items"].as_array().unwrap().len(), 1);

    let missing = ctx
        .send(
            Method::PUT,
            &format!("/api/cart/{tee}"),
            Some(json!({ "quantity": 2 })),
            Some(&session),
        )
        .await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);
    assert_eq!(missing.message(), "Item not in cart");

    let removed = ctx
        .send(
            Method::DELETE,
            "/api/cart",
            Some(json!({ "productId": hat })),
            Some(&session),
        )
        .await;
    assert_eq!(removed.status, StatusCode::OK);
    assert!(removed.body["items"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_out_of_range_quantity_is_rejected() {
    let ctx = TestContext::new();
    let session = ctx.signup("Ada", "ada@example.com").await;
    let tee = product(&ctx, "Tee", 10).await;
    ctx.post("/api/cart", json!({ "productId": tee }), Some(&session))
        .await;

    let response = ctx
        .send(
            Method::PUT,
            &format!("/api/cart/{tee}"),
            Some(json!({ "quantity": 3_000_000_000_u64 })),
            Some(&session),
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.message(), "Quantity cannot exceed 2147483647");

    let cart = ctx.get("/api/cart", Some(&session)).await;
    assert_eq!(cart.body["itemCount"], 1);
    assert_eq!(money(&cart.body["subtotal"]), Decimal::from(10));
}

#[tokio::test]
async fn test_delete_without_body_clears_cart() {
    let ctx = TestContext::new();
    let session = ctx.signup("Ada", "ada@example.com").await;
    let tee = product(&ctx, "Tee", 10).await;
    ctx.post("/api/cart", json!({ "productId": tee }), Some(&session))
        .await;

    let cleared = ctx
        .send(Method::DELETE, "/api/cart", None, Some(&session))
        .await;
    assert_eq!(cleared.status, StatusCode::OK);
    assert_eq!(cleared.body["itemCount"], 0);
    assert_eq!(money(&cleared.body["total"]), Decimal::ZERO);
}

#[tokio::test]
async fn test_unknown_product_is_not_found() {
    let ctx = TestContext::new();
    let session = ctx.signup("Ada", "ada@example.com").await;

    let response = ctx
        .post("/api/cart", json!({ "productId": 4242 }), Some(&session))
        .await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(response.message(), "Product not found");

    let missing = ctx.post("/api/cart", json!({}), Some(&session)).await;
    assert_eq!(missing.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_carts_are_per_user() {
    let ctx = TestContext::new();
    let ada = ctx.signup("Ada", "ada@example.com").await;
    let bo = ctx.signup("Bo", "bo@example.com").await;
    let tee = product(&ctx, "Tee", 10).await;

    ctx.post("/api/cart", json!({ "productId": tee }), Some(&ada))
        .await;

    let theirs = ctx.get("/api/cart", Some(&bo)).await;
    assert!(theirs.body["items"].as_array().unwrap().is_empty());
}

// =============================================================================
// Coupons
// =============================================================================

#[tokio::test]
async fn test_active_coupon_and_validation() {
    let ctx = TestContext::new();
    let session = ctx.signup("Ada", "ada@example.com").await;

    let none = ctx.get("/api/coupons", Some(&session)).await;
    assert_eq!(none.status, StatusCode::OK);
    assert!(none.body.is_null());

    let user = user_id(&ctx, "ada@example.com").await;
    issue_coupon(&ctx, user, "WELCOME", TimeDelta::days(7)).await;

    let active = ctx.get("/api/coupons", Some(&session)).await;
    assert_eq!(active.body["code"], "WELCOME");
    assert_eq!(active.body["discountPercentage"], 20);

    let valid = ctx
        .post("/api/coupons/validate", json!({ "code": "WELCOME" }), Some(&session))
        .await;
    assert_eq!(valid.status, StatusCode::OK);
    assert_eq!(valid.body, json!({ "code": "WELCOME", "discountPercentage": 20 }));

    let unknown = ctx
        .post("/api/coupons/validate", json!({ "code": "NOPE" }), Some(&session))
        .await;
    assert_eq!(unknown.status, StatusCode::NOT_FOUND);
    assert_eq!(unknown.message(), "Coupon not found");
}

#[tokio::test]
async fn test_coupons_belong_to_their_holder() {
    let ctx = TestContext::new();
    ctx.signup("Ada", "ada@example.com").await;
    let bo = ctx.signup("Bo", "bo@example.com").await;
    let ada = user_id(&ctx, "ada@example.com").await;
    issue_coupon(&ctx, ada, "ADAONLY", TimeDelta::days(7)).await;

    let response = ctx
        .post("/api/coupons/validate", json!({ "code": "ADAONLY" }), Some(&bo))
        .await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_expired_coupon_is_deactivated() {
    let ctx = TestContext::new();
    let session = ctx.signup("Ada", "ada@example.com").await;
    let user = user_id(&ctx, "ada@example.com").await;
    issue_coupon(&ctx, user, "OLD", TimeDelta::seconds(-1)).await;

    let expired = ctx
        .post("/api/coupons/validate", json!({ "code": "OLD" }), Some(&session))
        .await;
    assert_eq!(expired.status, StatusCode::NOT_FOUND);
    assert_eq!(expired.message(), "Coupon expired");

    // Now inactive, so it no longer matches at all.
    let again = ctx
        .post("/api/coupons/validate", json!({ "code": "OLD" }), Some(&session))
        .await;
    assert_eq!(again.message(), "Coupon not found");
    assert!(ctx.get("/api/coupons", Some(&session)).await.body.is_null());
}
