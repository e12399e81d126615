//! Integration tests for the product catalogue, admin gating, and analytics.

use axum::http::{Method, StatusCode};
use chrono::{TimeDelta, Utc};
use rust_decimal::Decimal;
use serde_json::{Value, json};

use mercato_core::UserId;
use mercato_integration_tests::{Session, TestContext, money};

fn shirt(name: &str) -> Value {
    json!({
        "name": name,
        "description": "Heavyweight cotton",
        "price": "24.50",
        "image": "https://img.example.com/shirt.png",
        "category": "t-shirts",
    })
}

async fn create(ctx: &TestContext, admin: &Session, name: &str) -> Value {
    let response = ctx.post("/api/products", shirt(name), Some(admin)).await;
    assert_eq!(response.status, StatusCode::CREATED, "{:?}", response.body);
    response.body
}

// =============================================================================
// Admin Gating
// =============================================================================

#[tokio::test]
async fn test_customers_cannot_use_admin_routes() {
    let ctx = TestContext::new();
    let customer = ctx.signup("Ada", "ada@example.com").await;

    for (method, uri) in [
        (Method::GET, "/api/products"),
        (Method::PATCH, "/api/products/1"),
        (Method::DELETE, "/api/products/1"),
        (Method::GET, "/api/analytics"),
    ] {
        let response = ctx.send(method, uri, None, Some(&customer)).await;
        assert_eq!(response.status, StatusCode::FORBIDDEN, "{uri}");
        assert_eq!(response.message(), "Access denied - Admin only");
    }

    let created = ctx
        .post("/api/products", shirt("Tee"), Some(&customer))
        .await;
    assert_eq!(created.status, StatusCode::FORBIDDEN);

    let anonymous = ctx.get("/api/products", None).await;
    assert_eq!(anonymous.status, StatusCode::UNAUTHORIZED);
}

// =============================================================================
// Catalogue
// =============================================================================

#[tokio::test]
async fn test_admin_product_lifecycle() {
    let ctx = TestContext::new();
    let admin = ctx.admin("owner@example.com").await;

    let product = create(&ctx, &admin, "Tee").await;
    assert_eq!(product["isFeatured"], false);
    assert_eq!(money(&product["price"]), Decimal::new(2450, 2));
    let id = product["id"].as_i64().unwrap();

    let all = ctx.get("/api/products", Some(&admin)).await;
    assert_eq!(all.body.as_array().unwrap().len(), 1);

    // Featured list is empty, then reflects the toggle.
    let featured = ctx.get("/api/products/featured", None).await;
    assert!(featured.body.as_array().unwrap().is_empty());

    let toggled = ctx
        .send(Method::PATCH, &format!("/api/products/{id}"), None, Some(&admin))
        .await;
    assert_eq!(toggled.status, StatusCode::OK);
    assert_eq!(toggled.body["isFeatured"], true);

    let featured = ctx.get("/api/products/featured", None).await;
    assert_eq!(featured.body.as_array().unwrap().len(), 1);
    assert_eq!(featured.body[0]["name"], "Tee");

    let deleted = ctx
        .send(Method::DELETE, &format!("/api/products/{id}"), None, Some(&admin))
        .await;
    assert_eq!(deleted.status, StatusCode::OK);

    let featured = ctx.get("/api/products/featured", None).await;
    assert!(featured.body.as_array().unwrap().is_empty());

    let again = ctx
        .send(Method::DELETE, &format!("/api/products/{id}"), None, Some(&admin))
        .await;
    assert_eq!(again.status, StatusCode::NOT_FOUND);
    assert_eq!(again.message(), "Product not found");
}

#[tokio::test]
async fn test_create_product_validation() {
    let ctx = TestContext::new();
    let admin = ctx.admin("owner@example.com").await;

    let mut blank = shirt("Tee");
    blank["name"] = json!("  ");
    let response = ctx.post("/api/products", blank, Some(&admin)).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.message(), "Name is required");

    let mut no_price = shirt("Tee");
    no_price.as_object_mut().unwrap().remove("price");
    let response = ctx.post("/api/products", no_price, Some(&admin)).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);

    let mut too_expensive = shirt("Tee");
    too_expensive["price"] = json!("10000000000.00");
    let response = ctx.post("/api/products", too_expensive, Some(&admin)).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.message(), "Price cannot exceed 9999999999.99");
}

#[tokio::test]
async fn test_public_listings() {
    let ctx = TestContext::new();
    let admin = ctx.admin("owner@example.com").await;
    for i in 0..6 {
        create(&ctx, &admin, &format!("Tee {i}")).await;
    }
    let mut hat = shirt("Cap");
    hat["category"] = json!("hats");
    ctx.post("/api/products", hat, Some(&admin)).await;

    let picks = ctx.get("/api/products/recommendations", None).await;
    assert_eq!(picks.status, StatusCode::OK);
    assert_eq!(picks.body.as_array().unwrap().len(), 4);

    let tees = ctx.get("/api/products/category/t-shirts", None).await;
    assert_eq!(tees.body.as_array().unwrap().len(), 6);
    let hats = ctx.get("/api/products/category/hats", None).await;
    assert_eq!(hats.body.as_array().unwrap().len(), 1);
    let none = ctx.get("/api/products/category/shoes", None).await;
    assert!(none.body.as_array().unwrap().is_empty());
}

// =============================================================================
// Analytics
// =============================================================================

#[tokio::test]
async fn test_analytics_dashboard() {
    let ctx = TestContext::new();
    let admin = ctx.admin("owner@example.com").await;
    create(&ctx, &admin, "Tee").await;

    let now = Utc::now();
    ctx.store
        .insert_order(UserId::new(1), Decimal::from(30), now);
    ctx.store
        .insert_order(UserId::new(1), Decimal::from(12), now - TimeDelta::days(2));

    let response = ctx.get("/api/analytics", Some(&admin)).await;
    assert_eq!(response.status, StatusCode::OK);

    let summary = &response.body["analyticsData"];
    assert_eq!(summary["users"], 1);
    assert_eq!(summary["products"], 1);
    assert_eq!(summary["totalSales"], 2);
    assert_eq!(money(&summary["totalRevenue"]), Decimal::from(42));

    let daily = response.body["dailySalesData"].as_array().unwrap();
    assert_eq!(daily.len(), 8);
    let revenue: Decimal = daily.iter().map(|d| money(&d["revenue"])).sum();
    assert_eq!(revenue, Decimal::from(42));
    assert_eq!(money(&daily[7]["revenue"]), Decimal::from(30));
}

// =============================================================================
// Health
// =============================================================================

#[tokio::test]
async fn test_health_endpoints() {
    let ctx = TestContext::new();
    assert_eq!(ctx.get("/health", None).await.status, StatusCode::OK);
    assert_eq!(ctx.get("/health/ready", None).await.status, StatusCode::OK);
}
