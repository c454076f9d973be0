//! Integration tests for the add-to-cart flow.
//!
//! These drive the HTTP surface end to end: form parsing, product
//! resolution, cart identity in the session and the merge/create strategy
//! against a mock commerce API.

#![allow(clippy::unwrap_used)]

use axum::http::StatusCode;
use mercado_integration_tests::{TestApp, cart_json, line_json, page_json, product_json};
use serde_json::json;
use wiremock::matchers::{body_json, body_partial_json, method, path, query_param};
use wiremock::{Mock, ResponseTemplate};

async fn mount_new_cart(app: &TestApp, id: &str) {
    Mock::given(method("POST"))
        .and(path("/carts/"))
        .respond_with(ResponseTemplate::new(201).set_body_json(cart_json(id, &[], false, false)))
        .expect(1)
        .mount(&app.commerce)
        .await;
}

async fn mount_product(app: &TestApp, id: &str, kind: &str, price: &str, item: Option<&str>) {
    Mock::given(method("GET"))
        .and(path(format!("/products/{id}/")))
        .respond_with(ResponseTemplate::new(200).set_body_json(product_json(id, kind, price, item)))
        .mount(&app.commerce)
        .await;
}

// =============================================================================
// Cart View
// =============================================================================

#[tokio::test]
async fn test_empty_cart_without_session() {
    let mut app = TestApp::new().await;

    let response = app.get("/cart").await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["id"], json!(null));
    assert_eq!(response.body["item_count"], json!(0));
    assert_eq!(response.body["subtotal"], json!("0.00"));
    assert_eq!(response.body["fulfillment"], json!("undetermined"));
    assert_eq!(app.commerce_calls().await, 0);
}

#[tokio::test]
async fn test_trailing_slash_is_normalized() {
    let mut app = TestApp::new().await;

    let response = app.get("/cart/").await;

    assert_eq!(response.status, StatusCode::OK);
}

// =============================================================================
// Simple Items
// =============================================================================

#[tokio::test]
async fn test_simple_item_merges_into_existing_line() {
    let mut app = TestApp::new().await;
    mount_new_cart(&app, "c1").await;
    mount_product(&app, "p1", "simple", "10.00", Some("i1")).await;

    // First lookup: no line yet. Afterwards: the line created below.
    Mock::given(method("GET"))
        .and(path("/cart-items/"))
        .and(query_param("cart", "c1"))
        .and(query_param("item", "i1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page_json(&[])))
        .up_to_n_times(1)
        .mount(&app.commerce)
        .await;
    Mock::given(method("GET"))
        .and(path("/cart-items/"))
        .and(query_param("cart", "c1"))
        .and(query_param("item", "i1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page_json(&[line_json(
            "l1", "c1", "i1", 2, "10.00",
        )])))
        .mount(&app.commerce)
        .await;
    Mock::given(method("POST"))
        .and(path("/cart-items/"))
        .and(body_partial_json(json!({"cart": "c1", "item": "i1", "quantity": 2})))
        .respond_with(
            ResponseTemplate::new(201).set_body_json(line_json("l1", "c1", "i1", 2, "10.00")),
        )
        .expect(1)
        .mount(&app.commerce)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/cart-items/l1/"))
        .and(body_json(json!({"quantity": 3})))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(line_json("l1", "c1", "i1", 3, "10.00")),
        )
        .expect(1)
        .mount(&app.commerce)
        .await;

    let first = app
        .post_form("/cart/items", &[("product", "p1"), ("quantity", "2")])
        .await;
    assert_eq!(first.status, StatusCode::CREATED);
    assert_eq!(first.body["quantity"], json!(2));

    let second = app
        .post_form("/cart/items", &[("product", "p1"), ("quantity", "1")])
        .await;
    assert_eq!(second.status, StatusCode::CREATED);
    assert_eq!(second.body["id"], json!("l1"));
    assert_eq!(second.body["quantity"], json!(3));
}

#[tokio::test]
async fn test_unknown_kind_takes_the_simple_path() {
    let mut app = TestApp::new().await;
    mount_new_cart(&app, "c1").await;
    mount_product(&app, "p9", "bundle", "5.00", Some("i9")).await;

    Mock::given(method("GET"))
        .and(path("/cart-items/"))
        .and(query_param("item", "i9"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page_json(&[])))
        .expect(1)
        .mount(&app.commerce)
        .await;
    Mock::given(method("POST"))
        .and(path("/cart-items/"))
        .respond_with(
            ResponseTemplate::new(201).set_body_json(line_json("l9", "c1", "i9", 1, "5.00")),
        )
        .expect(1)
        .mount(&app.commerce)
        .await;

    let response = app.post_form("/cart/items", &[("product", "p9")]).await;

    assert_eq!(response.status, StatusCode::CREATED);
    assert_eq!(response.body["item"], json!("i9"));
}

#[tokio::test]
async fn test_zero_quantity_is_rejected_before_any_remote_call() {
    let mut app = TestApp::new().await;

    let response = app
        .post_form("/cart/items", &[("product", "p1"), ("quantity", "0")])
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert!(response.body["error"].as_str().unwrap().contains("quantity"));
    assert_eq!(app.commerce_calls().await, 0);
}

#[tokio::test]
async fn test_unknown_product_is_not_found() {
    let mut app = TestApp::new().await;
    Mock::given(method("GET"))
        .and(path("/products/missing/"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"detail": "Not found."})))
        .mount(&app.commerce)
        .await;

    let response = app.post_form("/cart/items", &[("product", "missing")]).await;

    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_business_rejection_is_passed_through() {
    let mut app = TestApp::new().await;
    mount_new_cart(&app, "c1").await;
    mount_product(&app, "p1", "simple", "10.00", Some("i1")).await;
    Mock::given(method("GET"))
        .and(path("/cart-items/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page_json(&[])))
        .mount(&app.commerce)
        .await;
    Mock::given(method("POST"))
        .and(path("/cart-items/"))
        .respond_with(
            ResponseTemplate::new(400)
                .set_body_json(json!({"error": {"message": "Out of stock"}})),
        )
        .mount(&app.commerce)
        .await;

    let response = app.post_form("/cart/items", &[("product", "p1")]).await;

    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(response.body["error"], json!("Out of stock"));
}

// =============================================================================
// Group Items
// =============================================================================

#[tokio::test]
async fn test_group_item_resolves_variant() {
    let mut app = TestApp::new().await;
    mount_new_cart(&app, "c1").await;
    mount_product(&app, "p2", "group", "20.00", None).await;

    Mock::given(method("GET"))
        .and(path("/products/p2/variant/"))
        .and(query_param("size", "L"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "v-large",
            "price": "22.00",
            "attributes": {"size": "L"},
        })))
        .expect(1)
        .mount(&app.commerce)
        .await;
    Mock::given(method("GET"))
        .and(path("/cart-items/"))
        .and(query_param("item", "v-large"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page_json(&[])))
        .mount(&app.commerce)
        .await;
    Mock::given(method("POST"))
        .and(path("/cart-items/"))
        .and(body_partial_json(json!({"item": "v-large"})))
        .respond_with(
            ResponseTemplate::new(201).set_body_json(line_json("l2", "c1", "v-large", 1, "22.00")),
        )
        .expect(1)
        .mount(&app.commerce)
        .await;

    let response = app
        .post_form("/cart/items", &[("product", "p2"), ("attributes", "size:L")])
        .await;

    assert_eq!(response.status, StatusCode::CREATED);
    assert_eq!(response.body["item"], json!("v-large"));
}

// =============================================================================
// Compound Items
// =============================================================================

#[tokio::test]
async fn test_compound_item_always_creates_a_new_line() {
    let mut app = TestApp::new().await;
    mount_new_cart(&app, "c1").await;
    mount_product(&app, "p3", "compound", "100.00", Some("i3")).await;

    Mock::given(method("GET"))
        .and(path("/products/p3/materials/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page_json(&[json!({
            "id": "m1",
            "name": "Frosting",
            "price": "15.50",
        })])))
        .mount(&app.commerce)
        .await;
    Mock::given(method("GET"))
        .and(path("/cart-items/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page_json(&[])))
        .expect(0)
        .mount(&app.commerce)
        .await;
    Mock::given(method("POST"))
        .and(path("/cart-items/"))
        .and(body_partial_json(json!({
            "item": "i3",
            "price": "115.50",
            "materials": ["m1"],
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": "lx",
            "cart": "c1",
            "item": "i3",
            "quantity": 1,
            "price": "115.50",
            "materials": ["m1"],
        })))
        .expect(2)
        .mount(&app.commerce)
        .await;

    for _ in 0..2 {
        let response = app
            .post_form("/cart/items", &[("product", "p3"), ("materials", "m1")])
            .await;
        assert_eq!(response.status, StatusCode::CREATED);
        assert_eq!(response.body["price"], json!("115.50"));
    }
}

#[tokio::test]
async fn test_compound_item_rejects_unknown_material() {
    let mut app = TestApp::new().await;
    mount_product(&app, "p3", "compound", "100.00", Some("i3")).await;
    Mock::given(method("GET"))
        .and(path("/products/p3/materials/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page_json(&[])))
        .mount(&app.commerce)
        .await;

    let response = app
        .post_form("/cart/items", &[("product", "p3"), ("materials", "nope")])
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

// =============================================================================
// Line Changes
// =============================================================================

#[tokio::test]
async fn test_quantity_change_without_cart_makes_no_remote_call() {
    let mut app = TestApp::new().await;

    let response = app
        .post_form("/cart/items/l1/quantity", &[("quantity", "2")])
        .await;

    assert_eq!(response.status, StatusCode::CONFLICT);
    assert_eq!(app.commerce_calls().await, 0);
}

#[tokio::test]
async fn test_zero_quantity_removes_line() {
    let mut app = TestApp::new().await;
    mount_new_cart(&app, "c1").await;
    mount_product(&app, "p1", "simple", "10.00", Some("i1")).await;
    Mock::given(method("GET"))
        .and(path("/cart-items/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page_json(&[])))
        .mount(&app.commerce)
        .await;
    Mock::given(method("POST"))
        .and(path("/cart-items/"))
        .respond_with(
            ResponseTemplate::new(201).set_body_json(line_json("l1", "c1", "i1", 1, "10.00")),
        )
        .mount(&app.commerce)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/cart-items/l1/"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&app.commerce)
        .await;

    let added = app.post_form("/cart/items", &[("product", "p1")]).await;
    assert_eq!(added.status, StatusCode::CREATED);

    let response = app
        .post_form("/cart/items/l1/quantity", &[("quantity", "0")])
        .await;

    assert_eq!(response.status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_cart_view_reflects_remote_cart() {
    let mut app = TestApp::new().await;
    mount_new_cart(&app, "c1").await;
    mount_product(&app, "p1", "simple", "10.00", Some("i1")).await;
    Mock::given(method("GET"))
        .and(path("/cart-items/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page_json(&[])))
        .mount(&app.commerce)
        .await;
    Mock::given(method("POST"))
        .and(path("/cart-items/"))
        .respond_with(
            ResponseTemplate::new(201).set_body_json(line_json("l1", "c1", "i1", 2, "10.00")),
        )
        .mount(&app.commerce)
        .await;
    Mock::given(method("GET"))
        .and(path("/carts/c1/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(cart_json(
            "c1",
            &[line_json("l1", "c1", "i1", 2, "10.00")],
            false,
            true,
        )))
        .mount(&app.commerce)
        .await;

    app.post_form("/cart/items", &[("product", "p1"), ("quantity", "2")])
        .await;
    let response = app.get("/cart").await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["id"], json!("c1"));
    assert_eq!(response.body["item_count"], json!(2));
    assert_eq!(response.body["subtotal"], json!("20.00"));
    assert_eq!(response.body["fulfillment"], json!("pickup"));
}

#[tokio::test]
async fn test_clear_forgets_the_cart() {
    let mut app = TestApp::new().await;
    mount_new_cart(&app, "c1").await;
    mount_product(&app, "p1", "simple", "10.00", Some("i1")).await;
    Mock::given(method("GET"))
        .and(path("/cart-items/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page_json(&[])))
        .mount(&app.commerce)
        .await;
    Mock::given(method("POST"))
        .and(path("/cart-items/"))
        .respond_with(
            ResponseTemplate::new(201).set_body_json(line_json("l1", "c1", "i1", 1, "10.00")),
        )
        .mount(&app.commerce)
        .await;

    app.post_form("/cart/items", &[("product", "p1")]).await;
    let cleared = app.post_form("/cart/clear", &[]).await;
    assert_eq!(cleared.status, StatusCode::NO_CONTENT);

    let calls_before = app.commerce_calls().await;
    let response = app.get("/cart").await;

    assert_eq!(response.body["id"], json!(null));
    assert_eq!(app.commerce_calls().await, calls_before);
}
