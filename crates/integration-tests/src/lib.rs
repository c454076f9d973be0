//! Integration test harness for Mercado.
//!
//! Drives the full storefront [`app`](mercado_storefront::app) in-process
//! against a `wiremock` stand-in for the commerce API. Each [`TestApp`]
//! behaves like one browser: it keeps the session cookie between requests.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p mercado-integration-tests
//! ```

#![allow(clippy::missing_panics_doc, clippy::expect_used)]

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{HeaderMap, Request, StatusCode, header};
use mercado_storefront::config::StorefrontConfig;
use mercado_storefront::state::AppState;
use serde_json::{Value, json};
use tower::ServiceExt;
use tower_http::normalize_path::NormalizePath;
use wiremock::MockServer;

/// Delivery charge item configured for every test app.
pub const DELIVERY_ITEM: &str = "DELIVERY";

/// Maximum response body read by the harness.
const BODY_LIMIT: usize = 1024 * 1024;

/// A storefront wired to a mock commerce API, with one cookie jar.
pub struct TestApp {
    /// Mock commerce API (the postal service is mounted under `/postal/`).
    pub commerce: MockServer,
    app: NormalizePath<Router>,
    cookie: Option<String>,
}

/// Status, headers and decoded body of one response.
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    /// JSON body; `Null` for an empty body, a string for non-JSON text.
    pub body: Value,
}

impl TestApp {
    /// App with the default delivery item and postal lookup configured.
    pub async fn new() -> Self {
        Self::with_env(&[]).await
    }

    /// App with extra or overridden environment variables.
    ///
    /// An empty value unsets a variable.
    pub async fn with_env(overrides: &[(&str, &str)]) -> Self {
        let commerce = MockServer::start().await;
        let uri = commerce.uri();
        let postal = format!("{uri}/postal/");

        let mut vars: Vec<(String, String)> = vec![
            ("COMMERCE_API_URL".to_string(), uri.clone()),
            ("STOREFRONT_BASE_URL".to_string(), "http://localhost:3000".to_string()),
            ("DELIVERY_ITEM_ID".to_string(), DELIVERY_ITEM.to_string()),
            ("DELIVERY_ITEM_PRICE".to_string(), "99.00".to_string()),
            ("POSTAL_API_URL".to_string(), postal),
        ];
        for (key, value) in overrides {
            vars.retain(|(existing, _)| existing.as_str() != *key);
            vars.push(((*key).to_string(), (*value).to_string()));
        }

        let config = StorefrontConfig::from_lookup(&|key: &str| {
            vars.iter()
                .find(|(name, _)| name == key)
                .map(|(_, value)| value.clone())
        })
        .expect("test configuration is valid");
        let state = AppState::new(config).expect("test state builds");

        Self {
            commerce,
            app: mercado_storefront::app(state),
            cookie: None,
        }
    }

    /// `GET` a path.
    pub async fn get(&mut self, path: &str) -> TestResponse {
        let request = Request::get(path);
        self.send(request, Body::empty()).await
    }

    /// `POST` a form-encoded body.
    pub async fn post_form(&mut self, path: &str, fields: &[(&str, &str)]) -> TestResponse {
        let body = url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(fields)
            .finish();
        let request = Request::post(path).header(
            header::CONTENT_TYPE,
            "application/x-www-form-urlencoded",
        );
        self.send(request, Body::from(body)).await
    }

    /// Number of requests the mock commerce API has received.
    pub async fn commerce_calls(&self) -> usize {
        self.commerce
            .received_requests()
            .await
            .map_or(0, |requests| requests.len())
    }

    async fn send(&mut self, mut request: axum::http::request::Builder, body: Body) -> TestResponse {
        if let Some(cookie) = &self.cookie {
            request = request.header(header::COOKIE, cookie);
        }
        let request = request.body(body).expect("request builds");

        let response = self
            .app
            .clone()
            .oneshot(request)
            .await
            .expect("app is infallible");

        if let Some(cookie) = response
            .headers()
            .get(header::SET_COOKIE)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.split(';').next())
        {
            self.cookie = Some(cookie.to_string());
        }

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = to_bytes(response.into_body(), BODY_LIMIT)
            .await
            .expect("body is readable");
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };

        TestResponse {
            status,
            headers,
            body,
        }
    }
}

// =============================================================================
// Fixtures
// =============================================================================

/// Cart JSON as the commerce API returns it.
#[must_use]
pub fn cart_json(id: &str, items: &[Value], for_delivery: bool, for_pickup: bool) -> Value {
    json!({
        "id": id,
        "items": items,
        "for_delivery": for_delivery,
        "for_pickup": for_pickup,
        "shipment_address": null,
        "external_reference": null,
    })
}

/// Cart line JSON.
#[must_use]
pub fn line_json(id: &str, cart: &str, item: &str, quantity: u32, price: &str) -> Value {
    json!({
        "id": id,
        "cart": cart,
        "item": item,
        "quantity": quantity,
        "price": price,
        "materials": [],
    })
}

/// Paginated list envelope.
#[must_use]
pub fn page_json(results: &[Value]) -> Value {
    json!({
        "results": results,
        "count": results.len(),
        "next": null,
        "previous": null,
    })
}

/// Product JSON.
#[must_use]
pub fn product_json(id: &str, kind: &str, price: &str, item: Option<&str>) -> Value {
    json!({
        "id": id,
        "name": format!("Product {id}"),
        "kind": kind,
        "price": price,
        "item": item,
    })
}
