//! HTTP plumbing shared by every commerce endpoint.

use std::sync::Arc;

use mercado_core::AuthToken;
use reqwest::{Method, RequestBuilder, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, error, warn};
use url::Url;

use super::{CommerceError, Page, api_error_message, envelope_error};
use crate::config::CommerceConfig;

/// Client for the commerce REST API.
///
/// Cheaply cloneable; all clones share one connection pool.
#[derive(Clone)]
pub struct CommerceClient {
    inner: Arc<CommerceClientInner>,
}

struct CommerceClientInner {
    client: reqwest::Client,
    base_url: Url,
    service_token: Option<SecretString>,
    degrade_on_unreachable: bool,
}

impl CommerceClient {
    /// Create a new commerce API client.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(config: &CommerceConfig) -> Result<Self, CommerceError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("mercado-storefront/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(CommerceError::Http)?;

        Ok(Self {
            inner: Arc::new(CommerceClientInner {
                client,
                base_url: config.base_url.clone(),
                service_token: config.api_token.clone(),
                degrade_on_unreachable: config.degrade_on_unreachable,
            }),
        })
    }

    /// Base URL every endpoint path is joined onto.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    /// Build the URL for a relative endpoint path such as `carts/abc/`.
    pub(super) fn endpoint(&self, path: &str) -> Result<Url, CommerceError> {
        Ok(self.inner.base_url.join(path.trim_start_matches('/'))?)
    }

    /// Start a request, attaching the customer token or the service token.
    fn request(
        &self,
        method: Method,
        path: &str,
        token: Option<&AuthToken>,
    ) -> Result<RequestBuilder, CommerceError> {
        let url = self.endpoint(path)?;
        let builder = self
            .inner
            .client
            .request(method, url)
            .header("Accept", "application/json");

        let bearer = match (token, &self.inner.service_token) {
            (Some(token), _) => Some(token.bearer()),
            (None, Some(service)) => Some(format!("Bearer {}", service.expose_secret())),
            (None, None) => None,
        };

        Ok(match bearer {
            Some(value) => builder.header("Authorization", value),
            None => builder,
        })
    }

    /// Send a request and return the raw success body.
    async fn execute(&self, builder: RequestBuilder) -> Result<String, CommerceError> {
        let response = builder.send().await?;
        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(1);
            return Err(CommerceError::RateLimited(retry_after));
        }

        let body = response.text().await?;

        if !status.is_success() {
            let message = api_error_message(&body);
            if status.is_server_error() {
                error!(status = %status, message = %message, "Commerce API returned server error");
            } else {
                debug!(status = %status, message = %message, "Commerce API rejected request");
            }
            return Err(CommerceError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(body)
    }

    /// Send a request and decode a JSON body, honoring error envelopes.
    async fn send_json<T: DeserializeOwned>(
        &self,
        builder: RequestBuilder,
    ) -> Result<T, CommerceError> {
        let body = self.execute(builder).await?;
        let value: serde_json::Value = if body.trim().is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_str(&body).map_err(|e| {
                error!(
                    error = %e,
                    body = %body.chars().take(500).collect::<String>(),
                    "Failed to parse commerce API response"
                );
                CommerceError::Parse(e)
            })?
        };

        if let Some(message) = envelope_error(&value) {
            debug!(message = %message, "Commerce API returned error envelope");
            return Err(CommerceError::Rejected(message));
        }

        Ok(serde_json::from_value(value)?)
    }

    // =========================================================================
    // Verb Helpers
    // =========================================================================

    pub(super) async fn get<T, Q>(
        &self,
        path: &str,
        query: Option<&Q>,
        token: Option<&AuthToken>,
    ) -> Result<T, CommerceError>
    where
        T: DeserializeOwned,
        Q: Serialize + ?Sized,
    {
        let mut builder = self.request(Method::GET, path, token)?;
        if let Some(query) = query {
            builder = builder.query(query);
        }
        self.send_json(builder).await
    }

    pub(super) async fn post<T, B>(
        &self,
        path: &str,
        body: &B,
        token: Option<&AuthToken>,
    ) -> Result<T, CommerceError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let builder = self.request(Method::POST, path, token)?.json(body);
        self.send_json(builder).await
    }

    pub(super) async fn patch<T, B>(
        &self,
        path: &str,
        body: &B,
        token: Option<&AuthToken>,
    ) -> Result<T, CommerceError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let builder = self.request(Method::PATCH, path, token)?.json(body);
        self.send_json(builder).await
    }

    /// POST where the response body is irrelevant (may be empty).
    pub(super) async fn post_no_content<B>(
        &self,
        path: &str,
        body: &B,
        token: Option<&AuthToken>,
    ) -> Result<(), CommerceError>
    where
        B: Serialize + ?Sized,
    {
        let builder = self.request(Method::POST, path, token)?.json(body);
        self.execute(builder).await.map(drop)
    }

    pub(super) async fn delete(
        &self,
        path: &str,
        token: Option<&AuthToken>,
    ) -> Result<(), CommerceError> {
        let builder = self.request(Method::DELETE, path, token)?;
        self.execute(builder).await.map(drop)
    }

    // =========================================================================
    // Degradable Reads
    // =========================================================================

    /// Read a list endpoint.
    ///
    /// When degradation is enabled, an unreachable backend yields an empty
    /// page instead of an error.
    pub(super) async fn get_list<T, Q>(
        &self,
        path: &str,
        query: Option<&Q>,
        token: Option<&AuthToken>,
    ) -> Result<Page<T>, CommerceError>
    where
        T: DeserializeOwned,
        Q: Serialize + ?Sized,
    {
        match self.get::<Page<T>, Q>(path, query, token).await {
            Err(e) if e.is_unreachable() && self.inner.degrade_on_unreachable => {
                warn!(path, error = %e, "Commerce API unreachable, serving empty list");
                Ok(Page::empty())
            }
            other => other,
        }
    }

    /// Read a detail endpoint; `404` answers `None`.
    ///
    /// When degradation is enabled, an unreachable backend also yields `None`.
    pub(super) async fn get_detail<T>(
        &self,
        path: &str,
        token: Option<&AuthToken>,
    ) -> Result<Option<T>, CommerceError>
    where
        T: DeserializeOwned,
    {
        match self.get::<T, ()>(path, None, token).await {
            Ok(value) => Ok(Some(value)),
            Err(CommerceError::Api { status: 404, .. }) => Ok(None),
            Err(e) if e.is_unreachable() && self.inner.degrade_on_unreachable => {
                warn!(path, error = %e, "Commerce API unreachable, serving empty detail");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }
}

/// Percent-encode an opaque identifier for use as a path segment.
pub(super) fn segment(id: &str) -> std::borrow::Cow<'_, str> {
    urlencoding::encode(id)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn client_for(server: &MockServer, degrade: bool) -> CommerceClient {
        let mut config = CommerceConfig::new(&format!("{}/api/v1", server.uri())).unwrap();
        config.degrade_on_unreachable = degrade;
        CommerceClient::new(&config).unwrap()
    }

    #[derive(Debug, serde::Deserialize, PartialEq)]
    struct Thing {
        id: String,
    }

    #[tokio::test]
    async fn test_endpoint_joins_under_base_path() {
        let config = CommerceConfig::new("https://api.mercado.test/v1").unwrap();
        let client = CommerceClient::new(&config).unwrap();
        assert_eq!(
            client.endpoint("/carts/c1/").unwrap().as_str(),
            "https://api.mercado.test/v1/carts/c1/"
        );
    }

    #[test]
    fn test_segment_encodes_reserved_characters() {
        assert_eq!(segment("a/b c"), "a%2Fb%20c");
        assert_eq!(segment("plain-id"), "plain-id");
    }

    #[tokio::test]
    async fn test_get_sends_bearer_token() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/things/1/"))
            .and(header("Authorization", "Bearer tok_123"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "1"})))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server, false);
        let token = AuthToken::new("tok_123");
        let thing: Thing = client
            .get::<Thing, ()>("things/1/", None, Some(&token))
            .await
            .unwrap();
        assert_eq!(thing.id, "1");
    }

    #[tokio::test]
    async fn test_non_success_carries_server_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/things/"))
            .respond_with(
                ResponseTemplate::new(400)
                    .set_body_json(json!({"errors": [{"message": "Quantity must be positive"}]})),
            )
            .mount(&server)
            .await;

        let client = client_for(&server, false);
        let err = client
            .post::<Thing, _>("things/", &json!({"quantity": 0}), None)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            CommerceError::Api { status: 400, ref message } if message == "Quantity must be positive"
        ));
    }

    #[tokio::test]
    async fn test_success_with_error_envelope_is_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/things/1/"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"error": {"message": "Cart is closed"}})),
            )
            .mount(&server)
            .await;

        let client = client_for(&server, false);
        let err = client
            .get::<Thing, ()>("things/1/", None, None)
            .await
            .unwrap_err();
        assert!(matches!(err, CommerceError::Rejected(ref m) if m == "Cart is closed"));
    }

    #[tokio::test]
    async fn test_rate_limited_reads_retry_after() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "12"))
            .mount(&server)
            .await;

        let client = client_for(&server, false);
        let err = client
            .get::<Thing, ()>("things/1/", None, None)
            .await
            .unwrap_err();
        assert!(matches!(err, CommerceError::RateLimited(12)));
    }

    #[tokio::test]
    async fn test_detail_not_found_is_none() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({"detail": "Not found."})))
            .mount(&server)
            .await;

        let client = client_for(&server, false);
        let thing = client.get_detail::<Thing>("things/9/", None).await.unwrap();
        assert!(thing.is_none());
    }

    #[tokio::test]
    async fn test_delete_accepts_empty_body() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/api/v1/things/1/"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server, false);
        client.delete("things/1/", None).await.unwrap();
    }

    /// A base URL nobody listens on: the server is started to reserve a port,
    /// then dropped.
    async fn unreachable_client(degrade: bool) -> CommerceClient {
        let server = MockServer::builder().start().await;
        let uri = server.uri();
        drop(server);
        let mut config = CommerceConfig::new(&uri).unwrap();
        config.degrade_on_unreachable = degrade;
        CommerceClient::new(&config).unwrap()
    }

    #[tokio::test]
    async fn test_unreachable_list_degrades_when_enabled() {
        let client = unreachable_client(true).await;
        let page: Page<Thing> = client
            .get_list::<Thing, ()>("things/", None, None)
            .await
            .unwrap();
        assert_eq!(page, Page::empty());

        let detail = client.get_detail::<Thing>("things/1/", None).await.unwrap();
        assert!(detail.is_none());
    }

    #[tokio::test]
    async fn test_unreachable_propagates_when_disabled() {
        let client = unreachable_client(false).await;
        let err = client
            .get_list::<Thing, ()>("things/", None, None)
            .await
            .unwrap_err();
        assert!(err.is_unreachable());
    }

    #[tokio::test]
    async fn test_mutations_never_degrade() {
        let client = unreachable_client(true).await;
        let err = client
            .post::<Thing, _>("things/", &json!({}), None)
            .await
            .unwrap_err();
        assert!(err.is_unreachable());
    }
}
