//! HTTP middleware stack for storefront.
//!
//! # Middleware Order (bottom to top in Router)
//!
//! 1. Sentry layer (capture errors)
//! 2. Request ID (assign and propagate `x-request-id`)
//! 3. `TraceLayer` (request tracing)
//! 4. Request ID correlation (span field and Sentry tag)
//! 5. Security headers
//! 6. Session layer (tower-sessions with in-memory store)

pub mod context;
pub mod request_id;
pub mod security_headers;
pub mod session;

pub use context::{RequireAuth, clear_auth_token, set_auth_token};
pub use request_id::{REQUEST_ID_HEADER, request_id_middleware};
pub use security_headers::security_headers_middleware;
pub use session::create_session_layer;
