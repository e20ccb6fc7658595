//! PassLink HTTP layer: the login route, sessions, and a hyper service.
//!
//! This crate exposes a [`LinkGuard`](passlink_auth::LinkGuard) over HTTP. It handles:
//!
//! - **Service** ([`service`]): The [`LoginHttpService`](service::LoginHttpService)
//!   that implements hyper's `Service` trait and serves the login route.
//!
//! - **Sessions** ([`session`]): The [`SessionHook`](session::SessionHook) trait that
//!   turns an authenticated principal into a browser session, with an in-memory
//!   [`MemorySessionStore`](session::MemorySessionStore).
//!
//! - **Responses** ([`response`]): Redirect, rejection, and JSON responses plus the
//!   headers common to all of them.
//!
//! - **Body** ([`body`]): The [`LinkResponseBody`](body::LinkResponseBody) type
//!   supporting buffered and empty response modes.
//!
//! # Architecture
//!
//! ```text
//! HTTP Request
//!   -> LoginHttpService (hyper Service)
//!     -> Health check / session introspection
//!     -> Login route match ({base_path}/{route_name}/{id})
//!     -> LinkGuard::verify_request (signature, then expiry, then principal)
//!     -> SessionHook (already authenticated? establish session)
//!     -> Common response headers (x-request-id, Server, Cache-Control)
//!   <- 302 redirect / 401 rejection
//! ```
//!
//! # Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use passlink_auth::{Authenticatable, StaticPrincipalProvider};
//! use passlink_core::{PassLinkConfig, Secret, SystemClock};
//! use passlink_http::service::LoginHttpService;
//! use passlink_http::session::MemorySessionStore;
//!
//! #[derive(Debug, Clone)]
//! struct User(u64);
//!
//! impl Authenticatable for User {
//!     fn unique_key(&self) -> String {
//!         self.0.to_string()
//!     }
//! }
//!
//! let config = PassLinkConfig::builder()
//!     .secret(Secret::parse("secret").unwrap())
//!     .build();
//! let service = LoginHttpService::new(
//!     Arc::new(config),
//!     Arc::new(StaticPrincipalProvider::new(vec![User(1)])),
//!     Arc::new(MemorySessionStore::new()),
//!     Arc::new(SystemClock),
//! );
//! // Use `service` with hyper server.
//! ```

pub mod body;
pub mod response;
pub mod service;
pub mod session;

pub use body::LinkResponseBody;
pub use service::LoginHttpService;
pub use session::{MemorySessionStore, SessionHook};
