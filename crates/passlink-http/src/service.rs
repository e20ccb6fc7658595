//! The login HTTP service implementing hyper's `Service` trait.
//!
//! [`LoginHttpService`] handles:
//!
//! 1. Health check interception (`GET /_passlink/health`)
//! 2. Session introspection (`GET /_passlink/session`)
//! 3. The login route `GET {base_path}/{route_name}/{id}`
//! 4. `405` for other methods on the login route, `404` elsewhere
//! 5. Common response headers (`x-request-id`, `Server`, `Cache-Control`)

use std::convert::Infallible;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use hyper::body::Incoming;
use hyper::service::Service;
use passlink_auth::{AuthError, Authenticatable, LinkGuard, PrincipalProvider, VerificationOutcome};
use passlink_core::{Clock, PassLinkConfig};
use serde_json::json;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::body::LinkResponseBody;
use crate::response::{
    add_common_headers, internal_error_response, json_response, method_not_allowed_response,
    not_found_response, redirect_response, unauthorized_response,
};
use crate::session::SessionHook;

/// Path of the health check endpoint.
pub const HEALTH_PATH: &str = "/_passlink/health";
/// Path of the session introspection endpoint.
pub const SESSION_PATH: &str = "/_passlink/session";

/// The login HTTP service.
///
/// # Type Parameters
///
/// - `P`: The principal store implementing [`PrincipalProvider`].
/// - `S`: The session layer implementing [`SessionHook`].
pub struct LoginHttpService<P, S> {
    guard: LinkGuard<P>,
    sessions: Arc<S>,
    config: Arc<PassLinkConfig>,
    clock: Arc<dyn Clock>,
}

impl<P, S> std::fmt::Debug for LoginHttpService<P, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginHttpService")
            .field("route", &self.config.login_route_prefix())
            .field("clock", &self.clock)
            .finish_non_exhaustive()
    }
}

impl<P, S> Clone for LoginHttpService<P, S> {
    fn clone(&self) -> Self {
        Self {
            guard: self.guard.clone(),
            sessions: Arc::clone(&self.sessions),
            config: Arc::clone(&self.config),
            clock: Arc::clone(&self.clock),
        }
    }
}

impl<P, S> LoginHttpService<P, S>
where
    P: PrincipalProvider + 'static,
    S: SessionHook,
{
    /// Create a new login service.
    #[must_use]
    pub fn new(
        config: Arc<PassLinkConfig>,
        provider: Arc<P>,
        sessions: Arc<S>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            guard: LinkGuard::new(Arc::clone(&config), provider),
            sessions,
            config,
            clock,
        }
    }

    /// Handle a request and produce the response, including common headers.
    #[must_use]
    pub fn handle(
        &self,
        parts: &http::request::Parts,
        request_id: &str,
    ) -> http::Response<LinkResponseBody> {
        let response = self.route(parts, request_id);
        add_common_headers(response, request_id)
    }

    fn route(&self, parts: &http::request::Parts, request_id: &str) -> http::Response<LinkResponseBody> {
        let method = &parts.method;
        let path = parts.uri.path();
        debug!(%method, path, request_id, "processing request");

        if *method == http::Method::GET {
            match path {
                HEALTH_PATH => {
                    return json_response(&json!({ "status": "running", "service": "passlink" }));
                }
                SESSION_PATH => {
                    let principal = self.sessions.current(parts);
                    return json_response(&json!({
                        "authenticated": principal.is_some(),
                        "principal": principal,
                    }));
                }
                _ => {}
            }
        }

        if self.guard.principal_id(path).is_none() {
            return not_found_response();
        }
        if *method != http::Method::GET {
            return method_not_allowed_response();
        }

        self.login(parts, request_id)
    }

    fn login(&self, parts: &http::request::Parts, request_id: &str) -> http::Response<LinkResponseBody> {
        let path = parts.uri.path();
        let query = parts.uri.query().unwrap_or("");
        let now = self.clock.now();

        let outcome = match self.guard.verify_request(path, query, now) {
            Ok(outcome) => outcome,
            Err(AuthError::PrincipalNotFound(id)) => {
                warn!(principal = %id, request_id, "login link names an unknown principal");
                return unauthorized_response(&self.config.invalid_signature_message);
            }
            Err(err) => {
                error!(error = %err, request_id, "login link verification failed");
                return internal_error_response();
            }
        };

        match outcome {
            VerificationOutcome::Authenticated {
                principal,
                redirect_to,
            } => {
                let key = principal.unique_key();

                if self.config.redirect_authenticated {
                    if let Some(current) = self.sessions.current(parts) {
                        info!(
                            principal = %key,
                            session_principal = %current,
                            request_id,
                            "visitor already authenticated, redirecting"
                        );
                        return redirect_response(&redirect_to, None);
                    }
                }

                match self.sessions.establish(&key, self.config.remember_login) {
                    Ok(cookie) => {
                        info!(principal = %key, redirect_to = %redirect_to, request_id, "login link accepted");
                        redirect_response(&redirect_to, Some(cookie))
                    }
                    Err(err) => {
                        error!(error = %err, principal = %key, request_id, "failed to establish session");
                        internal_error_response()
                    }
                }
            }
            VerificationOutcome::ExpiredSignature => {
                warn!(path, request_id, "expired login link");
                unauthorized_response(&self.config.invalid_signature_message)
            }
            VerificationOutcome::InvalidSignature => {
                warn!(path, request_id, "invalid login link signature");
                unauthorized_response(&self.config.invalid_signature_message)
            }
        }
    }
}

impl<P, S> Service<http::Request<Incoming>> for LoginHttpService<P, S>
where
    P: PrincipalProvider + 'static,
    S: SessionHook,
{
    type Response = http::Response<LinkResponseBody>;
    type Error = Infallible;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn call(&self, req: http::Request<Incoming>) -> Self::Future {
        let service = self.clone();

        Box::pin(async move {
            let request_id = Uuid::new_v4().to_string();
            let (parts, _body) = req.into_parts();
            Ok(service.handle(&parts, &request_id))
        })
    }
}
