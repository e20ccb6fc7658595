//! Signed login link generation.
//!
//! A link has the shape:
//!
//! ```text
//! {app_url}{base_path}/{route_name}/{principal_id}?expires={unix}[&{extra}={value}...][&redirect_to={url}]&signature={hex}
//! ```
//!
//! `expires` is an absolute unix timestamp. `signature` is computed last and
//! covers the path and every parameter before it.

use std::sync::Arc;

use chrono::Duration;
use passlink_core::{Clock, PassLinkConfig};
use tracing::debug;
use typed_builder::TypedBuilder;

use crate::canonical::{
    build_query_string, canonicalize, encode_path_segment, encode_route_prefix,
};
use crate::error::AuthError;
use crate::principal::Authenticatable;
use crate::signer::LinkSigner;

/// Query parameter carrying the absolute expiry timestamp.
pub const EXPIRES_PARAM: &str = "expires";
/// Query parameter carrying the post-login destination.
pub const REDIRECT_PARAM: &str = "redirect_to";
/// Query parameter carrying the signature.
pub const SIGNATURE_PARAM: &str = "signature";

const RESERVED_PARAMS: [&str; 3] = [EXPIRES_PARAM, REDIRECT_PARAM, SIGNATURE_PARAM];

/// Per-link overrides of the configured defaults.
///
/// # Examples
///
/// ```
/// use passlink_auth::link::LinkOptions;
///
/// let options = LinkOptions::builder()
///     .redirect_url("/billing")
///     .ttl_minutes(5)
///     .extra_params(vec![("team".to_owned(), "blue".to_owned())])
///     .build();
/// assert_eq!(options.redirect_url.as_deref(), Some("/billing"));
/// ```
#[derive(Debug, Clone, Default, TypedBuilder)]
pub struct LinkOptions {
    /// Destination after login, overriding the configured default.
    #[builder(default, setter(into, strip_option))]
    pub redirect_url: Option<String>,

    /// Link lifetime in minutes, overriding the configured default.
    #[builder(default, setter(strip_option))]
    pub ttl_minutes: Option<u32>,

    /// Additional signed parameters, emitted in the given order.
    #[builder(default)]
    pub extra_params: Vec<(String, String)>,
}

/// The resolved contents of a link before it is signed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedLinkRequest {
    /// Identifier of the principal the link authenticates.
    pub principal_id: String,
    /// Unix timestamp after which the link is rejected.
    pub expires_at: i64,
    /// Destination baked into the link, if any.
    pub redirect_to: Option<String>,
    /// Additional signed parameters.
    pub extra_params: Vec<(String, String)>,
}

impl SignedLinkRequest {
    /// The signed query parameters in canonical order: `expires`, extras,
    /// then `redirect_to`.
    #[must_use]
    pub fn signed_params(&self) -> Vec<(String, String)> {
        let mut params = Vec::with_capacity(self.extra_params.len() + 2);
        params.push((EXPIRES_PARAM.to_owned(), self.expires_at.to_string()));
        params.extend(self.extra_params.iter().cloned());
        if let Some(redirect) = &self.redirect_to {
            params.push((REDIRECT_PARAM.to_owned(), redirect.clone()));
        }
        params
    }
}

/// A generated login link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedLink {
    /// Path component, e.g. `/magic-login/42`.
    pub path: String,
    /// Ordered query parameters; `signature` is always last.
    pub query: Vec<(String, String)>,
    /// Absolute URL including the configured application URL.
    pub full_url: String,
}

impl SignedLink {
    /// The encoded query string.
    #[must_use]
    pub fn query_string(&self) -> String {
        build_query_string(&self.query)
    }

    /// Path and query, suitable for a request target.
    #[must_use]
    pub fn path_and_query(&self) -> String {
        format!("{}?{}", self.path, self.query_string())
    }

    /// The signature parameter.
    #[must_use]
    pub fn signature(&self) -> &str {
        self.param(SIGNATURE_PARAM).unwrap_or_default()
    }

    /// The expiry timestamp embedded in the link.
    #[must_use]
    pub fn expires_at(&self) -> Option<i64> {
        self.param(EXPIRES_PARAM).and_then(|v| v.parse().ok())
    }

    fn param(&self, name: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

/// Builds signed login links for principals.
#[derive(Debug, Clone)]
pub struct LinkGenerator {
    config: Arc<PassLinkConfig>,
    signer: LinkSigner,
    clock: Arc<dyn Clock>,
}

impl LinkGenerator {
    /// Create a generator signing with the configured secret and reading time
    /// from `clock`.
    #[must_use]
    pub fn new(config: Arc<PassLinkConfig>, clock: Arc<dyn Clock>) -> Self {
        let signer = LinkSigner::new(config.secret.clone());
        Self {
            config,
            signer,
            clock,
        }
    }

    /// Generate a signed login link for `principal`.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::EmptyPrincipalKey`] if the principal's key is
    /// empty, or [`AuthError::ReservedParameter`] if an extra parameter uses
    /// `expires`, `redirect_to`, or `signature`.
    pub fn generate(
        &self,
        principal: &impl Authenticatable,
        options: &LinkOptions,
    ) -> Result<SignedLink, AuthError> {
        let request = self.prepare(principal, options)?;
        Ok(self.sign_request(&request))
    }

    /// Resolve `options` against the configuration into an unsigned request.
    pub fn prepare(
        &self,
        principal: &impl Authenticatable,
        options: &LinkOptions,
    ) -> Result<SignedLinkRequest, AuthError> {
        let principal_id = principal.unique_key();
        if principal_id.is_empty() {
            return Err(AuthError::EmptyPrincipalKey);
        }

        if let Some((key, _)) = options
            .extra_params
            .iter()
            .find(|(k, _)| RESERVED_PARAMS.contains(&k.as_str()))
        {
            return Err(AuthError::ReservedParameter(key.clone()));
        }

        let ttl = options
            .ttl_minutes
            .map_or_else(|| self.config.default_ttl(), |m| Duration::minutes(i64::from(m)));
        let expires_at = (self.clock.now() + ttl).timestamp();

        Ok(SignedLinkRequest {
            principal_id,
            expires_at,
            redirect_to: options.redirect_url.clone(),
            extra_params: options.extra_params.clone(),
        })
    }

    /// Sign a prepared request and assemble the final link.
    #[must_use]
    pub fn sign_request(&self, request: &SignedLinkRequest) -> SignedLink {
        let path = format!(
            "{}/{}",
            encode_route_prefix(&self.config.login_route_prefix()),
            encode_path_segment(&request.principal_id)
        );

        let mut query = request.signed_params();
        let signature = self.signer.sign(&canonicalize(&path, &query));
        query.push((SIGNATURE_PARAM.to_owned(), signature));

        let full_url = format!(
            "{}{}?{}",
            self.config.app_url.trim_end_matches('/'),
            path,
            build_query_string(&query)
        );

        debug!(
            principal_id = %request.principal_id,
            expires_at = request.expires_at,
            "generated login link"
        );

        SignedLink {
            path,
            query,
            full_url,
        }
    }
}
