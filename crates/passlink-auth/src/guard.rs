//! Verification of inbound login links.
//!
//! [`LinkGuard::verify_request`] runs a linear check with no retries:
//!
//! 1. Split the query around the single `signature` parameter. Everything
//!    before it is signed; only `redirect_to` may follow it.
//! 2. Extract the principal identifier from `{base_path}/{route_name}/{id}`.
//! 3. Recompute the signature over the canonical payload and compare it in
//!    constant time.
//! 4. Compare the signed `expires` timestamp against `now`.
//! 5. Resolve the principal through the [`PrincipalProvider`].
//!
//! The signature check always precedes the expiry check, so a tampered
//! `expires` is reported as an invalid signature rather than as expired.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use passlink_core::PassLinkConfig;
use tracing::debug;

use crate::canonical::{canonicalize, decode_component, parse_query};
use crate::error::AuthError;
use crate::link::{EXPIRES_PARAM, REDIRECT_PARAM, SIGNATURE_PARAM};
use crate::principal::PrincipalProvider;
use crate::signer::LinkSigner;

/// Result of checking an inbound link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerificationOutcome<P> {
    /// The link is authentic and current; log `principal` in and send them to
    /// `redirect_to`.
    Authenticated {
        /// The resolved principal.
        principal: P,
        /// Destination after login.
        redirect_to: String,
    },
    /// The signature is valid but the link has expired.
    ExpiredSignature,
    /// The signature is missing, malformed, or does not match.
    InvalidSignature,
}

/// A link whose signature and expiry both checked out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedLink {
    /// Identifier taken from the link path.
    pub principal_id: String,
    /// Signed expiry timestamp.
    pub expires_at: i64,
    /// Destination requested by the link, if any, after applying the
    /// unsigned override.
    pub redirect_to: Option<String>,
}

/// Classification of a link without principal resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkCheck {
    /// Authentic and current.
    Valid(VerifiedLink),
    /// Authentic but past its expiry.
    Expired,
    /// Not authentic.
    Invalid,
}

/// Verifies inbound login links and resolves their principals.
#[derive(Debug)]
pub struct LinkGuard<P> {
    config: Arc<PassLinkConfig>,
    signer: LinkSigner,
    provider: Arc<P>,
}

impl<P> Clone for LinkGuard<P> {
    fn clone(&self) -> Self {
        Self {
            config: Arc::clone(&self.config),
            signer: self.signer.clone(),
            provider: Arc::clone(&self.provider),
        }
    }
}

impl<P: PrincipalProvider> LinkGuard<P> {
    /// Create a guard verifying with the configured secret.
    #[must_use]
    pub fn new(config: Arc<PassLinkConfig>, provider: Arc<P>) -> Self {
        let signer = LinkSigner::new(config.secret.clone());
        Self {
            config,
            signer,
            provider,
        }
    }

    /// The principal provider backing this guard.
    #[must_use]
    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Verify a request and resolve its principal.
    ///
    /// `path` is the request path and `query` the raw (still percent-encoded)
    /// query string.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::PrincipalNotFound`] if the link is valid but the
    /// provider no longer knows the principal.
    pub fn verify_request(
        &self,
        path: &str,
        query: &str,
        now: DateTime<Utc>,
    ) -> Result<VerificationOutcome<P::Principal>, AuthError> {
        let verified = match self.check_link(path, query, now) {
            LinkCheck::Valid(verified) => verified,
            LinkCheck::Expired => return Ok(VerificationOutcome::ExpiredSignature),
            LinkCheck::Invalid => return Ok(VerificationOutcome::InvalidSignature),
        };

        let principal = self
            .provider
            .find_by_id(&verified.principal_id)
            .ok_or_else(|| AuthError::PrincipalNotFound(verified.principal_id.clone()))?;

        let redirect_to = verified
            .redirect_to
            .unwrap_or_else(|| self.config.redirect_on_success.clone());

        Ok(VerificationOutcome::Authenticated {
            principal,
            redirect_to,
        })
    }

    /// Check the signature and expiry of a link without resolving the
    /// principal.
    #[must_use]
    pub fn check_link(&self, path: &str, query: &str, now: DateTime<Utc>) -> LinkCheck {
        let params = parse_query(query);

        let mut signature_positions = params
            .iter()
            .enumerate()
            .filter(|(_, (k, _))| k == SIGNATURE_PARAM)
            .map(|(i, _)| i);
        let (Some(signature_index), None) = (signature_positions.next(), signature_positions.next())
        else {
            debug!(path, "link has no single signature parameter");
            return LinkCheck::Invalid;
        };

        let signed = &params[..signature_index];
        let claimed = &params[signature_index].1;
        let trailing = &params[signature_index + 1..];

        if let Some((key, _)) = trailing.iter().find(|(k, _)| k != REDIRECT_PARAM) {
            debug!(path, key = %key, "unsigned parameter after signature");
            return LinkCheck::Invalid;
        }

        let Some(principal_id) = self.principal_id(path) else {
            debug!(path, "path does not name a principal on the login route");
            return LinkCheck::Invalid;
        };

        let canonical = canonicalize(path, signed);
        if !self.signer.verify(&canonical, claimed) {
            debug!(path, "link signature mismatch");
            return LinkCheck::Invalid;
        }

        let Some(expires_at) = find_param(signed, EXPIRES_PARAM).and_then(|v| v.parse::<i64>().ok())
        else {
            debug!(path, "signed link carries no usable expiry");
            return LinkCheck::Invalid;
        };

        if now.timestamp() > expires_at {
            debug!(path, expires_at, now = now.timestamp(), "link expired");
            return LinkCheck::Expired;
        }

        // An empty `redirect_to` names no destination.
        let redirect_to = trailing
            .iter()
            .rev()
            .map(|(_, v)| v.as_str())
            .find(|v| !v.is_empty())
            .or_else(|| find_param(signed, REDIRECT_PARAM).filter(|v| !v.is_empty()))
            .map(ToOwned::to_owned);

        LinkCheck::Valid(VerifiedLink {
            principal_id,
            expires_at,
            redirect_to,
        })
    }

    /// Extract the decoded principal identifier from
    /// `{base_path}/{route_name}/{id}`.
    ///
    /// Segments are compared after percent-decoding, so `/magic%2Dlogin/1`
    /// names the same principal as `/magic-login/1`. Returns `None` for paths
    /// outside the login route.
    #[must_use]
    pub fn principal_id(&self, path: &str) -> Option<String> {
        let prefix = self.config.login_route_prefix();
        let expected: Vec<&str> = prefix.split('/').collect();
        let segments: Vec<String> = path.split('/').map(decode_component).collect();

        let (id, route) = segments.split_last()?;
        if route.len() != expected.len()
            || route.iter().zip(&expected).any(|(seen, want)| seen.as_str() != *want)
        {
            return None;
        }
        (!id.is_empty()).then(|| id.clone())
    }
}

fn find_param<'a>(params: &'a [(String, String)], name: &str) -> Option<&'a str> {
    params
        .iter()
        .find(|(k, _)| k == name)
        .map(|(_, v)| v.as_str())
}
