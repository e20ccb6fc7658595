//! Signed, expiring login links for PassLink.
//!
//! This crate implements both sides of a passwordless login link: the
//! [`LinkGenerator`] that issues a URL for a principal, and the [`LinkGuard`]
//! that later verifies an inbound request against it. The two sides share no
//! state besides the secret and must agree byte-for-byte on the canonical
//! payload, so both go through [`canonical`].
//!
//! # Overview
//!
//! A link carries its principal in the path and an absolute `expires`
//! timestamp in the query, signed with HMAC-SHA256:
//!
//! ```text
//! /magic-login/42?expires=1700001800&signature=9f2c...
//! ```
//!
//! Verification never throws for an expected rejection. It returns a
//! [`VerificationOutcome`]: `Authenticated`, `ExpiredSignature`, or
//! `InvalidSignature`. Only a vanished principal surfaces as an
//! [`AuthError`].
//!
//! # Usage
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use passlink_auth::{
//!     Authenticatable, LinkGenerator, LinkGuard, LinkOptions, StaticPrincipalProvider,
//!     VerificationOutcome,
//! };
//! use passlink_core::{Clock, PassLinkConfig, Secret, SystemClock};
//!
//! #[derive(Debug, Clone, PartialEq)]
//! struct User(u64);
//!
//! impl Authenticatable for User {
//!     fn unique_key(&self) -> String {
//!         self.0.to_string()
//!     }
//! }
//!
//! let config = Arc::new(
//!     PassLinkConfig::builder()
//!         .secret(Secret::parse("secret").unwrap())
//!         .build(),
//! );
//! let generator = LinkGenerator::new(Arc::clone(&config), Arc::new(SystemClock));
//! let guard = LinkGuard::new(config, Arc::new(StaticPrincipalProvider::new(vec![User(42)])));
//!
//! let link = generator.generate(&User(42), &LinkOptions::default()).unwrap();
//! let outcome = guard
//!     .verify_request(&link.path, &link.query_string(), SystemClock.now())
//!     .unwrap();
//! assert!(matches!(outcome, VerificationOutcome::Authenticated { .. }));
//! ```
//!
//! # Modules
//!
//! - [`canonical`] - Canonical payload construction and query parsing
//! - [`error`] - Error types for generation and principal resolution
//! - [`guard`] - Inbound link verification
//! - [`link`] - Link generation
//! - [`principal`] - Principal capability traits and an in-memory provider
//! - [`signer`] - HMAC-SHA256 signing with constant-time verification

pub mod canonical;
pub mod error;
pub mod guard;
pub mod link;
pub mod principal;
pub mod signer;

pub use error::AuthError;
pub use guard::{LinkCheck, LinkGuard, VerificationOutcome, VerifiedLink};
pub use link::{LinkGenerator, LinkOptions, SignedLink, SignedLinkRequest};
pub use principal::{Authenticatable, PrincipalProvider, StaticPrincipalProvider};
pub use signer::LinkSigner;
