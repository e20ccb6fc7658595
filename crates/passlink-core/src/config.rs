//! PassLink configuration.
//!
//! Provides [`PassLinkConfig`], the process-wide immutable configuration
//! consumed by the link builder, the verification guard, and the HTTP layer.
//! It is constructed once at startup (from environment variables or the typed
//! builder) and shared by reference afterwards.

use chrono::Duration;
use serde::{Deserialize, Serialize};
use tracing::debug;
use typed_builder::TypedBuilder;

use crate::error::{PassLinkError, PassLinkResult};
use crate::types::Secret;

/// PassLink configuration.
///
/// Only the signing secret is mandatory; every other field has a default.
///
/// # Examples
///
/// ```
/// use passlink_core::{PassLinkConfig, Secret};
///
/// let config = PassLinkConfig::builder()
///     .secret(Secret::parse("secret").unwrap())
///     .build();
/// assert_eq!(config.route_name, "magic-login");
/// assert_eq!(config.login_route_prefix(), "/magic-login");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, TypedBuilder)]
#[serde(rename_all = "camelCase")]
pub struct PassLinkConfig {
    /// HMAC key used to sign and verify links.
    pub secret: Secret,

    /// Minutes a freshly generated link stays valid.
    #[builder(default = 30)]
    pub default_ttl_minutes: u32,

    /// Path prefix mounted before the login route (empty, or `/`-prefixed).
    #[builder(default)]
    pub base_path: String,

    /// Route segment that precedes the principal identifier.
    #[builder(default = String::from("magic-login"))]
    pub route_name: String,

    /// Destination after a successful login when the link names none.
    #[builder(default = String::from("/"))]
    pub redirect_on_success: String,

    /// Scheme and authority prepended to generated links.
    #[builder(default = String::from("http://localhost:8080"))]
    pub app_url: String,

    /// Whether sessions established by a link outlive the browser session.
    #[builder(default = false)]
    pub remember_login: bool,

    /// Whether visitors that already hold a session skip re-authentication.
    #[builder(default = true)]
    pub redirect_authenticated: bool,

    /// Body of the 401 response for expired or invalid links.
    #[builder(default = String::from("Expired or Invalid Link"))]
    pub invalid_signature_message: String,

    /// Bind address for the server (e.g. `"0.0.0.0:8080"`).
    #[builder(default = String::from("0.0.0.0:8080"))]
    pub gateway_listen: String,

    /// Log level filter string (e.g. `"info"`, `"debug"`).
    #[builder(default = String::from("info"))]
    pub log_level: String,
}

impl PassLinkConfig {
    /// Load configuration from environment variables.
    ///
    /// | Variable | Default |
    /// |----------|---------|
    /// | `PASSLINK_SECRET` | *(required)* |
    /// | `PASSLINK_TTL_MINUTES` | `30` |
    /// | `PASSLINK_BASE_PATH` | *(empty)* |
    /// | `PASSLINK_ROUTE_NAME` | `magic-login` |
    /// | `PASSLINK_REDIRECT_ON_SUCCESS` | `/` |
    /// | `PASSLINK_APP_URL` | `http://localhost:8080` |
    /// | `PASSLINK_REMEMBER_LOGIN` | `false` |
    /// | `PASSLINK_REDIRECT_AUTHENTICATED` | `true` |
    /// | `PASSLINK_INVALID_SIGNATURE_MESSAGE` | `Expired or Invalid Link` |
    /// | `GATEWAY_LISTEN` | `0.0.0.0:8080` |
    /// | `LOG_LEVEL` | `info` |
    pub fn from_env() -> PassLinkResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// [`from_env`](Self::from_env) delegates here with `std::env::var`.
    pub fn from_lookup<F>(lookup: F) -> PassLinkResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let raw_secret = lookup("PASSLINK_SECRET")
            .ok_or_else(|| PassLinkError::Config("PASSLINK_SECRET is not set".to_owned()))?;
        let mut config = Self::builder().secret(Secret::parse(&raw_secret)?).build();

        if let Some(v) = lookup("PASSLINK_TTL_MINUTES") {
            config.default_ttl_minutes = v.parse().map_err(|_| {
                PassLinkError::Config(format!("PASSLINK_TTL_MINUTES is not a number: {v}"))
            })?;
        }
        if let Some(v) = lookup("PASSLINK_BASE_PATH") {
            config.base_path = v;
        }
        if let Some(v) = lookup("PASSLINK_ROUTE_NAME") {
            config.route_name = v;
        }
        if let Some(v) = lookup("PASSLINK_REDIRECT_ON_SUCCESS") {
            config.redirect_on_success = v;
        }
        if let Some(v) = lookup("PASSLINK_APP_URL") {
            config.app_url = v;
        }
        if let Some(v) = lookup("PASSLINK_REMEMBER_LOGIN") {
            config.remember_login = parse_bool(&v);
        }
        if let Some(v) = lookup("PASSLINK_REDIRECT_AUTHENTICATED") {
            config.redirect_authenticated = parse_bool(&v);
        }
        if let Some(v) = lookup("PASSLINK_INVALID_SIGNATURE_MESSAGE") {
            config.invalid_signature_message = v;
        }
        if let Some(v) = lookup("GATEWAY_LISTEN") {
            config.gateway_listen = v;
        }
        if let Some(v) = lookup("LOG_LEVEL") {
            config.log_level = v;
        }

        config.validate()?;
        debug!(
            route = %config.login_route_prefix(),
            ttl_minutes = config.default_ttl_minutes,
            "loaded PassLink configuration"
        );
        Ok(config)
    }

    /// Check the structural constraints the link format relies on.
    pub fn validate(&self) -> PassLinkResult<()> {
        if self.default_ttl_minutes == 0 {
            return Err(PassLinkError::Config(
                "default TTL must be at least one minute".to_owned(),
            ));
        }
        if self.route_name.is_empty() || self.route_name.contains(['/', '?', '#']) {
            return Err(PassLinkError::Config(format!(
                "route name must be a single path segment: {:?}",
                self.route_name
            )));
        }
        if !self.base_path.is_empty()
            && (!self.base_path.starts_with('/') || self.base_path.ends_with('/'))
        {
            return Err(PassLinkError::Config(format!(
                "base path must start with '/' and not end with one: {:?}",
                self.base_path
            )));
        }
        Ok(())
    }

    /// The path every login link starts with: `{base_path}/{route_name}`.
    #[must_use]
    pub fn login_route_prefix(&self) -> String {
        format!("{}/{}", self.base_path, self.route_name)
    }

    /// The default link lifetime.
    #[must_use]
    pub fn default_ttl(&self) -> Duration {
        Duration::minutes(i64::from(self.default_ttl_minutes))
    }
}

/// Parse a string as a boolean, accepting `"1"` and `"true"` (case-insensitive).
fn parse_bool(value: &str) -> bool {
    value == "1" || value.eq_ignore_ascii_case("true")
}
