//! Shared type definitions.

use std::fmt;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{PassLinkError, PassLinkResult};

/// Placeholder written wherever a secret would otherwise be displayed.
const REDACTED: &str = "[redacted]";

/// HMAC signing secret.
///
/// The raw bytes never leave this type through `Debug`, `Display`, or
/// serialization; all of them print a redaction marker instead.
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(Vec<u8>);

impl Secret {
    /// Prefix marking a base64-encoded secret, as in `base64:c2VjcmV0`.
    pub const BASE64_PREFIX: &str = "base64:";

    /// Create a secret from raw bytes.
    ///
    /// # Errors
    /// Returns [`PassLinkError::InvalidSecret`] if `bytes` is empty.
    pub fn new(bytes: impl Into<Vec<u8>>) -> PassLinkResult<Self> {
        let bytes = bytes.into();
        if bytes.is_empty() {
            return Err(PassLinkError::InvalidSecret("secret must not be empty".to_owned()));
        }
        Ok(Self(bytes))
    }

    /// Parse a secret from its configuration form.
    ///
    /// Values starting with `base64:` are decoded; anything else is taken
    /// verbatim as UTF-8 bytes.
    ///
    /// # Examples
    ///
    /// ```
    /// use passlink_core::Secret;
    ///
    /// let plain = Secret::parse("secret").unwrap();
    /// let encoded = Secret::parse("base64:c2VjcmV0").unwrap();
    /// assert_eq!(plain, encoded);
    /// ```
    pub fn parse(value: &str) -> PassLinkResult<Self> {
        match value.strip_prefix(Self::BASE64_PREFIX) {
            Some(encoded) => {
                let decoded = BASE64
                    .decode(encoded.trim())
                    .map_err(|e| PassLinkError::InvalidSecret(format!("bad base64: {e}")))?;
                Self::new(decoded)
            }
            None => Self::new(value.as_bytes()),
        }
    }

    /// Expose the raw key material.
    #[must_use]
    pub fn expose(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Secret").field(&REDACTED).finish()
    }
}

impl Serialize for Secret {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(REDACTED)
    }
}

impl<'de> Deserialize<'de> for Secret {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        if raw == REDACTED {
            return Err(serde::de::Error::custom(
                "secret is redacted; supply the real key",
            ));
        }
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}
