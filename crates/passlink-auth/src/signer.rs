//! HMAC-SHA256 link signing.
//!
//! Signatures are `hex(HMAC-SHA256(secret, canonical_payload))`. Verification
//! recomputes the signature and compares it in constant time.

use hmac::{Hmac, KeyInit, Mac};
use passlink_core::Secret;
use sha2::Sha256;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

/// Signs and verifies canonical link payloads with a process-wide secret.
#[derive(Debug, Clone)]
pub struct LinkSigner {
    secret: Secret,
}

impl LinkSigner {
    /// Create a signer keyed with `secret`.
    #[must_use]
    pub fn new(secret: Secret) -> Self {
        Self { secret }
    }

    /// Compute the hex-encoded signature of a canonical payload.
    ///
    /// # Examples
    ///
    /// ```
    /// use passlink_auth::signer::LinkSigner;
    /// use passlink_core::Secret;
    ///
    /// let signer = LinkSigner::new(Secret::parse("key").unwrap());
    /// let signature = signer.sign(b"The quick brown fox jumps over the lazy dog");
    /// assert_eq!(
    ///     signature,
    ///     "f7bc83f430538424b13298e6aa6fb143ef4d59a14946175997479dbc2d1a3cd8"
    /// );
    /// ```
    #[must_use]
    pub fn sign(&self, canonical: &[u8]) -> String {
        let mut mac = HmacSha256::new_from_slice(self.secret.expose())
            .expect("HMAC can accept keys of any length");
        mac.update(canonical);
        hex::encode(mac.finalize().into_bytes())
    }

    /// Check `candidate` against the signature of `canonical`.
    ///
    /// The comparison runs in constant time for candidates of the expected
    /// length.
    #[must_use]
    pub fn verify(&self, canonical: &[u8], candidate: &str) -> bool {
        let expected = self.sign(canonical);
        expected.as_bytes().ct_eq(candidate.as_bytes()).into()
    }
}
