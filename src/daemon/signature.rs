use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::config::WebhookSecret;
use crate::error::DeployhookError;

type HmacSha256 = Hmac<Sha256>;

pub const SIGNATURE_PREFIX: &str = "sha256=";

/// Hex length of a SHA-256 digest
const DIGEST_HEX_LEN: usize = 64;

/// Checks `X-Hub-Signature-256` values against the shared secret.
///
/// Every failure mode (absent, malformed, wrong length, wrong digest)
/// collapses to `false`.
#[derive(Clone)]
pub struct SignatureVerifier {
    secret: WebhookSecret,
}

impl SignatureVerifier {
    pub fn new(secret: WebhookSecret) -> Self {
        Self { secret }
    }

    pub fn verify(&self, payload: &[u8], claimed: Option<&str>) -> bool {
        let Some(claimed) = claimed else {
            return false;
        };
        let Some(expected) = decode_signature(claimed) else {
            return false;
        };
        let Ok(mut mac) = HmacSha256::new_from_slice(self.secret.expose()) else {
            return false;
        };
        mac.update(payload);
        // constant-time
        mac.verify_slice(&expected).is_ok()
    }

    /// `sha256=<hex>` for `payload`, as a sender would compute it
    pub fn sign(&self, payload: &[u8]) -> Result<String, DeployhookError> {
        let mut mac = HmacSha256::new_from_slice(self.secret.expose())
            .map_err(|e| DeployhookError::Config(format!("invalid HMAC key: {}", e)))?;
        mac.update(payload);
        Ok(format!(
            "{}{}",
            SIGNATURE_PREFIX,
            hex::encode(mac.finalize().into_bytes())
        ))
    }
}

impl std::fmt::Debug for SignatureVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignatureVerifier")
            .field("secret", &self.secret)
            .finish()
    }
}

/// Digest bytes of a well-formed header value; length is checked before decoding
fn decode_signature(value: &str) -> Option<Vec<u8>> {
    let hex_sig = value.trim().strip_prefix(SIGNATURE_PREFIX)?;
    if hex_sig.len() != DIGEST_HEX_LEN || !hex_sig.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    hex::decode(hex_sig).ok()
}
