use crate::error::{PaymentError, Result};
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use hmac::{Hmac, Mac};
use rand::RngCore;
use sha2::Sha256;
use tracing::debug;

type HmacSha256 = Hmac<Sha256>;

/// Authorization scheme token expected by the gateway (iyzico v2).
pub const AUTH_SCHEME: &str = "IYZWSv2";
/// The nonce travels out-of-band on this header; the gateway recomputes the
/// signature with it server-side.
pub const NONCE_HEADER: &str = "x-iyzi-rnd";

/// Header values for one signed request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedHeaders {
    /// Full `Authorization` header value, scheme token included.
    pub authorization: String,
    /// The nonce, to be sent as the [`NONCE_HEADER`] header.
    pub random_key: String,
}

/// Produces gateway authorization headers.
///
/// The signing payload is `nonce + path + body` with no delimiters; the
/// gateway relies on the nonce arriving separately to reconstruct the same
/// byte sequence. Reordering or delimiting the concatenation produces
/// signatures the gateway rejects.
pub struct RequestSigner {
    api_key: String,
    secret_key: String,
}

impl RequestSigner {
    /// Fails fast on empty credentials so misconfiguration surfaces at
    /// startup rather than on the first payment.
    pub fn new(api_key: impl Into<String>, secret_key: impl Into<String>) -> Result<Self> {
        let api_key = api_key.into();
        let secret_key = secret_key.into();
        if api_key.trim().is_empty() {
            return Err(PaymentError::ConfigurationError(
                "gateway API key is empty".to_string(),
            ));
        }
        if secret_key.trim().is_empty() {
            return Err(PaymentError::ConfigurationError(
                "gateway secret key is empty".to_string(),
            ));
        }
        Ok(Self {
            api_key,
            secret_key,
        })
    }

    /// Signs one request. `path` is the path component only (no host, no
    /// query); `body` must be the exact bytes that will be transmitted.
    pub fn sign(&self, nonce: &str, path: &str, body: &[u8]) -> SignedHeaders {
        // Log the path only: nonce, payload and signature stay out of logs.
        debug!(path, "signing gateway request");

        let mut mac = HmacSha256::new_from_slice(self.secret_key.as_bytes())
            .expect("HMAC accepts keys of any length");
        mac.update(nonce.as_bytes());
        mac.update(path.as_bytes());
        mac.update(body);
        let signature = hex::encode(mac.finalize().into_bytes());

        let auth_string = format!(
            "apiKey:{}&randomKey:{}&signature:{}",
            self.api_key, nonce, signature
        );

        SignedHeaders {
            authorization: format!("{} {}", AUTH_SCHEME, BASE64.encode(auth_string)),
            random_key: nonce.to_string(),
        }
    }
}

/// A fresh cryptographically random nonce: 16 bytes, hex-encoded.
pub fn random_nonce() -> String {
    let mut bytes = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}
