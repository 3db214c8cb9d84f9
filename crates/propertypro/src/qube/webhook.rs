use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::error::UnknownValue;

type HmacSha256 = Hmac<Sha256>;

pub const SIGNATURE_HEADER: &str = "X-Qube-Signature";

#[derive(Debug, thiserror::Error)]
pub enum WebhookError {
    #[error("Missing signature")]
    MissingSignature,
    #[error("Invalid signature")]
    InvalidSignature,
    #[error("invalid webhook payload: {0}")]
    Payload(String),
    #[error(transparent)]
    UnknownStatus(#[from] UnknownValue),
    #[error("webhook secret is not configured: set QUBE_WEBHOOK_SECRET")]
    NotConfigured,
}

/// Checks `X-Qube-Signature`: hex HMAC-SHA256 of the raw body, optionally
/// prefixed with `sha256=`.
#[derive(Clone)]
pub struct WebhookVerifier {
    secret: Option<String>,
}

impl WebhookVerifier {
    pub fn new(secret: Option<String>) -> Self {
        Self { secret }
    }

    pub fn sign(secret: &str, body: &[u8]) -> String {
        let mut mac = mac(secret);
        mac.update(body);
        hex::encode(mac.finalize().into_bytes())
    }

    pub fn verify(&self, body: &[u8], signature: Option<&str>) -> Result<(), WebhookError> {
        let signature = signature
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .ok_or(WebhookError::MissingSignature)?;
        let secret = self.secret.as_deref().ok_or(WebhookError::NotConfigured)?;

        let hex_digest = signature.strip_prefix("sha256=").unwrap_or(signature);
        let expected = hex::decode(hex_digest).map_err(|_| WebhookError::InvalidSignature)?;

        let mut mac = mac(secret);
        mac.update(body);
        mac.verify_slice(&expected)
            .map_err(|_| WebhookError::InvalidSignature)
    }
}

fn mac(secret: &str) -> HmacSha256 {
    <HmacSha256 as Mac>::new_from_slice(secret.as_bytes()).expect("HMAC accepts any key length")
}
