//! Payment webhook configuration.

use serde::{Deserialize, Serialize};

/// Payment provider webhook configuration.
///
/// The signing secret is injected from the deployment environment
/// (`TOLLGATE__PAYMENT__WEBHOOK_SECRET`); it has no usable default.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentConfig {
    /// Shared secret used to verify the provider's HMAC-SHA256 signature.
    pub webhook_secret: String,
    /// HTTP header carrying the hex-encoded signature over the raw body.
    #[serde(default = "default_signature_header")]
    pub signature_header: String,
}

fn default_signature_header() -> String {
    "x-tollgate-signature".to_string()
}
