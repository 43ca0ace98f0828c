//! HMAC-SHA256 webhook signature verification.

use hmac::{Hmac, Mac};
use sha2::Sha256;

use tollgate_core::error::AppError;
use tollgate_core::result::AppResult;

type HmacSha256 = Hmac<Sha256>;

/// Verify a hex-encoded HMAC-SHA256 signature over the raw request body.
///
/// The comparison is constant-time via `Mac::verify_slice`.
pub fn verify_signature(secret: &str, body: &[u8], signature_hex: &str) -> AppResult<()> {
    let expected = hex::decode(signature_hex)
        .map_err(|_| AppError::invalid_signature("Signature is not valid hex"))?;

    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|_| AppError::invalid_signature("Webhook secret is empty"))?;
    mac.update(body);

    mac.verify_slice(&expected)
        .map_err(|_| AppError::invalid_signature("Signature mismatch"))
}

/// Compute the hex-encoded signature for a body. Used by tests and tooling.
pub fn sign(secret: &str, body: &[u8]) -> String {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC can take key of any size");
    mac.update(body);
    hex::encode(mac.finalize().into_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tollgate_core::error::ErrorKind;

    #[test]
    fn valid_signature_passes() {
        let body = br#"{"licenseKey":"lic_x","hours":5}"#;
        let sig = sign("topsecret", body);
        assert!(verify_signature("topsecret", body, &sig).is_ok());
    }

    #[test]
    fn wrong_secret_fails() {
        let body = b"payload";
        let sig = sign("secret-a", body);
        let err = verify_signature("secret-b", body, &sig).unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidSignature);
    }

    #[test]
    fn tampered_body_fails() {
        let sig = sign("topsecret", b"original");
        let err = verify_signature("topsecret", b"tampered", &sig).unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidSignature);
    }

    #[test]
    fn non_hex_signature_fails() {
        let err = verify_signature("topsecret", b"body", "not-hex!").unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidSignature);
    }
}
