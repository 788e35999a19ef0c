//! Gateway-side checks for signed URLs.

use super::issuer::{sign, Clock, SystemClock};
use reelvault_core::{SignedCapability, SigningConfig, VerificationError};
use std::sync::Arc;
use subtle::ConstantTimeEq;

/// Check a signature and expiry. A URL is still valid at exactly `expires_at`.
///
/// The signature is compared in constant time and checked before the expiry, so a
/// tampered `expires` value reports [`VerificationError::InvalidSignature`].
pub fn verify(
    resource_path: &str,
    expires_at: u64,
    signature: &str,
    secret: &[u8],
    now: u64,
) -> Result<(), VerificationError> {
    let expected = sign(resource_path, expires_at, secret);
    if !bool::from(expected.as_bytes().ct_eq(signature.as_bytes())) {
        return Err(VerificationError::InvalidSignature);
    }
    if now > expires_at {
        return Err(VerificationError::Expired {
            expires: expires_at,
            now,
        });
    }
    Ok(())
}

/// Parse a full signed URL issued under `base_url` and verify it.
pub fn verify_url(
    url: &str,
    base_url: &str,
    secret: &[u8],
    now: u64,
) -> Result<SignedCapability, VerificationError> {
    let base = base_url.trim_end_matches('/');
    let rest = url
        .strip_prefix(base)
        .and_then(|rest| rest.strip_prefix('/'))
        .ok_or_else(|| {
            VerificationError::Malformed(format!("URL is not under {}", base))
        })?;

    let (path, query) = rest
        .split_once('?')
        .ok_or(VerificationError::MissingParameter("expires"))?;
    if path.is_empty() {
        return Err(VerificationError::Malformed(
            "URL has no resource path".to_string(),
        ));
    }

    let mut expires = None;
    let mut signature = None;
    for pair in query.split('&') {
        let (name, value) = pair.split_once('=').unwrap_or((pair, ""));
        match name {
            "expires" => expires = Some(value),
            "signature" => signature = Some(value),
            _ => {}
        }
    }

    let expires = decode(expires.ok_or(VerificationError::MissingParameter("expires"))?)?;
    let expires_at = expires.parse::<u64>().map_err(|_| {
        VerificationError::Malformed(format!("expires is not a Unix timestamp: {}", expires))
    })?;
    let signature = decode(signature.ok_or(VerificationError::MissingParameter("signature"))?)?;

    verify(path, expires_at, &signature, secret, now)?;

    Ok(SignedCapability {
        resource_path: path.to_string(),
        expires_at,
        signature,
    })
}

fn decode(value: &str) -> Result<String, VerificationError> {
    urlencoding::decode(value)
        .map(|decoded| decoded.into_owned())
        .map_err(|e| VerificationError::Malformed(format!("Invalid query encoding: {}", e)))
}

/// Verifies URLs for one base URL and secret against a clock.
#[derive(Clone)]
pub struct TokenVerifier {
    base_url: String,
    secret: String,
    clock: Arc<dyn Clock>,
}

impl TokenVerifier {
    pub fn new(config: &SigningConfig) -> Self {
        Self {
            base_url: config.base_url.clone(),
            secret: config.secret.clone(),
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn verify_url(&self, url: &str) -> Result<SignedCapability, VerificationError> {
        verify_url(
            url,
            &self.base_url,
            self.secret.as_bytes(),
            self.clock.now_unix(),
        )
    }
}
