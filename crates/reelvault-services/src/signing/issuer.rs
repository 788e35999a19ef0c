use hmac::{Hmac, Mac};
use reelvault_core::{AppError, SignedCapability, SigningConfig};
use sha2::Sha256;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

type HmacSha256 = Hmac<Sha256>;

/// Source of "now" in Unix seconds.
pub trait Clock: Send + Sync {
    fn now_unix(&self) -> u64;
}

/// Wall clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_unix(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs()
    }
}

impl<F> Clock for F
where
    F: Fn() -> u64 + Send + Sync,
{
    fn now_unix(&self) -> u64 {
        self()
    }
}

/// Lowercase hex HMAC-SHA256 of `"{resource_path}:{expires_at}"`.
pub fn sign(resource_path: &str, expires_at: u64, secret: &[u8]) -> String {
    let mut mac = HmacSha256::new_from_slice(secret).expect("HMAC accepts any key size");
    mac.update(SignedCapability::canonical_string(resource_path, expires_at).as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

/// Sign `resource_path` for `ttl_secs` seconds from `clock`'s now.
///
/// The path is signed exactly as given: no normalization, no percent-encoding.
pub fn issue_capability(
    resource_path: &str,
    ttl_secs: i64,
    secret: &[u8],
    clock: &dyn Clock,
) -> Result<SignedCapability, AppError> {
    if resource_path.is_empty() {
        return Err(AppError::InvalidInput(
            "Resource path cannot be empty".to_string(),
        ));
    }
    if ttl_secs < 1 {
        return Err(AppError::InvalidInput(format!(
            "TTL must be at least 1 second, got {}",
            ttl_secs
        )));
    }

    let expires_at = clock
        .now_unix()
        .checked_add(ttl_secs as u64)
        .ok_or_else(|| AppError::InvalidInput(format!("TTL {} is too large", ttl_secs)))?;

    Ok(SignedCapability {
        resource_path: resource_path.to_string(),
        expires_at,
        signature: sign(resource_path, expires_at, secret),
    })
}

/// Build a signed URL for `resource_path` under `base_url`.
pub fn issue(
    resource_path: &str,
    ttl_secs: i64,
    base_url: &str,
    secret: &[u8],
    clock: &dyn Clock,
) -> Result<String, AppError> {
    Ok(issue_capability(resource_path, ttl_secs, secret, clock)?.to_url(base_url))
}

/// Issues signed URLs for one base URL and secret.
#[derive(Clone)]
pub struct TokenIssuer {
    base_url: String,
    secret: String,
    default_ttl_secs: u64,
    clock: Arc<dyn Clock>,
}

impl TokenIssuer {
    pub fn new(config: &SigningConfig) -> Self {
        Self {
            base_url: config.base_url.clone(),
            secret: config.secret.clone(),
            default_ttl_secs: config.default_ttl_secs,
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn default_ttl_secs(&self) -> u64 {
        self.default_ttl_secs
    }

    pub fn capability(
        &self,
        resource_path: &str,
        ttl_secs: i64,
    ) -> Result<SignedCapability, AppError> {
        issue_capability(
            resource_path,
            ttl_secs,
            self.secret.as_bytes(),
            self.clock.as_ref(),
        )
    }

    pub fn issue(&self, resource_path: &str, ttl_secs: i64) -> Result<String, AppError> {
        Ok(self.capability(resource_path, ttl_secs)?.to_url(&self.base_url))
    }

    /// [`TokenIssuer::issue`] with the configured default TTL.
    pub fn issue_default(&self, resource_path: &str) -> Result<String, AppError> {
        let ttl = i64::try_from(self.default_ttl_secs).map_err(|_| {
            AppError::InvalidInput(format!("TTL {} is too large", self.default_ttl_secs))
        })?;
        self.issue(resource_path, ttl)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIXED_NOW: u64 = 1_700_000_000;

    fn fixed_clock() -> u64 {
        FIXED_NOW
    }

    #[test]
    fn signature_matches_known_vector() {
        assert_eq!(
            sign("video/a.mp4", 1_700_000_000, b"k"),
            "da1efbd2b48e62a15ffc057a87eeafdeeeab410c7e8bdc7f3f78a47c4e4e9ab3"
        );
    }

    #[test]
    fn issue_builds_expected_url() {
        let url = issue(
            "video/intro.mp4",
            3600,
            "https://media.example.com/",
            b"your-secret-key-change-this",
            &fixed_clock,
        )
        .unwrap();
        assert_eq!(
            url,
            "https://media.example.com/video/intro.mp4?expires=1700003600\
             &signature=6516f9009d592d09e43f179417ea5a69ec0d3fc6bc8a4f8b0658c33d1c46f0f4"
        );
    }

    #[test]
    fn rejects_non_positive_ttl() {
        for ttl in [0, -1, -3600] {
            let result = issue_capability("video/a.mp4", ttl, b"k", &fixed_clock);
            assert!(matches!(result, Err(AppError::InvalidInput(_))));
        }
    }

    #[test]
    fn rejects_empty_path() {
        let result = issue_capability("", 60, b"k", &fixed_clock);
        assert!(matches!(result, Err(AppError::InvalidInput(_))));
    }

    #[test]
    fn rejects_overflowing_expiry() {
        let far_future = || u64::MAX - 10;
        let result = issue_capability("video/a.mp4", 60, b"k", &far_future);
        assert!(matches!(result, Err(AppError::InvalidInput(_))));
    }

    #[test]
    fn path_is_signed_verbatim() {
        let capability =
            issue_capability("video/my clip.mp4", 60, b"k", &fixed_clock).unwrap();
        assert_eq!(capability.resource_path, "video/my clip.mp4");
        assert_eq!(capability.expires_at, FIXED_NOW + 60);
        assert_eq!(
            capability.signature,
            sign("video/my clip.mp4", FIXED_NOW + 60, b"k")
        );
    }

    #[test]
    fn token_issuer_uses_config_and_clock() {
        let mut config = SigningConfig::new("https://media.example.com", "k");
        config.default_ttl_secs = 86_400;
        let issuer = TokenIssuer::new(&config).with_clock(Arc::new(fixed_clock));

        let url = issuer.issue_default("video/a.mp4").unwrap();
        let expected = format!(
            "https://media.example.com/video/a.mp4?expires={}&signature={}",
            FIXED_NOW + 86_400,
            sign("video/a.mp4", FIXED_NOW + 86_400, b"k")
        );
        assert_eq!(url, expected);
    }

    #[test]
    fn signatures_are_lowercase_hex() {
        let signature = sign("video/a.mp4", 1, b"secret");
        assert_eq!(signature.len(), 64);
        assert!(signature
            .chars()
            .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c)));
    }
}
