use serde::{Deserialize, Serialize};

/// The signed access grant carried in a URL's path and query string.
///
/// Never stored: it only exists serialized as
/// `{base}/{resource_path}?expires={expires_at}&signature={signature}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedCapability {
    pub resource_path: String,
    pub expires_at: u64,
    /// Lowercase hex HMAC-SHA256 over [`SignedCapability::canonical_string`].
    pub signature: String,
}

impl SignedCapability {
    /// The exact bytes that get signed: `"{resource_path}:{expires}"`.
    pub fn canonical_string(resource_path: &str, expires_at: u64) -> String {
        format!("{}:{}", resource_path, expires_at)
    }

    pub fn to_url(&self, base_url: &str) -> String {
        format!(
            "{}/{}?expires={}&signature={}",
            base_url.trim_end_matches('/'),
            self.resource_path,
            self.expires_at,
            self.signature
        )
    }
}
