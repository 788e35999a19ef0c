//! Signed, expiring access URLs.
//!
//! URL shape: `{base}/{resource_path}?expires={unix_seconds}&signature={hex}` where the
//! signature is lowercase hex HMAC-SHA256 over `"{resource_path}:{expires}"`. A verifying
//! gateway only needs the shared secret to check it.

pub mod issuer;
pub mod verifier;

pub use issuer::{issue, issue_capability, sign, Clock, SystemClock, TokenIssuer};
pub use reelvault_core::{describe_ttl, parse_ttl};
pub use verifier::{verify, verify_url, TokenVerifier};
