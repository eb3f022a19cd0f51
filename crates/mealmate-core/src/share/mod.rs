//! Signed share links for meal plans.
//!
//! Tokens are HMAC-SHA256 over the plan ID, so a link grants read access
//! to exactly one plan and cannot be forged without the secret.
//! Format: `mm_share_<plan_id>_<hmac_hex>`

pub mod service;

use hmac::{Hmac, Mac};
use sha2::Sha256;
use uuid::Uuid;

type HmacSha256 = Hmac<Sha256>;

/// Token prefix used to identify share tokens.
const TOKEN_PREFIX: &str = "mm_share_";

/// Base URL used when none is configured.
pub const DEFAULT_APP_URL: &str = "http://localhost:3000";

/// Errors that can occur during share token operations.
#[derive(Debug, thiserror::Error)]
pub enum ShareError {
    #[error("invalid share token format: {0}")]
    InvalidFormat(String),

    #[error("invalid plan ID in share token: {0}")]
    InvalidPlanId(String),

    #[error("share token signature verification failed")]
    HmacMismatch,

    #[error("invalid share secret: {0}")]
    InvalidSecret(String),
}

/// Secret and public base URL for share links.
#[derive(Debug, Clone)]
pub struct ShareConfig {
    /// The HMAC secret key bytes.
    pub secret: Vec<u8>,
    /// Scheme and host the links point at, without a trailing slash.
    pub base_url: String,
}

impl ShareConfig {
    pub fn new(secret: Vec<u8>, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        Self {
            secret,
            base_url: base_url.trim_end_matches('/').to_owned(),
        }
    }

    /// Build a config from a hex-encoded secret (as written by
    /// `mealmate init`).
    pub fn from_hex(secret_hex: &str, base_url: impl Into<String>) -> Result<Self, ShareError> {
        let secret = hex::decode(secret_hex.trim())
            .map_err(|e| ShareError::InvalidSecret(format!("not valid hex: {e}")))?;
        if secret.is_empty() {
            return Err(ShareError::InvalidSecret("secret is empty".to_string()));
        }
        Ok(Self::new(secret, base_url))
    }
}

/// Generate the share token for a plan.
///
/// The HMAC-SHA256 is computed over the hyphenated plan ID.
pub fn generate_share_token(config: &ShareConfig, plan_id: Uuid) -> String {
    let mac = compute_hmac(&config.secret, plan_id.to_string().as_bytes());
    format!("{TOKEN_PREFIX}{plan_id}_{}", hex::encode(mac))
}

/// Public URL for a plan's share link.
pub fn share_url(config: &ShareConfig, plan_id: Uuid) -> String {
    format!(
        "{}/shared/meal-plan/{}",
        config.base_url,
        generate_share_token(config, plan_id)
    )
}

/// Validate a share token and return the plan ID it grants access to.
pub fn validate_share_token(config: &ShareConfig, token: &str) -> Result<Uuid, ShareError> {
    let rest = token.strip_prefix(TOKEN_PREFIX).ok_or_else(|| {
        ShareError::InvalidFormat(format!("token must start with {TOKEN_PREFIX:?}"))
    })?;

    // A hyphenated UUID is 36 characters.
    if rest.len() < 36 || !rest.is_char_boundary(36) {
        return Err(ShareError::InvalidFormat(
            "token too short to contain a plan ID".to_string(),
        ));
    }
    let (plan_id_str, after_plan_id) = rest.split_at(36);

    let plan_id =
        Uuid::parse_str(plan_id_str).map_err(|e| ShareError::InvalidPlanId(e.to_string()))?;

    let hmac_hex = after_plan_id.strip_prefix('_').ok_or_else(|| {
        ShareError::InvalidFormat("expected underscore after plan ID".to_string())
    })?;

    let provided_mac = hex::decode(hmac_hex)
        .map_err(|e| ShareError::InvalidFormat(format!("invalid hex in signature: {e}")))?;

    // Signed over the literal ID text, so only the lower-case form verifies.
    verify_hmac_constant_time(&config.secret, plan_id_str.as_bytes(), &provided_mac)?;

    Ok(plan_id)
}

/// Compute HMAC-SHA256 over the given message with the given key.
fn compute_hmac(key: &[u8], message: &[u8]) -> Vec<u8> {
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC can take key of any size");
    mac.update(message);
    mac.finalize().into_bytes().to_vec()
}

/// Verify with the `hmac` crate's constant-time `verify_slice`.
fn verify_hmac_constant_time(
    key: &[u8],
    message: &[u8],
    expected_mac: &[u8],
) -> Result<(), ShareError> {
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC can take key of any size");
    mac.update(message);
    mac.verify_slice(expected_mac)
        .map_err(|_| ShareError::HmacMismatch)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> ShareConfig {
        ShareConfig::new(b"test-secret-key-for-mealmate".to_vec(), "https://meals.example.com/")
    }

    fn plan_id() -> Uuid {
        Uuid::parse_str("550e8400-e29b-41d4-a716-446655440000").unwrap()
    }

    #[test]
    fn token_has_expected_format() {
        let token = generate_share_token(&test_config(), plan_id());
        let rest = token.strip_prefix("mm_share_").unwrap();
        assert!(rest.starts_with("550e8400-e29b-41d4-a716-446655440000_"));
        assert_eq!(rest[37..].len(), 64, "HMAC-SHA256 hex should be 64 chars");
    }

    #[test]
    fn share_url_uses_base_without_trailing_slash() {
        let config = test_config();
        let url = share_url(&config, plan_id());
        assert!(url.starts_with("https://meals.example.com/shared/meal-plan/mm_share_"));
    }

    #[test]
    fn generate_and_validate_roundtrip() {
        let config = test_config();
        let token = generate_share_token(&config, plan_id());
        assert_eq!(validate_share_token(&config, &token).unwrap(), plan_id());
    }

    #[test]
    fn same_plan_same_token() {
        let config = test_config();
        assert_eq!(
            generate_share_token(&config, plan_id()),
            generate_share_token(&config, plan_id())
        );
        assert_ne!(
            generate_share_token(&config, plan_id()),
            generate_share_token(&config, Uuid::new_v4())
        );
    }

    #[test]
    fn reject_swapped_plan_id() {
        let config = test_config();
        let token = generate_share_token(&config, plan_id());
        let other = "660e8400-e29b-41d4-a716-446655440000";
        let tampered = token.replace(&plan_id().to_string(), other);
        assert!(matches!(
            validate_share_token(&config, &tampered),
            Err(ShareError::HmacMismatch)
        ));
    }

    #[test]
    fn reject_uppercased_plan_id() {
        let config = test_config();
        let token = generate_share_token(&config, plan_id());
        let upper = token.replace(&plan_id().to_string(), &plan_id().to_string().to_uppercase());
        assert!(validate_share_token(&config, &upper).is_err());
    }

    #[test]
    fn reject_wrong_secret() {
        let token = generate_share_token(&test_config(), plan_id());
        let other = ShareConfig::new(b"another-secret".to_vec(), DEFAULT_APP_URL);
        assert!(matches!(
            validate_share_token(&other, &token),
            Err(ShareError::HmacMismatch)
        ));
    }

    #[test]
    fn reject_flipped_signature_bit() {
        let config = test_config();
        let token = generate_share_token(&config, plan_id());
        let (head, sig) = token.rsplit_once('_').unwrap();
        let mut bytes = hex::decode(sig).unwrap();
        bytes[31] ^= 0x01;
        let tampered = format!("{head}_{}", hex::encode(bytes));
        assert!(matches!(
            validate_share_token(&config, &tampered),
            Err(ShareError::HmacMismatch)
        ));
    }

    #[test]
    fn reject_malformed_tokens() {
        let config = test_config();
        for bad in ["", "wrong_prefix", "mm_share_short"] {
            assert!(
                matches!(validate_share_token(&config, bad), Err(ShareError::InvalidFormat(_))),
                "{bad:?} should be rejected as malformed"
            );
        }
        assert!(matches!(
            validate_share_token(&config, "mm_share_not-a-valid-uuid-at-all-noooooo_abcd"),
            Err(ShareError::InvalidPlanId(_))
        ));
        let id = plan_id();
        assert!(matches!(
            validate_share_token(&config, &format!("mm_share_{id}_zz-not-hex")),
            Err(ShareError::InvalidFormat(_))
        ));
        assert!(matches!(
            validate_share_token(&config, &format!("mm_share_{id}abc")),
            Err(ShareError::InvalidFormat(_))
        ));
    }

    #[test]
    fn from_hex_rejects_bad_secrets() {
        assert!(ShareConfig::from_hex("abcd", DEFAULT_APP_URL).is_ok());
        assert!(matches!(
            ShareConfig::from_hex("xyz", DEFAULT_APP_URL),
            Err(ShareError::InvalidSecret(_))
        ));
        assert!(matches!(
            ShareConfig::from_hex("", DEFAULT_APP_URL),
            Err(ShareError::InvalidSecret(_))
        ));
    }
}
