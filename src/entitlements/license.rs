//! License key shape checks and the verification seam.
//!
//! Keys look like `XXXX-XXXX-XXXX-XXXX`: four groups of four ASCII
//! alphanumerics joined by hyphens. Matching is case-insensitive and keys are
//! stored upper-cased.

use std::sync::LazyLock;

use chrono::{DateTime, Months, Utc};
use rand::Rng;
use regex::Regex;

use super::SubscriptionStatus;

static KEY_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Z0-9]{4}-[A-Z0-9]{4}-[A-Z0-9]{4}-[A-Z0-9]{4}$")
        .expect("license key pattern is a valid regex")
});

const KEY_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Trim and upper-case `key`, returning it only if it has the license shape.
pub fn normalize_key(key: &str) -> Option<String> {
    let normalized = key.trim().to_ascii_uppercase();
    KEY_PATTERN.is_match(&normalized).then_some(normalized)
}

/// Check whether `key` has the `XXXX-XXXX-XXXX-XXXX` shape.
pub fn is_well_formed(key: &str) -> bool {
    normalize_key(key).is_some()
}

/// Generate a random, well-formed key. Only useful for local testing.
pub fn generate_demo_key() -> String {
    let mut rng = rand::thread_rng();
    let groups: Vec<String> = (0..4)
        .map(|_| {
            (0..4)
                .map(|_| KEY_ALPHABET[rng.gen_range(0..KEY_ALPHABET.len())] as char)
                .collect()
        })
        .collect();
    groups.join("-")
}

/// Outcome of checking a key against a license backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verification {
    Valid {
        expires_at: DateTime<Utc>,
        status: SubscriptionStatus,
    },
    Rejected {
        reason: String,
    },
}

/// Backend that decides whether a normalized key grants a subscription.
pub trait LicenseVerifier: Send + Sync {
    fn verify(&self, key: &str) -> Verification;
}

/// Placeholder verifier that accepts every well-formed key for one month.
///
/// There is no license server behind this. Any key with the right shape turns
/// into an active Pro subscription, so a real backend must replace it before
/// the gate means anything.
#[derive(Debug, Default, Clone, Copy)]
pub struct OfflineVerifier;

impl LicenseVerifier for OfflineVerifier {
    fn verify(&self, key: &str) -> Verification {
        if !is_well_formed(key) {
            return Verification::Rejected {
                reason: "malformed license key".to_string(),
            };
        }

        tracing::warn!("License key accepted without remote verification (offline verifier)");

        let now = Utc::now();
        let expires_at = now
            .checked_add_months(Months::new(1))
            .unwrap_or(now + chrono::Duration::days(30));

        Verification::Valid {
            expires_at,
            status: SubscriptionStatus::Active,
        }
    }
}
