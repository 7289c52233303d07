//! Subscription records, plan features and the on-disk entitlement store.
//!
//! A plan is resolved from the stored subscription every time it is needed:
//! only an `active` Pro record whose expiry lies in the future counts as Pro,
//! everything else (no record, expired, cancelled) is the free plan.

pub mod license;
pub mod messages;
pub mod store;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

pub use license::{LicenseVerifier, OfflineVerifier, Verification};
pub use messages::LicenseLinks;
pub use store::{EntitlementError, EntitlementStore};

const MILLIS_PER_DAY: i64 = 24 * 60 * 60 * 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Plan {
    Free,
    Pro,
}

impl Plan {
    pub fn features(self) -> PlanFeatures {
        match self {
            Plan::Free => PlanFeatures {
                plan: self,
                max_per_day: Some(3),
                allowed_devices: Allowed::Only(&["iphone-15-pro-max"]),
                allowed_presets: Allowed::Only(&["purple", "dark"]),
                batch_allowed: false,
                custom_colors_allowed: false,
                watermark_required: true,
            },
            Plan::Pro => PlanFeatures {
                plan: self,
                max_per_day: None,
                allowed_devices: Allowed::All,
                allowed_presets: Allowed::All,
                batch_allowed: true,
                custom_colors_allowed: true,
                watermark_required: false,
            },
        }
    }
}

impl std::fmt::Display for Plan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Plan::Free => write!(f, "FREE"),
            Plan::Pro => write!(f, "PRO"),
        }
    }
}

/// Status stored on a subscription record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionStatus {
    Active,
    Expired,
    Cancelled,
}

/// Status reported to callers. `None` means no record is stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportedStatus {
    None,
    Active,
    Expired,
    Cancelled,
}

/// Which catalog entries a plan may use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Allowed {
    All,
    Only(&'static [&'static str]),
}

impl Allowed {
    pub fn contains(&self, id: &str) -> bool {
        match self {
            Allowed::All => true,
            Allowed::Only(ids) => ids.iter().any(|allowed| *allowed == id),
        }
    }
}

/// Limits and switches derived from a [`Plan`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlanFeatures {
    pub plan: Plan,
    /// Daily generation quota. `None` is unbounded.
    pub max_per_day: Option<u32>,
    pub allowed_devices: Allowed,
    pub allowed_presets: Allowed,
    pub batch_allowed: bool,
    pub custom_colors_allowed: bool,
    pub watermark_required: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionRecord {
    pub key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub activated_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub plan: Plan,
    pub status: SubscriptionStatus,
}

impl SubscriptionRecord {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// The plan this record actually grants at `now`.
    pub fn effective_plan(&self, now: DateTime<Utc>) -> Plan {
        let usable = self.plan == Plan::Pro
            && self.status == SubscriptionStatus::Active
            && !self.is_expired_at(now);
        if usable {
            Plan::Pro
        } else {
            Plan::Free
        }
    }

    /// Whole days until expiry, rounded up and never negative.
    pub fn days_remaining(&self, now: DateTime<Utc>) -> i64 {
        let millis = (self.expires_at - now).num_milliseconds();
        if millis <= 0 {
            return 0;
        }
        (millis + MILLIS_PER_DAY - 1) / MILLIS_PER_DAY
    }

    /// `ABCD-****-****-WXYZ`
    pub fn masked_key(&self) -> String {
        let chars: Vec<char> = self.key.chars().collect();
        if chars.len() < 19 {
            return "****-****-****-****".to_string();
        }
        let head: String = chars[..4].iter().collect();
        let tail: String = chars[15..].iter().collect();
        format!("{head}-****-****-{tail}")
    }
}

/// Generations counted for one UTC calendar day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageCounter {
    pub date: NaiveDate,
    pub count: u32,
}

impl UsageCounter {
    pub fn new(date: NaiveDate) -> Self {
        Self { date, count: 0 }
    }

    /// Count for `today`; a counter from another day reads as zero.
    pub fn count_on(&self, today: NaiveDate) -> u32 {
        if self.date == today {
            self.count
        } else {
            0
        }
    }
}

/// Result of [`EntitlementStore::status`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionReport {
    pub plan: Plan,
    pub status: ReportedStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub days_remaining: Option<i64>,
    pub message: String,
}

/// Result of [`EntitlementStore::check_usage`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageCheck {
    pub allowed: bool,
    pub used: u32,
    /// `None` for unbounded plans.
    pub limit: Option<u32>,
    pub message: String,
}
