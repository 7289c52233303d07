//! JSON-file backed entitlement store.
//!
//! Two files live in the data directory:
//!
//! - `subscription.json`: the [`SubscriptionRecord`], absent on the free plan
//! - `usage.json`: the [`UsageCounter`] for the current UTC day
//!
//! Reads never fail. A missing, unreadable or corrupt file is treated as "no
//! subscription" or "nothing used today" so callers always get a usable
//! entitlement view. Writes do report I/O errors.

use std::path::{Path, PathBuf};

use chrono::{NaiveDate, Utc};
use serde::{de::DeserializeOwned, Serialize};

use super::license::{normalize_key, LicenseVerifier, OfflineVerifier, Verification};
use super::messages::{self, LicenseLinks};
use super::{
    Plan, PlanFeatures, ReportedStatus, SubscriptionRecord, SubscriptionReport, SubscriptionStatus,
    UsageCheck, UsageCounter,
};

pub const SUBSCRIPTION_FILE: &str = "subscription.json";
pub const USAGE_FILE: &str = "usage.json";

#[derive(Debug, thiserror::Error)]
pub enum EntitlementError {
    #[error("{message}")]
    InvalidKeyFormat { message: String },

    #[error("License key rejected: {0}")]
    Rejected(String),

    #[error("Storage error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Entitlement state of one local installation.
pub struct EntitlementStore {
    data_dir: PathBuf,
    verifier: Box<dyn LicenseVerifier>,
    links: LicenseLinks,
}

impl std::fmt::Debug for EntitlementStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntitlementStore")
            .field("data_dir", &self.data_dir)
            .field("links", &self.links)
            .finish_non_exhaustive()
    }
}

impl EntitlementStore {
    /// Open the store in `data_dir`, creating the directory if needed.
    ///
    /// Keys are checked with [`OfflineVerifier`] until another verifier is
    /// installed with [`EntitlementStore::with_verifier`].
    pub fn open(data_dir: impl Into<PathBuf>) -> Result<Self, EntitlementError> {
        let data_dir = data_dir.into();
        std::fs::create_dir_all(&data_dir)?;
        tracing::debug!("Entitlement store at {:?}", data_dir);

        Ok(Self {
            data_dir,
            verifier: Box::new(OfflineVerifier),
            links: LicenseLinks::default(),
        })
    }

    pub fn with_verifier(mut self, verifier: impl LicenseVerifier + 'static) -> Self {
        self.verifier = Box::new(verifier);
        self
    }

    pub fn with_links(mut self, links: LicenseLinks) -> Self {
        self.links = links;
        self
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn links(&self) -> &LicenseLinks {
        &self.links
    }

    pub fn subscription_path(&self) -> PathBuf {
        self.data_dir.join(SUBSCRIPTION_FILE)
    }

    pub fn usage_path(&self) -> PathBuf {
        self.data_dir.join(USAGE_FILE)
    }

    // =========================================================================
    // Persistence
    // =========================================================================

    fn read_json<T: DeserializeOwned>(path: &Path) -> Option<T> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                tracing::warn!("Failed to read {:?}: {}", path, e);
                return None;
            }
        };

        match serde_json::from_str(&content) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!("Ignoring corrupt {:?}: {}", path, e);
                None
            }
        }
    }

    fn write_json<T: Serialize>(&self, path: &Path, value: &T) -> Result<(), EntitlementError> {
        std::fs::create_dir_all(&self.data_dir)?;
        let content = serde_json::to_string_pretty(value)?;
        std::fs::write(path, content)?;
        tracing::debug!("Saved {:?}", path);
        Ok(())
    }

    pub fn load_subscription(&self) -> Option<SubscriptionRecord> {
        Self::read_json(&self.subscription_path())
    }

    fn save_subscription(&self, record: &SubscriptionRecord) -> Result<(), EntitlementError> {
        self.write_json(&self.subscription_path(), record)
    }

    fn usage_today(&self, today: NaiveDate) -> UsageCounter {
        match Self::read_json::<UsageCounter>(&self.usage_path()) {
            Some(counter) if counter.date == today => counter,
            _ => UsageCounter::new(today),
        }
    }

    // =========================================================================
    // Plan resolution
    // =========================================================================

    pub fn plan(&self) -> Plan {
        let now = Utc::now();
        self.load_subscription()
            .map(|record| record.effective_plan(now))
            .unwrap_or(Plan::Free)
    }

    pub fn features(&self) -> PlanFeatures {
        self.plan().features()
    }

    pub fn status(&self) -> SubscriptionReport {
        let now = Utc::now();
        let Some(record) = self.load_subscription() else {
            return SubscriptionReport {
                plan: Plan::Free,
                status: ReportedStatus::None,
                expires_at: None,
                days_remaining: None,
                message: messages::free_plan(&self.links),
            };
        };

        if record.is_expired_at(now) || record.status == SubscriptionStatus::Expired {
            return SubscriptionReport {
                plan: Plan::Free,
                status: ReportedStatus::Expired,
                expires_at: Some(record.expires_at),
                days_remaining: Some(0),
                message: messages::expired(&self.links, record.expires_at),
            };
        }

        if record.status == SubscriptionStatus::Cancelled {
            return SubscriptionReport {
                plan: Plan::Free,
                status: ReportedStatus::Cancelled,
                expires_at: Some(record.expires_at),
                days_remaining: Some(0),
                message: messages::cancelled(&self.links),
            };
        }

        if record.effective_plan(now) == Plan::Free {
            // Active but not a Pro record: nothing beyond the free plan.
            return SubscriptionReport {
                plan: Plan::Free,
                status: ReportedStatus::Active,
                expires_at: Some(record.expires_at),
                days_remaining: Some(record.days_remaining(now)),
                message: messages::free_plan(&self.links),
            };
        }

        let days_remaining = record.days_remaining(now);
        SubscriptionReport {
            plan: Plan::Pro,
            status: ReportedStatus::Active,
            expires_at: Some(record.expires_at),
            days_remaining: Some(days_remaining),
            message: messages::active(
                &self.links,
                &record.masked_key(),
                record.expires_at,
                days_remaining,
            ),
        }
    }

    // =========================================================================
    // Subscription lifecycle
    // =========================================================================

    pub fn activate(
        &self,
        key: &str,
        email: Option<String>,
    ) -> Result<SubscriptionReport, EntitlementError> {
        let Some(key) = normalize_key(key) else {
            return Err(EntitlementError::InvalidKeyFormat {
                message: messages::invalid_key(&self.links),
            });
        };

        let (expires_at, status) = match self.verifier.verify(&key) {
            Verification::Valid { expires_at, status } => (expires_at, status),
            Verification::Rejected { reason } => return Err(EntitlementError::Rejected(reason)),
        };

        let now = Utc::now();
        let record = SubscriptionRecord {
            key,
            email,
            activated_at: now,
            expires_at,
            plan: Plan::Pro,
            status,
        };
        self.save_subscription(&record)?;
        tracing::info!("Subscription activated, expires {}", expires_at);

        let days_remaining = record.days_remaining(now);
        Ok(SubscriptionReport {
            plan: record.effective_plan(now),
            status: ReportedStatus::Active,
            expires_at: Some(expires_at),
            days_remaining: Some(days_remaining),
            message: messages::activated(expires_at, days_remaining),
        })
    }

    /// Remove the stored subscription. Removing nothing is not an error.
    pub fn deactivate(&self) -> Result<(), EntitlementError> {
        match std::fs::remove_file(self.subscription_path()) {
            Ok(()) => {
                tracing::info!("Subscription deactivated");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Re-verify the stored key and persist what the verifier says.
    pub fn refresh(&self) -> Result<SubscriptionReport, EntitlementError> {
        let Some(mut record) = self.load_subscription() else {
            return Ok(self.status());
        };

        let verification = match normalize_key(&record.key) {
            Some(key) => self.verifier.verify(&key),
            None => Verification::Rejected {
                reason: "stored key is malformed".to_string(),
            },
        };

        match verification {
            Verification::Valid { expires_at, status } => {
                record.expires_at = expires_at;
                record.status = status;
                self.save_subscription(&record)?;
                tracing::info!("Subscription refreshed, expires {}", expires_at);
                Ok(self.status())
            }
            Verification::Rejected { reason } => {
                tracing::warn!("Subscription refresh rejected: {}", reason);
                record.status = SubscriptionStatus::Cancelled;
                self.save_subscription(&record)?;
                Ok(SubscriptionReport {
                    plan: Plan::Free,
                    status: ReportedStatus::Cancelled,
                    expires_at: Some(record.expires_at),
                    days_remaining: Some(0),
                    message: messages::cancelled(&self.links),
                })
            }
        }
    }

    // =========================================================================
    // Usage quota
    // =========================================================================

    pub fn check_usage(&self) -> UsageCheck {
        let Some(limit) = self.features().max_per_day else {
            return UsageCheck {
                allowed: true,
                used: 0,
                limit: None,
                message: messages::unlimited_usage(),
            };
        };

        let used = self.usage_today(Utc::now().date_naive()).count;
        if used >= limit {
            return UsageCheck {
                allowed: false,
                used,
                limit: Some(limit),
                message: messages::quota_exceeded(&self.links, used, limit),
            };
        }

        UsageCheck {
            allowed: true,
            used,
            limit: Some(limit),
            message: messages::usage_summary(used, limit),
        }
    }

    /// Count one successful generation against today's quota.
    pub fn increment_usage(&self) -> Result<(), EntitlementError> {
        if self.features().max_per_day.is_none() {
            return Ok(());
        }

        let mut counter = self.usage_today(Utc::now().date_naive());
        counter.count = counter.count.saturating_add(1);
        self.write_json(&self.usage_path(), &counter)
    }

    // =========================================================================
    // Feature projections
    // =========================================================================

    pub fn available_devices(&self) -> Vec<&'static str> {
        let allowed = self.features().allowed_devices;
        crate::catalog::DEVICES
            .iter()
            .map(|d| d.id)
            .filter(|id| allowed.contains(id))
            .collect()
    }

    pub fn available_presets(&self) -> Vec<&'static str> {
        let allowed = self.features().allowed_presets;
        crate::catalog::PRESETS
            .iter()
            .map(|p| p.id)
            .filter(|id| allowed.contains(id))
            .collect()
    }

    pub fn watermark_required(&self) -> bool {
        self.features().watermark_required
    }

    pub fn custom_colors_allowed(&self) -> bool {
        self.features().custom_colors_allowed
    }

    pub fn batch_allowed(&self) -> bool {
        self.features().batch_allowed
    }
}
