//! User-facing status and upgrade texts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Plan;

pub const PRO_MONTHLY_PRICE: &str = "$4.9";

pub const SEPARATOR: &str = "━━━━━━━━━━━━━━━━━━━━━━━━━━━";

/// Where users buy and manage subscriptions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LicenseLinks {
    pub purchase_url: String,
    pub manage_url: String,
}

impl Default for LicenseLinks {
    fn default() -> Self {
        Self {
            purchase_url: "https://8566730725923.gumroad.com/l/bkkfx".to_string(),
            manage_url: "https://app.gumroad.com/library".to_string(),
        }
    }
}

fn date(at: DateTime<Utc>) -> String {
    at.format("%Y-%m-%d").to_string()
}

pub fn free_plan(links: &LicenseLinks) -> String {
    let free = Plan::Free.features();
    let limit = free.max_per_day.unwrap_or_default();
    format!(
        "📦 FREE Plan\n\n\
         Limitations:\n\
         • {limit} screenshots/day\n\
         • Watermark on all images\n\
         • Limited presets (purple, dark)\n\
         • iPhone 15 Pro Max only\n\
         • No batch generation\n\
         • No custom colors\n\n\
         {SEPARATOR}\n\n\
         🚀 Upgrade to PRO - {PRO_MONTHLY_PRICE}/month\n\n\
         ✓ Unlimited screenshots\n\
         ✓ No watermark\n\
         ✓ All 7 color presets\n\
         ✓ All device mockups\n\
         ✓ Batch generation\n\
         ✓ Custom gradient colors\n\n\
         👉 Subscribe: {}",
        links.purchase_url
    )
}

pub fn expired(links: &LicenseLinks, expires_at: DateTime<Utc>) -> String {
    format!(
        "⚠️ Subscription Expired\n\n\
         Your Pro subscription expired on {}\n\n\
         🔄 Renew now: {}\n\
         💰 Only {PRO_MONTHLY_PRICE}/month\n\n\
         You're now on the Free plan with limitations.",
        date(expires_at),
        links.purchase_url
    )
}

pub fn cancelled(links: &LicenseLinks) -> String {
    format!(
        "⚠️ Subscription Cancelled\n\n\
         Your subscription is no longer active.\n\n\
         🔄 Resubscribe: {}",
        links.purchase_url
    )
}

pub fn active(
    links: &LicenseLinks,
    masked_key: &str,
    expires_at: DateTime<Utc>,
    days_remaining: i64,
) -> String {
    let mut message = format!(
        "✅ PRO Subscription Active\n\n\
         🔑 Key: {masked_key}\n\
         📅 Expires: {}\n\
         ⏳ Days remaining: {days_remaining}\n\n\
         📊 Manage subscription: {}",
        date(expires_at),
        links.manage_url
    );
    if days_remaining <= 7 {
        message.push_str(&format!(
            "\n\n⚠️ Expiring in {days_remaining} days!\n🔄 Renew: {}",
            links.manage_url
        ));
    }
    message
}

pub fn activated(expires_at: DateTime<Utc>, days_remaining: i64) -> String {
    format!(
        "✅ Subscription Activated!\n\n\
         🎉 Plan: PRO ({PRO_MONTHLY_PRICE}/month)\n\
         📅 Expires: {}\n\
         ⏳ Days remaining: {days_remaining}\n\n\
         Features unlocked:\n\
         • Unlimited screenshots\n\
         • No watermark\n\
         • All devices & presets\n\
         • Batch generation\n\
         • Custom colors",
        date(expires_at)
    )
}

pub fn deactivated(links: &LicenseLinks) -> String {
    format!(
        "✅ Subscription deactivated\n\n\
         You're now on the Free plan.\n\n\
         🚀 Resubscribe anytime: {}",
        links.purchase_url
    )
}

pub fn invalid_key(links: &LicenseLinks) -> String {
    format!(
        "Invalid license key\n\n\
         Please check your key and try again.\n\n\
         📦 Subscribe at: {}\n\
         💰 Only {PRO_MONTHLY_PRICE}/month",
        links.purchase_url
    )
}

pub fn unlimited_usage() -> String {
    "✅ Unlimited usage (Pro)".to_string()
}

pub fn usage_summary(used: u32, limit: u32) -> String {
    let remaining = limit.saturating_sub(used);
    format!("📊 Usage: {used}/{limit} today ({remaining} remaining)")
}

pub fn quota_exceeded(links: &LicenseLinks, used: u32, limit: u32) -> String {
    format!(
        "⚠️ Daily limit reached ({used}/{limit})\n\n\
         🚀 Upgrade to Pro for unlimited:\n{}\n\n\
         💰 Only {PRO_MONTHLY_PRICE}/month",
        links.purchase_url
    )
}

/// Footer appended to catalog listings on the free plan.
pub fn unlock_footer(links: &LicenseLinks, what: &str) -> String {
    format!(
        "\n{SEPARATOR}\n\n🚀 Unlock all {what} with Pro ({PRO_MONTHLY_PRICE}/mo)\n👉 {}",
        links.purchase_url
    )
}

pub fn watermark_note(links: &LicenseLinks) -> String {
    format!(
        "\n\n⚠️ Watermark added (Free plan)\n🚀 Upgrade to Pro ({PRO_MONTHLY_PRICE}/mo) to remove: {}",
        links.purchase_url
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_active_warns_when_expiring_soon() {
        let links = LicenseLinks::default();
        let at = Utc.with_ymd_and_hms(2026, 5, 1, 0, 0, 0).unwrap();
        let soon = active(&links, "ABCD-****-****-5678", at, 3);
        assert!(soon.contains("Expiring in 3 days"));
        assert!(soon.contains("2026-05-01"));

        let later = active(&links, "ABCD-****-****-5678", at, 20);
        assert!(!later.contains("Expiring"));
    }

    #[test]
    fn test_usage_summary_counts_remaining() {
        assert_eq!(usage_summary(1, 3), "📊 Usage: 1/3 today (2 remaining)");
    }

    #[test]
    fn test_links_show_up_in_upgrade_texts() {
        let links = LicenseLinks {
            purchase_url: "https://example.test/buy".to_string(),
            manage_url: "https://example.test/manage".to_string(),
        };
        assert!(free_plan(&links).contains("https://example.test/buy"));
        assert!(quota_exceeded(&links, 3, 3).contains("(3/3)"));
        assert!(unlock_footer(&links, "presets").contains("Unlock all presets"));
    }
}
