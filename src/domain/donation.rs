//! Donation records and their payment status.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{CampaignId, UserId};

/// Payment status of a donation, driven by the payment webhook.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    /// Intent created, payment not yet confirmed.
    Pending,
    /// Payment captured.
    Succeeded,
    /// Payment failed or was abandoned.
    Failed,
}

impl PaymentStatus {
    /// Returns `true` once the status can no longer change.
    #[must_use]
    pub const fn is_final(self) -> bool {
        !matches!(self, Self::Pending)
    }

    /// Storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "succeeded" => Ok(Self::Succeeded),
            "failed" => Ok(Self::Failed),
            other => Err(format!("unknown payment status: {other}")),
        }
    }
}

/// A monetary contribution to a campaign.
///
/// Immutable once created except for `payment_status` and donor
/// anonymization. Donations are never deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Donation {
    /// Donation identifier, also used as the payment idempotency key.
    pub id: uuid::Uuid,
    /// Campaign receiving the donation.
    pub campaign_id: CampaignId,
    /// Donor account, if the donor was signed in.
    pub donor_id: Option<UserId>,
    /// Donor display name, if given.
    pub donor_name: Option<String>,
    /// Donor e-mail for receipts, if given.
    pub donor_email: Option<String>,
    /// Amount in minor currency units.
    pub amount: i64,
    /// ISO 4217 currency code, lower-case.
    pub currency: String,
    /// Payment processor intent identifier.
    pub payment_intent_id: String,
    /// Current payment status.
    pub payment_status: PaymentStatus,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

impl Donation {
    /// Returns `true` if the donation counts towards the campaign's history.
    #[must_use]
    pub const fn counts_for_history(&self) -> bool {
        !matches!(self.payment_status, PaymentStatus::Failed)
    }

    /// Strips every field identifying the donor.
    pub fn anonymize(&mut self) {
        self.donor_id = None;
        self.donor_name = None;
        self.donor_email = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn donation() -> Donation {
        Donation {
            id: uuid::Uuid::new_v4(),
            campaign_id: CampaignId::new(),
            donor_id: Some(UserId::new()),
            donor_name: Some("Ada".to_string()),
            donor_email: Some("ada@example.org".to_string()),
            amount: 2_500,
            currency: "usd".to_string(),
            payment_intent_id: "pi_123".to_string(),
            payment_status: PaymentStatus::Pending,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn anonymize_clears_donor_fields_only() {
        let mut d = donation();
        d.anonymize();
        assert!(d.donor_id.is_none());
        assert!(d.donor_name.is_none());
        assert!(d.donor_email.is_none());
        assert_eq!(d.amount, 2_500);
        assert_eq!(d.payment_intent_id, "pi_123");
    }

    #[test]
    fn failed_donations_do_not_count() {
        let mut d = donation();
        assert!(d.counts_for_history());
        d.payment_status = PaymentStatus::Failed;
        assert!(!d.counts_for_history());
    }

    #[test]
    fn only_pending_is_open() {
        assert!(!PaymentStatus::Pending.is_final());
        assert!(PaymentStatus::Succeeded.is_final());
        assert!(PaymentStatus::Failed.is_final());
        assert_eq!("failed".parse::<PaymentStatus>(), Ok(PaymentStatus::Failed));
    }
}
