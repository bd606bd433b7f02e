//! Trust score weighting configuration.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::config::parse_env;

/// Points awarded per trust factor.
///
/// The defaults are product heuristics; every value can be overridden
/// with a `TRUST_*` environment variable (see [`TrustWeights::from_env`]).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct TrustWeights {
    /// Points every campaign starts with.
    pub baseline: u32,
    /// Points for a verified creator.
    pub verified: u32,
    /// Points for a campaign at least a week old.
    pub age_week_points: u32,
    /// Points for a campaign at least a month old.
    pub age_month_points: u32,
    /// Points for a campaign at least a quarter old.
    pub age_quarter_points: u32,
    /// Story length (characters) for the first description tier.
    pub description_short_chars: usize,
    /// Story length for the second description tier.
    pub description_medium_chars: usize,
    /// Story length for the third description tier.
    pub description_long_chars: usize,
    /// Points for the first description tier.
    pub description_short_points: u32,
    /// Points for the second description tier.
    pub description_medium_points: u32,
    /// Points for the third description tier.
    pub description_long_points: u32,
    /// Bonus for well-formed prose.
    pub well_formed_bonus: u32,
    /// Points per media item.
    pub media_per_item: u32,
    /// Media items counted at most.
    pub media_max_items: usize,
    /// Points per recent update.
    pub update_per_recent: u32,
    /// Recent updates counted at most.
    pub update_max_recent: usize,
    /// Window, in days, in which an update counts as recent.
    pub update_window_days: i64,
    /// Points for having any donation.
    pub donation_presence: u32,
    /// Points per donation.
    pub donation_per_item: u32,
    /// Donations counted at most.
    pub donation_max_items: usize,
}

impl Default for TrustWeights {
    fn default() -> Self {
        Self {
            baseline: 20,
            verified: 15,
            age_week_points: 4,
            age_month_points: 7,
            age_quarter_points: 10,
            description_short_chars: 50,
            description_medium_chars: 200,
            description_long_chars: 500,
            description_short_points: 5,
            description_medium_points: 10,
            description_long_points: 15,
            well_formed_bonus: 5,
            media_per_item: 3,
            media_max_items: 5,
            update_per_recent: 5,
            update_max_recent: 3,
            update_window_days: 30,
            donation_presence: 5,
            donation_per_item: 1,
            donation_max_items: 10,
        }
    }
}

impl TrustWeights {
    /// Loads weights from `TRUST_*` environment variables, falling back
    /// to [`TrustWeights::default`] for anything missing or unparsable.
    #[must_use]
    pub fn from_env() -> Self {
        let d = Self::default();
        Self {
            baseline: parse_env("TRUST_BASELINE", d.baseline),
            verified: parse_env("TRUST_VERIFIED", d.verified),
            age_week_points: parse_env("TRUST_AGE_WEEK_POINTS", d.age_week_points),
            age_month_points: parse_env("TRUST_AGE_MONTH_POINTS", d.age_month_points),
            age_quarter_points: parse_env("TRUST_AGE_QUARTER_POINTS", d.age_quarter_points),
            description_short_chars: parse_env(
                "TRUST_DESCRIPTION_SHORT_CHARS",
                d.description_short_chars,
            ),
            description_medium_chars: parse_env(
                "TRUST_DESCRIPTION_MEDIUM_CHARS",
                d.description_medium_chars,
            ),
            description_long_chars: parse_env(
                "TRUST_DESCRIPTION_LONG_CHARS",
                d.description_long_chars,
            ),
            description_short_points: parse_env(
                "TRUST_DESCRIPTION_SHORT_POINTS",
                d.description_short_points,
            ),
            description_medium_points: parse_env(
                "TRUST_DESCRIPTION_MEDIUM_POINTS",
                d.description_medium_points,
            ),
            description_long_points: parse_env(
                "TRUST_DESCRIPTION_LONG_POINTS",
                d.description_long_points,
            ),
            well_formed_bonus: parse_env("TRUST_WELL_FORMED_BONUS", d.well_formed_bonus),
            media_per_item: parse_env("TRUST_MEDIA_PER_ITEM", d.media_per_item),
            media_max_items: parse_env("TRUST_MEDIA_MAX_ITEMS", d.media_max_items),
            update_per_recent: parse_env("TRUST_UPDATE_PER_RECENT", d.update_per_recent),
            update_max_recent: parse_env("TRUST_UPDATE_MAX_RECENT", d.update_max_recent),
            update_window_days: parse_env("TRUST_UPDATE_WINDOW_DAYS", d.update_window_days),
            donation_presence: parse_env("TRUST_DONATION_PRESENCE", d.donation_presence),
            donation_per_item: parse_env("TRUST_DONATION_PER_ITEM", d.donation_per_item),
            donation_max_items: parse_env("TRUST_DONATION_MAX_ITEMS", d.donation_max_items),
        }
    }
}
