//! Pure trust score computation.
//!
//! The score is the sum of independent factor contributions clamped to
//! `[0, 100]`. Nothing here touches storage: callers gather a
//! [`TrustInputs`] snapshot and pass the evaluation time explicitly so
//! the same snapshot always produces the same score.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use super::TrustWeights;
use crate::domain::{Campaign, CampaignUpdate, Donation};

/// Highest possible trust score.
pub const MAX_SCORE: u8 = 100;

/// Everything the calculator looks at.
#[derive(Debug, Clone, Copy)]
pub struct TrustInputs<'a> {
    /// The campaign being scored.
    pub campaign: &'a Campaign,
    /// All donations recorded for the campaign.
    pub donations: &'a [Donation],
    /// All updates posted for the campaign.
    pub updates: &'a [CampaignUpdate],
}

/// Contribution of each factor, before clamping.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct TrustBreakdown {
    /// Starting points.
    pub baseline: u32,
    /// Creator verification.
    pub verification: u32,
    /// Campaign age.
    pub age: u32,
    /// Story length and form.
    pub description: u32,
    /// Attached media.
    pub media: u32,
    /// Recent update cadence.
    pub updates: u32,
    /// Donation history.
    pub donations: u32,
}

impl TrustBreakdown {
    /// Sum of all factors, unclamped. Saturates at `u32::MAX`.
    #[must_use]
    pub const fn total(&self) -> u32 {
        self.baseline
            .saturating_add(self.verification)
            .saturating_add(self.age)
            .saturating_add(self.description)
            .saturating_add(self.media)
            .saturating_add(self.updates)
            .saturating_add(self.donations)
    }
}

/// A computed score with its breakdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct TrustScore {
    /// Final score, 0–100.
    pub score: u8,
    /// Per-factor contributions.
    pub breakdown: TrustBreakdown,
}

/// Computes the trust score of `inputs` as of `now`.
#[must_use]
pub fn compute(inputs: &TrustInputs<'_>, weights: &TrustWeights, now: DateTime<Utc>) -> TrustScore {
    let campaign = inputs.campaign;
    let breakdown = TrustBreakdown {
        baseline: weights.baseline,
        verification: if campaign.creator_verified {
            weights.verified
        } else {
            0
        },
        age: age_points(campaign.created_at, now, weights),
        description: description_points(&campaign.story_markdown, weights),
        media: count_points(
            campaign.media.len(),
            weights.media_max_items,
            weights.media_per_item,
        ),
        updates: update_points(inputs.updates, now, weights),
        donations: donation_points(inputs.donations, weights),
    };

    let clamped = breakdown.total().min(u32::from(MAX_SCORE));
    TrustScore {
        score: u8::try_from(clamped).unwrap_or(MAX_SCORE),
        breakdown,
    }
}

fn age_points(created_at: Option<DateTime<Utc>>, now: DateTime<Utc>, w: &TrustWeights) -> u32 {
    // Missing creation time is treated as brand new.
    let Some(created_at) = created_at else {
        return 0;
    };
    let days = (now - created_at).num_days();
    match days {
        d if d < 7 => 0,
        d if d < 30 => w.age_week_points,
        d if d < 90 => w.age_month_points,
        _ => w.age_quarter_points,
    }
}

fn description_points(story: &str, w: &TrustWeights) -> u32 {
    let story = story.trim();
    let len = story.chars().count();
    let length_points = if len >= w.description_long_chars {
        w.description_long_points
    } else if len >= w.description_medium_chars {
        w.description_medium_points
    } else if len >= w.description_short_chars {
        w.description_short_points
    } else {
        0
    };
    let bonus = if is_well_formed(story) {
        w.well_formed_bonus
    } else {
        0
    };
    length_points.saturating_add(bonus)
}

/// Heuristic for prose that reads like sentences rather than a plea
/// typed in a hurry: capitalised start, terminal punctuation, sensible
/// sentence length, and no shouting.
fn is_well_formed(text: &str) -> bool {
    let Some(first) = text.chars().find(|c| c.is_alphabetic()) else {
        return false;
    };
    if !first.is_uppercase() {
        return false;
    }
    if !text.ends_with(['.', '!', '?']) {
        return false;
    }

    let sentences = text
        .split(['.', '!', '?'])
        .filter(|s| !s.trim().is_empty())
        .count();
    let words = text.split_whitespace().count();
    if sentences == 0 {
        return false;
    }
    let avg = words / sentences;
    if !(4..=40).contains(&avg) {
        return false;
    }

    let letters = text.chars().filter(|c| c.is_alphabetic()).count();
    let upper = text.chars().filter(|c| c.is_uppercase()).count();
    upper * 2 < letters
}

fn count_points(count: usize, max_items: usize, per_item: u32) -> u32 {
    u32::try_from(count.min(max_items))
        .unwrap_or(u32::MAX)
        .saturating_mul(per_item)
}

fn update_points(updates: &[CampaignUpdate], now: DateTime<Utc>, w: &TrustWeights) -> u32 {
    // A window too large to represent reaches back to the beginning of time.
    let cutoff = Duration::try_days(w.update_window_days)
        .and_then(|window| now.checked_sub_signed(window))
        .unwrap_or(DateTime::<Utc>::MIN_UTC);
    let recent = updates.iter().filter(|u| u.created_at >= cutoff).count();
    count_points(recent, w.update_max_recent, w.update_per_recent)
}

fn donation_points(donations: &[Donation], w: &TrustWeights) -> u32 {
    let counted = donations.iter().filter(|d| d.counts_for_history()).count();
    if counted == 0 {
        return 0;
    }
    w.donation_presence
        .saturating_add(count_points(counted, w.donation_max_items, w.donation_per_item))
}
