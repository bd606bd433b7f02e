//! Automated moderation decision rule.

use crate::content::ContentCheck;
use crate::domain::ModerationDecision;

/// Thresholds for automated screening.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModerationPolicy {
    /// Scores strictly below this are rejected outright.
    pub reject_below: u8,
    /// Commit Approved and Rejected outcomes instead of only recording them.
    pub auto_apply: bool,
}

impl Default for ModerationPolicy {
    fn default() -> Self {
        Self {
            reject_below: 30,
            auto_apply: false,
        }
    }
}

impl ModerationPolicy {
    /// Decides the outcome of screening.
    ///
    /// A low score wins over content flags; any negative content sends the
    /// campaign to a human; otherwise it is approved.
    #[must_use]
    pub fn decide(&self, score: u8, content: &ContentCheck) -> ModerationDecision {
        if score < self.reject_below {
            ModerationDecision::Rejected
        } else if !content.passed {
            ModerationDecision::Review
        } else {
            ModerationDecision::Approved
        }
    }

    /// Returns `true` if `decision` should be committed automatically.
    #[must_use]
    pub fn commits(&self, decision: ModerationDecision) -> bool {
        self.auto_apply
            && matches!(
                decision,
                ModerationDecision::Approved | ModerationDecision::Rejected
            )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::ContentChecks;

    fn flagged() -> ContentCheck {
        ContentCheck {
            passed: false,
            checks: ContentChecks {
                has_luxury: true,
                ..ContentChecks::default()
            },
            ..ContentCheck::default()
        }
    }

    fn clean() -> ContentCheck {
        ContentCheck {
            passed: true,
            ..ContentCheck::default()
        }
    }

    #[test]
    fn low_score_rejects_even_with_clean_content() {
        let policy = ModerationPolicy::default();
        assert_eq!(policy.decide(29, &clean()), ModerationDecision::Rejected);
        assert_eq!(policy.decide(10, &flagged()), ModerationDecision::Rejected);
    }

    #[test]
    fn flagged_content_goes_to_review() {
        let policy = ModerationPolicy::default();
        assert_eq!(policy.decide(30, &flagged()), ModerationDecision::Review);
        assert_eq!(policy.decide(95, &flagged()), ModerationDecision::Review);
    }

    #[test]
    fn clean_content_at_threshold_is_approved() {
        let policy = ModerationPolicy::default();
        assert_eq!(policy.decide(30, &clean()), ModerationDecision::Approved);
    }

    #[test]
    fn only_final_decisions_commit() {
        let policy = ModerationPolicy {
            auto_apply: true,
            ..ModerationPolicy::default()
        };
        assert!(policy.commits(ModerationDecision::Approved));
        assert!(policy.commits(ModerationDecision::Rejected));
        assert!(!policy.commits(ModerationDecision::Review));
        assert!(!ModerationPolicy::default().commits(ModerationDecision::Approved));
    }
}
