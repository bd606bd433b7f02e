//! DTOs for campaign, moderation, and trust score endpoints.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::api::dto::PaginationMeta;
use crate::domain::{Campaign, CampaignId, CampaignPatch};
use crate::trust::TrustScore;

/// Request body for `PATCH /campaigns/{id}`.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct PatchCampaignRequest {
    /// Fields to change.
    #[serde(flatten)]
    pub patch: CampaignPatch,
    /// Version the edit is based on; checked when present.
    #[serde(default)]
    pub expected_version: Option<i64>,
}

/// Request body for approve and reject.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct ReviewRequest {
    /// Reviewer notes.
    #[serde(default)]
    pub notes: Option<String>,
    /// Version the decision is based on; checked when present.
    #[serde(default)]
    pub expected_version: Option<i64>,
}

/// Request body for `POST /campaigns/{id}/request-changes`.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct ChangesRequest {
    /// Changes the owner must make.
    pub changes: Vec<String>,
    /// Reviewer notes.
    #[serde(default)]
    pub notes: Option<String>,
    /// Version the decision is based on; checked when present.
    #[serde(default)]
    pub expected_version: Option<i64>,
}

/// Request body for `POST /content/check`.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct ContentCheckRequest {
    /// Text to screen.
    pub text: String,
}

/// Request body for `POST /campaigns/{id}/updates`.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct PostUpdateRequest {
    /// Update headline.
    pub title: String,
    /// Update body.
    pub content: String,
}

/// Response body for the trust score endpoints.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TrustScoreResponse {
    /// Scored campaign.
    pub campaign_id: CampaignId,
    /// Score and per-factor breakdown.
    pub trust_score: TrustScore,
}

/// Response body for `GET /moderation/queue`.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct QueueResponse {
    /// Campaigns awaiting review, oldest submission first.
    pub data: Vec<Campaign>,
    /// Pagination metadata.
    pub pagination: PaginationMeta,
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn patch_request_flattens_fields() {
        let body = r#"{"title":"New title","goal_amount":500,"expected_version":3}"#;
        let Ok(req) = serde_json::from_str::<PatchCampaignRequest>(body) else {
            panic!("expected valid patch request");
        };
        assert_eq!(req.patch.title.as_deref(), Some("New title"));
        assert_eq!(req.patch.goal_amount, Some(500));
        assert!(req.patch.story_markdown.is_none());
        assert_eq!(req.expected_version, Some(3));
    }

    #[test]
    fn review_request_fields_are_optional() {
        let Ok(req) = serde_json::from_str::<ReviewRequest>("{}") else {
            panic!("expected empty review request to parse");
        };
        assert!(req.notes.is_none());
        assert!(req.expected_version.is_none());
    }
}
