//! PostgreSQL implementation of [`CampaignRepository`].
//!
//! Multi-row writes run inside a transaction. Campaign writes that must not
//! race use `UPDATE ... WHERE version = $n` as the compare-and-swap, and
//! row locks (`FOR UPDATE`) where the new value depends on the stored one.

use async_trait::async_trait;
use sqlx::types::Json;
use sqlx::{PgConnection, PgPool};

use super::models::{CampaignRow, DonationRow, ModerationRow, TrustEventRow, UpdateRow};
use super::{CampaignRepository, ReviewCommit, Settlement};
use crate::domain::{
    Campaign, CampaignId, CampaignStatus, CampaignUpdate, Donation, ModerationRecord,
    PaymentStatus, TrustScoreEvent, UserId,
};
use crate::error::ServiceError;

const CAMPAIGN_COLUMNS: &str = "id, owner_id, status, title, story_markdown, category, \
     goal_amount, raised_amount, currency, trust_score, media, budget_breakdown, \
     beneficiaries, creator_verified, changes_requested, version, created_at, \
     submitted_at, updated_at";

const DONATION_COLUMNS: &str = "id, campaign_id, donor_id, donor_name, donor_email, amount, \
     currency, payment_intent_id, payment_status, created_at";

/// PostgreSQL-backed repository using `sqlx::PgPool`.
#[derive(Debug, Clone)]
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    /// Creates a repository over the given connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Applies pending migrations from `./migrations`.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Persistence`] if a migration fails.
    pub async fn migrate(&self) -> Result<(), ServiceError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| ServiceError::Persistence(e.to_string()))
    }
}

/// Maps driver errors: connectivity problems are retryable, the rest are not.
fn db_error(err: sqlx::Error) -> ServiceError {
    match &err {
        sqlx::Error::Io(_) | sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed => {
            ServiceError::Unavailable(err.to_string())
        }
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            ServiceError::InvalidRequest(db.message().to_string())
        }
        _ => ServiceError::Persistence(err.to_string()),
    }
}

/// Resolves a failed compare-and-swap into not-found or stale.
async fn cas_failure(
    conn: &mut PgConnection,
    id: CampaignId,
    expected: i64,
) -> Result<ServiceError, ServiceError> {
    let actual = sqlx::query_scalar::<_, i64>("SELECT version FROM campaigns WHERE id = $1")
        .bind(id.as_uuid())
        .fetch_optional(conn)
        .await
        .map_err(db_error)?;
    Ok(match actual {
        Some(actual) => ServiceError::StaleState { expected, actual },
        None => ServiceError::CampaignNotFound(id),
    })
}

async fn lock_campaign(conn: &mut PgConnection, id: CampaignId) -> Result<Campaign, ServiceError> {
    let sql = format!("SELECT {CAMPAIGN_COLUMNS} FROM campaigns WHERE id = $1 FOR UPDATE");
    let row = sqlx::query_as::<_, CampaignRow>(&sql)
        .bind(id.as_uuid())
        .fetch_optional(conn)
        .await
        .map_err(db_error)?
        .ok_or(ServiceError::CampaignNotFound(id))?;
    Campaign::try_from(row)
}

async fn insert_moderation(
    conn: &mut PgConnection,
    record: &ModerationRecord,
) -> Result<(), ServiceError> {
    sqlx::query(
        "INSERT INTO campaign_moderation \
         (id, campaign_id, decision, score, flags, notes, required_changes, reviewer_id, created_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
    )
    .bind(record.id)
    .bind(record.campaign_id.as_uuid())
    .bind(record.decision.as_str())
    .bind(i16::from(record.score))
    .bind(Json(&record.flags))
    .bind(record.notes.as_deref())
    .bind(Json(&record.required_changes))
    .bind(record.reviewer_id.map(|id| *id.as_uuid()))
    .bind(record.created_at)
    .execute(conn)
    .await
    .map_err(db_error)?;
    Ok(())
}

#[async_trait]
impl CampaignRepository for PostgresRepository {
    async fn insert_campaign(&self, campaign: &Campaign) -> Result<(), ServiceError> {
        sqlx::query(
            "INSERT INTO campaigns \
             (id, owner_id, status, title, story_markdown, category, goal_amount, raised_amount, \
              currency, trust_score, media, budget_breakdown, beneficiaries, creator_verified, \
              changes_requested, version, created_at, submitted_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19)",
        )
        .bind(campaign.id.as_uuid())
        .bind(campaign.owner_id.as_uuid())
        .bind(campaign.status.as_str())
        .bind(&campaign.title)
        .bind(&campaign.story_markdown)
        .bind(campaign.category.as_deref())
        .bind(campaign.goal_amount)
        .bind(campaign.raised_amount)
        .bind(&campaign.currency)
        .bind(i16::from(campaign.trust_score))
        .bind(Json(&campaign.media))
        .bind(Json(&campaign.budget_breakdown))
        .bind(Json(&campaign.beneficiaries))
        .bind(campaign.creator_verified)
        .bind(campaign.changes_requested)
        .bind(campaign.version)
        .bind(campaign.created_at)
        .bind(campaign.submitted_at)
        .bind(campaign.updated_at)
        .execute(&self.pool)
        .await
        .map_err(db_error)?;
        Ok(())
    }

    async fn get_campaign(&self, id: CampaignId) -> Result<Campaign, ServiceError> {
        let sql = format!("SELECT {CAMPAIGN_COLUMNS} FROM campaigns WHERE id = $1");
        let row = sqlx::query_as::<_, CampaignRow>(&sql)
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error)?
            .ok_or(ServiceError::CampaignNotFound(id))?;
        Campaign::try_from(row)
    }

    async fn save_campaign(
        &self,
        campaign: &Campaign,
        expected_version: i64,
    ) -> Result<Campaign, ServiceError> {
        let mut conn = self.pool.acquire().await.map_err(db_error)?;
        let sql = format!(
            "UPDATE campaigns SET status = $3, title = $4, story_markdown = $5, category = $6, \
             goal_amount = $7, raised_amount = $8, currency = $9, media = $10, \
             budget_breakdown = $11, beneficiaries = $12, creator_verified = $13, \
             changes_requested = $14, submitted_at = $15, version = version + 1, \
             updated_at = now() \
             WHERE id = $1 AND version = $2 RETURNING {CAMPAIGN_COLUMNS}"
        );
        let row = sqlx::query_as::<_, CampaignRow>(&sql)
            .bind(campaign.id.as_uuid())
            .bind(expected_version)
            .bind(campaign.status.as_str())
            .bind(&campaign.title)
            .bind(&campaign.story_markdown)
            .bind(campaign.category.as_deref())
            .bind(campaign.goal_amount)
            .bind(campaign.raised_amount)
            .bind(&campaign.currency)
            .bind(Json(&campaign.media))
            .bind(Json(&campaign.budget_breakdown))
            .bind(Json(&campaign.beneficiaries))
            .bind(campaign.creator_verified)
            .bind(campaign.changes_requested)
            .bind(campaign.submitted_at)
            .fetch_optional(&mut *conn)
            .await
            .map_err(db_error)?;

        match row {
            Some(row) => Campaign::try_from(row),
            None => Err(cas_failure(&mut conn, campaign.id, expected_version).await?),
        }
    }

    async fn list_pending_review(
        &self,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<Campaign>, ServiceError> {
        let sql = format!(
            "SELECT {CAMPAIGN_COLUMNS} FROM campaigns WHERE status = $1 \
             ORDER BY submitted_at ASC, id ASC LIMIT $2 OFFSET $3"
        );
        let rows = sqlx::query_as::<_, CampaignRow>(&sql)
            .bind(CampaignStatus::PendingReview.as_str())
            .bind(i64::from(limit))
            .bind(i64::from(offset))
            .fetch_all(&self.pool)
            .await
            .map_err(db_error)?;
        rows.into_iter().map(Campaign::try_from).collect()
    }

    async fn count_pending_review(&self) -> Result<u64, ServiceError> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM campaigns WHERE status = $1")
            .bind(CampaignStatus::PendingReview.as_str())
            .fetch_one(&self.pool)
            .await
            .map_err(db_error)?;
        Ok(u64::try_from(count).unwrap_or(0))
    }

    async fn commit_review(
        &self,
        campaign_id: CampaignId,
        commit: ReviewCommit<'_>,
    ) -> Result<Campaign, ServiceError> {
        let mut tx = self.pool.begin().await.map_err(db_error)?;
        let sql = format!(
            "UPDATE campaigns SET status = $3, changes_requested = $4, \
             version = version + 1, updated_at = now() \
             WHERE id = $1 AND version = $2 RETURNING {CAMPAIGN_COLUMNS}"
        );
        let row = sqlx::query_as::<_, CampaignRow>(&sql)
            .bind(campaign_id.as_uuid())
            .bind(commit.expected_version)
            .bind(commit.new_status.as_str())
            .bind(commit.changes_requested)
            .fetch_optional(&mut *tx)
            .await
            .map_err(db_error)?;

        let Some(row) = row else {
            return Err(cas_failure(&mut tx, campaign_id, commit.expected_version).await?);
        };
        let campaign = Campaign::try_from(row)?;
        insert_moderation(&mut tx, commit.record).await?;
        tx.commit().await.map_err(db_error)?;
        Ok(campaign)
    }

    async fn append_moderation_record(
        &self,
        record: &ModerationRecord,
    ) -> Result<(), ServiceError> {
        let mut conn = self.pool.acquire().await.map_err(db_error)?;
        insert_moderation(&mut conn, record).await
    }

    async fn moderation_history(
        &self,
        campaign_id: CampaignId,
    ) -> Result<Vec<ModerationRecord>, ServiceError> {
        let rows = sqlx::query_as::<_, ModerationRow>(
            "SELECT id, campaign_id, decision, score, flags, notes, required_changes, \
             reviewer_id, created_at FROM campaign_moderation \
             WHERE campaign_id = $1 ORDER BY created_at DESC",
        )
        .bind(campaign_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;
        rows.into_iter().map(ModerationRecord::try_from).collect()
    }

    async fn record_trust_score(
        &self,
        campaign_id: CampaignId,
        new_score: u8,
        reason: &str,
    ) -> Result<(Campaign, TrustScoreEvent), ServiceError> {
        let mut tx = self.pool.begin().await.map_err(db_error)?;
        let mut campaign = lock_campaign(&mut tx, campaign_id).await?;
        let event = TrustScoreEvent::new(campaign_id, campaign.trust_score, new_score, reason);

        sqlx::query("UPDATE campaigns SET trust_score = $2 WHERE id = $1")
            .bind(campaign_id.as_uuid())
            .bind(i16::from(new_score))
            .execute(&mut *tx)
            .await
            .map_err(db_error)?;
        sqlx::query(
            "INSERT INTO trust_score_events \
             (id, campaign_id, previous_score, new_score, score_change, reason, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(event.id)
        .bind(campaign_id.as_uuid())
        .bind(i16::from(event.previous_score))
        .bind(i16::from(event.new_score))
        .bind(event.score_change)
        .bind(&event.reason)
        .bind(event.created_at)
        .execute(&mut *tx)
        .await
        .map_err(db_error)?;
        tx.commit().await.map_err(db_error)?;

        campaign.trust_score = new_score;
        Ok((campaign, event))
    }

    async fn trust_score_history(
        &self,
        campaign_id: CampaignId,
    ) -> Result<Vec<TrustScoreEvent>, ServiceError> {
        let rows = sqlx::query_as::<_, TrustEventRow>(
            "SELECT id, campaign_id, previous_score, new_score, score_change, reason, created_at \
             FROM trust_score_events WHERE campaign_id = $1 ORDER BY created_at DESC",
        )
        .bind(campaign_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;
        rows.into_iter().map(TrustScoreEvent::try_from).collect()
    }

    async fn list_updates(
        &self,
        campaign_id: CampaignId,
    ) -> Result<Vec<CampaignUpdate>, ServiceError> {
        let rows = sqlx::query_as::<_, UpdateRow>(
            "SELECT id, campaign_id, title, content, created_at FROM campaign_updates \
             WHERE campaign_id = $1 ORDER BY created_at ASC",
        )
        .bind(campaign_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;
        Ok(rows.into_iter().map(CampaignUpdate::from).collect())
    }

    async fn insert_update(&self, update: &CampaignUpdate) -> Result<(), ServiceError> {
        sqlx::query(
            "INSERT INTO campaign_updates (id, campaign_id, title, content, created_at) \
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(update.id)
        .bind(update.campaign_id.as_uuid())
        .bind(&update.title)
        .bind(&update.content)
        .bind(update.created_at)
        .execute(&self.pool)
        .await
        .map_err(db_error)?;
        Ok(())
    }

    async fn list_donations(
        &self,
        campaign_id: CampaignId,
    ) -> Result<Vec<Donation>, ServiceError> {
        let sql = format!(
            "SELECT {DONATION_COLUMNS} FROM donations WHERE campaign_id = $1 ORDER BY created_at ASC"
        );
        let rows = sqlx::query_as::<_, DonationRow>(&sql)
            .bind(campaign_id.as_uuid())
            .fetch_all(&self.pool)
            .await
            .map_err(db_error)?;
        rows.into_iter().map(Donation::try_from).collect()
    }

    async fn insert_donation(&self, donation: &Donation) -> Result<(), ServiceError> {
        let sql = format!(
            "INSERT INTO donations ({DONATION_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)"
        );
        sqlx::query(&sql)
            .bind(donation.id)
            .bind(donation.campaign_id.as_uuid())
            .bind(donation.donor_id.map(|id| *id.as_uuid()))
            .bind(donation.donor_name.as_deref())
            .bind(donation.donor_email.as_deref())
            .bind(donation.amount)
            .bind(&donation.currency)
            .bind(&donation.payment_intent_id)
            .bind(donation.payment_status.as_str())
            .bind(donation.created_at)
            .execute(&self.pool)
            .await
            .map_err(db_error)?;
        Ok(())
    }

    async fn settle_donation(
        &self,
        payment_intent_id: &str,
        status: PaymentStatus,
    ) -> Result<Settlement, ServiceError> {
        let mut tx = self.pool.begin().await.map_err(db_error)?;

        let sql = format!(
            "SELECT {DONATION_COLUMNS} FROM donations WHERE payment_intent_id = $1 FOR UPDATE"
        );
        let row = sqlx::query_as::<_, DonationRow>(&sql)
            .bind(payment_intent_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(db_error)?
            .ok_or_else(|| ServiceError::DonationNotFound(payment_intent_id.to_string()))?;
        let mut donation = Donation::try_from(row)?;
        let mut campaign = lock_campaign(&mut tx, donation.campaign_id).await?;

        if donation.payment_status.is_final() {
            return Ok(Settlement {
                donation,
                campaign,
                applied: false,
            });
        }

        if status == PaymentStatus::Succeeded {
            let remaining = campaign.remaining_amount();
            if donation.amount > remaining {
                return Err(ServiceError::GoalExceeded {
                    amount: donation.amount,
                    remaining,
                });
            }
            let sql = format!(
                "UPDATE campaigns SET raised_amount = raised_amount + $2, \
                 status = CASE WHEN status = $3 AND raised_amount + $2 >= goal_amount \
                          THEN $4 ELSE status END, \
                 version = version + 1, updated_at = now() \
                 WHERE id = $1 RETURNING {CAMPAIGN_COLUMNS}"
            );
            let row = sqlx::query_as::<_, CampaignRow>(&sql)
                .bind(campaign.id.as_uuid())
                .bind(donation.amount)
                .bind(CampaignStatus::Funding.as_str())
                .bind(CampaignStatus::Funded.as_str())
                .fetch_one(&mut *tx)
                .await
                .map_err(db_error)?;
            campaign = Campaign::try_from(row)?;
        }

        sqlx::query("UPDATE donations SET payment_status = $2 WHERE id = $1")
            .bind(donation.id)
            .bind(status.as_str())
            .execute(&mut *tx)
            .await
            .map_err(db_error)?;
        tx.commit().await.map_err(db_error)?;

        donation.payment_status = status;
        Ok(Settlement {
            donation,
            campaign,
            applied: true,
        })
    }

    async fn anonymize_donor(&self, donor: UserId) -> Result<u64, ServiceError> {
        let result = sqlx::query(
            "UPDATE donations SET donor_id = NULL, donor_name = NULL, donor_email = NULL \
             WHERE donor_id = $1",
        )
        .bind(donor.as_uuid())
        .execute(&self.pool)
        .await
        .map_err(db_error)?;
        Ok(result.rows_affected())
    }
}
