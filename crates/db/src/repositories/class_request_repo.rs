//! Repository for the `class_requests` table.

use lifesafe_core::locking::LockClaim;
use lifesafe_core::types::{DbId, Timestamp, UserId};
use sqlx::PgPool;

use super::stale_before;
use crate::models::class_request::{ClassRequest, NewClassRequest};

/// Column list for `class_requests` queries.
pub(crate) const COLUMNS: &str = "id, company_id, site_id, class_types, \
    preferred_date_start, preferred_date_end, status, educator_id, coordinator_id, \
    assignee_id, class_date, offer_sent_at, educator_response_at, notes, \
    locked_by_user_id, locked_at, version, created_at, last_modified";

pub struct ClassRequestRepo;

impl ClassRequestRepo {
    pub async fn create(
        pool: &PgPool,
        input: &NewClassRequest,
    ) -> Result<ClassRequest, sqlx::Error> {
        let query = format!(
            "INSERT INTO class_requests \
                (company_id, site_id, class_types, preferred_date_start, preferred_date_end, \
                 status, coordinator_id, notes) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ClassRequest>(&query)
            .bind(input.company_id)
            .bind(input.site_id)
            .bind(&input.class_types)
            .bind(input.preferred_date_start)
            .bind(input.preferred_date_end)
            .bind(&input.status)
            .bind(input.coordinator_id)
            .bind(&input.notes)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<ClassRequest>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM class_requests WHERE id = $1");
        sqlx::query_as::<_, ClassRequest>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Requests currently sitting in a user's work queue.
    pub async fn list_by_assignee(
        pool: &PgPool,
        assignee_id: UserId,
    ) -> Result<Vec<ClassRequest>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM class_requests WHERE assignee_id = $1 \
             ORDER BY class_date ASC NULLS LAST, created_at ASC"
        );
        sqlx::query_as::<_, ClassRequest>(&query)
            .bind(assignee_id)
            .fetch_all(pool)
            .await
    }

    /// Requests assigned to an educator, oldest first.
    pub async fn list_by_educator(
        pool: &PgPool,
        educator_id: DbId,
    ) -> Result<Vec<ClassRequest>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM class_requests WHERE educator_id = $1 \
             ORDER BY created_at ASC"
        );
        sqlx::query_as::<_, ClassRequest>(&query)
            .bind(educator_id)
            .fetch_all(pool)
            .await
    }

    /// Write every mutable column of `row` if the guard holds.
    ///
    /// Bumps `version` and sets the lock columns according to `claim`.
    pub async fn update_guarded(
        pool: &PgPool,
        row: &ClassRequest,
        expected_version: i32,
        claim: LockClaim,
        now: Timestamp,
    ) -> Result<Option<ClassRequest>, sqlx::Error> {
        let (locked_by, locked_at) = claim.lock_fields(now);
        let query = format!(
            "UPDATE class_requests SET \
                company_id = $2, site_id = $3, class_types = $4, \
                preferred_date_start = $5, preferred_date_end = $6, status = $7, \
                educator_id = $8, coordinator_id = $9, assignee_id = $10, class_date = $11, \
                offer_sent_at = $12, educator_response_at = $13, notes = $14, \
                locked_by_user_id = $15, locked_at = $16, \
                version = version + 1, last_modified = $17 \
             WHERE id = $1 AND version = $18 \
               AND (locked_by_user_id IS NULL OR locked_by_user_id = $19 OR locked_at <= $20) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ClassRequest>(&query)
            .bind(row.id)
            .bind(row.company_id)
            .bind(row.site_id)
            .bind(&row.class_types)
            .bind(row.preferred_date_start)
            .bind(row.preferred_date_end)
            .bind(&row.status)
            .bind(row.educator_id)
            .bind(row.coordinator_id)
            .bind(row.assignee_id)
            .bind(row.class_date)
            .bind(row.offer_sent_at)
            .bind(row.educator_response_at)
            .bind(&row.notes)
            .bind(locked_by)
            .bind(locked_at)
            .bind(now)
            .bind(expected_version)
            .bind(claim.actor)
            .bind(stale_before(now))
            .fetch_optional(pool)
            .await
    }

    /// Delete a request if the guard holds. Returns `true` if a row was deleted.
    pub async fn delete_guarded(
        pool: &PgPool,
        id: DbId,
        expected_version: i32,
        actor: UserId,
        now: Timestamp,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "DELETE FROM class_requests \
             WHERE id = $1 AND version = $2 \
               AND (locked_by_user_id IS NULL OR locked_by_user_id = $3 OR locked_at <= $4)",
        )
        .bind(id)
        .bind(expected_version)
        .bind(actor)
        .bind(stale_before(now))
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Unconditional delete, used to finish an interrupted promotion.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM class_requests WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Clear the edit lock. Only the holder may release unless `force` is set.
    pub async fn release_lock(
        pool: &PgPool,
        id: DbId,
        user_id: UserId,
        force: bool,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE class_requests SET locked_by_user_id = NULL, locked_at = NULL \
             WHERE id = $1 AND locked_by_user_id IS NOT NULL \
               AND (locked_by_user_id = $2 OR $3)",
        )
        .bind(id)
        .bind(user_id)
        .bind(force)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
