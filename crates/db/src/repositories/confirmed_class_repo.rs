//! Repository for the `confirmed_classes` table.

use lifesafe_core::locking::LockClaim;
use lifesafe_core::types::{Date, DbId, Timestamp, UserId};
use sqlx::PgPool;

use super::stale_before;
use crate::models::confirmed_class::{ConfirmedClass, NewConfirmedClass};

/// Column list for `confirmed_classes` queries.
const COLUMNS: &str = "id, site_id, educator_id, subjects, date_of_class, coordinator_id, \
    notes, billable, hours, expenses, student_count, bill_date, review, source_request_id, \
    locked_by_user_id, locked_at, version, created_at, last_modified";

const INSERT_COLUMNS: &str = "site_id, educator_id, subjects, date_of_class, coordinator_id, \
    notes, source_request_id";

pub struct ConfirmedClassRepo;

impl ConfirmedClassRepo {
    pub async fn create(
        pool: &PgPool,
        input: &NewConfirmedClass,
    ) -> Result<ConfirmedClass, sqlx::Error> {
        let query = format!(
            "INSERT INTO confirmed_classes ({INSERT_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ConfirmedClass>(&query)
            .bind(input.site_id)
            .bind(input.educator_id)
            .bind(&input.subjects)
            .bind(input.date_of_class)
            .bind(input.coordinator_id)
            .bind(&input.notes)
            .bind(input.source_request_id)
            .fetch_one(pool)
            .await
    }

    /// Insert the confirmed class and delete its source request in one
    /// transaction.
    ///
    /// The request delete is guarded. When the guard fails the transaction
    /// is rolled back and `None` is returned.
    pub async fn promote(
        pool: &PgPool,
        input: &NewConfirmedClass,
        request_id: DbId,
        expected_version: i32,
        actor: UserId,
        now: Timestamp,
    ) -> Result<Option<ConfirmedClass>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let deleted = sqlx::query(
            "DELETE FROM class_requests \
             WHERE id = $1 AND version = $2 \
               AND (locked_by_user_id IS NULL OR locked_by_user_id = $3 OR locked_at <= $4)",
        )
        .bind(request_id)
        .bind(expected_version)
        .bind(actor)
        .bind(stale_before(now))
        .execute(&mut *tx)
        .await?;

        if deleted.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(None);
        }

        let query = format!(
            "INSERT INTO confirmed_classes ({INSERT_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             RETURNING {COLUMNS}"
        );
        let class = sqlx::query_as::<_, ConfirmedClass>(&query)
            .bind(input.site_id)
            .bind(input.educator_id)
            .bind(&input.subjects)
            .bind(input.date_of_class)
            .bind(input.coordinator_id)
            .bind(&input.notes)
            .bind(input.source_request_id)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(Some(class))
    }

    pub async fn find_by_id(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<ConfirmedClass>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM confirmed_classes WHERE id = $1");
        sqlx::query_as::<_, ConfirmedClass>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Classes held before `today` that have no bill date yet.
    pub async fn list_pending_bills(
        pool: &PgPool,
        today: Date,
    ) -> Result<Vec<ConfirmedClass>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM confirmed_classes \
             WHERE date_of_class < $1 AND bill_date IS NULL \
             ORDER BY date_of_class ASC, id ASC"
        );
        sqlx::query_as::<_, ConfirmedClass>(&query)
            .bind(today)
            .fetch_all(pool)
            .await
    }

    /// Classes dated within `[from, to]`, inclusive.
    pub async fn list_between(
        pool: &PgPool,
        from: Date,
        to: Date,
    ) -> Result<Vec<ConfirmedClass>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM confirmed_classes \
             WHERE date_of_class BETWEEN $1 AND $2 \
             ORDER BY date_of_class ASC, id ASC"
        );
        sqlx::query_as::<_, ConfirmedClass>(&query)
            .bind(from)
            .bind(to)
            .fetch_all(pool)
            .await
    }

    /// Confirmed classes whose source request row still exists.
    pub async fn list_with_live_source(pool: &PgPool) -> Result<Vec<ConfirmedClass>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM confirmed_classes \
             WHERE source_request_id IN (SELECT id FROM class_requests) \
             ORDER BY id ASC"
        );
        sqlx::query_as::<_, ConfirmedClass>(&query)
            .fetch_all(pool)
            .await
    }

    /// Write the mutable columns of `row` if the guard holds.
    pub async fn update_guarded(
        pool: &PgPool,
        row: &ConfirmedClass,
        expected_version: i32,
        claim: LockClaim,
        now: Timestamp,
    ) -> Result<Option<ConfirmedClass>, sqlx::Error> {
        let (locked_by, locked_at) = claim.lock_fields(now);
        let query = format!(
            "UPDATE confirmed_classes SET \
                educator_id = $2, notes = $3, billable = $4, hours = $5, expenses = $6, \
                student_count = $7, bill_date = $8, review = $9, \
                locked_by_user_id = $10, locked_at = $11, \
                version = version + 1, last_modified = $12 \
             WHERE id = $1 AND version = $13 \
               AND (locked_by_user_id IS NULL OR locked_by_user_id = $14 OR locked_at <= $15) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ConfirmedClass>(&query)
            .bind(row.id)
            .bind(row.educator_id)
            .bind(&row.notes)
            .bind(row.billable)
            .bind(row.hours)
            .bind(row.expenses)
            .bind(row.student_count)
            .bind(row.bill_date)
            .bind(&row.review)
            .bind(locked_by)
            .bind(locked_at)
            .bind(now)
            .bind(expected_version)
            .bind(claim.actor)
            .bind(stale_before(now))
            .fetch_optional(pool)
            .await
    }

    /// Unconditional delete, used to undo a promotion insert.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM confirmed_classes WHERE id = $1")
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
            "UPDATE confirmed_classes SET locked_by_user_id = NULL, locked_at = NULL \
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
