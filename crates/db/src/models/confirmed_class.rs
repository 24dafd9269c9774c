//! Confirmed class row and billing DTOs.

use lifesafe_core::types::{Date, DbId, Timestamp, UserId};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// A row from the `confirmed_classes` table.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct ConfirmedClass {
    pub id: DbId,
    pub site_id: DbId,
    pub educator_id: Option<DbId>,
    /// Class types joined with `", "`.
    pub subjects: String,
    pub date_of_class: Date,
    pub coordinator_id: Option<UserId>,
    pub notes: Option<String>,
    pub billable: Option<f64>,
    pub hours: Option<f64>,
    pub expenses: Option<f64>,
    pub student_count: Option<i32>,
    pub bill_date: Option<Timestamp>,
    pub review: Option<String>,
    /// The class request this class was promoted from.
    pub source_request_id: Option<DbId>,
    pub locked_by_user_id: Option<UserId>,
    pub locked_at: Option<Timestamp>,
    pub version: i32,
    pub created_at: Timestamp,
    pub last_modified: Timestamp,
}

/// Fields written when a confirmed class is inserted by promotion.
#[derive(Debug, Clone, PartialEq)]
pub struct NewConfirmedClass {
    pub site_id: DbId,
    pub educator_id: Option<DbId>,
    pub subjects: String,
    pub date_of_class: Date,
    pub coordinator_id: Option<UserId>,
    pub notes: Option<String>,
    pub source_request_id: Option<DbId>,
}

/// DTO for editing billing fields. Absent fields keep their stored value.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateBilling {
    #[validate(range(min = 0))]
    pub student_count: Option<i32>,
    #[validate(range(min = 0.0))]
    pub billable: Option<f64>,
    #[validate(range(min = 0.0))]
    pub hours: Option<f64>,
    #[validate(range(min = 0.0))]
    pub expenses: Option<f64>,
    /// Version the caller last read.
    pub version: i32,
}

impl UpdateBilling {
    pub fn apply_to(&self, row: &ConfirmedClass) -> ConfirmedClass {
        let mut next = row.clone();
        next.student_count = self.student_count.or(row.student_count);
        next.billable = self.billable.or(row.billable);
        next.hours = self.hours.or(row.hours);
        next.expenses = self.expenses.or(row.expenses);
        next
    }
}

/// DTO for a client's post-class review. The text is trimmed and checked
/// by `lifesafe_core::billing::validate_review`.
#[derive(Debug, Clone, Deserialize)]
pub struct SubmitReview {
    pub review: String,
    pub version: i32,
}
