//! Class request row and input DTOs.

use lifesafe_core::class_request::{ClassRequestStatus, FieldPresence};
use lifesafe_core::error::CoreError;
use lifesafe_core::types::{Date, DbId, Timestamp, UserId};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// A row from the `class_requests` table.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct ClassRequest {
    pub id: DbId,
    pub company_id: Option<DbId>,
    pub site_id: Option<DbId>,
    pub class_types: Vec<String>,
    pub preferred_date_start: Date,
    pub preferred_date_end: Date,
    pub status: String,
    pub educator_id: Option<DbId>,
    pub coordinator_id: UserId,
    pub assignee_id: Option<UserId>,
    pub class_date: Option<Date>,
    pub offer_sent_at: Option<Timestamp>,
    pub educator_response_at: Option<Timestamp>,
    pub notes: Option<String>,
    pub locked_by_user_id: Option<UserId>,
    pub locked_at: Option<Timestamp>,
    pub version: i32,
    pub created_at: Timestamp,
    pub last_modified: Timestamp,
}

impl ClassRequest {
    pub fn status(&self) -> Result<ClassRequestStatus, CoreError> {
        ClassRequestStatus::parse(&self.status)
    }

    /// Which lifecycle-relevant fields are populated.
    pub fn field_presence(&self) -> FieldPresence {
        FieldPresence {
            class_types: !self.class_types.is_empty(),
            preferred_window: true,
            educator: self.educator_id.is_some(),
            site: self.site_id.is_some(),
            class_date: self.class_date.is_some(),
            offer_sent_at: self.offer_sent_at.is_some(),
            educator_response_at: self.educator_response_at.is_some(),
        }
    }
}

/// Fields written when a request row is inserted.
#[derive(Debug, Clone)]
pub struct NewClassRequest {
    pub company_id: Option<DbId>,
    pub site_id: Option<DbId>,
    pub class_types: Vec<String>,
    pub preferred_date_start: Date,
    pub preferred_date_end: Date,
    pub status: String,
    pub coordinator_id: UserId,
    pub notes: Option<String>,
}

/// DTO for submitting a class request.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateClassRequest {
    pub company_id: Option<DbId>,
    pub site_id: Option<DbId>,
    #[validate(length(min = 1, message = "At least one class type is required"))]
    pub class_types: Vec<String>,
    pub preferred_date_start: Date,
    pub preferred_date_end: Date,
    #[validate(length(max = 4000))]
    pub notes: Option<String>,
}

/// DTO for editing a request without changing its status. Absent fields
/// keep their stored value.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateClassRequest {
    pub company_id: Option<DbId>,
    pub site_id: Option<DbId>,
    #[validate(length(min = 1, message = "At least one class type is required"))]
    pub class_types: Option<Vec<String>>,
    pub preferred_date_start: Option<Date>,
    pub preferred_date_end: Option<Date>,
    #[validate(length(max = 4000))]
    pub notes: Option<String>,
    pub coordinator_id: Option<UserId>,
    /// Version the caller last read.
    pub version: i32,
}

impl UpdateClassRequest {
    /// Apply the supplied fields to a fresh copy of the stored row.
    pub fn apply_to(&self, row: &ClassRequest) -> ClassRequest {
        let mut next = row.clone();
        if let Some(company_id) = self.company_id {
            next.company_id = Some(company_id);
        }
        if let Some(site_id) = self.site_id {
            next.site_id = Some(site_id);
        }
        if let Some(types) = &self.class_types {
            next.class_types = types.clone();
        }
        if let Some(start) = self.preferred_date_start {
            next.preferred_date_start = start;
        }
        if let Some(end) = self.preferred_date_end {
            next.preferred_date_end = end;
        }
        if let Some(notes) = &self.notes {
            next.notes = Some(notes.clone());
        }
        if let Some(coordinator_id) = self.coordinator_id {
            next.coordinator_id = coordinator_id;
        }
        next
    }
}
