//! Educator reference rows.

use lifesafe_core::types::DbId;
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `educators` table.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct Educator {
    pub id: DbId,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub teach_state: Option<String>,
    /// Hourly rate used for cost estimates.
    pub rate1: Option<f64>,
}

impl Educator {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}
