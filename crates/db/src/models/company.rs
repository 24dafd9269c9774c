use lifesafe_core::types::DbId;
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `companies` table.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct Company {
    pub id: DbId,
    pub name: String,
}
