//! Read-only repository for the `companies` table.

use lifesafe_core::types::DbId;
use sqlx::PgPool;

use crate::models::company::Company;

const COLUMNS: &str = "id, name";

pub struct CompanyRepo;

impl CompanyRepo {
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Company>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM companies WHERE id = $1");
        sqlx::query_as::<_, Company>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }
}
