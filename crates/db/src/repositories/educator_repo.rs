//! Read-only repository for the `educators` table.

use lifesafe_core::types::DbId;
use sqlx::PgPool;

use crate::models::educator::Educator;

const COLUMNS: &str = "id, first_name, last_name, email, teach_state, rate1";

pub struct EducatorRepo;

impl EducatorRepo {
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Educator>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM educators WHERE id = $1");
        sqlx::query_as::<_, Educator>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }
}
