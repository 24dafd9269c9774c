//! Read-only repository for the `sites` table.

use lifesafe_core::types::DbId;
use sqlx::PgPool;

use crate::models::site::Site;

const COLUMNS: &str = "id, company_id, name, address, city, state, zip, email";

pub struct SiteRepo;

impl SiteRepo {
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Site>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM sites WHERE id = $1");
        sqlx::query_as::<_, Site>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }
}
