//! Read-only repository for the `profiles` table.

use lifesafe_core::types::UserId;
use sqlx::PgPool;

use crate::models::profile::Profile;

const COLUMNS: &str = "id, first_name, last_name, email, role, educator_id";

pub struct ProfileRepo;

impl ProfileRepo {
    pub async fn find_by_id(pool: &PgPool, id: UserId) -> Result<Option<Profile>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM profiles WHERE id = $1");
        sqlx::query_as::<_, Profile>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }
}
