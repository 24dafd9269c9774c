//! Client site reference rows.

use lifesafe_core::types::DbId;
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `sites` table.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct Site {
    pub id: DbId,
    pub company_id: DbId,
    pub name: String,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip: Option<String>,
    pub email: Option<String>,
}

impl Site {
    /// Single-line address, skipping missing parts.
    pub fn address_line(&self) -> String {
        let locality = [self.city.as_deref(), self.state.as_deref(), self.zip.as_deref()]
            .into_iter()
            .flatten()
            .collect::<Vec<_>>()
            .join(" ");
        [self.address.as_deref(), Some(locality.as_str())]
            .into_iter()
            .flatten()
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(", ")
    }
}
