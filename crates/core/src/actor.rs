//! The acting identity threaded into every lifecycle operation.

use serde::{Deserialize, Serialize};

use crate::roles::Role;
use crate::types::{DbId, UserId};

/// Who is performing an operation.
///
/// Resolved once per request from the bearer token and the user's profile,
/// then passed explicitly to every operation that needs it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub user_id: UserId,
    pub role: Role,
    /// The educator row linked to this login, for users with the educator role.
    pub educator_id: Option<DbId>,
}

impl Actor {
    pub fn new(user_id: UserId, role: Role) -> Self {
        Self {
            user_id,
            role,
            educator_id: None,
        }
    }

    pub fn with_educator(mut self, educator_id: DbId) -> Self {
        self.educator_id = Some(educator_id);
        self
    }
}
