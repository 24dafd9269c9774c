//! User profiles maintained by the identity provider's admin screens.

use lifesafe_core::actor::Actor;
use lifesafe_core::roles::Role;
use lifesafe_core::types::{DbId, UserId};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `profiles` table. `id` is the identity provider's user id.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct Profile {
    pub id: UserId,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub role: String,
    pub educator_id: Option<DbId>,
}

impl Profile {
    pub fn role(&self) -> Role {
        Role::parse(&self.role)
    }

    /// The acting identity this profile resolves to.
    pub fn to_actor(&self) -> Actor {
        let actor = Actor::new(self.id, self.role());
        match self.educator_id {
            Some(educator_id) => actor.with_educator(educator_id),
            None => actor,
        }
    }
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;

    #[test]
    fn educator_profile_carries_link() {
        let profile = Profile {
            id: Uuid::new_v4(),
            first_name: "Ana".into(),
            last_name: "Ruiz".into(),
            email: None,
            role: "educator".into(),
            educator_id: Some(5),
        };
        let actor = profile.to_actor();
        assert_eq!(actor.role, Role::Educator);
        assert_eq!(actor.educator_id, Some(5));
    }

    #[test]
    fn unknown_role_resolves_to_user() {
        let profile = Profile {
            id: Uuid::new_v4(),
            first_name: "X".into(),
            last_name: "Y".into(),
            email: None,
            role: "guest".into(),
            educator_id: None,
        };
        assert_eq!(profile.to_actor().role, Role::User);
    }
}
