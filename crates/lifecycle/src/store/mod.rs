//! The store boundary.
//!
//! Lifecycle logic is written against [`ClassStore`] so it runs unchanged on
//! Postgres ([`pg::PgClassStore`]) and in process ([`memory::MemoryStore`]).

pub mod memory;
pub mod pg;

use std::future::Future;

use lifesafe_core::error::CoreError;
use lifesafe_core::locking::{blocking_holder, lock_conflict, stale_conflict, LockClaim};
use lifesafe_core::types::{Date, DbId, Timestamp, UserId};
use lifesafe_db::models::class_request::{ClassRequest, NewClassRequest};
use lifesafe_db::models::company::Company;
use lifesafe_db::models::confirmed_class::{ConfirmedClass, NewConfirmedClass};
use lifesafe_db::models::educator::Educator;
use lifesafe_db::models::profile::Profile;
use lifesafe_db::models::site::Site;

use crate::error::StoreError;

/// Result of a guarded write.
#[derive(Debug, Clone, PartialEq)]
pub enum Guarded<T> {
    Applied(T),
    /// Another user holds a live edit lock.
    Locked { holder: UserId },
    /// The stored version no longer matches the version read.
    Stale,
    /// The row no longer exists.
    Missing,
}

impl<T> Guarded<T> {
    /// Map a rejected write onto the domain error the caller reports.
    pub fn into_result(self, entity: &'static str, id: DbId) -> Result<T, CoreError> {
        match self {
            Guarded::Applied(value) => Ok(value),
            Guarded::Locked { holder } => Err(lock_conflict(entity_label(entity), holder)),
            Guarded::Stale => Err(stale_conflict(entity_label(entity))),
            Guarded::Missing => Err(CoreError::NotFound { entity, id }),
        }
    }
}

fn entity_label(entity: &str) -> &'static str {
    match entity {
        "ConfirmedClass" => "confirmed class",
        _ => "class request",
    }
}

/// Why a guarded write against a row in this state would be rejected, or
/// `None` when it may proceed.
pub(crate) fn guard_rejection<T>(
    version: i32,
    locked_by: Option<UserId>,
    locked_at: Option<Timestamp>,
    expected_version: i32,
    actor: UserId,
    now: Timestamp,
) -> Option<Guarded<T>> {
    if let Some(holder) = blocking_holder(locked_by, locked_at, actor, now) {
        return Some(Guarded::Locked { holder });
    }
    if version != expected_version {
        return Some(Guarded::Stale);
    }
    None
}

pub trait ClassStore: Send + Sync {
    /* ---- class requests ---- */

    fn find_request(
        &self,
        id: DbId,
    ) -> impl Future<Output = Result<Option<ClassRequest>, StoreError>> + Send;

    fn insert_request(
        &self,
        input: &NewClassRequest,
    ) -> impl Future<Output = Result<ClassRequest, StoreError>> + Send;

    /// Write every mutable column of `row` if the guard holds.
    fn update_request(
        &self,
        row: &ClassRequest,
        expected_version: i32,
        claim: LockClaim,
        now: Timestamp,
    ) -> impl Future<Output = Result<Guarded<ClassRequest>, StoreError>> + Send;

    fn delete_request(
        &self,
        id: DbId,
        expected_version: i32,
        actor: UserId,
        now: Timestamp,
    ) -> impl Future<Output = Result<Guarded<()>, StoreError>> + Send;

    /// Delete without a guard. Only reconciliation uses this.
    fn purge_request(&self, id: DbId) -> impl Future<Output = Result<bool, StoreError>> + Send;

    fn release_request_lock(
        &self,
        id: DbId,
        user_id: UserId,
        force: bool,
    ) -> impl Future<Output = Result<bool, StoreError>> + Send;

    fn list_queue(
        &self,
        assignee_id: UserId,
    ) -> impl Future<Output = Result<Vec<ClassRequest>, StoreError>> + Send;

    fn list_for_educator(
        &self,
        educator_id: DbId,
    ) -> impl Future<Output = Result<Vec<ClassRequest>, StoreError>> + Send;

    /* ---- confirmed classes ---- */

    fn find_confirmed(
        &self,
        id: DbId,
    ) -> impl Future<Output = Result<Option<ConfirmedClass>, StoreError>> + Send;

    fn insert_confirmed(
        &self,
        input: &NewConfirmedClass,
    ) -> impl Future<Output = Result<ConfirmedClass, StoreError>> + Send;

    fn delete_confirmed(&self, id: DbId) -> impl Future<Output = Result<bool, StoreError>> + Send;

    fn update_confirmed(
        &self,
        row: &ConfirmedClass,
        expected_version: i32,
        claim: LockClaim,
        now: Timestamp,
    ) -> impl Future<Output = Result<Guarded<ConfirmedClass>, StoreError>> + Send;

    fn release_confirmed_lock(
        &self,
        id: DbId,
        user_id: UserId,
        force: bool,
    ) -> impl Future<Output = Result<bool, StoreError>> + Send;

    fn list_pending_bills(
        &self,
        today: Date,
    ) -> impl Future<Output = Result<Vec<ConfirmedClass>, StoreError>> + Send;

    fn list_classes_between(
        &self,
        from: Date,
        to: Date,
    ) -> impl Future<Output = Result<Vec<ConfirmedClass>, StoreError>> + Send;

    /// Confirmed classes whose source request still exists.
    fn list_promotion_leftovers(
        &self,
    ) -> impl Future<Output = Result<Vec<ConfirmedClass>, StoreError>> + Send;

    /* ---- reference data ---- */

    fn find_educator(
        &self,
        id: DbId,
    ) -> impl Future<Output = Result<Option<Educator>, StoreError>> + Send;

    fn find_site(&self, id: DbId) -> impl Future<Output = Result<Option<Site>, StoreError>> + Send;

    fn find_company(
        &self,
        id: DbId,
    ) -> impl Future<Output = Result<Option<Company>, StoreError>> + Send;

    fn find_profile(
        &self,
        id: UserId,
    ) -> impl Future<Output = Result<Option<Profile>, StoreError>> + Send;

    /* ---- promotion ---- */

    /// Create the confirmed class for `request` and delete the request.
    ///
    /// Either both happen or neither does. This default inserts first, then
    /// runs the guarded delete; if the delete does not apply, the inserted
    /// class is deleted again. When that compensation also fails the result
    /// is [`StoreError::Inconsistent`] and the leftover is picked up by
    /// reconciliation through `source_request_id`.
    fn promote_request(
        &self,
        request: &ClassRequest,
        input: &NewConfirmedClass,
        actor: UserId,
        now: Timestamp,
    ) -> impl Future<Output = Result<Guarded<ConfirmedClass>, StoreError>> + Send {
        async move {
            let class = self.insert_confirmed(input).await?;

            let rejected = match self
                .delete_request(request.id, request.version, actor, now)
                .await
            {
                Ok(Guarded::Applied(())) => return Ok(Guarded::Applied(class)),
                Ok(Guarded::Locked { holder }) => Ok(Guarded::Locked { holder }),
                Ok(Guarded::Stale) => Ok(Guarded::Stale),
                Ok(Guarded::Missing) => Ok(Guarded::Missing),
                Err(e) => Err(e),
            };

            match self.delete_confirmed(class.id).await {
                Ok(true) => rejected,
                Ok(false) => Err(inconsistent(request.id, class.id, "row vanished")),
                Err(e) => Err(inconsistent(request.id, class.id, &e.to_string())),
            }
        }
    }
}

fn inconsistent(request_id: DbId, class_id: DbId, cause: &str) -> StoreError {
    tracing::error!(
        request_id,
        confirmed_class_id = class_id,
        cause,
        "Promotion could not be undone; confirmed class left behind",
    );
    StoreError::Inconsistent(format!(
        "confirmed class {class_id} was created for request {request_id} but the request \
         could not be removed and the class could not be deleted ({cause})"
    ))
}
