//! Postgres-backed [`ClassStore`].

use lifesafe_core::locking::LockClaim;
use lifesafe_core::types::{Date, DbId, Timestamp, UserId};
use lifesafe_db::models::class_request::{ClassRequest, NewClassRequest};
use lifesafe_db::models::company::Company;
use lifesafe_db::models::confirmed_class::{ConfirmedClass, NewConfirmedClass};
use lifesafe_db::models::educator::Educator;
use lifesafe_db::models::profile::Profile;
use lifesafe_db::models::site::Site;
use lifesafe_db::repositories::{
    ClassRequestRepo, CompanyRepo, ConfirmedClassRepo, EducatorRepo, ProfileRepo, SiteRepo,
};
use lifesafe_db::DbPool;

use super::{guard_rejection, ClassStore, Guarded};
use crate::error::StoreError;

/// [`ClassStore`] over the `lifesafe_db` repositories.
///
/// Promotion runs in a single transaction instead of the compensating
/// default.
#[derive(Clone)]
pub struct PgClassStore {
    pool: DbPool,
}

impl PgClassStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }

    /// Re-read a request whose guarded write matched nothing to find out why.
    async fn explain_request_rejection<T>(
        &self,
        id: DbId,
        expected_version: i32,
        actor: UserId,
        now: Timestamp,
    ) -> Result<Guarded<T>, StoreError> {
        Ok(match ClassRequestRepo::find_by_id(&self.pool, id).await? {
            None => Guarded::Missing,
            Some(row) => guard_rejection(
                row.version,
                row.locked_by_user_id,
                row.locked_at,
                expected_version,
                actor,
                now,
            )
            // Matched nothing yet passes on re-read: it changed in between.
            .unwrap_or(Guarded::Stale),
        })
    }

    async fn explain_class_rejection<T>(
        &self,
        id: DbId,
        expected_version: i32,
        actor: UserId,
        now: Timestamp,
    ) -> Result<Guarded<T>, StoreError> {
        Ok(match ConfirmedClassRepo::find_by_id(&self.pool, id).await? {
            None => Guarded::Missing,
            Some(row) => guard_rejection(
                row.version,
                row.locked_by_user_id,
                row.locked_at,
                expected_version,
                actor,
                now,
            )
            .unwrap_or(Guarded::Stale),
        })
    }
}

impl ClassStore for PgClassStore {
    async fn find_request(&self, id: DbId) -> Result<Option<ClassRequest>, StoreError> {
        Ok(ClassRequestRepo::find_by_id(&self.pool, id).await?)
    }

    async fn insert_request(&self, input: &NewClassRequest) -> Result<ClassRequest, StoreError> {
        Ok(ClassRequestRepo::create(&self.pool, input).await?)
    }

    async fn update_request(
        &self,
        row: &ClassRequest,
        expected_version: i32,
        claim: LockClaim,
        now: Timestamp,
    ) -> Result<Guarded<ClassRequest>, StoreError> {
        match ClassRequestRepo::update_guarded(&self.pool, row, expected_version, claim, now).await? {
            Some(updated) => Ok(Guarded::Applied(updated)),
            None => {
                self.explain_request_rejection(row.id, expected_version, claim.actor, now)
                    .await
            }
        }
    }

    async fn delete_request(
        &self,
        id: DbId,
        expected_version: i32,
        actor: UserId,
        now: Timestamp,
    ) -> Result<Guarded<()>, StoreError> {
        if ClassRequestRepo::delete_guarded(&self.pool, id, expected_version, actor, now).await? {
            Ok(Guarded::Applied(()))
        } else {
            self.explain_request_rejection(id, expected_version, actor, now)
                .await
        }
    }

    async fn purge_request(&self, id: DbId) -> Result<bool, StoreError> {
        Ok(ClassRequestRepo::delete(&self.pool, id).await?)
    }

    async fn release_request_lock(
        &self,
        id: DbId,
        user_id: UserId,
        force: bool,
    ) -> Result<bool, StoreError> {
        Ok(ClassRequestRepo::release_lock(&self.pool, id, user_id, force).await?)
    }

    async fn list_queue(&self, assignee_id: UserId) -> Result<Vec<ClassRequest>, StoreError> {
        Ok(ClassRequestRepo::list_by_assignee(&self.pool, assignee_id).await?)
    }

    async fn list_for_educator(&self, educator_id: DbId) -> Result<Vec<ClassRequest>, StoreError> {
        Ok(ClassRequestRepo::list_by_educator(&self.pool, educator_id).await?)
    }

    async fn find_confirmed(&self, id: DbId) -> Result<Option<ConfirmedClass>, StoreError> {
        Ok(ConfirmedClassRepo::find_by_id(&self.pool, id).await?)
    }

    async fn insert_confirmed(
        &self,
        input: &NewConfirmedClass,
    ) -> Result<ConfirmedClass, StoreError> {
        Ok(ConfirmedClassRepo::create(&self.pool, input).await?)
    }

    async fn delete_confirmed(&self, id: DbId) -> Result<bool, StoreError> {
        Ok(ConfirmedClassRepo::delete(&self.pool, id).await?)
    }

    async fn update_confirmed(
        &self,
        row: &ConfirmedClass,
        expected_version: i32,
        claim: LockClaim,
        now: Timestamp,
    ) -> Result<Guarded<ConfirmedClass>, StoreError> {
        match ConfirmedClassRepo::update_guarded(&self.pool, row, expected_version, claim, now)
            .await?
        {
            Some(updated) => Ok(Guarded::Applied(updated)),
            None => {
                self.explain_class_rejection(row.id, expected_version, claim.actor, now)
                    .await
            }
        }
    }

    async fn release_confirmed_lock(
        &self,
        id: DbId,
        user_id: UserId,
        force: bool,
    ) -> Result<bool, StoreError> {
        Ok(ConfirmedClassRepo::release_lock(&self.pool, id, user_id, force).await?)
    }

    async fn list_pending_bills(&self, today: Date) -> Result<Vec<ConfirmedClass>, StoreError> {
        Ok(ConfirmedClassRepo::list_pending_bills(&self.pool, today).await?)
    }

    async fn list_classes_between(
        &self,
        from: Date,
        to: Date,
    ) -> Result<Vec<ConfirmedClass>, StoreError> {
        Ok(ConfirmedClassRepo::list_between(&self.pool, from, to).await?)
    }

    async fn list_promotion_leftovers(&self) -> Result<Vec<ConfirmedClass>, StoreError> {
        Ok(ConfirmedClassRepo::list_with_live_source(&self.pool).await?)
    }

    async fn find_educator(&self, id: DbId) -> Result<Option<Educator>, StoreError> {
        Ok(EducatorRepo::find_by_id(&self.pool, id).await?)
    }

    async fn find_site(&self, id: DbId) -> Result<Option<Site>, StoreError> {
        Ok(SiteRepo::find_by_id(&self.pool, id).await?)
    }

    async fn find_company(&self, id: DbId) -> Result<Option<Company>, StoreError> {
        Ok(CompanyRepo::find_by_id(&self.pool, id).await?)
    }

    async fn find_profile(&self, id: UserId) -> Result<Option<Profile>, StoreError> {
        Ok(ProfileRepo::find_by_id(&self.pool, id).await?)
    }

    async fn promote_request(
        &self,
        request: &ClassRequest,
        input: &NewConfirmedClass,
        actor: UserId,
        now: Timestamp,
    ) -> Result<Guarded<ConfirmedClass>, StoreError> {
        match ConfirmedClassRepo::promote(&self.pool, input, request.id, request.version, actor, now)
            .await?
        {
            Some(class) => Ok(Guarded::Applied(class)),
            None => {
                self.explain_request_rejection(request.id, request.version, actor, now)
                    .await
            }
        }
    }
}
