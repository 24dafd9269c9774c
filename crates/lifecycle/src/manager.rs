//! Class request lifecycle operations.
//!
//! Every operation takes the acting [`Actor`] explicitly and follows the
//! same order: authorize the role, re-read the record, authorize ownership,
//! look the transition up, check required fields, then apply one guarded
//! write. A rejected step leaves the record untouched.

use chrono::Utc;
use lifesafe_core::actor::Actor;
use lifesafe_core::class_catalog::{
    estimate_cost, join_class_types, total_hours, validate_class_types,
};
use lifesafe_core::class_request::{
    ensure_fields, ensure_promotable, next_status, next_target, validate_preferred_window,
    TransitionTarget, STATUS_PENDING,
};
use lifesafe_core::error::CoreError;
use lifesafe_core::locking::LockClaim;
use lifesafe_core::permissions::{authorize, authorize_role, Action, Ownership};
use lifesafe_core::roles::Role;
use lifesafe_core::types::{Date, DbId, UserId};
use lifesafe_db::models::class_request::{
    ClassRequest, CreateClassRequest, NewClassRequest, UpdateClassRequest,
};
use lifesafe_db::models::confirmed_class::{ConfirmedClass, NewConfirmedClass};
use lifesafe_db::models::educator::Educator;
use lifesafe_events::{dispatch, Composer, NoticeKind, NoticeOutcome, Notifier};
use serde::Serialize;
use validator::Validate;

use crate::config::LifecycleConfig;
use crate::error::{LifecycleError, LifecycleResult};
use crate::store::ClassStore;

pub(crate) const REQUEST: &str = "ClassRequest";
pub(crate) const CONFIRMED: &str = "ConfirmedClass";

/// A record together with the outcome of the notice sent for it.
#[derive(Debug, Clone, Serialize)]
pub struct Notified<T> {
    pub record: T,
    pub notice: NoticeOutcome,
}

/// Cost estimate for a set of class types taught by one educator.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CostEstimate {
    pub class_types: Vec<String>,
    pub educator_id: DbId,
    pub total_hours: u32,
    pub hourly_rate: f64,
    pub total: f64,
}

pub struct LifecycleManager<S, N> {
    pub(crate) store: S,
    pub(crate) notifier: N,
    pub(crate) composer: Composer,
    pub(crate) config: LifecycleConfig,
}

impl<S: ClassStore, N: Notifier> LifecycleManager<S, N> {
    pub fn new(store: S, notifier: N, composer: Composer, config: LifecycleConfig) -> Self {
        Self {
            store,
            notifier,
            composer,
            config,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    pub fn config(&self) -> &LifecycleConfig {
        &self.config
    }

    /// Resolve the acting identity for an authenticated user id. Users
    /// without a profile get the permissionless `user` role.
    pub async fn resolve_actor(&self, user_id: UserId) -> LifecycleResult<Actor> {
        Ok(match self.store.find_profile(user_id).await? {
            Some(profile) => profile.to_actor(),
            None => {
                tracing::debug!(%user_id, "No profile found, using default role");
                Actor::new(user_id, Role::User)
            }
        })
    }

    /* --------------------------------------------------------------------
    Loading helpers
    -------------------------------------------------------------------- */

    pub(crate) async fn load_request(&self, id: DbId) -> LifecycleResult<ClassRequest> {
        self.store
            .find_request(id)
            .await?
            .ok_or(LifecycleError::Core(CoreError::NotFound { entity: REQUEST, id }))
    }

    pub(crate) async fn load_class(&self, id: DbId) -> LifecycleResult<ConfirmedClass> {
        self.store
            .find_confirmed(id)
            .await?
            .ok_or(LifecycleError::Core(CoreError::NotFound {
                entity: CONFIRMED,
                id,
            }))
    }

    pub(crate) async fn load_educator(&self, id: DbId) -> LifecycleResult<Educator> {
        self.store
            .find_educator(id)
            .await?
            .ok_or(LifecycleError::Core(CoreError::NotFound {
                entity: "Educator",
                id,
            }))
    }

    async fn ensure_site(&self, site_id: Option<DbId>) -> LifecycleResult<()> {
        if let Some(id) = site_id {
            if self.store.find_site(id).await?.is_none() {
                return Err(CoreError::NotFound { entity: "Site", id }.into());
            }
        }
        Ok(())
    }

    async fn ensure_company(&self, company_id: Option<DbId>) -> LifecycleResult<()> {
        if let Some(id) = company_id {
            if self.store.find_company(id).await?.is_none() {
                return Err(CoreError::NotFound {
                    entity: "Company",
                    id,
                }
                .into());
            }
        }
        Ok(())
    }

    /// A coordinator must be a LifeSafe staff member with a profile.
    async fn ensure_coordinator(&self, user_id: UserId) -> LifecycleResult<()> {
        match self.store.find_profile(user_id).await? {
            Some(profile) if profile.role().is_staff() => Ok(()),
            Some(_) => Err(CoreError::Validation(format!(
                "coordinator_id {user_id} does not belong to a LifeSafe staff member"
            ))
            .into()),
            None => Err(CoreError::Validation(format!(
                "coordinator_id {user_id} has no profile"
            ))
            .into()),
        }
    }

    /// Apply a status-changing write and release the lock.
    async fn commit_transition(
        &self,
        actor: &Actor,
        next: ClassRequest,
        expected_version: i32,
        action: Action,
    ) -> LifecycleResult<ClassRequest> {
        let id = next.id;
        let updated = self
            .store
            .update_request(&next, expected_version, LockClaim::release(actor.user_id), Utc::now())
            .await?
            .into_result(REQUEST, id)?;

        tracing::info!(
            request_id = id,
            actor = %actor.user_id,
            action = %action,
            status = %updated.status,
            "Class request transitioned",
        );
        Ok(updated)
    }

    /* --------------------------------------------------------------------
    Create / read / edit / remove
    -------------------------------------------------------------------- */

    /// Submit a new request in `pending`, owned by the acting user.
    pub async fn create_request(
        &self,
        actor: &Actor,
        input: CreateClassRequest,
    ) -> LifecycleResult<Notified<ClassRequest>> {
        authorize_role(actor, Action::CreateRequest)?;
        input.validate()?;
        validate_class_types(&input.class_types)?;
        validate_preferred_window(input.preferred_date_start, input.preferred_date_end)?;
        self.ensure_site(input.site_id).await?;
        self.ensure_company(input.company_id).await?;

        let row = self
            .store
            .insert_request(&NewClassRequest {
                company_id: input.company_id,
                site_id: input.site_id,
                class_types: input.class_types,
                preferred_date_start: input.preferred_date_start,
                preferred_date_end: input.preferred_date_end,
                status: STATUS_PENDING.to_string(),
                coordinator_id: actor.user_id,
                notes: input.notes,
            })
            .await?;

        tracing::info!(
            request_id = row.id,
            actor = %actor.user_id,
            class_types = ?row.class_types,
            "Class request created",
        );

        let notice = match self.config.staff_inbox.as_deref() {
            None => NoticeOutcome::Skipped("No staff inbox configured".to_string()),
            Some(inbox) => {
                let company = match row.company_id {
                    Some(id) => self.store.find_company(id).await.ok().flatten().map(|c| c.name),
                    None => None,
                };
                let composed = self
                    .composer
                    .new_request(Some(inbox), &row, company.as_deref());
                dispatch(&self.notifier, NoticeKind::NewRequest, composed).await
            }
        };

        Ok(Notified { record: row, notice })
    }

    pub async fn get_request(&self, actor: &Actor, id: DbId) -> LifecycleResult<ClassRequest> {
        authorize_role(actor, Action::ViewRequest)?;
        let row = self.load_request(id).await?;
        authorize(actor, Action::ViewRequest, &request_ownership(&row))?;
        Ok(row)
    }

    /// Requests whose assignee is the acting user.
    pub async fn work_queue(&self, actor: &Actor) -> LifecycleResult<Vec<ClassRequest>> {
        authorize_role(actor, Action::ViewQueue)?;
        Ok(self.store.list_queue(actor.user_id).await?)
    }

    /// Requests assigned to the acting educator.
    pub async fn educator_offers(&self, actor: &Actor) -> LifecycleResult<Vec<ClassRequest>> {
        authorize_role(actor, Action::ViewQueue)?;
        let educator_id = actor.educator_id.ok_or_else(|| {
            CoreError::Forbidden("No educator record is linked to this user".to_string())
        })?;
        Ok(self.store.list_for_educator(educator_id).await?)
    }

    /// Change request details without changing status. Keeps the edit lock
    /// for the acting user.
    pub async fn edit_request(
        &self,
        actor: &Actor,
        id: DbId,
        input: UpdateClassRequest,
    ) -> LifecycleResult<ClassRequest> {
        authorize_role(actor, Action::EditRequest)?;
        input.validate()?;
        let row = self.load_request(id).await?;
        authorize(actor, Action::EditRequest, &request_ownership(&row))?;

        next_target(row.status()?, Action::EditRequest)?;

        let next = input.apply_to(&row);
        validate_class_types(&next.class_types)?;
        validate_preferred_window(next.preferred_date_start, next.preferred_date_end)?;
        if next.site_id != row.site_id {
            self.ensure_site(next.site_id).await?;
        }
        if next.company_id != row.company_id {
            self.ensure_company(next.company_id).await?;
        }
        if next.coordinator_id != row.coordinator_id {
            self.ensure_coordinator(next.coordinator_id).await?;
        }

        let updated = self
            .store
            .update_request(&next, input.version, LockClaim::hold(actor.user_id), Utc::now())
            .await?
            .into_result(REQUEST, id)?;

        tracing::info!(request_id = id, actor = %actor.user_id, "Class request edited");
        Ok(updated)
    }

    /// Delete a request. Only its coordinator may do this.
    pub async fn remove_request(&self, actor: &Actor, id: DbId) -> LifecycleResult<()> {
        authorize_role(actor, Action::RemoveRequest)?;
        let row = self.load_request(id).await?;
        authorize(actor, Action::RemoveRequest, &request_ownership(&row))?;
        next_target(row.status()?, Action::RemoveRequest)?;

        self.store
            .delete_request(id, row.version, actor.user_id, Utc::now())
            .await?
            .into_result(REQUEST, id)?;

        tracing::info!(request_id = id, actor = %actor.user_id, "Class request removed");
        Ok(())
    }

    /// Release the acting user's edit lock. Staff may release any lock.
    pub async fn release_request_lock(&self, actor: &Actor, id: DbId) -> LifecycleResult<bool> {
        authorize_role(actor, Action::ReleaseLock)?;
        self.load_request(id).await?;
        let released = self
            .store
            .release_request_lock(id, actor.user_id, actor.role.is_staff())
            .await?;
        if released {
            tracing::info!(request_id = id, actor = %actor.user_id, "Class request lock released");
        }
        Ok(released)
    }

    /* --------------------------------------------------------------------
    Transitions
    -------------------------------------------------------------------- */

    /// `pending` → `Confirm Educator Dates`.
    pub async fn assign_educator(
        &self,
        actor: &Actor,
        id: DbId,
        educator_id: DbId,
    ) -> LifecycleResult<ClassRequest> {
        authorize_role(actor, Action::AssignEducator)?;
        let row = self.load_request(id).await?;
        let status = next_status(row.status()?, Action::AssignEducator)?;
        self.load_educator(educator_id).await?;

        let mut next = row.clone();
        next.educator_id = Some(educator_id);
        next.status = status.as_str().to_string();
        ensure_fields(
            Action::AssignEducator.as_str(),
            status.required_fields(),
            &next.field_presence(),
        )?;

        self.commit_transition(actor, next, row.version, Action::AssignEducator)
            .await
    }

    /// `Confirm Educator Dates` → `Awaiting Date`, then send the offer to
    /// the educator. The notice outcome is returned with the request.
    pub async fn contact_educator(
        &self,
        actor: &Actor,
        id: DbId,
    ) -> LifecycleResult<Notified<ClassRequest>> {
        authorize_role(actor, Action::ContactEducator)?;
        let row = self.load_request(id).await?;
        let status = next_status(row.status()?, Action::ContactEducator)?;

        let mut next = row.clone();
        next.status = status.as_str().to_string();
        next.offer_sent_at = Some(Utc::now());
        ensure_fields(
            Action::ContactEducator.as_str(),
            status.required_fields(),
            &next.field_presence(),
        )?;

        let updated = self
            .commit_transition(actor, next, row.version, Action::ContactEducator)
            .await?;
        let notice = self.send_contact_notice(&updated).await;
        Ok(Notified {
            record: updated,
            notice,
        })
    }

    async fn send_contact_notice(&self, request: &ClassRequest) -> NoticeOutcome {
        let Some(educator_id) = request.educator_id else {
            return NoticeOutcome::Skipped("No educator assigned".to_string());
        };
        let educator = match self.store.find_educator(educator_id).await {
            Ok(Some(educator)) => educator,
            Ok(None) => return NoticeOutcome::Skipped(format!("Educator {educator_id} not found")),
            Err(e) => {
                tracing::warn!(request_id = request.id, error = %e, "Could not load educator for notice");
                return NoticeOutcome::Failed(e.to_string());
            }
        };
        let site = match request.site_id {
            Some(site_id) => self.store.find_site(site_id).await.ok().flatten(),
            None => None,
        };
        let composed = self
            .composer
            .contact_educator(&educator, request, site.as_ref());
        dispatch(&self.notifier, NoticeKind::ContactEducator, composed).await
    }

    /// `Awaiting Date` or `accepted` → `Final Confirmation`.
    ///
    /// Records the educator's response time and puts the request back in its
    /// coordinator's queue.
    pub async fn record_class_date(
        &self,
        actor: &Actor,
        id: DbId,
        class_date: Option<Date>,
    ) -> LifecycleResult<ClassRequest> {
        authorize_role(actor, Action::RecordClassDate)?;
        let row = self.load_request(id).await?;
        let status = next_status(row.status()?, Action::RecordClassDate)?;
        let class_date = class_date.ok_or_else(|| {
            CoreError::missing_fields(Action::RecordClassDate.as_str(), &["class_date"])
        })?;

        let mut next = row.clone();
        next.status = status.as_str().to_string();
        next.class_date = Some(class_date);
        next.educator_response_at = Some(Utc::now());
        next.assignee_id = Some(row.coordinator_id);
        ensure_fields(
            Action::RecordClassDate.as_str(),
            status.required_fields(),
            &next.field_presence(),
        )?;

        self.commit_transition(actor, next, row.version, Action::RecordClassDate)
            .await
    }

    /// The assigned educator accepts the offer.
    pub async fn accept_offer(&self, actor: &Actor, id: DbId) -> LifecycleResult<ClassRequest> {
        authorize_role(actor, Action::AcceptOffer)?;
        let row = self.load_request(id).await?;
        authorize(actor, Action::AcceptOffer, &request_ownership(&row))?;
        let status = next_status(row.status()?, Action::AcceptOffer)?;

        let mut next = row.clone();
        next.status = status.as_str().to_string();
        next.educator_response_at = Some(Utc::now());
        ensure_fields(
            Action::AcceptOffer.as_str(),
            status.required_fields(),
            &next.field_presence(),
        )?;

        self.commit_transition(actor, next, row.version, Action::AcceptOffer)
            .await
    }

    /// The assigned educator declines; the request goes back to `pending`
    /// without an educator.
    pub async fn decline_offer(&self, actor: &Actor, id: DbId) -> LifecycleResult<ClassRequest> {
        authorize_role(actor, Action::DeclineOffer)?;
        let row = self.load_request(id).await?;
        authorize(actor, Action::DeclineOffer, &request_ownership(&row))?;
        let status = next_status(row.status()?, Action::DeclineOffer)?;

        let mut next = row.clone();
        next.status = status.as_str().to_string();
        next.educator_id = None;
        next.offer_sent_at = None;
        next.educator_response_at = Some(Utc::now());

        let declined_by = row.educator_id;
        let updated = self
            .commit_transition(actor, next, row.version, Action::DeclineOffer)
            .await?;
        tracing::info!(request_id = id, educator_id = ?declined_by, "Offer declined");
        Ok(updated)
    }

    /// `Final Confirmation` → confirmed class. The request row is consumed.
    pub async fn confirm_class(&self, actor: &Actor, id: DbId) -> LifecycleResult<ConfirmedClass> {
        authorize_role(actor, Action::Promote)?;
        let row = self.load_request(id).await?;
        let status = row.status()?;
        match next_target(status, Action::Promote)? {
            TransitionTarget::Promoted => {}
            other => {
                return Err(CoreError::Internal(format!(
                    "Promotion from '{status}' resolved to {other:?}"
                ))
                .into())
            }
        }
        ensure_promotable(&row.field_presence())?;

        let (Some(site_id), Some(date_of_class)) = (row.site_id, row.class_date) else {
            return Err(CoreError::Internal("Promotable request lacks site or date".into()).into());
        };
        let input = NewConfirmedClass {
            site_id,
            educator_id: row.educator_id,
            subjects: join_class_types(&row.class_types),
            date_of_class,
            coordinator_id: Some(row.coordinator_id),
            notes: row.notes.clone(),
            source_request_id: Some(row.id),
        };

        let class = self
            .store
            .promote_request(&row, &input, actor.user_id, Utc::now())
            .await?
            .into_result(REQUEST, id)?;

        tracing::info!(
            request_id = id,
            confirmed_class_id = class.id,
            actor = %actor.user_id,
            date_of_class = %class.date_of_class,
            "Class request promoted",
        );
        Ok(class)
    }

    /* --------------------------------------------------------------------
    Estimate
    -------------------------------------------------------------------- */

    /// Total catalog hours times the educator's hourly rate.
    pub async fn estimate_cost(
        &self,
        actor: &Actor,
        class_types: Vec<String>,
        educator_id: DbId,
    ) -> LifecycleResult<CostEstimate> {
        authorize_role(actor, Action::EstimateCost)?;
        validate_class_types(&class_types)?;
        let educator = self.load_educator(educator_id).await?;
        let rate = educator.rate1.ok_or_else(|| {
            CoreError::Validation(format!("Educator {educator_id} has no hourly rate"))
        })?;

        Ok(CostEstimate {
            total_hours: total_hours(&class_types)?,
            total: estimate_cost(&class_types, rate)?,
            hourly_rate: rate,
            educator_id,
            class_types,
        })
    }
}

pub(crate) fn request_ownership(row: &ClassRequest) -> Ownership {
    Ownership {
        coordinator_id: Some(row.coordinator_id),
        educator_id: row.educator_id,
    }
}

pub(crate) fn class_ownership(row: &ConfirmedClass) -> Ownership {
    Ownership {
        coordinator_id: row.coordinator_id,
        educator_id: row.educator_id,
    }
}
