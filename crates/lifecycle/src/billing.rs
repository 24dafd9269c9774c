//! Billing operations on confirmed classes.

use chrono::Utc;
use lifesafe_core::actor::Actor;
use lifesafe_core::billing::{
    ensure_class_held, ensure_not_billed, ensure_roster_missing, validate_billing_fields,
    validate_review,
};
use lifesafe_core::locking::LockClaim;
use lifesafe_core::permissions::{authorize, authorize_role, Action};
use lifesafe_core::types::DbId;
use lifesafe_db::models::confirmed_class::{ConfirmedClass, SubmitReview, UpdateBilling};
use lifesafe_events::{dispatch, NoticeKind, NoticeOutcome, Notifier};
use validator::Validate;

use crate::error::LifecycleResult;
use crate::manager::{class_ownership, LifecycleManager, CONFIRMED};
use crate::store::ClassStore;

impl<S: ClassStore, N: Notifier> LifecycleManager<S, N> {
    pub async fn get_class(&self, actor: &Actor, id: DbId) -> LifecycleResult<ConfirmedClass> {
        authorize_role(actor, Action::ViewRequest)?;
        let class = self.load_class(id).await?;
        authorize(actor, Action::ViewRequest, &class_ownership(&class))?;
        Ok(class)
    }

    /// Classes that have taken place and have not been billed.
    pub async fn pending_bills(&self, actor: &Actor) -> LifecycleResult<Vec<ConfirmedClass>> {
        authorize_role(actor, Action::MarkBilled)?;
        let today = Utc::now().date_naive();
        Ok(self.store.list_pending_bills(today).await?)
    }

    /// Edit billing figures. Keeps the edit lock for the acting user.
    pub async fn update_billing(
        &self,
        actor: &Actor,
        id: DbId,
        input: UpdateBilling,
    ) -> LifecycleResult<ConfirmedClass> {
        authorize_role(actor, Action::UpdateBilling)?;
        input.validate()?;
        validate_billing_fields(input.student_count, input.billable, input.hours, input.expenses)?;
        let class = self.load_class(id).await?;
        ensure_not_billed(class.bill_date)?;

        let next = input.apply_to(&class);
        let updated = self
            .store
            .update_confirmed(&next, input.version, LockClaim::hold(actor.user_id), Utc::now())
            .await?
            .into_result(CONFIRMED, id)?;

        tracing::info!(confirmed_class_id = id, actor = %actor.user_id, "Billing updated");
        Ok(updated)
    }

    /// Stamp the bill date. A class is billed at most once.
    pub async fn mark_billed(&self, actor: &Actor, id: DbId) -> LifecycleResult<ConfirmedClass> {
        authorize_role(actor, Action::MarkBilled)?;
        let class = self.load_class(id).await?;
        ensure_not_billed(class.bill_date)?;
        let now = Utc::now();
        ensure_class_held(class.date_of_class, now.date_naive())?;

        let mut next = class.clone();
        next.bill_date = Some(now);
        let updated = self
            .store
            .update_confirmed(&next, class.version, LockClaim::release(actor.user_id), now)
            .await?
            .into_result(CONFIRMED, id)?;

        tracing::info!(confirmed_class_id = id, actor = %actor.user_id, "Class billed");
        Ok(updated)
    }

    /// Ask the educator for the roster while the student count is missing.
    pub async fn send_roster_reminder(
        &self,
        actor: &Actor,
        id: DbId,
    ) -> LifecycleResult<NoticeOutcome> {
        authorize_role(actor, Action::SendRosterReminder)?;
        let class = self.load_class(id).await?;
        ensure_roster_missing(class.student_count)?;

        let Some(educator_id) = class.educator_id else {
            return Ok(NoticeOutcome::Skipped("Class has no educator".to_string()));
        };
        let Some(educator) = self.store.find_educator(educator_id).await? else {
            return Ok(NoticeOutcome::Skipped(format!(
                "Educator {educator_id} not found"
            )));
        };
        let site = self.store.find_site(class.site_id).await?;

        let composed = self
            .composer
            .roster_reminder(&educator, &class, site.as_ref());
        let outcome = dispatch(&self.notifier, NoticeKind::RosterReminder, composed).await;
        tracing::info!(confirmed_class_id = id, actor = %actor.user_id, outcome = ?outcome, "Roster reminder processed");
        Ok(outcome)
    }

    /// Record a post-class review from the requesting client.
    pub async fn submit_review(
        &self,
        actor: &Actor,
        id: DbId,
        input: SubmitReview,
    ) -> LifecycleResult<ConfirmedClass> {
        authorize_role(actor, Action::SubmitReview)?;
        let review = input.review.trim();
        validate_review(review)?;
        let class = self.load_class(id).await?;
        authorize(actor, Action::SubmitReview, &class_ownership(&class))?;

        let mut next = class.clone();
        next.review = Some(review.to_string());
        let updated = self
            .store
            .update_confirmed(&next, input.version, LockClaim::release(actor.user_id), Utc::now())
            .await?
            .into_result(CONFIRMED, id)?;

        tracing::info!(confirmed_class_id = id, actor = %actor.user_id, "Review submitted");
        Ok(updated)
    }

    pub async fn release_class_lock(&self, actor: &Actor, id: DbId) -> LifecycleResult<bool> {
        authorize_role(actor, Action::ReleaseLock)?;
        self.load_class(id).await?;
        let released = self
            .store
            .release_confirmed_lock(id, actor.user_id, actor.role.is_staff())
            .await?;
        if released {
            tracing::info!(confirmed_class_id = id, actor = %actor.user_id, "Confirmed class lock released");
        }
        Ok(released)
    }
}
