//! Completion of interrupted promotions.
//!
//! A promotion that created its confirmed class but could not remove the
//! source request leaves both rows behind. The confirmed class carries
//! `source_request_id`, so the leftover request can be found and removed.

use lifesafe_core::actor::Actor;
use lifesafe_core::permissions::{authorize_role, Action};
use lifesafe_core::types::DbId;
use lifesafe_events::Notifier;
use serde::Serialize;

use crate::error::LifecycleResult;
use crate::manager::LifecycleManager;
use crate::store::ClassStore;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileReport {
    /// Requests that were already promoted but still exist.
    pub leftover_request_ids: Vec<DbId>,
    /// Leftover requests deleted by this run.
    pub repaired_request_ids: Vec<DbId>,
}

impl<S: ClassStore, N: Notifier> LifecycleManager<S, N> {
    /// Find leftover promoted requests and, with `repair`, delete them.
    pub async fn reconcile(&self, repair: bool) -> LifecycleResult<ReconcileReport> {
        let leftovers = self.store.list_promotion_leftovers().await?;
        let mut report = ReconcileReport::default();

        for class in leftovers {
            let Some(request_id) = class.source_request_id else {
                continue;
            };
            tracing::warn!(
                request_id,
                confirmed_class_id = class.id,
                "Promoted request still present",
            );
            report.leftover_request_ids.push(request_id);

            if repair && self.store.purge_request(request_id).await? {
                tracing::info!(request_id, confirmed_class_id = class.id, "Promotion completed");
                report.repaired_request_ids.push(request_id);
            }
        }

        if !report.leftover_request_ids.is_empty() {
            tracing::warn!(
                leftovers = report.leftover_request_ids.len(),
                repaired = report.repaired_request_ids.len(),
                "Reconciliation finished",
            );
        }
        Ok(report)
    }

    /// Staff-triggered reconciliation.
    pub async fn reconcile_as(&self, actor: &Actor, repair: bool) -> LifecycleResult<ReconcileReport> {
        authorize_role(actor, Action::Reconcile)?;
        tracing::info!(actor = %actor.user_id, repair, "Reconciliation requested");
        self.reconcile(repair).await
    }
}
