//! Upcoming-class reminders to educators and sites.

use chrono::Utc;
use lifesafe_core::actor::Actor;
use lifesafe_core::permissions::{authorize_role, Action};
use lifesafe_core::reminders::reminder_window;
use lifesafe_core::types::DbId;
use lifesafe_db::models::confirmed_class::ConfirmedClass;
use lifesafe_events::{
    dispatch, NoticeKind, NoticeOutcome, Notifier, NotifyError, OutboundEmail,
};
use serde::Serialize;

use crate::error::LifecycleResult;
use crate::manager::LifecycleManager;
use crate::store::ClassStore;

/// Rendered reminders for one class. A side is `None` when it has no
/// recipient address.
#[derive(Debug, Clone, Serialize)]
pub struct ReminderPreview {
    pub class: ConfirmedClass,
    pub educator: Option<OutboundEmail>,
    pub site: Option<OutboundEmail>,
}

/// Per-recipient outcome of sending reminders for one class.
#[derive(Debug, Clone, Serialize)]
pub struct ReminderReport {
    pub confirmed_class_id: DbId,
    pub educator: NoticeOutcome,
    pub site: NoticeOutcome,
}

struct Composed {
    educator: Result<OutboundEmail, NotifyError>,
    site: Result<OutboundEmail, NotifyError>,
}

impl<S: ClassStore, N: Notifier> LifecycleManager<S, N> {
    /// Confirmed classes from today through the lookahead window.
    pub async fn upcoming_classes(&self, actor: &Actor) -> LifecycleResult<Vec<ConfirmedClass>> {
        authorize_role(actor, Action::SendClassReminder)?;
        let (from, to) = reminder_window(Utc::now().date_naive());
        Ok(self.store.list_classes_between(from, to).await?)
    }

    async fn compose_reminders(&self, class: &ConfirmedClass) -> LifecycleResult<Composed> {
        let educator = match class.educator_id {
            Some(id) => self.store.find_educator(id).await?,
            None => None,
        };
        let site = self.store.find_site(class.site_id).await?;

        Ok(Composed {
            educator: match &educator {
                Some(educator) => self.composer.educator_reminder(educator, class),
                None => Err(NotifyError::MissingRecipient(NoticeKind::EducatorReminder)),
            },
            site: match &site {
                Some(site) => self.composer.site_reminder(site, class),
                None => Err(NotifyError::MissingRecipient(NoticeKind::SiteReminder)),
            },
        })
    }

    pub async fn preview_class_reminder(
        &self,
        actor: &Actor,
        id: DbId,
    ) -> LifecycleResult<ReminderPreview> {
        authorize_role(actor, Action::SendClassReminder)?;
        let class = self.load_class(id).await?;
        let composed = self.compose_reminders(&class).await?;
        Ok(ReminderPreview {
            educator: composed.educator.ok(),
            site: composed.site.ok(),
            class,
        })
    }

    /// Send the educator and site reminders for one class.
    pub async fn send_class_reminder(
        &self,
        actor: &Actor,
        id: DbId,
    ) -> LifecycleResult<ReminderReport> {
        authorize_role(actor, Action::SendClassReminder)?;
        let class = self.load_class(id).await?;
        let composed = self.compose_reminders(&class).await?;

        let educator =
            dispatch(&self.notifier, NoticeKind::EducatorReminder, composed.educator).await;
        let site = dispatch(&self.notifier, NoticeKind::SiteReminder, composed.site).await;

        tracing::info!(
            confirmed_class_id = id,
            actor = %actor.user_id,
            educator = ?educator,
            site = ?site,
            "Class reminders processed",
        );
        Ok(ReminderReport {
            confirmed_class_id: id,
            educator,
            site,
        })
    }
}
