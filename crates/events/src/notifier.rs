//! The delivery seam used by the lifecycle manager.

use std::future::Future;

use serde::Serialize;

use crate::composer::{NoticeKind, OutboundEmail};
use crate::delivery::email::{EmailConfig, EmailDelivery, EmailError};

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error(transparent)]
    Email(#[from] EmailError),

    #[error("No email address on file for {0} notice")]
    MissingRecipient(NoticeKind),

    #[error("Email delivery is not configured")]
    NotConfigured,
}

/// Sends rendered notices.
pub trait Notifier: Send + Sync {
    fn send(&self, email: &OutboundEmail) -> impl Future<Output = Result<(), NotifyError>> + Send;
}

/// The production notifier: SMTP when configured, otherwise disabled.
pub enum Mailer {
    Smtp(EmailDelivery),
    Disabled,
}

impl Mailer {
    /// Build from `SMTP_*` variables. Falls back to [`Mailer::Disabled`] when
    /// `SMTP_HOST` is unset.
    pub fn from_env() -> Self {
        match EmailConfig::from_env() {
            Some(config) => {
                tracing::info!(host = %config.smtp_host, port = config.smtp_port, "Email delivery enabled");
                Self::Smtp(EmailDelivery::new(config))
            }
            None => {
                tracing::info!("SMTP_HOST not set, email delivery disabled");
                Self::Disabled
            }
        }
    }

    pub fn is_enabled(&self) -> bool {
        matches!(self, Self::Smtp(_))
    }
}

impl Notifier for Mailer {
    async fn send(&self, email: &OutboundEmail) -> Result<(), NotifyError> {
        match self {
            Self::Smtp(delivery) => Ok(delivery.deliver(email).await?),
            Self::Disabled => Err(NotifyError::NotConfigured),
        }
    }
}

/// What happened to a notice attached to an operation.
///
/// Delivery never rolls back the operation; the outcome is reported next to
/// its result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum NoticeOutcome {
    Sent,
    Failed(String),
    Skipped(String),
}

/// Send a composed notice and report the outcome.
///
/// A notice that could not be composed (no recipient) or that has nowhere to
/// go (mailer disabled) is skipped; a delivery error is a failure. Both are
/// logged at `warn`.
pub async fn dispatch<N: Notifier>(
    notifier: &N,
    kind: NoticeKind,
    composed: Result<OutboundEmail, NotifyError>,
) -> NoticeOutcome {
    let email = match composed {
        Ok(email) => email,
        Err(e) => {
            tracing::warn!(notice = %kind, error = %e, "Notice skipped");
            return NoticeOutcome::Skipped(e.to_string());
        }
    };

    match notifier.send(&email).await {
        Ok(()) => {
            tracing::debug!(notice = %kind, to = %email.to, "Notice delivered");
            NoticeOutcome::Sent
        }
        Err(NotifyError::NotConfigured) => {
            tracing::warn!(notice = %kind, to = %email.to, "Notice skipped, email not configured");
            NoticeOutcome::Skipped(NotifyError::NotConfigured.to_string())
        }
        Err(e) => {
            tracing::warn!(notice = %kind, to = %email.to, error = %e, "Notice delivery failed");
            NoticeOutcome::Failed(e.to_string())
        }
    }
}
