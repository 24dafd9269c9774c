//! Outbound notifications for the class lifecycle.
//!
//! - [`Composer`] renders notices (new request, educator contact, class
//!   reminders, roster reminder) into [`OutboundEmail`]s.
//! - [`Notifier`] is the delivery seam; [`Mailer`] implements it over SMTP
//!   or as a disabled sink.
//! - [`delivery`] holds the `lettre` SMTP transport.

pub mod composer;
pub mod delivery;
pub mod notifier;

pub use composer::{escape_html, Composer, NoticeKind, OutboundEmail, ROSTER_REMINDER_SUBJECT};
pub use delivery::email::{EmailConfig, EmailDelivery, EmailError};
pub use notifier::{dispatch, Mailer, NoticeOutcome, Notifier, NotifyError};
