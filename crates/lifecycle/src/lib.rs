//! Class request lifecycle, billing and reminders.
//!
//! [`LifecycleManager`] is the only writer of class requests and confirmed
//! classes. It authorizes the acting user, re-reads the record, consults the
//! transition table in `lifesafe_core`, and applies a guarded write through a
//! [`ClassStore`]. Notices go out through a [`lifesafe_events::Notifier`] and
//! never undo the write they accompany.

pub mod billing;
pub mod config;
pub mod error;
pub mod manager;
pub mod reconcile;
pub mod reminders;
pub mod store;

pub use config::LifecycleConfig;
pub use error::{LifecycleError, LifecycleResult, StoreError};
pub use manager::{CostEstimate, LifecycleManager, Notified};
pub use reconcile::ReconcileReport;
pub use reminders::{ReminderPreview, ReminderReport};
pub use store::memory::{FailPoint, MemoryStore};
pub use store::pg::PgClassStore;
pub use store::{ClassStore, Guarded};
