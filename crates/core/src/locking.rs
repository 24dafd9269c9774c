//! Record edit locks shared by class requests and confirmed classes.
//!
//! A record carries `locked_by_user_id` and `locked_at`. A write is allowed
//! only when the record is unlocked, locked by the writer, or the lock is
//! older than [`LOCK_TTL_MINS`]. The write then either keeps the lock for the
//! writer ([`LockMode::Hold`]) or clears it ([`LockMode::Release`]) in the
//! same statement as the field update.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::{Timestamp, UserId};

/// Locks older than this many minutes are stale and no longer block writers.
pub const LOCK_TTL_MINS: i64 = 30;

/// What a guarded write does with the record's lock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LockMode {
    /// Field edits: the writer keeps holding the lock.
    Hold,
    /// Lifecycle transitions: the lock is cleared.
    Release,
}

/// A writer's claim on a record for one guarded write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockClaim {
    pub actor: UserId,
    pub mode: LockMode,
}

impl LockClaim {
    pub fn hold(actor: UserId) -> Self {
        Self {
            actor,
            mode: LockMode::Hold,
        }
    }

    pub fn release(actor: UserId) -> Self {
        Self {
            actor,
            mode: LockMode::Release,
        }
    }

    /// Lock columns to write alongside the field update.
    pub fn lock_fields(&self, now: Timestamp) -> (Option<UserId>, Option<Timestamp>) {
        match self.mode {
            LockMode::Hold => (Some(self.actor), Some(now)),
            LockMode::Release => (None, None),
        }
    }
}

/// Return the holder that blocks `actor` from writing, if any.
///
/// A lock without a timestamp never expires.
pub fn blocking_holder(
    locked_by: Option<UserId>,
    locked_at: Option<Timestamp>,
    actor: UserId,
    now: Timestamp,
) -> Option<UserId> {
    let holder = locked_by?;
    if holder == actor {
        return None;
    }
    match locked_at {
        Some(at) if now - at >= chrono::Duration::minutes(LOCK_TTL_MINS) => None,
        _ => Some(holder),
    }
}

pub fn lock_conflict(entity: &str, holder: UserId) -> CoreError {
    CoreError::Conflict(format!("This {entity} is currently locked by user {holder}"))
}

pub fn stale_conflict(entity: &str) -> CoreError {
    CoreError::Conflict(format!(
        "This {entity} was modified by someone else; reload and try again"
    ))
}
