//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods that
//! accept `&PgPool` as the first argument.
//!
//! Writes to class requests and confirmed classes are guarded: they match
//! only when the stored `version` equals the version the caller read and no
//! other user holds a live edit lock. A guarded write that matches nothing
//! returns `None` / `false`; the caller re-reads to find out why.

pub mod class_request_repo;
pub mod company_repo;
pub mod confirmed_class_repo;
pub mod educator_repo;
pub mod profile_repo;
pub mod site_repo;

pub use class_request_repo::ClassRequestRepo;
pub use company_repo::CompanyRepo;
pub use confirmed_class_repo::ConfirmedClassRepo;
pub use educator_repo::EducatorRepo;
pub use profile_repo::ProfileRepo;
pub use site_repo::SiteRepo;

use lifesafe_core::locking::LOCK_TTL_MINS;
use lifesafe_core::types::Timestamp;

/// Locks taken before this instant no longer block writers.
pub(crate) fn stale_before(now: Timestamp) -> Timestamp {
    now - chrono::Duration::minutes(LOCK_TTL_MINS)
}
