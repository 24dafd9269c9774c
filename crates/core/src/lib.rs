//! Domain rules for class scheduling and billing.
//!
//! This crate has no I/O. The store layer, the notification composer and
//! the lifecycle manager all reference the same statuses, transitions,
//! capability table, catalog and billing rules defined here.

pub mod actor;
pub mod billing;
pub mod class_catalog;
pub mod class_request;
pub mod error;
pub mod locking;
pub mod permissions;
pub mod reminders;
pub mod roles;
pub mod types;
