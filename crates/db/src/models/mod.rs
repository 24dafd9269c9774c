//! Row structs and DTOs.
//!
//! Each submodule contains:
//! - A `FromRow` + `Serialize` entity struct matching the database row
//! - `Deserialize` input DTOs where the API accepts writes

pub mod class_request;
pub mod company;
pub mod confirmed_class;
pub mod educator;
pub mod profile;
pub mod site;
