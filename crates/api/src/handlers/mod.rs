pub mod admin;
pub mod class_requests;
pub mod confirmed_classes;
