//! HTTP handlers for resource CRUD, entries and greetings.

pub mod entries;
pub mod greeting;
pub mod resource;
