//! Storage Layer - SQLite-backed persistence
//!
//! System of record is SQLite with tables:
//! - roles(name), tasks(name), events(name)
//! - users(username, role_id, creation)
//! - models(name, task_id)
//! - model_versions(model_id, creator_id, version, creation)
//! - user_log(user_id, event_id, time)

pub mod schema;
pub mod sqlite;

pub use sqlite::RegistryStore;
