//! Registry entity types and operation outcomes
//!
//! The registry tracks six entity kinds plus an append-only activity log:
//! - `Role`: named permission group, referenced by users
//! - `User`: account with one role
//! - `Task`: problem family (e.g. "cv"), referenced by models
//! - `Model`: named model bound to one task
//! - `ModelVersion`: labelled version of a model, authored by a user
//! - `Event`: named activity kind, referenced by user log entries

use serde::{Deserialize, Serialize};

/// The kinds of rows the registry can resolve by natural key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Role,
    User,
    Task,
    Model,
    ModelVersion,
    Event,
    UserLog,
}

impl EntityKind {
    /// Get the string representation of the entity kind
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Role => "role",
            EntityKind::User => "user",
            EntityKind::Task => "task",
            EntityKind::Model => "model",
            EntityKind::ModelVersion => "model_version",
            EntityKind::Event => "event",
            EntityKind::UserLog => "user_log",
        }
    }

    /// Backing table for this kind
    pub fn table(&self) -> &'static str {
        match self {
            EntityKind::Role => "roles",
            EntityKind::User => "users",
            EntityKind::Task => "tasks",
            EntityKind::Model => "models",
            EntityKind::ModelVersion => "model_versions",
            EntityKind::Event => "events",
            EntityKind::UserLog => "user_log",
        }
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// What an `add_*` call did to the stored state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// A new row was inserted
    Created,
    /// The natural key was already present; nothing changed
    AlreadyExists,
}

impl Outcome {
    pub fn is_created(&self) -> bool {
        matches!(self, Outcome::Created)
    }
}

/// Result of a successful `add_*` operation.
///
/// `name` is the natural key that was added. For model versions it is
/// `model:version`, for log entries `username:event`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddResult {
    pub kind: EntityKind,
    pub name: String,
    pub outcome: Outcome,
}

impl AddResult {
    pub fn created(kind: EntityKind, name: impl Into<String>) -> Self {
        Self { kind, name: name.into(), outcome: Outcome::Created }
    }

    pub fn already_exists(kind: EntityKind, name: impl Into<String>) -> Self {
        Self { kind, name: name.into(), outcome: Outcome::AlreadyExists }
    }

    pub fn is_created(&self) -> bool {
        self.outcome.is_created()
    }

    /// Human readable summary, e.g. "Role admin added successfully."
    pub fn message(&self) -> String {
        let label = match self.kind {
            EntityKind::ModelVersion => "Model version",
            EntityKind::UserLog => "Log entry",
            EntityKind::Role => "Role",
            EntityKind::User => "User",
            EntityKind::Task => "Task",
            EntityKind::Model => "Model",
            EntityKind::Event => "Event",
        };
        match self.outcome {
            Outcome::Created => format!("{} {} added successfully.", label, self.name),
            Outcome::AlreadyExists => format!("{} {} already exists.", label, self.name),
        }
    }
}

/// A user joined with its role name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserView {
    pub username: String,
    pub role: String,
}

/// A model joined with its task name, at a specific version
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelView {
    pub model: String,
    pub task: String,
    pub version: String,
}

/// Row counts per table
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryStats {
    pub roles: usize,
    pub users: usize,
    pub tasks: usize,
    pub models: usize,
    pub model_versions: usize,
    pub events: usize,
    pub user_log: usize,
}

impl RegistryStats {
    /// (label, count) pairs in display order
    pub fn rows(&self) -> [(&'static str, usize); 7] {
        [
            ("Roles", self.roles),
            ("Users", self.users),
            ("Tasks", self.tasks),
            ("Models", self.models),
            ("Model versions", self.model_versions),
            ("Events", self.events),
            ("User log", self.user_log),
        ]
    }
}

impl std::fmt::Display for RegistryStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Registry Statistics:")?;
        for (label, count) in self.rows() {
            writeln!(f, "  {}: {}", label, count)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_result_message() {
        let res = AddResult::created(EntityKind::Role, "admin");
        assert_eq!(res.message(), "Role admin added successfully.");

        let res = AddResult::already_exists(EntityKind::Model, "resnet");
        assert_eq!(res.message(), "Model resnet already exists.");
        assert!(!res.is_created());
    }

    #[test]
    fn test_outcome_serializes_snake_case() {
        let res = AddResult::already_exists(EntityKind::ModelVersion, "resnet:v1");
        let json = serde_json::to_value(&res).unwrap();
        assert_eq!(json["outcome"], "already_exists");
        assert_eq!(json["kind"], "model_version");
    }

    #[test]
    fn test_stats_display() {
        let stats = RegistryStats { roles: 2, ..Default::default() };
        let text = stats.to_string();
        assert!(text.contains("Roles: 2"));
        assert!(text.contains("User log: 0"));
    }
}
