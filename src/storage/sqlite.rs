//! SQLite storage implementation

use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Transaction, TransactionBehavior};
use tracing::{debug, warn};

use super::schema;
use crate::config::DEFAULT_BUSY_TIMEOUT_MS;
use crate::entity::{AddResult, EntityKind, ModelView, RegistryStats, UserView};
use crate::{Error, Result};

/// SQLite-backed model registry.
///
/// Every mutating operation runs in its own `BEGIN IMMEDIATE` transaction, so
/// the resolve/check/insert sequence is a single critical section against any
/// other connection to the same database file. The connection sits behind a
/// `Mutex` so one store can be shared between threads.
pub struct RegistryStore {
    conn: Mutex<Connection>,
}

impl RegistryStore {
    /// Open a database file (creates if doesn't exist)
    pub fn open(path: &Path) -> Result<Self> {
        Self::open_with_timeout(path, Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))
    }

    /// Open a database file, waiting up to `busy_timeout` for competing writers
    ///
    /// Missing parent directories are created.
    pub fn open_with_timeout(path: &Path, busy_timeout: Duration) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;
        conn.busy_timeout(busy_timeout)?;
        conn.execute_batch(
            "PRAGMA journal_mode=WAL;\n\
             PRAGMA synchronous=NORMAL;",
        )?;
        Self::from_connection(conn)
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Self::initialize_schema(&conn)?;
        Ok(Self { conn: Mutex::new(conn) })
    }

    /// Initialize the database schema
    fn initialize_schema(conn: &Connection) -> Result<()> {
        for stmt in schema::all_schema_statements() {
            conn.execute(stmt, [])?;
        }
        Ok(())
    }

    fn lock_conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| Error::Lock)
    }

    /// Run `op` inside an immediate transaction and commit on success.
    ///
    /// An `Err` from `op` drops the transaction, which rolls it back.
    fn write<F>(&self, op: F) -> Result<AddResult>
    where
        F: FnOnce(&Transaction<'_>) -> Result<AddResult>,
    {
        let mut conn = self.lock_conn()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let result = op(&tx)?;
        tx.commit()?;
        Ok(result)
    }

    // ========== Named entities ==========

    /// Add a role. Idempotent: reports `AlreadyExists` if the name is taken.
    pub fn add_role(&self, name: &str) -> Result<AddResult> {
        self.add_named(EntityKind::Role, name)
    }

    /// Add a task. Idempotent: reports `AlreadyExists` if the name is taken.
    pub fn add_task(&self, name: &str) -> Result<AddResult> {
        self.add_named(EntityKind::Task, name)
    }

    /// Add an event. Idempotent: reports `AlreadyExists` if the name is taken.
    pub fn add_event(&self, name: &str) -> Result<AddResult> {
        self.add_named(EntityKind::Event, name)
    }

    fn add_named(&self, kind: EntityKind, name: &str) -> Result<AddResult> {
        self.write(|tx| {
            if lookup_id(tx, kind, name)?.is_some() {
                debug!("{} {} already exists", kind, name);
                return Ok(AddResult::already_exists(kind, name));
            }

            let inserted = tx.execute(
                &format!("INSERT INTO {} (name) VALUES (?1)", kind.table()),
                params![name],
            );
            finish_insert(inserted, kind, name)
        })
    }

    // ========== Users ==========

    /// Add a user with the given role.
    ///
    /// Fails with `NotFound` if the role does not exist, even when the user
    /// itself is already present.
    pub fn add_user(&self, username: &str, role: &str) -> Result<AddResult> {
        self.write(|tx| {
            let role_id = require_id(tx, EntityKind::Role, role)?;

            if lookup_id(tx, EntityKind::User, username)?.is_some() {
                debug!("user {} already exists", username);
                return Ok(AddResult::already_exists(EntityKind::User, username));
            }

            let inserted = tx.execute(
                "INSERT INTO users (username, role_id, creation) VALUES (?1, ?2, ?3)",
                params![username, role_id, now()],
            );
            finish_insert(inserted, EntityKind::User, username)
        })
    }

    /// Look up a user joined with its role name
    pub fn get_user(&self, username: &str) -> Result<UserView> {
        let conn = self.lock_conn()?;
        conn.query_row(
            "SELECT users.username, roles.name FROM users
             INNER JOIN roles ON users.role_id = roles.id
             WHERE users.username = ?1",
            params![username],
            |row| {
                Ok(UserView {
                    username: row.get(0)?,
                    role: row.get(1)?,
                })
            },
        )
        .optional()?
        .ok_or_else(|| Error::not_found(EntityKind::User, username))
    }

    // ========== Models ==========

    /// Add a model bound to a task.
    ///
    /// An existing model short-circuits: the task is not checked in that case.
    pub fn add_model(&self, model: &str, task: &str) -> Result<AddResult> {
        self.write(|tx| {
            if lookup_id(tx, EntityKind::Model, model)?.is_some() {
                debug!("model {} already exists", model);
                return Ok(AddResult::already_exists(EntityKind::Model, model));
            }

            let task_id = require_id(tx, EntityKind::Task, task)?;
            let inserted = tx.execute(
                "INSERT INTO models (name, task_id) VALUES (?1, ?2)",
                params![model, task_id],
            );
            finish_insert(inserted, EntityKind::Model, model)
        })
    }

    /// Add a version label to an existing model, authored by `creator`.
    ///
    /// Resolution order is model, then creator, then the (model, version)
    /// uniqueness check.
    pub fn add_model_version(&self, model: &str, version: &str, creator: &str) -> Result<AddResult> {
        let key = format!("{}:{}", model, version);
        self.write(|tx| {
            let Some(model_id) = lookup_id(tx, EntityKind::Model, model)? else {
                warn!(
                    "model {} does not exist; cannot add version {} until the base model is created",
                    model, version
                );
                return Err(Error::not_found(EntityKind::Model, model));
            };
            let creator_id = require_id(tx, EntityKind::User, creator)?;

            let existing: Option<i64> = tx
                .query_row(
                    "SELECT id FROM model_versions WHERE model_id = ?1 AND version = ?2",
                    params![model_id, version],
                    |row| row.get(0),
                )
                .optional()?;
            if existing.is_some() {
                debug!("model {} already has version {}", model, version);
                return Ok(AddResult::already_exists(EntityKind::ModelVersion, key.as_str()));
            }

            let inserted = tx.execute(
                "INSERT INTO model_versions (model_id, creator_id, version, creation)
                 VALUES (?1, ?2, ?3, ?4)",
                params![model_id, creator_id, version, now()],
            );
            finish_insert(inserted, EntityKind::ModelVersion, &key)
        })
    }

    /// Look up a model joined with its task, at a specific version.
    ///
    /// A missing model is `NotFound`; a present model without the version is
    /// `VersionNotFound`.
    pub fn get_model(&self, model: &str, version: &str) -> Result<ModelView> {
        let conn = self.lock_conn()?;
        let (model_id, task): (i64, String) = conn
            .query_row(
                "SELECT models.id, tasks.name FROM models
                 INNER JOIN tasks ON models.task_id = tasks.id
                 WHERE models.name = ?1",
                params![model],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?
            .ok_or_else(|| Error::not_found(EntityKind::Model, model))?;

        let version_label: String = conn
            .query_row(
                "SELECT version FROM model_versions WHERE model_id = ?1 AND version = ?2",
                params![model_id, version],
                |row| row.get(0),
            )
            .optional()?
            .ok_or_else(|| Error::VersionNotFound {
                model: model.to_string(),
                version: version.to_string(),
            })?;

        Ok(ModelView {
            model: model.to_string(),
            task,
            version: version_label,
        })
    }

    // ========== Activity log ==========

    /// Append a log entry linking a user to an event. Never idempotent.
    pub fn add_user_log(&self, username: &str, event: &str) -> Result<AddResult> {
        self.write(|tx| {
            let user_id = require_id(tx, EntityKind::User, username)?;
            let event_id = require_id(tx, EntityKind::Event, event)?;

            tx.execute(
                "INSERT INTO user_log (user_id, event_id, time) VALUES (?1, ?2, ?3)",
                params![user_id, event_id, now()],
            )?;
            debug!("logged event {} for user {}", event, username);
            Ok(AddResult::created(
                EntityKind::UserLog,
                format!("{}:{}", username, event),
            ))
        })
    }

    // ========== Maintenance ==========

    /// Count rows in one table
    pub fn count(&self, kind: EntityKind) -> Result<usize> {
        let conn = self.lock_conn()?;
        count_rows(&conn, kind)
    }

    /// Get registry statistics
    pub fn stats(&self) -> Result<RegistryStats> {
        let conn = self.lock_conn()?;
        Ok(RegistryStats {
            roles: count_rows(&conn, EntityKind::Role)?,
            users: count_rows(&conn, EntityKind::User)?,
            tasks: count_rows(&conn, EntityKind::Task)?,
            models: count_rows(&conn, EntityKind::Model)?,
            model_versions: count_rows(&conn, EntityKind::ModelVersion)?,
            events: count_rows(&conn, EntityKind::Event)?,
            user_log: count_rows(&conn, EntityKind::UserLog)?,
        })
    }

    /// Release the underlying connection.
    ///
    /// Consumes the store, so it can only happen once. Dropping the store
    /// has the same effect minus the error report; nothing is buffered.
    pub fn close(self) -> Result<()> {
        let conn = self.conn.into_inner().map_err(|_| Error::Lock)?;
        conn.close().map_err(|(_, e)| Error::Storage(e))
    }
}

/// Resolve a natural key to its row id
fn lookup_id(conn: &Connection, kind: EntityKind, name: &str) -> Result<Option<i64>> {
    let sql = match kind {
        EntityKind::Role => "SELECT id FROM roles WHERE name = ?1",
        EntityKind::Task => "SELECT id FROM tasks WHERE name = ?1",
        EntityKind::Event => "SELECT id FROM events WHERE name = ?1",
        EntityKind::Model => "SELECT id FROM models WHERE name = ?1",
        EntityKind::User => "SELECT id FROM users WHERE username = ?1",
        EntityKind::ModelVersion | EntityKind::UserLog => {
            return Err(Error::InvalidRequest(format!(
                "{} has no single-name key",
                kind
            )));
        }
    };
    conn.query_row(sql, params![name], |row| row.get(0))
        .optional()
        .map_err(Into::into)
}

/// Resolve a natural key, failing with `NotFound` when absent
fn require_id(conn: &Connection, kind: EntityKind, name: &str) -> Result<i64> {
    match lookup_id(conn, kind, name)? {
        Some(id) => Ok(id),
        None => {
            warn!("{} {} does not exist", kind, name);
            Err(Error::not_found(kind, name))
        }
    }
}

/// Turn an insert result into an outcome.
///
/// A UNIQUE violation means another writer got there first; the key exists,
/// the failed statement wrote nothing, and the enclosing transaction still
/// commits unchanged.
fn finish_insert(inserted: rusqlite::Result<usize>, kind: EntityKind, name: &str) -> Result<AddResult> {
    match inserted {
        Ok(_) => {
            debug!("added {} {}", kind, name);
            Ok(AddResult::created(kind, name))
        }
        Err(e) if is_unique_violation(&e) => {
            debug!("{} {} inserted concurrently", kind, name);
            Ok(AddResult::already_exists(kind, name))
        }
        Err(e) => Err(e.into()),
    }
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _)
            if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
    )
}

fn count_rows(conn: &Connection, kind: EntityKind) -> Result<usize> {
    let count: i64 = conn.query_row(
        &format!("SELECT COUNT(*) FROM {}", kind.table()),
        [],
        |row| row.get(0),
    )?;
    Ok(count as usize)
}

/// SQLite `datetime('now')` layout, UTC
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

fn now() -> String {
    Utc::now().format(TIMESTAMP_FORMAT).to_string()
}
