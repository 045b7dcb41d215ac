//! Database schema definitions
//!
//! Natural keys carry `UNIQUE` constraints and every reference column is a
//! declared foreign key. Statements are idempotent so the schema can be
//! applied on every open.

/// SQL to create the roles table
pub const CREATE_ROLES_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS roles (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL UNIQUE
)
"#;

/// SQL to create the users table
pub const CREATE_USERS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    id INTEGER PRIMARY KEY,
    username TEXT NOT NULL UNIQUE,
    role_id INTEGER NOT NULL,
    creation TIMESTAMP NOT NULL,
    FOREIGN KEY (role_id) REFERENCES roles(id)
)
"#;

/// SQL to create the tasks table
pub const CREATE_TASKS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS tasks (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL UNIQUE
)
"#;

/// SQL to create the models table
pub const CREATE_MODELS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS models (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL UNIQUE,
    task_id INTEGER NOT NULL,
    FOREIGN KEY (task_id) REFERENCES tasks(id)
)
"#;

/// SQL to create the model_versions table
/// One row per (model, version label); the label is free text
pub const CREATE_MODEL_VERSIONS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS model_versions (
    id INTEGER PRIMARY KEY,
    model_id INTEGER NOT NULL,
    creator_id INTEGER NOT NULL,
    version TEXT NOT NULL,
    creation TIMESTAMP NOT NULL,
    UNIQUE(model_id, version),
    FOREIGN KEY (model_id) REFERENCES models(id),
    FOREIGN KEY (creator_id) REFERENCES users(id)
)
"#;

/// SQL to create the events table
pub const CREATE_EVENTS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS events (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL UNIQUE
)
"#;

/// SQL to create the user_log table (append-only, no uniqueness)
pub const CREATE_USER_LOG_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS user_log (
    id INTEGER PRIMARY KEY,
    user_id INTEGER NOT NULL,
    event_id INTEGER NOT NULL,
    time TIMESTAMP NOT NULL,
    FOREIGN KEY (user_id) REFERENCES users(id),
    FOREIGN KEY (event_id) REFERENCES events(id)
)
"#;

/// SQL to create indexes
pub const CREATE_INDEXES: &[&str] = &[
    "CREATE INDEX IF NOT EXISTS idx_users_role ON users(role_id)",
    "CREATE INDEX IF NOT EXISTS idx_models_task ON models(task_id)",
    "CREATE INDEX IF NOT EXISTS idx_user_log_user ON user_log(user_id)",
    "CREATE INDEX IF NOT EXISTS idx_user_log_event ON user_log(event_id)",
];

/// All schema creation statements, parents before children
pub fn all_schema_statements() -> Vec<&'static str> {
    let mut stmts = vec![
        CREATE_ROLES_TABLE,
        CREATE_TASKS_TABLE,
        CREATE_EVENTS_TABLE,
        CREATE_USERS_TABLE,
        CREATE_MODELS_TABLE,
        CREATE_MODEL_VERSIONS_TABLE,
        CREATE_USER_LOG_TABLE,
    ];
    stmts.extend(CREATE_INDEXES.iter().copied());
    stmts
}
