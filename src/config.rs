use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// How long a connection waits on a competing writer before failing
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

pub const DEFAULT_PORT: u16 = 5000;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct RegistryConfig {
    pub database: Option<String>,
    pub busy_timeout_ms: Option<u64>,
    pub bind: Option<String>,
    pub port: Option<u16>,
}

impl RegistryConfig {
    /// Database path, relative to `base` unless absolute
    pub fn database_path_in(&self, base: &Path) -> PathBuf {
        match &self.database {
            Some(db) => base.join(db),
            None => default_database_path_in(base),
        }
    }

    pub fn busy_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.busy_timeout_ms.unwrap_or(DEFAULT_BUSY_TIMEOUT_MS))
    }

    pub fn bind_addr(&self) -> String {
        format!(
            "{}:{}",
            self.bind.as_deref().unwrap_or("127.0.0.1"),
            self.port.unwrap_or(DEFAULT_PORT)
        )
    }
}

pub fn default_config_path() -> PathBuf {
    PathBuf::from("modelreg.toml")
}

pub fn default_database_path_in(base: &Path) -> PathBuf {
    base.join(".modelreg").join("registry.db")
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<Option<RegistryConfig>> {
    let path = path.map(Path::to_path_buf).unwrap_or_else(default_config_path);
    if !path.exists() {
        return Ok(None);
    }

    let contents = std::fs::read_to_string(&path)?;
    let config: RegistryConfig = toml::from_str(&contents)?;
    Ok(Some(config))
}

pub fn write_config(path: &Path, config: &RegistryConfig, force: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        anyhow::bail!("config already exists at {} (use --force to overwrite)", path.display());
    }

    let contents = toml::to_string_pretty(config)?;
    std::fs::write(path, contents)?;
    Ok(())
}

pub fn ensure_db_dir(db_path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}
