use std::path::{Path, PathBuf};

use anyhow::Result;
use serde::Deserialize;
use anyhow::anyhow;

#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub worker_threads: Option<usize>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: default_host(), port: default_port(), worker_threads: Some(4) }
    }
}

fn default_host() -> String { "127.0.0.1".into() }
fn default_port() -> u16 { 3000 }

/// Which record store implementation backs the server.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// One JSON file per player under `storage.root`.
    #[default]
    File,
    /// In-process map; nothing survives a restart.
    Memory,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_root")]
    pub root: PathBuf,
    #[serde(default)]
    pub backend: StorageBackend,
    /// Write save files with two-space indentation.
    #[serde(default = "default_pretty")]
    pub pretty: bool,
    /// Document field holding the player name (the storage key).
    #[serde(default = "default_username_field")]
    pub username_field: String,
    /// Document field holding the credential compared at login.
    #[serde(default = "default_credential_field")]
    pub credential_field: String,
    /// Extra fields a registration must carry, e.g. `["farm_name"]`.
    #[serde(default)]
    pub register_required_fields: Vec<String>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            root: default_root(),
            backend: StorageBackend::default(),
            pretty: default_pretty(),
            username_field: default_username_field(),
            credential_field: default_credential_field(),
            register_required_fields: Vec::new(),
        }
    }
}

fn default_root() -> PathBuf { PathBuf::from("game_saves") }
fn default_pretty() -> bool { true }
fn default_username_field() -> String { "username".into() }
fn default_credential_field() -> String { "credential".into() }

fn parse_var<T>(name: &str, raw: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim().parse::<T>().map_err(|e| anyhow!("{name}={raw:?}: {e}"))
}

fn config_path() -> String {
    std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string())
}

pub fn load_from_file(path: &str) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path)?;
    let cfg: AppConfig = toml::from_str(&content)?;
    Ok(cfg)
}

impl AppConfig {
    /// Load `CONFIG_PATH` (or `config.toml`) if present, otherwise start from
    /// defaults; then apply environment overrides and validate.
    pub fn load() -> Result<Self> {
        let path = config_path();
        let mut cfg = if Path::new(&path).exists() {
            load_from_file(&path).map_err(|e| anyhow!("{path}: {e}"))?
        } else {
            AppConfig::default()
        };
        cfg.apply_env_overrides()?;
        cfg.normalize_and_validate()?;
        Ok(cfg)
    }

    /// `SERVER_HOST`, `SERVER_PORT`, `TOKIO_WORKER_THREADS`, `SAVES_DIR`,
    /// `SAVES_BACKEND` take precedence over file values when set. A set but
    /// unparsable value is an error.
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        self.apply_overrides(|name| std::env::var(name).ok())
    }

    fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(host) = var("SERVER_HOST") {
            self.server.host = host;
        }
        if let Some(port) = var("SERVER_PORT") {
            self.server.port = parse_var("SERVER_PORT", &port)?;
        }
        if let Some(w) = var("TOKIO_WORKER_THREADS") {
            self.server.worker_threads = Some(parse_var("TOKIO_WORKER_THREADS", &w)?);
        }
        self.storage.normalize_from(&var)
    }

    pub fn normalize_and_validate(&mut self) -> Result<()> {
        // 归一化 server
        self.server.normalize()?;
        self.storage.validate()?;
        Ok(())
    }
}

impl ServerConfig {
    fn normalize(&mut self) -> Result<()> {
        if self.host.trim().is_empty() {
            self.host = default_host();
        }
        if self.port == 0 {
            return Err(anyhow!("server.port must be in 1..=65535"));
        }
        if let Some(w) = self.worker_threads {
            if w == 0 { self.worker_threads = Some(4); }
        } else {
            self.worker_threads = Some(4);
        }
        Ok(())
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl StorageConfig {
    fn normalize_from(&mut self, var: &impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(dir) = var("SAVES_DIR") {
            if !dir.trim().is_empty() {
                self.root = PathBuf::from(dir);
            }
        }
        if let Some(backend) = var("SAVES_BACKEND") {
            self.backend = match backend.trim().to_ascii_lowercase().as_str() {
                "file" => StorageBackend::File,
                "memory" => StorageBackend::Memory,
                other => return Err(anyhow!("SAVES_BACKEND: unknown backend `{other}` (expected file or memory)")),
            };
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.backend == StorageBackend::File && self.root.as_os_str().is_empty() {
            return Err(anyhow!("storage.root must not be empty for the file backend"));
        }
        if self.username_field.trim().is_empty() || self.credential_field.trim().is_empty() {
            return Err(anyhow!("storage.username_field and storage.credential_field must not be empty"));
        }
        if self.username_field == self.credential_field {
            return Err(anyhow!("storage.username_field and storage.credential_field must differ"));
        }
        if self.register_required_fields.iter().any(|f| f.trim().is_empty()) {
            return Err(anyhow!("storage.register_required_fields must not contain empty names"));
        }
        Ok(())
    }
}
