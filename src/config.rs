use std::path::{Path, PathBuf};
use std::time::Duration;

use color_eyre::eyre::{eyre, Result, WrapErr};
use serde::Deserialize;

/// Delay before the contacts table runs a row add or delete.
pub const DEFAULT_ROW_DELAY_MS: u64 = 1000;
/// How long a notification stays in the status bar.
pub const DEFAULT_NOTIFICATION_MS: u64 = 5000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    #[default]
    Firestore,
    Memory,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FirestoreConfig {
    pub project_id: String,
    pub database: String,
    pub api_key: Option<String>,
    /// Bearer token sent with every request when set.
    pub id_token: Option<String>,
    pub request_timeout_secs: u64,
}

impl Default for FirestoreConfig {
    fn default() -> Self {
        Self {
            project_id: String::new(),
            database: "(default)".to_string(),
            api_key: None,
            id_token: None,
            request_timeout_secs: 15,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct MemoryConfig {
    /// TOML file seeding the in-memory store.
    pub fixture: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub backend: Backend,
    pub org_id: String,
    pub user_id: String,
    pub firestore: FirestoreConfig,
    pub memory: MemoryConfig,
    pub row_delay_ms: u64,
    pub notification_ms: u64,
    pub export_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend: Backend::default(),
            org_id: String::new(),
            user_id: String::new(),
            firestore: FirestoreConfig::default(),
            memory: MemoryConfig::default(),
            row_delay_ms: DEFAULT_ROW_DELAY_MS,
            notification_ms: DEFAULT_NOTIFICATION_MS,
            export_dir: None,
        }
    }
}

impl Config {
    /// Read `config.toml` from the config directory, then apply `CRM_*`
    /// environment overrides.
    pub fn load() -> Result<Self> {
        let mut config = match config_dir().map(|d| d.join("config.toml")) {
            Some(path) if path.exists() => Self::from_file(&path)?,
            _ => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .wrap_err_with(|| format!("reading {}", path.display()))?;
        Self::from_toml(&content).wrap_err_with(|| format!("parsing {}", path.display()))
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(v) = var("CRM_ORG_ID") {
            self.org_id = v;
        }
        if let Some(v) = var("CRM_USER_ID") {
            self.user_id = v;
        }
        if let Some(v) = var("CRM_BACKEND") {
            match v.to_lowercase().as_str() {
                "memory" => self.backend = Backend::Memory,
                "firestore" => self.backend = Backend::Firestore,
                other => tracing::warn!(backend = other, "ignoring unknown CRM_BACKEND"),
            }
        }
        if let Some(v) = var("CRM_PROJECT_ID") {
            self.firestore.project_id = v;
        }
        if let Some(v) = var("CRM_API_KEY") {
            self.firestore.api_key = Some(v);
        }
        if let Some(v) = var("CRM_ID_TOKEN") {
            self.firestore.id_token = Some(v);
        }
    }

    fn validate(&self) -> Result<()> {
        if self.org_id.trim().is_empty() {
            return Err(eyre!("no organization configured (set org_id or CRM_ORG_ID)"));
        }
        if self.user_id.trim().is_empty() {
            return Err(eyre!("no user configured (set user_id or CRM_USER_ID)"));
        }
        if self.backend == Backend::Firestore && self.firestore.project_id.trim().is_empty() {
            return Err(eyre!(
                "firestore backend needs [firestore] project_id (or CRM_PROJECT_ID)"
            ));
        }
        Ok(())
    }

    pub fn row_delay(&self) -> Duration {
        Duration::from_millis(self.row_delay_ms)
    }

    pub fn notification_ttl(&self) -> Duration {
        Duration::from_millis(self.notification_ms)
    }

    pub fn export_dir(&self) -> PathBuf {
        self.export_dir
            .clone()
            .or_else(dirs::download_dir)
            .or_else(dirs::home_dir)
            .unwrap_or_else(|| PathBuf::from("."))
    }
}

/// `~/.config/crm-tui` on Linux; also holds `theme.toml`.
pub fn config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("crm-tui"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn defaults_fill_missing_keys() {
        let config = Config::from_toml(
            r#"
            org_id = "org-1"
            user_id = "user-1"

            [firestore]
            project_id = "ripple"
            "#,
        )
        .unwrap();

        assert_eq!(config.backend, Backend::Firestore);
        assert_eq!(config.firestore.database, "(default)");
        assert_eq!(config.row_delay(), Duration::from_millis(1000));
        assert_eq!(config.notification_ttl(), Duration::from_millis(5000));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn env_overrides_file_values() {
        let mut config = Config::from_toml("org_id = \"from-file\"\nbackend = \"firestore\"").unwrap();
        let env: HashMap<&str, &str> = [
            ("CRM_ORG_ID", "from-env"),
            ("CRM_USER_ID", "me"),
            ("CRM_BACKEND", "memory"),
        ]
        .into_iter()
        .collect();
        config.apply_env(|k| env.get(k).map(|v| v.to_string()));

        assert_eq!(config.org_id, "from-env");
        assert_eq!(config.user_id, "me");
        assert_eq!(config.backend, Backend::Memory);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn firestore_without_project_is_rejected() {
        let config = Config::from_toml("org_id = \"o\"\nuser_id = \"u\"").unwrap();
        assert!(config.validate().is_err());
    }
}
