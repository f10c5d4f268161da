use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

use crate::constants::{DEFAULT_MAX_FILE_SIZE, DEFAULT_STATS_INTERVAL_MINUTES};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,

    pub server: ServerConfig,

    pub uploads: UploadConfig,

    pub email: EmailConfig,

    pub scheduler: SchedulerConfig,

    pub security: SecurityConfig,

    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    pub database_url: String,

    pub log_level: String,

    /// Number of tokio worker threads (default: 2)
    /// Set to 0 to use the number of CPU cores
    pub worker_threads: usize,

    pub max_db_connections: u32,

    pub min_db_connections: u32,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            database_url: "sqlite:data/bugdesk.db".to_string(),
            log_level: "info".to_string(),
            worker_threads: 2,
            max_db_connections: 5,
            min_db_connections: 1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub port: u16,

    pub cors_allowed_origins: Vec<String>,

    /// Whether to set the Secure flag on session cookies.
    /// Set to false for local development without HTTPS.
    pub secure_cookies: bool,

    /// Secret used to sign session cookies. Must be at least 64 bytes;
    /// otherwise a random key is generated at startup and sessions do not
    /// survive a restart.
    pub secret_key: Option<String>,

    pub session_inactivity_minutes: i64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 8000,
            cors_allowed_origins: vec![
                "http://localhost:3000".to_string(),
                "http://127.0.0.1:3000".to_string(),
            ],
            secure_cookies: true,
            secret_key: None,
            session_inactivity_minutes: 60 * 24,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadConfig {
    pub dir: String,

    /// Largest accepted attachment in bytes (default: 10 MiB)
    pub max_file_size: u64,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            dir: "uploads".to_string(),
            max_file_size: DEFAULT_MAX_FILE_SIZE,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmailConfig {
    pub enabled: bool,

    pub smtp_host: String,

    pub smtp_port: u16,

    pub smtp_user: Option<String>,

    pub smtp_password: Option<String>,

    pub from_address: String,

    /// Base URL of the web client, used for links in messages.
    pub frontend_base_url: String,

    /// Pending jobs before new ones are dropped with a warning.
    pub queue_capacity: usize,
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            smtp_host: String::new(),
            smtp_port: 587,
            smtp_user: None,
            smtp_password: None,
            from_address: "bugdesk@localhost".to_string(),
            frontend_base_url: "http://localhost:3000".to_string(),
            queue_capacity: 256,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    pub enabled: bool,

    pub stats_interval_minutes: u32,

    /// Takes precedence over the interval when set.
    pub cron_expression: Option<String>,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            stats_interval_minutes: DEFAULT_STATS_INTERVAL_MINUTES,
            cron_expression: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Argon2 memory cost in KiB (default: 8192 = 8MB)
    pub argon2_memory_cost_kib: u32,

    /// Argon2 time cost (iterations)
    pub argon2_time_cost: u32,

    pub argon2_parallelism: u32,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            argon2_memory_cost_kib: 8192,
            argon2_time_cost: 3,
            argon2_parallelism: 1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    pub metrics_enabled: bool,

    pub loki_enabled: bool,

    pub loki_url: String,

    pub loki_labels: std::collections::HashMap<String, String>,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        let mut labels = std::collections::HashMap::new();
        labels.insert("app".to_string(), "bugdesk".to_string());

        Self {
            metrics_enabled: true,
            loki_enabled: false,
            loki_url: "http://localhost:3100".to_string(),
            loki_labels: labels,
        }
    }
}

impl Config {
    /// Loads the first config file found, then applies environment overrides.
    pub fn load() -> Result<Self> {
        let mut config = Self::load_file()?;
        config.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    fn load_file() -> Result<Self> {
        let paths = Self::config_paths();

        for path in &paths {
            if path.exists() {
                info!("Loading config from: {}", path.display());
                return Self::load_from_path(path);
            }
        }

        info!("No config file found, using defaults");
        Ok(Self::default())
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Environment variables win over file values.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("DATABASE_URL") {
            self.general.database_url = url;
        }
        if let Some(level) = lookup("LOG_LEVEL") {
            self.general.log_level = level;
        }
        if let Some(secret) = lookup("SECRET_KEY") {
            self.server.secret_key = Some(secret);
        }
        if let Some(port) = lookup("PORT") {
            self.server.port = port
                .parse()
                .with_context(|| format!("PORT is not a valid port: {port}"))?;
        }
        if let Some(dir) = lookup("UPLOAD_DIR") {
            self.uploads.dir = dir;
        }
        if let Some(size) = lookup("MAX_FILE_SIZE") {
            self.uploads.max_file_size = size
                .parse()
                .with_context(|| format!("MAX_FILE_SIZE is not a byte count: {size}"))?;
        }
        if let Some(host) = lookup("SMTP_HOST") {
            self.email.enabled = !host.is_empty();
            self.email.smtp_host = host;
        }
        if let Some(port) = lookup("SMTP_PORT") {
            self.email.smtp_port = port
                .parse()
                .with_context(|| format!("SMTP_PORT is not a valid port: {port}"))?;
        }
        if let Some(user) = lookup("SMTP_USER") {
            self.email.smtp_user = Some(user);
        }
        if let Some(password) = lookup("SMTP_PASSWORD") {
            self.email.smtp_password = Some(password);
        }
        if let Some(from) = lookup("SMTP_FROM") {
            self.email.from_address = from;
        }

        Ok(())
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::default_config_path();
        self.save_to_path(&path)
    }

    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        info!("Config saved to: {}", path.display());
        Ok(())
    }

    fn config_paths() -> Vec<PathBuf> {
        let mut paths = vec![];

        paths.push(PathBuf::from("config.toml"));

        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("bugdesk").join("config.toml"));
        }

        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".bugdesk").join("config.toml"));
        }

        paths
    }

    fn default_config_path() -> PathBuf {
        PathBuf::from("config.toml")
    }

    pub fn create_default_if_missing() -> Result<bool> {
        let path = Self::default_config_path();
        if path.exists() {
            Ok(false)
        } else {
            let config = Self::default();
            config.save_to_path(&path)?;
            info!("Created default config file: {}", path.display());
            Ok(true)
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.uploads.max_file_size == 0 {
            anyhow::bail!("Upload size limit must be > 0");
        }

        if self.uploads.dir.trim().is_empty() {
            anyhow::bail!("Upload directory cannot be empty");
        }

        if self.scheduler.enabled
            && self.scheduler.stats_interval_minutes == 0
            && self.scheduler.cron_expression.is_none()
        {
            anyhow::bail!("Scheduler interval must be > 0 or cron expression must be set");
        }

        if self.email.enabled && self.email.smtp_host.is_empty() {
            anyhow::bail!("SMTP host cannot be empty when email is enabled");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.scheduler.stats_interval_minutes, 30);
        assert_eq!(config.uploads.max_file_size, 10 * 1024 * 1024);
        assert_eq!(config.uploads.dir, "uploads");
        assert!(!config.email.enabled);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("[general]"));
        assert!(toml_str.contains("[uploads]"));
        assert!(toml_str.contains("[scheduler]"));
    }

    #[test]
    fn test_config_deserialization() {
        let toml_str = r#"
            [general]
            log_level = "debug"

            [uploads]
            max_file_size = 2048
        "#;

        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.general.log_level, "debug");
        assert_eq!(config.uploads.max_file_size, 2048);

        assert_eq!(config.uploads.dir, "uploads");
        assert_eq!(config.scheduler.stats_interval_minutes, 30);
    }

    #[test]
    fn environment_overrides_file_values() {
        let env: HashMap<&str, &str> = [
            ("DATABASE_URL", "sqlite:/tmp/x.db"),
            ("MAX_FILE_SIZE", "1024"),
            ("UPLOAD_DIR", "/var/bugdesk"),
            ("SMTP_HOST", "smtp.example.com"),
            ("SMTP_PORT", "2525"),
            ("SECRET_KEY", "s3cret"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config
            .apply_overrides(|key| env.get(key).map(ToString::to_string))
            .unwrap();

        assert_eq!(config.general.database_url, "sqlite:/tmp/x.db");
        assert_eq!(config.uploads.max_file_size, 1024);
        assert_eq!(config.uploads.dir, "/var/bugdesk");
        assert!(config.email.enabled);
        assert_eq!(config.email.smtp_port, 2525);
        assert_eq!(config.server.secret_key.as_deref(), Some("s3cret"));
    }

    #[test]
    fn malformed_numeric_override_is_an_error() {
        let mut config = Config::default();
        let result = config.apply_overrides(|key| (key == "MAX_FILE_SIZE").then(|| "ten".into()));
        assert!(result.is_err());
    }

    #[test]
    fn validation_rejects_unusable_settings() {
        let mut config = Config::default();
        config.uploads.max_file_size = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.scheduler.stats_interval_minutes = 0;
        assert!(config.validate().is_err());
        config.scheduler.cron_expression = Some("0 */30 * * * *".to_string());
        assert!(config.validate().is_ok());

        let mut config = Config::default();
        config.email.enabled = true;
        assert!(config.validate().is_err());
    }
}
