use std::{
    env,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use config as cfg;
use schemars::JsonSchema;
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{DirectoryOptions, DuplicatePolicy, SeedEntry};

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 8080,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct LoggingConfig {
    #[serde(default = "LoggingConfig::default_level")]
    pub level: String,
}

impl LoggingConfig {
    fn default_level() -> String {
        "info".to_string()
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Self::default_level(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default)]
pub struct SecurityConfig {
    /// Bearer token required on `/api` routes. Unset disables the check.
    #[serde(default, skip_serializing)]
    #[schemars(skip)]
    pub api_token: Option<SecretString>,
    #[serde(default)]
    pub allowed_origins: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct DirectoryConfig {
    #[serde(default)]
    pub duplicate_policy: DuplicatePolicy,
    #[serde(default)]
    pub validate_ids: bool,
    /// Base directory for seed `payload_file` paths.
    #[serde(default = "DirectoryConfig::default_data_dir")]
    pub data_dir: PathBuf,
    #[serde(default)]
    pub seed: Vec<SeedEntry>,
}

impl DirectoryConfig {
    fn default_data_dir() -> PathBuf {
        PathBuf::from("data")
    }

    pub fn options(&self) -> DirectoryOptions {
        DirectoryOptions {
            duplicate_policy: self.duplicate_policy,
            validate_ids: self.validate_ids,
        }
    }
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self {
            duplicate_policy: DuplicatePolicy::default(),
            validate_ids: false,
            data_dir: Self::default_data_dir(),
            seed: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Settings {
    #[serde(default = "Settings::default_env")]
    pub env: String,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub security: SecurityConfig,
    #[serde(default)]
    pub directory: DirectoryConfig,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            env: Self::default_env(),
            server: ServerConfig::default(),
            logging: LoggingConfig::default(),
            security: SecurityConfig::default(),
            directory: DirectoryConfig::default(),
        }
    }
}

impl Settings {
    fn default_env() -> String {
        env::var("APP_ENV")
            .ok()
            .or_else(|| env::var("RUST_ENV").ok())
            .unwrap_or_else(|| "development".to_string())
    }

    pub fn validate(&self) -> Result<()> {
        anyhow::ensure!(
            !self.server.host.trim().is_empty(),
            "server.host cannot be empty"
        );
        anyhow::ensure!(self.server.port > 0, "server.port must be > 0");
        for (i, seed) in self.directory.seed.iter().enumerate() {
            anyhow::ensure!(
                !seed.id.trim().is_empty(),
                "directory.seed[{}].id cannot be empty",
                i
            );
        }
        Ok(())
    }

    /// JSON schema of the settings file, for editors and docs.
    pub fn json_schema() -> serde_json::Value {
        serde_json::to_value(schemars::schema_for!(Settings)).unwrap_or_default()
    }
}

/// Layered configuration loading: files in the config directory, then
/// `CONTACTDIR__*` environment variables.
pub struct ConfigManager;

impl ConfigManager {
    /// Resolve the configuration directory.
    ///
    /// Priority order:
    /// 1. explicit path (`--config-dir` / `CONTACTDIR_CONFIG_DIR`)
    /// 2. ~/.contactdir/, when it exists
    /// 3. ./config/
    /// 4. current directory
    pub fn config_dir(custom_path: Option<PathBuf>) -> PathBuf {
        if let Some(path) = custom_path {
            return path;
        }

        if let Some(home_dir) = dirs::home_dir() {
            let user_dir = home_dir.join(".contactdir");
            if user_dir.exists() {
                info!("Using config directory: {:?}", user_dir);
                return user_dir;
            }
        }

        let cwd = env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        let project_config = cwd.join("config");
        if project_config.exists() {
            info!("Using config directory: {:?}", project_config);
            return project_config;
        }

        info!("Using config directory: {:?}", cwd);
        cwd
    }

    pub fn load_from_sources(config_dir: &Path, env_name: &str) -> Result<Settings> {
        let settings: Settings = cfg::Config::builder()
            .add_source(cfg::File::from(config_dir.join("default.toml")).required(false))
            .add_source(cfg::File::from(config_dir.join("default.yaml")).required(false))
            .add_source(cfg::File::from(config_dir.join("default.json")).required(false))
            .add_source(
                cfg::File::from(config_dir.join(format!("{}.toml", env_name))).required(false),
            )
            .add_source(
                cfg::File::from(config_dir.join(format!("{}.yaml", env_name))).required(false),
            )
            .add_source(
                cfg::File::from(config_dir.join(format!("{}.json", env_name))).required(false),
            )
            .add_source(cfg::File::from(config_dir.join("local.toml")).required(false))
            .add_source(cfg::Environment::with_prefix("CONTACTDIR").separator("__"))
            .build()
            .context("building configuration")?
            .try_deserialize()
            .context("deserializing configuration")?;
        Ok(settings)
    }

    /// Load and validate settings. Relative `directory.data_dir` paths are
    /// resolved against the config directory.
    pub fn load(custom_dir: Option<PathBuf>, env_override: Option<String>) -> Result<Settings> {
        let config_dir = Self::config_dir(custom_dir);
        let env_name = env_override.unwrap_or_else(Settings::default_env);
        let mut settings = Self::load_from_sources(&config_dir, &env_name)?;
        settings.env = env_name;
        if settings.directory.data_dir.is_relative() {
            settings.directory.data_dir = config_dir.join(&settings.directory.data_dir);
        }
        settings.validate()?;
        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;
    use std::fs;

    #[test]
    fn test_defaults_validate() {
        let settings = Settings::default();
        assert!(settings.validate().is_ok());
        assert_eq!(settings.directory.duplicate_policy, DuplicatePolicy::Allow);
        assert!(settings.security.api_token.is_none());
    }

    #[test]
    fn test_explicit_config_dir_wins() {
        let dir = tempfile::tempdir().unwrap();
        let explicit = dir.path().join("elsewhere");
        assert_eq!(ConfigManager::config_dir(Some(explicit.clone())), explicit);
    }

    #[test]
    fn test_layered_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("default.toml"),
            r#"
[server]
host = "0.0.0.0"
port = 9000

[security]
api_token = "s3cret"

[directory]
duplicate_policy = "reject"

[[directory.seed]]
id = "research"
payload_file = "contact_research.json"
"#,
        )
        .unwrap();
        fs::write(
            dir.path().join("staging.toml"),
            "[server]\nhost = \"0.0.0.0\"\nport = 9100\n",
        )
        .unwrap();

        let settings = ConfigManager::load(Some(dir.path().to_path_buf()), Some("staging".into()))
            .unwrap();
        assert_eq!(settings.env, "staging");
        assert_eq!(settings.server.port, 9100);
        assert_eq!(settings.directory.duplicate_policy, DuplicatePolicy::Reject);
        assert_eq!(settings.directory.seed.len(), 1);
        assert_eq!(settings.directory.data_dir, dir.path().join("data"));
        assert_eq!(
            settings
                .security
                .api_token
                .as_ref()
                .map(|t| t.expose_secret().to_string()),
            Some("s3cret".to_string())
        );
    }

    #[test]
    fn test_blank_seed_id_fails_validation() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("default.toml"),
            "[[directory.seed]]\nid = \" \"\n",
        )
        .unwrap();
        assert!(ConfigManager::load(Some(dir.path().to_path_buf()), Some("test".into())).is_err());
    }

    #[test]
    fn test_schema_omits_secrets() {
        let schema = Settings::json_schema().to_string();
        assert!(schema.contains("duplicate_policy"));
        assert!(!schema.contains("api_token"));
    }
}
