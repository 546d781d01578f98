use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct AssistantConfig {
    #[serde(default)]
    pub service: ServiceConfig,
    pub database: DatabaseConfig,
    pub vault: VaultConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub router: RouterConfig,
    #[serde(default)]
    pub housekeeping: HousekeepingConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServiceConfig {
    pub log_level: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub path: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_max_connections() -> u32 {
    5
}

#[derive(Debug, Deserialize, Clone)]
pub struct VaultConfig {
    /// Vault used when no profile is active, and the default root for new profiles.
    pub default_root: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LlmConfig {
    pub model: String,
    pub fallback_model: String,
    pub base_url: String,
    pub timeout_seconds: u64,
    pub temperature: f32,
    pub credentials_path: String,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            model: "gemini-2.5-flash".to_string(),
            fallback_model: crate::llm::DEFAULT_FALLBACK_MODEL.to_string(),
            base_url: crate::llm::GEMINI_BASE_URL.to_string(),
            timeout_seconds: 60,
            temperature: 0.2,
            credentials_path: ".env.local".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct HttpConfig {
    pub host: String,
    pub port: u16,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8787,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct RouterConfig {
    /// `act` decisions below this confidence are turned into a clarifying question.
    pub confidence_threshold: f32,
    pub history_limit: u32,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: 0.6,
            history_limit: 12,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct HousekeepingConfig {
    pub enabled: bool,
    pub interval_minutes: u64,
}

impl Default for HousekeepingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_minutes: 30,
        }
    }
}

impl AssistantConfig {
    /// Load from a TOML file, then apply `INTERN__SECTION__KEY` environment overrides.
    pub fn load(path: &str) -> Result<Self, ConfigError> {
        let s = Config::builder()
            .add_source(File::with_name(path))
            .add_source(Environment::with_prefix("INTERN").separator("__"))
            .build()?;
        s.try_deserialize()
    }

    /// Config rooted in a single directory: `<dir>/intern.db` and `<dir>/vault`.
    /// Used by tests and by first runs without a config file.
    pub fn rooted_at(dir: &Path) -> Self {
        let path_str = |p: PathBuf| p.to_string_lossy().into_owned();
        Self {
            service: ServiceConfig::default(),
            database: DatabaseConfig {
                path: path_str(dir.join("intern.db")),
                max_connections: default_max_connections(),
            },
            vault: VaultConfig {
                default_root: path_str(dir.join("vault")),
            },
            llm: LlmConfig {
                credentials_path: path_str(dir.join(".env.local")),
                ..LlmConfig::default()
            },
            http: HttpConfig::default(),
            router: RouterConfig::default(),
            housekeeping: HousekeepingConfig::default(),
        }
    }
}
