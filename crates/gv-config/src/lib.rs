//! # gv-config
//!
//! Settings are layered, lowest to highest precedence:
//! 1. Built-in defaults
//! 2. `gitview.toml` in the working directory (optional)
//! 3. Environment variables prefixed `GITVIEW__`, nested with `__`
//!    (e.g. `GITVIEW__DATABASE__URL` -> `database.url`)
//!
//! A `.env` file is loaded into the environment first when present.
//!
//! ```toml
//! [database]
//! url = "sqlite://gitview.db"
//!
//! [translate]
//! langpair = "en|ja"
//! cache_capacity = 1024
//!
//! [log]
//! format = "json"
//! ```

use std::path::{Path, PathBuf};

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, Environment, File, FileFormat};
use serde::Deserialize;
use thiserror::Error;

pub const DEFAULT_CONFIG_FILE: &str = "gitview.toml";
pub const ENV_PREFIX: &str = "GITVIEW";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub database: DatabaseSettings,
    pub storage: StorageSettings,
    pub github: GitHubSettings,
    pub translate: TranslateSettings,
    pub http: HttpSettings,
    pub feed: PageSettings,
    pub repo: PageSettings,
    pub trending: PageSettings,
    pub log: LogSettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseSettings {
    /// `sqlite::memory:` or `sqlite://path/to/file.db`
    pub url: String,
    pub max_connections: u32,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            url: "sqlite://gitview.db".to_string(),
            max_connections: 5,
        }
    }
}

/// Client-local state (anonymous token, bookmarks).
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    pub path: PathBuf,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            path: PathBuf::from("gitview-local.json"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GitHubSettings {
    pub api_base: String,
    /// GitHub rejects requests without a User-Agent
    pub user_agent: String,
}

impl Default for GitHubSettings {
    fn default() -> Self {
        Self {
            api_base: "https://api.github.com".to_string(),
            user_agent: concat!("gitview/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TranslateSettings {
    pub api_base: String,
    /// `source|target` language codes
    pub langpair: String,
    pub cache_capacity: usize,
}

impl Default for TranslateSettings {
    fn default() -> Self {
        Self {
            api_base: "https://api.mymemory.translated.net".to_string(),
            langpair: "en|ja".to_string(),
            cache_capacity: 1024,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HttpSettings {
    pub timeout_secs: u64,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self { timeout_secs: 10 }
    }
}

/// Listing size. The default applies to every section that omits it, so
/// `feed` is lowered to 10 in [`Settings::builder`].
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PageSettings {
    pub page_size: u32,
}

impl Default for PageSettings {
    fn default() -> Self {
        Self { page_size: 20 }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LogSettings {
    pub format: LogFormat,
}

impl Settings {
    /// Loads `.env`, then `./gitview.toml` and the environment.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(None)
    }

    /// Like [`Settings::load`] with an explicit config file, which must exist.
    pub fn load_from(path: Option<&Path>) -> Result<Self, ConfigError> {
        if dotenvy::dotenv().is_ok() {
            tracing::debug!("loaded .env");
        }

        let file = match path {
            Some(path) => File::from(path).format(FileFormat::Toml).required(true),
            None => File::with_name(DEFAULT_CONFIG_FILE)
                .format(FileFormat::Toml)
                .required(false),
        };

        let builder = Self::builder()?.add_source(file).add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );
        Self::build(builder)
    }

    fn builder() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        Ok(Config::builder().set_default("feed.page_size", 10)?)
    }

    fn build(builder: ConfigBuilder<DefaultState>) -> Result<Self, ConfigError> {
        let settings: Settings = builder.build()?.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let pages = [
            ("feed", &self.feed),
            ("repo", &self.repo),
            ("trending", &self.trending),
        ];
        for (section, page) in pages {
            if page.page_size == 0 {
                return Err(ConfigError::Invalid(format!("{section}.page_size must be positive")));
            }
        }
        if self.database.max_connections == 0 {
            return Err(ConfigError::Invalid("database.max_connections must be positive".into()));
        }
        if self.translate.cache_capacity == 0 {
            return Err(ConfigError::Invalid("translate.cache_capacity must be positive".into()));
        }
        if !self.translate.langpair.contains('|') {
            return Err(ConfigError::Invalid(format!(
                "translate.langpair must look like `en|ja`, got `{}`",
                self.translate.langpair
            )));
        }
        if self.http.timeout_secs == 0 {
            return Err(ConfigError::Invalid("http.timeout_secs must be positive".into()));
        }
        Ok(())
    }
}
