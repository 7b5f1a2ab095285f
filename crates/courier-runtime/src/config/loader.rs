//! Layered configuration loading on top of figment.
//!
//! Sources are merged from lowest to highest priority:
//!
//! 1. [`CourierConfig::default`]
//! 2. Values given to [`ConfigLoader::merge`], typically an embedder's own defaults
//! 3. The profile file next to the main file, e.g. `courier.production.toml`
//! 4. The main file, `courier.toml` or `config.toml` (`.yaml`/`.yml` with `yaml-config`)
//! 5. `COURIER_*` environment variables, with `__` between nested keys
//! 6. Values given to [`ConfigLoader::set`], typically command line flags
//!
//! Without an explicit [`file`](ConfigLoader::file), the loader looks in each
//! search path in turn and stops at the first directory holding a main file.
//! The search paths default to the working directory and
//! `<user config dir>/courier`.
//!
//! ```rust,ignore
//! let config = ConfigLoader::new()
//!     .profile("production")
//!     .set("bot.display_name", "Courier")
//!     .load()?;
//! ```
//!
//! Environment examples:
//!
//! - `COURIER_BOT__IDENTITY=bot@example.org`
//! - `COURIER_COMMANDS__UNPREFIXED=ignore-registry`
//! - `COURIER_LOGGING__LEVEL=debug`

use std::path::{Path, PathBuf};

use figment::Figment;
#[cfg(any(feature = "toml-config", feature = "yaml-config"))]
use figment::providers::Format;
#[cfg(feature = "toml-config")]
use figment::providers::Toml;
#[cfg(feature = "yaml-config")]
use figment::providers::Yaml;
use figment::providers::{Env, Serialized};
use tracing::{debug, info, trace, warn};

use super::error::{ConfigError, ConfigResult};
use super::schema::CourierConfig;

const ENV_PREFIX: &str = "COURIER_";
const PROFILE_VAR: &str = "COURIER_PROFILE";

/// Main file names tried in each search path, in order.
const FILE_NAMES: &[&str] = &[
    #[cfg(feature = "toml-config")]
    "courier.toml",
    #[cfg(feature = "toml-config")]
    "config.toml",
    #[cfg(feature = "yaml-config")]
    "courier.yaml",
    #[cfg(feature = "yaml-config")]
    "courier.yml",
    #[cfg(feature = "yaml-config")]
    "config.yaml",
    #[cfg(feature = "yaml-config")]
    "config.yml",
];

/// Selects the profile file layered under the main file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Profile {
    #[default]
    Development,
    Production,
    /// Any other name, lower-cased.
    Custom(String),
}

impl Profile {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Development => "development",
            Self::Production => "production",
            Self::Custom(name) => name,
        }
    }

    /// Accepts `dev`/`prod` shorthands; other names become [`Profile::Custom`].
    pub fn parse(name: &str) -> Self {
        match name.to_lowercase().as_str() {
            "production" | "prod" => Self::Production,
            "development" | "dev" => Self::Development,
            other => Self::Custom(other.to_string()),
        }
    }

    /// The profile named by `COURIER_PROFILE`, or development.
    pub fn from_env() -> Self {
        std::env::var(PROFILE_VAR)
            .map(|name| Self::parse(&name))
            .unwrap_or_default()
    }
}

impl std::fmt::Display for Profile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Builds a [`CourierConfig`] from defaults, files, environment and code.
pub struct ConfigLoader {
    /// Layers between the defaults and the files.
    base: Figment,
    /// Layers over everything else.
    overrides: Figment,
    profile: Profile,
    search_paths: Vec<PathBuf>,
    load_env: bool,
    /// Replaces the search when set.
    config_file: Option<PathBuf>,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// A loader with the profile from `COURIER_PROFILE` and environment
    /// variables enabled.
    pub fn new() -> Self {
        Self {
            base: Figment::new(),
            overrides: Figment::new(),
            profile: Profile::from_env(),
            search_paths: Vec::new(),
            load_env: true,
            config_file: None,
        }
    }

    pub fn profile(mut self, profile: impl Into<String>) -> Self {
        self.profile = Profile::parse(&profile.into());
        self
    }

    /// Adds a directory to search. Any explicit path replaces the defaults.
    pub fn search_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.search_paths.push(path.as_ref().to_path_buf());
        self
    }

    /// Loads exactly this file instead of searching. It must exist.
    pub fn file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_file = Some(path.as_ref().to_path_buf());
        self
    }

    pub fn with_env(mut self) -> Self {
        self.load_env = true;
        self
    }

    pub fn without_env(mut self) -> Self {
        self.load_env = false;
        self
    }

    /// Layers a whole config just above the built-in defaults.
    ///
    /// Files and environment variables still take precedence.
    pub fn merge(mut self, config: CourierConfig) -> Self {
        self.base = self.base.merge(Serialized::defaults(config));
        self
    }

    /// Sets one value by its dotted key, e.g. `("bot.identity", "bot@example.org")`.
    ///
    /// The value wins over files and environment variables.
    pub fn set<V: serde::Serialize>(mut self, key: &str, value: V) -> Self {
        self.overrides = self.overrides.merge(Serialized::default(key, value));
        self
    }

    pub fn load(self) -> ConfigResult<CourierConfig> {
        let profile = self.profile.clone();
        let config: CourierConfig = self.into_figment()?.extract()?;

        debug!(
            %profile,
            identity = %config.bot.identity,
            logging_level = %config.logging.level,
            "Configuration loaded"
        );
        Ok(config)
    }

    fn into_figment(self) -> ConfigResult<Figment> {
        let mut figment = Figment::from(Serialized::defaults(CourierConfig::default()))
            .merge(self.base.clone());

        figment = match &self.config_file {
            Some(path) if path.exists() => {
                info!(path = %path.display(), "Loading configuration file");
                merge_file(figment, path)?
            }
            Some(path) => return Err(ConfigError::FileNotFound(path.clone())),
            None => self.merge_found_files(figment)?,
        };

        if self.load_env {
            trace!(prefix = ENV_PREFIX, "Reading environment variables");
            figment = figment.merge(Env::prefixed(ENV_PREFIX).split("__"));
        }

        Ok(figment.merge(self.overrides))
    }

    /// Merges the profile file and main file of the first search path that
    /// has a main file.
    fn merge_found_files(&self, mut figment: Figment) -> ConfigResult<Figment> {
        for dir in self.resolve_search_paths() {
            for name in FILE_NAMES {
                let main = dir.join(name);
                if !main.exists() {
                    continue;
                }

                let profile_file = main.with_file_name(profile_file_name(name, &self.profile));
                if profile_file.exists() {
                    debug!(path = %profile_file.display(), "Loading profile configuration");
                    figment = merge_file(figment, &profile_file)?;
                }

                info!(path = %main.display(), "Loading configuration file");
                return merge_file(figment, &main);
            }
        }

        warn!("No configuration file found, using defaults");
        Ok(figment)
    }

    fn resolve_search_paths(&self) -> Vec<PathBuf> {
        if !self.search_paths.is_empty() {
            return self.search_paths.clone();
        }

        std::env::current_dir()
            .ok()
            .into_iter()
            .chain(dirs::config_dir().map(|dir| dir.join("courier")))
            .collect()
    }
}

/// `courier.toml` with profile `production` gives `courier.production.toml`.
fn profile_file_name(name: &str, profile: &Profile) -> String {
    match name.rsplit_once('.') {
        Some((stem, ext)) => format!("{stem}.{profile}.{ext}"),
        None => format!("{name}.{profile}"),
    }
}

/// Merges one file, choosing the format by extension.
fn merge_file(figment: Figment, path: &Path) -> ConfigResult<Figment> {
    let ext = path.extension().and_then(|ext| ext.to_str()).unwrap_or("");
    match ext {
        #[cfg(feature = "toml-config")]
        "toml" => Ok(figment.merge(Toml::file(path))),
        #[cfg(feature = "yaml-config")]
        "yaml" | "yml" => Ok(figment.merge(Yaml::file(path))),
        _ => Err(ConfigError::UnsupportedFormat(ext.to_string())),
    }
}
