//! Runtime configuration read from the environment.
//!
//! A `.env` file in the working directory is loaded first, so keys can live
//! there instead of the shell profile.

use std::path::PathBuf;

use anyhow::Result;

/// Model used for the quick title/summary/category pass.
pub const DEFAULT_METADATA_MODEL: &str = "gemini-2.5-flash";

/// Model used for in-depth analysis.
pub const DEFAULT_ANALYSIS_MODEL: &str = "gemini-2.5-pro";

/// Settings for the CLI and TUI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Gemini API key. AI features fall back to placeholders without one.
    pub api_key: Option<String>,
    /// Override for the Gemini host, mostly useful for proxies and tests.
    pub base_url: Option<String>,
    pub metadata_model: String,
    pub analysis_model: String,
    /// Override for the database location.
    pub database_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: None,
            metadata_model: DEFAULT_METADATA_MODEL.to_string(),
            analysis_model: DEFAULT_ANALYSIS_MODEL.to_string(),
            database_path: None,
        }
    }
}

impl Config {
    /// Loads `.env` (if present) and then reads the environment.
    pub fn load() -> Self {
        match dotenvy::dotenv() {
            Ok(path) => tracing::debug!(path = %path.display(), "loaded .env"),
            Err(e) if e.not_found() => {}
            Err(e) => tracing::warn!(error = %e, "failed to read .env"),
        }
        Self::from_env()
    }

    /// Reads configuration from environment variables only.
    ///
    /// | Variable | Meaning |
    /// |---|---|
    /// | `GEMINI_API_KEY` / `API_KEY` | API key |
    /// | `GEMINI_BASE_URL` | API host |
    /// | `SHELF_METADATA_MODEL` | model for link metadata |
    /// | `SHELF_ANALYSIS_MODEL` | model for deep analysis |
    /// | `SHELF_DB` | database file |
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            api_key: api_key_from_env(),
            base_url: non_empty_var("GEMINI_BASE_URL"),
            metadata_model: non_empty_var("SHELF_METADATA_MODEL")
                .unwrap_or(defaults.metadata_model),
            analysis_model: non_empty_var("SHELF_ANALYSIS_MODEL")
                .unwrap_or(defaults.analysis_model),
            database_path: non_empty_var("SHELF_DB").map(PathBuf::from),
        }
    }

    /// Returns the database path, honoring `SHELF_DB`.
    pub fn database_path(&self) -> Result<PathBuf> {
        match &self.database_path {
            Some(path) => Ok(path.clone()),
            None => crate::utils::get_database_path(),
        }
    }
}

/// Reads the API key from `GEMINI_API_KEY`, falling back to `API_KEY`.
pub fn api_key_from_env() -> Option<String> {
    non_empty_var("GEMINI_API_KEY").or_else(|| non_empty_var("API_KEY"))
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const VARS: [&str; 6] = [
        "GEMINI_API_KEY",
        "API_KEY",
        "GEMINI_BASE_URL",
        "SHELF_METADATA_MODEL",
        "SHELF_ANALYSIS_MODEL",
        "SHELF_DB",
    ];

    fn clear_env() {
        for var in VARS {
            unsafe {
                std::env::remove_var(var);
            }
        }
    }

    #[test]
    #[serial]
    fn from_env_uses_defaults_when_unset() {
        clear_env();

        let config = Config::from_env();
        assert_eq!(config, Config::default());
        assert_eq!(config.metadata_model, "gemini-2.5-flash");
        assert_eq!(config.analysis_model, "gemini-2.5-pro");
    }

    #[test]
    #[serial]
    fn from_env_reads_overrides() {
        clear_env();
        unsafe {
            std::env::set_var("GEMINI_API_KEY", "secret");
            std::env::set_var("SHELF_METADATA_MODEL", "gemini-2.0-flash");
            std::env::set_var("SHELF_DB", "/tmp/shelf-test.db");
        }

        let config = Config::from_env();
        assert_eq!(config.api_key.as_deref(), Some("secret"));
        assert_eq!(config.metadata_model, "gemini-2.0-flash");
        assert_eq!(
            config.database_path().unwrap(),
            PathBuf::from("/tmp/shelf-test.db")
        );

        clear_env();
    }

    #[test]
    #[serial]
    fn api_key_falls_back_to_legacy_variable_and_ignores_blank() {
        clear_env();
        unsafe {
            std::env::set_var("GEMINI_API_KEY", "  ");
            std::env::set_var("API_KEY", "legacy");
        }

        assert_eq!(api_key_from_env().as_deref(), Some("legacy"));

        clear_env();
    }
}
