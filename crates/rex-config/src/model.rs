use std::path::{Path, PathBuf};

use rex_domain::ConflictDetection;
use serde::{Deserialize, Serialize};

pub const DEFAULT_STORE_FILE: &str = "expenses.json";

/// User-tunable engine settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub conflict_detection: ConflictDetection,
    #[serde(default = "Config::default_currency_value")]
    pub default_currency: String,

    /// Custom location of the expense store. Defaults to `<data dir>/expenses.json`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub store_path: Option<PathBuf>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_filter: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            conflict_detection: ConflictDetection::default(),
            default_currency: Self::default_currency_value(),
            store_path: None,
            log_filter: None,
        }
    }
}

impl Config {
    pub fn default_currency_value() -> String {
        "USD".into()
    }

    /// Checks the values serde cannot: the currency code shape and empty
    /// overrides. Returns the first problem found.
    pub fn validate(&self) -> Result<(), String> {
        let code = &self.default_currency;
        if code.len() != 3 || !code.chars().all(|ch| ch.is_ascii_alphabetic()) {
            return Err(format!(
                "default_currency `{code}` must be a three-letter code"
            ));
        }
        if self
            .store_path
            .as_ref()
            .is_some_and(|path| path.as_os_str().is_empty())
        {
            return Err("store_path cannot be empty".into());
        }
        if self
            .log_filter
            .as_deref()
            .is_some_and(|filter| filter.trim().is_empty())
        {
            return Err("log_filter cannot be empty".into());
        }
        Ok(())
    }

    pub fn resolve_store_path(&self, data_dir: &Path) -> PathBuf {
        match &self.store_path {
            Some(path) => path.clone(),
            None => data_dir.join(DEFAULT_STORE_FILE),
        }
    }
}
