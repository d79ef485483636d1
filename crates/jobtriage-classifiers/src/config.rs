//! Configuration for the classification tiers

use crate::signals::SignalTable;
use jobtriage_core::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Tier 1 confidence below which a job is escalated to Tier 2
pub const DEFAULT_ESCALATION_THRESHOLD: u8 = 70;

/// Tier 2 request deadline
pub const DEFAULT_TIER2_TIMEOUT_MS: u64 = 4000;

/// Configuration for the classifier stack
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassifierConfig {
    /// Tier 1 results below this confidence (0-100) are escalated
    #[serde(default = "default_escalation_threshold")]
    pub escalation_threshold: u8,

    /// Optional YAML signal table; the built-in table is used when absent
    #[serde(default)]
    pub signals_path: Option<PathBuf>,

    /// Tier 2 backend settings
    #[serde(default)]
    pub tier2: SemanticConfig,
}

/// Tier 2 (language model) settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SemanticConfig {
    /// Master switch; off by default so a bare install makes no API calls
    #[serde(default)]
    pub enabled: bool,

    /// Base URL of an OpenAI-compatible server
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Model name
    #[serde(default = "default_model")]
    pub model: String,

    /// Environment variable holding the API key
    #[serde(default = "default_api_key_env")]
    pub api_key_env: Option<String>,

    /// Per-request deadline in milliseconds
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_escalation_threshold() -> u8 {
    DEFAULT_ESCALATION_THRESHOLD
}

fn default_base_url() -> String {
    "https://api.openai.com".to_string()
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_api_key_env() -> Option<String> {
    Some("OPENAI_API_KEY".to_string())
}

fn default_timeout_ms() -> u64 {
    DEFAULT_TIER2_TIMEOUT_MS
}

impl Default for SemanticConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            base_url: default_base_url(),
            model: default_model(),
            api_key_env: default_api_key_env(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            escalation_threshold: DEFAULT_ESCALATION_THRESHOLD,
            signals_path: None,
            tier2: SemanticConfig::default(),
        }
    }
}

impl ClassifierConfig {
    /// Load from YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)
            .map_err(|e| Error::config(format!("Invalid classifier config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from file
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Check value ranges
    pub fn validate(&self) -> Result<()> {
        if self.escalation_threshold > 100 {
            return Err(Error::config(format!(
                "escalation_threshold must be 0-100, got {}",
                self.escalation_threshold
            )));
        }
        if self.tier2.timeout_ms == 0 {
            return Err(Error::config("tier2.timeout_ms must be greater than zero"));
        }
        if self.tier2.enabled && self.tier2.base_url.trim().is_empty() {
            return Err(Error::config("tier2.base_url is required when tier2 is enabled"));
        }
        Ok(())
    }

    /// Load the configured signal table, or the built-in one
    pub fn signal_table(&self) -> Result<SignalTable> {
        match &self.signals_path {
            Some(path) => SignalTable::from_file(path).map_err(|e| {
                Error::config(format!("Failed to load signals from {}: {}", path.display(), e))
            }),
            None => Ok(SignalTable::builtin()),
        }
    }

    /// Tier 2 deadline as a duration
    pub fn tier2_timeout(&self) -> Duration {
        Duration::from_millis(self.tier2.timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = ClassifierConfig::default();
        assert_eq!(config.escalation_threshold, 70);
        assert!(!config.tier2.enabled);
        assert_eq!(config.tier2_timeout(), Duration::from_secs(4));
        assert_eq!(config.tier2.api_key_env.as_deref(), Some("OPENAI_API_KEY"));
    }

    #[test]
    fn test_parse_partial_yaml() {
        let yaml = r#"
escalation_threshold: 60
tier2:
  enabled: true
  base_url: http://localhost:8000
  model: llama3.2
"#;

        let config = ClassifierConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.escalation_threshold, 60);
        assert!(config.tier2.enabled);
        assert_eq!(config.tier2.model, "llama3.2");
        assert_eq!(config.tier2.timeout_ms, DEFAULT_TIER2_TIMEOUT_MS);
    }

    #[test]
    fn test_rejects_invalid_values() {
        assert!(ClassifierConfig::from_yaml("escalation_threshold: 101").is_err());
        assert!(ClassifierConfig::from_yaml("tier2:\n  timeout_ms: 0").is_err());
        assert!(ClassifierConfig::from_yaml("escalation_threshold: -1").is_err());
    }

    #[test]
    fn test_signal_table_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "red:\n  - sewage\ngreen:\n  - doorbell").unwrap();

        let config = ClassifierConfig {
            signals_path: Some(file.path().to_path_buf()),
            ..Default::default()
        };

        let table = config.signal_table().unwrap();
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_missing_signal_file_is_config_error() {
        let config = ClassifierConfig {
            signals_path: Some(PathBuf::from("/nonexistent/signals.yaml")),
            ..Default::default()
        };
        assert!(matches!(config.signal_table(), Err(Error::Config(_))));
    }
}
