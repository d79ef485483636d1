//! Server configuration

use anyhow::Context;
use jobtriage_classifiers::ClassifierConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

/// Server configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Listen address
    #[serde(default = "default_listen")]
    pub listen: String,

    /// Listen port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Decision log settings
    #[serde(default)]
    pub audit: AuditConfig,

    /// Classifier settings
    #[serde(default)]
    pub classifier: ClassifierConfig,
}

/// Command-line values that take precedence over the file
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub listen: Option<String>,
    pub port: Option<u16>,
    pub no_tier2: bool,
    pub tier2_url: Option<String>,
}

impl ServerConfig {
    /// Load configuration from file and CLI overrides
    pub fn load(config_path: &str, overrides: &Overrides) -> anyhow::Result<Self> {
        // Try to load from file, or use defaults
        let mut config: Self = if Path::new(config_path).exists() {
            let content = std::fs::read_to_string(config_path)
                .with_context(|| format!("Failed to read {}", config_path))?;
            serde_yaml::from_str(&content)
                .with_context(|| format!("Invalid configuration in {}", config_path))?
        } else {
            info!("No configuration at {}, using defaults", config_path);
            Self::default()
        };

        // Apply CLI overrides
        if let Some(listen) = &overrides.listen {
            config.listen = listen.clone();
        }

        if let Some(port) = overrides.port {
            config.port = port;
        }

        if let Some(url) = &overrides.tier2_url {
            config.classifier.tier2.base_url = url.clone();
        }

        if overrides.no_tier2 {
            config.classifier.tier2.enabled = false;
        }

        config.classifier.validate()?;
        Ok(config)
    }

    /// Socket address string for binding
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.listen, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            port: default_port(),
            audit: AuditConfig::default(),
            classifier: ClassifierConfig::default(),
        }
    }
}

/// Decision log configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditConfig {
    /// Record call decisions
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Retained decisions before the oldest is evicted
    #[serde(default = "default_capacity")]
    pub capacity: usize,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            capacity: default_capacity(),
        }
    }
}

fn default_listen() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_true() -> bool {
    true
}

fn default_capacity() -> usize {
    jobtriage_telemetry::audit::DEFAULT_CAPACITY
}
