//! Configuration management for RAX File Broker
//!
//! Separates startup configuration (requires restart) from runtime configuration
//! (can be updated from the operator console).

use config::{Config, Environment, File, FileFormat};
use serde::Deserialize;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::roots::RootLayout;

/// Complete broker configuration with startup/runtime separation
#[derive(Debug, Deserialize, Clone)]
pub struct BrokerConfig {
    #[serde(flatten)]
    pub startup: StartupConfig,

    #[serde(flatten)]
    pub runtime: RuntimeConfig,
}

/// Configuration that requires restart to take effect
#[derive(Debug, Deserialize, Clone)]
pub struct StartupConfig {
    // ═══ ADDRESSING ═══
    /// Token scheme
    #[serde(default = "default_scheme")]
    pub scheme: String,

    /// Token authority identifying this broker
    pub authority: String,

    // ═══ STORAGE ROOTS ═══
    /// App-private persistent directory
    pub files_dir: String,

    /// App-private cache directory
    pub cache_dir: String,

    /// Mount point of removable storage; its roots exist only if mounted at startup
    #[serde(default)]
    pub external_storage_dir: Option<String>,

    // ═══ EXPOSURE ═══
    /// Must stay false: the broker is never openly reachable
    #[serde(default)]
    pub exported: bool,

    /// Must stay true: access goes through per-token grants
    #[serde(default = "default_true")]
    pub grant_uri_permissions: bool,

    /// `update` deletes the file when true, is rejected otherwise
    #[serde(default = "default_true")]
    pub update_deletes: bool,

    // ═══ NETWORK ═══
    pub bind_address: String,
    pub port: u16,
    pub max_command_length: usize,
    pub buffer_size: usize,
}

/// Configuration that can be updated at runtime via console commands
#[derive(Debug, Deserialize, Clone)]
pub struct RuntimeConfig {
    /// Maximum concurrent clients
    /// Environment: RAX_BROKER_MAX_CLIENTS
    pub max_clients: usize,

    /// Lifetime of a new grant in seconds
    /// Environment: RAX_BROKER_GRANT_TTL_SECS
    pub grant_ttl_secs: u64,
}

/// Thread-safe runtime configuration wrapper
pub type SharedRuntimeConfig = Arc<RwLock<RuntimeConfig>>;

fn default_true() -> bool {
    true
}

fn default_scheme() -> String {
    "content".to_string()
}

impl BrokerConfig {
    /// Load configuration from config.toml with environment overrides
    pub fn load() -> Result<Self, config::ConfigError> {
        let config_paths = ["rax-file-broker/config", "config"];
        let mut last_error = None;

        for config_path in &config_paths {
            match Config::builder()
                .add_source(File::with_name(config_path))
                .add_source(Environment::with_prefix("RAX_BROKER").try_parsing(true))
                .build()
            {
                Ok(settings) => {
                    let config: BrokerConfig = settings.try_deserialize()?;
                    config.validate()?;
                    return Ok(config);
                }
                Err(e) => {
                    last_error = Some(e);
                    continue;
                }
            }
        }

        Err(config::ConfigError::Message(format!(
            "Failed to load config.toml from any location. Tried: {config_paths:?}. Last error: {last_error:?}"
        )))
    }

    /// Parse and validate an inline TOML document
    pub fn from_toml_str(toml: &str) -> Result<Self, config::ConfigError> {
        let config: BrokerConfig = Config::builder()
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()?
            .try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Split into startup (immutable) and runtime (mutable) parts
    pub fn split(self) -> (StartupConfig, SharedRuntimeConfig) {
        let runtime = Arc::new(RwLock::new(self.runtime));
        (self.startup, runtime)
    }

    /// Validation for all configuration values
    fn validate(&self) -> Result<(), config::ConfigError> {
        let startup = &self.startup;

        let scheme_ok = startup
            .scheme
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic())
            && startup
                .scheme
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'));
        if !scheme_ok {
            return Err(config::ConfigError::Message(format!(
                "Invalid scheme '{}'",
                startup.scheme
            )));
        }

        if startup.authority.is_empty() || startup.authority.contains(['/', '?', '#']) {
            return Err(config::ConfigError::Message(format!(
                "Invalid authority '{}'",
                startup.authority
            )));
        }

        if startup.files_dir.is_empty() || startup.cache_dir.is_empty() {
            return Err(config::ConfigError::Message(
                "files_dir and cache_dir cannot be empty".into(),
            ));
        }

        // Environment preconditions: never openly exported, always grant-gated
        if startup.exported {
            return Err(config::ConfigError::Message(
                "Broker must not be exported".into(),
            ));
        }

        if !startup.grant_uri_permissions {
            return Err(config::ConfigError::Message(
                "Broker requires grant_uri_permissions".into(),
            ));
        }

        if startup.port == 0 {
            return Err(config::ConfigError::Message("Port cannot be 0".into()));
        }

        if startup.buffer_size == 0 || startup.max_command_length == 0 {
            return Err(config::ConfigError::Message(
                "buffer_size and max_command_length must be greater than 0".into(),
            ));
        }

        if self.runtime.max_clients == 0 {
            return Err(config::ConfigError::Message(
                "max_clients must be greater than 0".into(),
            ));
        }

        if self.runtime.grant_ttl_secs == 0 {
            return Err(config::ConfigError::Message(
                "grant_ttl_secs must be greater than 0".into(),
            ));
        }

        Ok(())
    }
}

impl StartupConfig {
    /// Get bind address and port as socket address
    pub fn listen_socket(&self) -> String {
        format!("{}:{}", self.bind_address, self.port)
    }

    /// Directories the root registry is built from
    pub fn root_layout(&self) -> RootLayout {
        RootLayout {
            files_dir: PathBuf::from(&self.files_dir),
            cache_dir: PathBuf::from(&self.cache_dir),
            external_storage_dir: self.external_storage_dir.as_ref().map(PathBuf::from),
        }
    }
}

impl RuntimeConfig {
    /// Get grant lifetime as Duration
    pub fn grant_ttl(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.grant_ttl_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = r#"
        authority = "rax.file-broker"
        files_dir = "/tmp/rax/files"
        cache_dir = "/tmp/rax/cache"
        bind_address = "127.0.0.1"
        port = 7070
        max_command_length = 4096
        buffer_size = 8192
        max_clients = 4
        grant_ttl_secs = 60
    "#;

    #[test]
    fn test_minimal_config_uses_safe_defaults() {
        let config = BrokerConfig::from_toml_str(BASE).unwrap();
        assert_eq!(config.startup.scheme, "content");
        assert!(!config.startup.exported);
        assert!(config.startup.grant_uri_permissions);
        assert!(config.startup.update_deletes);
        assert_eq!(config.startup.external_storage_dir, None);
        assert_eq!(config.startup.listen_socket(), "127.0.0.1:7070");
        assert_eq!(config.runtime.grant_ttl().as_secs(), 60);
    }

    #[test]
    fn test_exported_broker_is_fatal() {
        let toml = format!("exported = true\n{BASE}");
        assert!(BrokerConfig::from_toml_str(&toml).is_err());
    }

    #[test]
    fn test_missing_grant_permissions_is_fatal() {
        let toml = format!("grant_uri_permissions = false\n{BASE}");
        assert!(BrokerConfig::from_toml_str(&toml).is_err());
    }

    #[test]
    fn test_invalid_authority_rejected() {
        let toml = BASE.replace("rax.file-broker", "a/b");
        assert!(BrokerConfig::from_toml_str(&toml).is_err());
    }

    #[test]
    fn test_root_layout_carries_external_dir() {
        let toml = format!("external_storage_dir = \"/mnt/sd\"\n{BASE}");
        let (startup, _runtime) = BrokerConfig::from_toml_str(&toml).unwrap().split();
        let layout = startup.root_layout();
        assert_eq!(layout.files_dir, PathBuf::from("/tmp/rax/files"));
        assert_eq!(layout.external_storage_dir, Some(PathBuf::from("/mnt/sd")));
    }
}
