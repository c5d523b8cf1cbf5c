//! Centralized application configuration.
//!
//! Configuration is loaded from a TOML file, from environment variables, or
//! both (environment overrides file). Each concern gets its own section
//! struct with defaults and validation; the shard address list is read-only
//! after startup.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration error.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A configuration value is invalid.
    #[error("invalid configuration for {key}: '{value}' ({reason})")]
    InvalidValue {
        key: String,
        value: String,
        reason: String,
    },

    /// A required configuration value is missing.
    #[error("missing required configuration: {key} ({hint})")]
    MissingRequired { key: String, hint: String },

    /// The config file could not be read.
    #[error("failed to read config file {path}: {source}")]
    ReadFile {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The config file could not be parsed.
    #[error("failed to parse config file {path}: {source}")]
    ParseFile {
        path: String,
        #[source]
        source: toml::de::Error,
    },
}

/// Where user accounts live, if anywhere.
///
/// `None` means the deployment has no user-account system at all
/// (single-tenant mode): every access check passes. `Local` means this node
/// is authoritative for user records. `Root` means user records live on the
/// federation root and permission checks are forwarded there.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AuthSource {
    /// No user accounts; everyone has write and admin access.
    #[default]
    None,
    /// User records are stored on this node.
    Local,
    /// User records are authoritative on the federation root.
    Root,
}

impl AuthSource {
    /// Whether any user-account system is enabled.
    pub fn has_user_accounts(&self) -> bool {
        !matches!(self, AuthSource::None)
    }

    /// Whether this node is authoritative for user records.
    pub fn is_local(&self) -> bool {
        matches!(self, AuthSource::Local)
    }
}

/// Access-control configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Where user accounts live.
    #[serde(default)]
    pub source: AuthSource,

    /// Restrict write operations to admin users.
    #[serde(default)]
    pub restrict_write_access: bool,
}

impl AuthConfig {
    /// Load from environment variables (`ALDER_AUTH_SOURCE`,
    /// `ALDER_RESTRICT_WRITE_ACCESS`), falling back to defaults.
    pub fn load() -> Result<Self, ConfigError> {
        let source = match std::env::var("ALDER_AUTH_SOURCE") {
            Ok(v) => match v.as_str() {
                "none" => AuthSource::None,
                "local" => AuthSource::Local,
                "root" => AuthSource::Root,
                other => {
                    return Err(ConfigError::InvalidValue {
                        key: "ALDER_AUTH_SOURCE".to_string(),
                        value: other.to_string(),
                        reason: "expected one of: none, local, root".to_string(),
                    })
                }
            },
            Err(_) => AuthSource::default(),
        };

        let restrict_write_access = parse_bool_env("ALDER_RESTRICT_WRITE_ACCESS")?.unwrap_or(false);

        Ok(Self {
            source,
            restrict_write_access,
        })
    }
}

/// Federation configuration, consulted by discovery and the admin check.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FederationConfig {
    /// Whether this node is the authoritative federation root.
    #[serde(default)]
    pub is_root: bool,

    /// RPC endpoint of the federation root. Required on satellites that
    /// route authority-sensitive operations to the root.
    #[serde(default)]
    pub root_endpoint: Option<String>,
}

impl FederationConfig {
    /// Load from environment variables (`ALDER_IS_ROOT`,
    /// `ALDER_ROOT_ENDPOINT`).
    pub fn load() -> Result<Self, ConfigError> {
        let is_root = parse_bool_env("ALDER_IS_ROOT")?.unwrap_or(false);
        let root_endpoint = std::env::var("ALDER_ROOT_ENDPOINT").ok().filter(|s| !s.is_empty());
        Ok(Self {
            is_root,
            root_endpoint,
        })
    }

    /// The root endpoint, or an error if this satellite has none configured.
    pub fn root_endpoint(&self) -> Result<&str, ConfigError> {
        self.root_endpoint
            .as_deref()
            .ok_or_else(|| ConfigError::MissingRequired {
                key: "federation.root_endpoint".to_string(),
                hint: "satellite nodes must configure the root RPC endpoint".to_string(),
            })
    }
}

/// Storage configuration for the shard daemon.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory under which repositories are stored, keyed by name.
    pub repos_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            repos_dir: PathBuf::from("/var/lib/alder/repos"),
        }
    }
}

impl StorageConfig {
    /// Load from environment variables (`ALDER_REPOS_DIR`).
    pub fn load() -> Result<Self, ConfigError> {
        let repos_dir = std::env::var("ALDER_REPOS_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| Self::default().repos_dir);
        Ok(Self { repos_dir })
    }
}

/// Cluster configuration: the shard address list.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClusterConfig {
    /// Addresses of the git-storage shard daemons. Placement is a pure
    /// function of the repository name and this list; the list must not
    /// change while the process runs.
    #[serde(default)]
    pub shards: Vec<String>,

    /// Address this node's own RPC listener binds to, when serving as a
    /// shard daemon or federation root.
    #[serde(default)]
    pub listen_addr: Option<String>,
}

impl ClusterConfig {
    /// Load from environment variables (`ALDER_SHARDS` comma-separated,
    /// `ALDER_LISTEN_ADDR`).
    pub fn load() -> Result<Self, ConfigError> {
        let shards = std::env::var("ALDER_SHARDS")
            .map(|v| {
                v.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default();
        let listen_addr = std::env::var("ALDER_LISTEN_ADDR").ok().filter(|s| !s.is_empty());
        Ok(Self {
            shards,
            listen_addr,
        })
    }
}

/// Top-level application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub cluster: ClusterConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub federation: FederationConfig,
}

impl AppConfig {
    /// Load configuration from environment variables with defaults.
    pub fn load() -> Result<Self, ConfigError> {
        let config = Self {
            cluster: ClusterConfig::load()?,
            storage: StorageConfig::load()?,
            auth: AuthConfig::load()?,
            federation: FederationConfig::load()?,
        };
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: impl AsRef<std::path::Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadFile {
            path: path.display().to_string(),
            source,
        })?;
        let config: Self = toml::from_str(&contents).map_err(|source| ConfigError::ParseFile {
            path: path.display().to_string(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Validate cross-section invariants.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.federation.is_root && self.auth.source == AuthSource::Root {
            // Satellites that forward permission checks must know the root.
            self.federation.root_endpoint()?;
        }
        for shard in &self.cluster.shards {
            if shard.trim().is_empty() {
                return Err(ConfigError::InvalidValue {
                    key: "cluster.shards".to_string(),
                    value: String::new(),
                    reason: "shard addresses must be non-empty".to_string(),
                });
            }
        }
        Ok(())
    }
}

fn parse_bool_env(key: &str) -> Result<Option<bool>, ConfigError> {
    match std::env::var(key) {
        Ok(v) => match v.as_str() {
            "1" | "true" | "yes" => Ok(Some(true)),
            "0" | "false" | "no" => Ok(Some(false)),
            other => Err(ConfigError::InvalidValue {
                key: key.to_string(),
                value: other.to_string(),
                reason: "expected a boolean (true/false)".to_string(),
            }),
        },
        Err(_) => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_source_flags() {
        assert!(!AuthSource::None.has_user_accounts());
        assert!(AuthSource::Local.has_user_accounts());
        assert!(AuthSource::Root.has_user_accounts());
        assert!(AuthSource::Local.is_local());
        assert!(!AuthSource::Root.is_local());
    }

    #[test]
    fn satellite_forwarding_requires_root_endpoint() {
        let config = AppConfig {
            auth: AuthConfig {
                source: AuthSource::Root,
                restrict_write_access: false,
            },
            federation: FederationConfig {
                is_root: false,
                root_endpoint: None,
            },
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::MissingRequired { .. })
        ));

        let config = AppConfig {
            federation: FederationConfig {
                is_root: false,
                root_endpoint: Some("10.0.0.1:13100".to_string()),
            },
            ..config
        };
        config.validate().expect("endpoint satisfies the check");
    }

    #[test]
    fn toml_round_trip() {
        let toml = r#"
            [cluster]
            shards = ["10.0.0.1:13080", "10.0.0.2:13080"]

            [auth]
            source = "local"
            restrict_write_access = true

            [federation]
            is_root = true
        "#;
        let config: AppConfig = toml::from_str(toml).expect("parses");
        assert_eq!(config.cluster.shards.len(), 2);
        assert_eq!(config.auth.source, AuthSource::Local);
        assert!(config.auth.restrict_write_access);
        assert!(config.federation.is_root);
    }
}
