//! TOML configuration for the Strata daemon.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use strata_gateway::DEFAULT_MAX_BODY_BYTES;
use strata_ledger::{DEFAULT_MAX_REFERENCE_DEPTH, LedgerConfig};

/// Top-level configuration, parsed from TOML.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    /// Data directory and gateway address.
    pub node: NodeSection,
    /// Log storage backend.
    pub storage: StorageSection,
    /// Ledger tunables.
    pub ledger: LedgerSection,
    /// HTTP gateway settings.
    pub gateway: GatewaySection,
    /// Logging configuration.
    pub log: LogSection,
}

/// `[node]` section.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct NodeSection {
    /// Directory holding the ledger's log.
    pub data_dir: PathBuf,
    /// Address for the HTTP gateway.
    pub listen_addr: String,
}

impl Default for NodeSection {
    fn default() -> Self {
        let data_dir = dirs::home_dir()
            .map(|h| h.join(".strata"))
            .unwrap_or_else(|| PathBuf::from(".strata"));
        Self {
            data_dir,
            listen_addr: "127.0.0.1:3323".to_string(),
        }
    }
}

/// `[storage]` section.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct StorageSection {
    /// Backend type: `"fjall"` (default) or `"memory"`.
    pub backend: String,
    /// Fsync the journal after every append.
    pub sync_writes: bool,
}

impl Default for StorageSection {
    fn default() -> Self {
        Self {
            backend: "fjall".to_string(),
            sync_writes: true,
        }
    }
}

/// `[ledger]` section.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LedgerSection {
    /// Maximum reference hops per lookup.
    pub max_reference_depth: Option<usize>,
}

/// `[gateway]` section.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct GatewaySection {
    /// Bearer token required on every request. Open when unset.
    pub auth_token: Option<String>,
    /// Request body limit in bytes.
    pub max_body_bytes: Option<usize>,
}

/// `[log]` section.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LogSection {
    /// Log level filter (e.g. `"info"`, `"debug"`, `"warn"`).
    pub level: String,
}

impl Default for LogSection {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl CliConfig {
    /// Load config from a TOML file, or use defaults if no path given.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        match path {
            Some(p) => {
                let content = std::fs::read_to_string(p)?;
                let config: CliConfig = toml::from_str(&content)?;
                Ok(config)
            }
            None => Ok(Self::default()),
        }
    }

    /// Parse config from a TOML string (used in tests).
    #[cfg(test)]
    pub fn from_toml(s: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(s)?)
    }

    /// Whether the log lives in memory only.
    pub fn memory_mode(&self) -> bool {
        self.storage.backend == "memory"
    }

    /// Directory of the Fjall log inside the data directory.
    pub fn log_dir(&self) -> PathBuf {
        self.node.data_dir.join("log")
    }

    /// Ledger settings.
    pub fn ledger_config(&self) -> LedgerConfig {
        LedgerConfig {
            max_reference_depth: self
                .ledger
                .max_reference_depth
                .unwrap_or(DEFAULT_MAX_REFERENCE_DEPTH),
        }
    }

    /// Effective request body limit.
    pub fn max_body_bytes(&self) -> usize {
        self.gateway
            .max_body_bytes
            .unwrap_or(DEFAULT_MAX_BODY_BYTES)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_config() {
        let toml = r#"
[node]
data_dir = "/tmp/strata-test"
listen_addr = "127.0.0.1:5323"

[storage]
backend = "memory"
sync_writes = false

[ledger]
max_reference_depth = 3

[gateway]
auth_token = "s3cret"
max_body_bytes = 1024

[log]
level = "debug"
"#;
        let config = CliConfig::from_toml(toml).unwrap();
        assert_eq!(config.node.data_dir, PathBuf::from("/tmp/strata-test"));
        assert_eq!(config.node.listen_addr, "127.0.0.1:5323");
        assert!(config.memory_mode());
        assert!(!config.storage.sync_writes);
        assert_eq!(config.ledger_config().max_reference_depth, 3);
        assert_eq!(config.gateway.auth_token.as_deref(), Some("s3cret"));
        assert_eq!(config.max_body_bytes(), 1024);
        assert_eq!(config.log.level, "debug");
    }

    #[test]
    fn test_parse_minimal_config() {
        let config = CliConfig::from_toml("").unwrap();
        let expected_default = dirs::home_dir()
            .map(|h| h.join(".strata"))
            .unwrap_or_else(|| PathBuf::from(".strata"));
        assert_eq!(config.node.data_dir, expected_default);
        assert_eq!(config.log_dir(), expected_default.join("log"));
        assert_eq!(config.node.listen_addr, "127.0.0.1:3323");
        assert_eq!(config.storage.backend, "fjall");
        assert!(config.storage.sync_writes);
        assert_eq!(
            config.ledger_config().max_reference_depth,
            DEFAULT_MAX_REFERENCE_DEPTH
        );
        assert_eq!(config.gateway.auth_token, None);
        assert_eq!(config.max_body_bytes(), DEFAULT_MAX_BODY_BYTES);
        assert_eq!(config.log.level, "info");
    }

    #[test]
    fn test_parse_partial_config() {
        let toml = r#"
[gateway]
auth_token = "t"
"#;
        let config = CliConfig::from_toml(toml).unwrap();
        assert_eq!(config.gateway.auth_token.as_deref(), Some("t"));
        assert!(!config.memory_mode());
        assert_eq!(config.max_body_bytes(), DEFAULT_MAX_BODY_BYTES);
    }

    #[test]
    fn test_reject_unknown_value_type() {
        let toml = r#"
[ledger]
max_reference_depth = "deep"
"#;
        assert!(CliConfig::from_toml(toml).is_err());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("strata.toml");
        std::fs::write(
            &path,
            r#"
[node]
data_dir = "/tmp/test-strata"
"#,
        )
        .unwrap();

        let config = CliConfig::load(Some(&path)).unwrap();
        assert_eq!(config.node.data_dir, PathBuf::from("/tmp/test-strata"));
    }

    #[test]
    fn test_load_missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        assert!(CliConfig::load(Some(&dir.path().join("nope.toml"))).is_err());
    }

    #[test]
    fn test_load_without_path_uses_defaults() {
        let config = CliConfig::load(None).unwrap();
        assert_eq!(config.storage.backend, "fjall");
    }
}
