//! Local gateway configuration (`gateway_config.json`).

use crate::error::{Result, TargetError};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default configuration file name, resolved against the working directory.
pub const DEFAULT_CONFIG_PATH: &str = "gateway_config.json";

/// Identity of the gateway that targets are provisioned against.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    pub region: String,
    pub gateway_id: String,
}

impl GatewayConfig {
    /// Read and validate the configuration at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`TargetError::Config`] if the file is missing, unreadable,
    /// malformed, or has an empty `region` or `gateway_id`.
    pub fn load(path: &Path) -> Result<Self> {
        let bytes = match std::fs::read(path) {
            Ok(b) => b,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(TargetError::Config(format!(
                    "{} not found; create it with {{\"region\": \"us-west-2\", \"gateway_id\": \"...\"}}",
                    path.display()
                )));
            }
            Err(e) => {
                return Err(TargetError::Config(format!("read {}: {e}", path.display())));
            }
        };
        let cfg: Self = serde_json::from_slice(&bytes)
            .map_err(|e| TargetError::Config(format!("parse {}: {e}", path.display())))?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn validate(&self) -> Result<()> {
        if self.region.trim().is_empty() {
            return Err(TargetError::Config("'region' must not be empty".to_string()));
        }
        if self.gateway_id.trim().is_empty() {
            return Err(TargetError::Config("'gateway_id' must not be empty".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_load_valid_config() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("gateway_config.json");
        fs::write(
            &path,
            r#"{"region": "us-west-2", "gateway_id": "my-gateway-abc123"}"#,
        )
        .unwrap();
        let cfg = GatewayConfig::load(&path).unwrap();
        assert_eq!(cfg.region, "us-west-2");
        assert_eq!(cfg.gateway_id, "my-gateway-abc123");
    }

    #[test]
    fn test_missing_config_names_path() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nope.json");
        let err = GatewayConfig::load(&path).unwrap_err();
        assert!(err.to_string().contains("nope.json"));
        assert!(err.to_string().contains("gateway_id"));
    }

    #[test]
    fn test_malformed_config_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("gateway_config.json");
        fs::write(&path, "{not json").unwrap();
        assert!(GatewayConfig::load(&path).is_err());
    }

    #[test]
    fn test_empty_region_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("gateway_config.json");
        fs::write(&path, r#"{"region": "", "gateway_id": "gw"}"#).unwrap();
        let err = GatewayConfig::load(&path).unwrap_err();
        assert!(err.to_string().contains("region"));
    }

    #[test]
    fn test_unknown_keys_tolerated() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("gateway_config.json");
        fs::write(
            &path,
            r#"{"region": "us-east-1", "gateway_id": "gw", "comment": "scratch"}"#,
        )
        .unwrap();
        let cfg = GatewayConfig::load(&path).unwrap();
        assert_eq!(cfg.region, "us-east-1");
    }
}
