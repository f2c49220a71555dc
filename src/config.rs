/**
 * ============================================================================
 * CLUSTER CONFIG MODULE
 * ============================================================================
 *
 * PURPOSE: Optional overrides for the cluster layout
 *
 * FILE PATH (first match wins):
 * 1. --config <path>
 * 2. $CLUSTER_CONFIG
 * 3. {project_root}/cluster.json
 *
 * A missing default file means "use defaults". A path given explicitly
 * must exist.
 *
 * ENVIRONMENT:
 * - CLUSTER_CONFIG: config file path
 * - CLUSTER_HEADLESS: "1"/"true" launches services without terminals
 * ============================================================================
 */

use crate::bootstrap::RuntimeEnv;
use crate::error::ClusterError;
use crate::launcher::readiness::ReadinessConfig;
use crate::services::{ServiceCatalog, ServiceSpec};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_FILE: &str = "cluster.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusterConfig {
    // Virtual environment, relative to the project root
    pub venv_dir: PathBuf,

    pub requirements: PathBuf,

    // Interpreter that creates the virtual environment
    pub python: String,

    // Interactive client launched by `clusterctl client`
    pub client_script: PathBuf,

    pub readiness: ReadinessConfig,

    // Replaces the built-in catalog when present
    #[serde(skip_serializing_if = "Option::is_none")]
    pub services: Option<Vec<ServiceSpec>>,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            venv_dir: PathBuf::from("venv"),
            requirements: PathBuf::from("requirements.txt"),
            python: if cfg!(windows) { "python" } else { "python3" }.to_string(),
            client_script: PathBuf::from("client").join("client-cli.py"),
            readiness: ReadinessConfig::default(),
            services: None,
        }
    }
}

impl ClusterConfig {
    pub fn catalog(&self) -> Result<ServiceCatalog, ClusterError> {
        match &self.services {
            Some(services) if services.is_empty() => {
                Err(ClusterError::Config("service list is empty".to_string()))
            }
            Some(services) => ServiceCatalog::new(services.clone()),
            None => Ok(ServiceCatalog::reference()),
        }
    }

    pub fn runtime_env(&self, root: &Path) -> RuntimeEnv {
        RuntimeEnv::new(root, &self.venv_dir, &self.requirements, self.python.clone())
    }
}

// Resolve which file to read and whether it has to exist
fn config_path(root: &Path, explicit: Option<&Path>) -> (PathBuf, bool) {
    if let Some(path) = explicit {
        return (root.join(path), true);
    }
    if let Some(path) = std::env::var_os("CLUSTER_CONFIG") {
        return (root.join(path), true);
    }
    (root.join(DEFAULT_CONFIG_FILE), false)
}

// Load configuration for the project rooted at `root`
pub fn load_config(root: &Path, explicit: Option<&Path>) -> Result<ClusterConfig, ClusterError> {
    let (path, required) = config_path(root, explicit);

    if !path.exists() {
        if required {
            return Err(ClusterError::Config(format!(
                "config file not found: {:?}",
                path
            )));
        }
        log::info!("No cluster config found, using defaults");
        return Ok(ClusterConfig::default());
    }

    let contents = std::fs::read_to_string(&path)
        .map_err(|e| ClusterError::Config(format!("failed to read {:?}: {}", path, e)))?;

    let config: ClusterConfig = serde_json::from_str(&contents)
        .map_err(|e| ClusterError::Config(format!("failed to parse {:?}: {}", path, e)))?;

    log::info!("Loaded cluster config from {:?}", path);
    Ok(config)
}

pub fn headless_from_env() -> bool {
    std::env::var("CLUSTER_HEADLESS")
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::launcher::readiness::ReadinessMode;

    #[test]
    fn test_missing_default_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config(dir.path(), None).unwrap();
        assert_eq!(config, ClusterConfig::default());
        assert_eq!(config.catalog().unwrap().len(), 6);
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_config(dir.path(), Some(Path::new("nope.json"))).unwrap_err();
        assert!(matches!(err, ClusterError::Config(_)));
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("custom.json"),
            r#"{ "venv_dir": ".venv", "readiness": { "mode": "probe", "timeout_secs": 5 } }"#,
        )
        .unwrap();

        let config = load_config(dir.path(), Some(Path::new("custom.json"))).unwrap();

        assert_eq!(config.venv_dir, PathBuf::from(".venv"));
        assert_eq!(config.requirements, PathBuf::from("requirements.txt"));
        assert_eq!(config.readiness.mode, ReadinessMode::Probe);
        assert_eq!(config.readiness.timeout_secs, 5);
        assert_eq!(config.readiness.interval_ms, 250);
    }

    #[test]
    fn test_custom_services_replace_catalog() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("cluster.json"),
            r#"{ "services": [
                { "name": "auth", "command": "python", "args": ["auth-server.py"],
                  "working_dir": "auth-service", "title": "Auth", "port": 8000,
                  "delay_ms": 500, "signature": "auth-server.py" }
            ] }"#,
        )
        .unwrap();

        let catalog = load_config(dir.path(), None).unwrap().catalog().unwrap();
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.services()[0].delay_ms, 500);
    }

    #[test]
    fn test_invalid_json_is_a_config_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("cluster.json"), "{ not json").unwrap();
        assert!(matches!(
            load_config(dir.path(), None),
            Err(ClusterError::Config(_))
        ));
    }

    #[test]
    fn test_empty_service_list_is_rejected() {
        let config = ClusterConfig {
            services: Some(Vec::new()),
            ..Default::default()
        };
        assert!(config.catalog().is_err());
    }
}
