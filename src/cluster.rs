/**
 * ============================================================================
 * CLUSTER COMMANDS
 * ============================================================================
 *
 * PURPOSE: The operations behind each CLI subcommand
 *
 * - start: catalog -> platform -> bootstrap -> launch
 * - stop: one forceful sweep over the process table
 * - status: read-only sweep, grouped per catalog entry
 * - client: foreground interactive client, environment required
 *
 * `start` and `stop` share no state; stop rediscovers everything by
 * signature.
 * ============================================================================
 */

use crate::bootstrap::{EnvironmentBootstrapper, RuntimeEnv};
use crate::config::{load_config, ClusterConfig};
use crate::error::ClusterError;
use crate::launcher::readiness::ReadinessMode;
use crate::launcher::{ClusterLauncher, LaunchReport};
use crate::platform::spawner::{LaunchCommand, ProcessSpawner, SystemSpawner};
use crate::platform::{select_adapter, Platform};
use crate::services::{ServiceCatalog, ServiceStatus};
use crate::terminator::{ProcessTable, ProcessTerminator};
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub struct Cluster {
    root: PathBuf,
    config: ClusterConfig,
    spawner: Arc<dyn ProcessSpawner>,
}

impl Cluster {
    /// Read the config for the project at `root` and use the real OS.
    pub fn load(root: &Path, config_path: Option<&Path>) -> Result<Self, ClusterError> {
        let config = load_config(root, config_path)?;
        Ok(Self::with_spawner(root, config, Arc::new(SystemSpawner)))
    }

    pub fn with_spawner(root: &Path, config: ClusterConfig, spawner: Arc<dyn ProcessSpawner>) -> Self {
        Self {
            root: root.to_path_buf(),
            config,
            spawner,
        }
    }

    pub fn catalog(&self) -> Result<ServiceCatalog, ClusterError> {
        self.config.catalog()
    }

    pub fn env(&self) -> RuntimeEnv {
        self.config.runtime_env(&self.root)
    }

    /// Start on this host. The platform is detected once per process.
    pub async fn start(&self, headless: bool, wait_ready: bool) -> Result<LaunchReport, ClusterError> {
        let catalog = self.catalog()?;
        let platform = Platform::current(headless, self.spawner.as_ref())?;
        self.launch_on(platform, &catalog, wait_ready).await
    }

    /// Start as if running on `os` (values of std::env::consts::OS).
    pub async fn start_on(
        &self,
        os: &str,
        headless: bool,
        wait_ready: bool,
    ) -> Result<LaunchReport, ClusterError> {
        let catalog = self.catalog()?;
        let platform = Platform::detect(os, headless, self.spawner.as_ref())?;
        self.launch_on(platform, &catalog, wait_ready).await
    }

    async fn launch_on(
        &self,
        platform: Platform,
        catalog: &ServiceCatalog,
        wait_ready: bool,
    ) -> Result<LaunchReport, ClusterError> {
        let env = self.env();
        let mut readiness = self.config.readiness.clone();
        if wait_ready {
            readiness.mode = ReadinessMode::Probe;
        }

        let launcher = ClusterLauncher::new(
            select_adapter(platform, env.clone(), self.spawner.clone()),
            EnvironmentBootstrapper::new(self.spawner.clone()),
            env,
            readiness,
        );
        launcher.launch(catalog).await
    }

    /**
     * Kill every cluster process. An unusable catalog falls back to the
     * built-in signatures so the sweep still happens.
     */
    pub fn stop<T: ProcessTable>(&self, table: T) -> usize {
        let catalog = self.catalog().unwrap_or_else(|e| {
            log::warn!("{}; sweeping with the built-in service signatures", e);
            ServiceCatalog::reference()
        });
        ProcessTerminator::new(table).terminate(&catalog.signatures())
    }

    pub fn status<T: ProcessTable>(&self, table: T) -> Result<Vec<ServiceStatus>, ClusterError> {
        let catalog = self.catalog()?;
        let matches = ProcessTerminator::new(table).matching(&catalog.signatures());

        Ok(catalog
            .services()
            .iter()
            .map(|spec| {
                let pids: Vec<u32> = matches
                    .iter()
                    .filter(|m| m.signature == spec.signature)
                    .map(|m| m.pid)
                    .collect();
                ServiceStatus {
                    name: spec.name.clone(),
                    title: spec.title.clone(),
                    running: !pids.is_empty(),
                    pids,
                    port: spec.port,
                    signature: spec.signature.clone(),
                }
            })
            .collect())
    }

    /// Run the interactive client in this terminal and wait for it to exit.
    pub fn run_client(&self) -> Result<bool, ClusterError> {
        let env = self.env();
        env.require()?;

        let script = self.root.join(&self.config.client_script);
        if !script.is_file() {
            return Err(ClusterError::Config(format!(
                "client script not found: {:?}",
                script
            )));
        }

        let command = LaunchCommand::new(env.interpreter().to_string_lossy())
            .arg(script.to_string_lossy())
            .current_dir(&self.root);
        log::info!("Launching client {:?}", script);
        Ok(self.spawner.run(&command)?)
    }
}
