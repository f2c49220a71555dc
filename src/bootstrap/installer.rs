use crate::bootstrap::environment::RuntimeEnv;
use crate::error::ClusterError;
use crate::platform::spawner::{LaunchCommand, ProcessSpawner};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootstrapOutcome {
    AlreadyPresent,
    Created { requirements_installed: bool },
}

/// Creates the virtual environment on first launch and installs requirements.
pub struct EnvironmentBootstrapper {
    spawner: Arc<dyn ProcessSpawner>,
}

impl EnvironmentBootstrapper {
    pub fn new(spawner: Arc<dyn ProcessSpawner>) -> Self {
        Self { spawner }
    }

    pub fn ensure(&self, env: &RuntimeEnv) -> Result<BootstrapOutcome, ClusterError> {
        if env.exists() {
            log::debug!("Runtime environment present at {:?}", env.venv_dir);
            return Ok(BootstrapOutcome::AlreadyPresent);
        }

        log::info!("Runtime environment not found, creating {:?}", env.venv_dir);
        let create = LaunchCommand::new(env.python.clone())
            .args(["-m", "venv"])
            .arg(env.venv_dir.to_string_lossy())
            .current_dir(&env.root);
        self.run_step(&create, "create virtual environment")?;

        if !env.exists() {
            return Err(ClusterError::Bootstrap(format!(
                "{} reported success but {:?} was not created",
                env.python, env.venv_dir
            )));
        }

        if !env.requirements.is_file() {
            log::warn!(
                "No requirements file at {:?}, skipping dependency install",
                env.requirements
            );
            return Ok(BootstrapOutcome::Created {
                requirements_installed: false,
            });
        }

        log::info!("Installing dependencies from {:?}", env.requirements);
        let install = LaunchCommand::new(env.interpreter().to_string_lossy())
            .args(["-m", "pip", "install", "-r"])
            .arg(env.requirements.to_string_lossy())
            .current_dir(&env.root);

        if let Err(e) = self.run_step(&install, "install requirements") {
            // Leave no half-built environment behind so the next start retries
            if let Err(remove_err) = std::fs::remove_dir_all(&env.venv_dir) {
                log::error!("Failed to remove incomplete environment: {}", remove_err);
            }
            return Err(e);
        }

        log::info!("Runtime environment ready");
        Ok(BootstrapOutcome::Created {
            requirements_installed: true,
        })
    }

    fn run_step(&self, command: &LaunchCommand, step: &str) -> Result<(), ClusterError> {
        match self.spawner.run(command) {
            Ok(true) => Ok(()),
            Ok(false) => Err(ClusterError::Bootstrap(format!("failed to {}", step))),
            Err(e) => Err(ClusterError::Bootstrap(format!(
                "failed to {} ({}): {}",
                step, command.program, e
            ))),
        }
    }
}
