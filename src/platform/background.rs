use crate::bootstrap::RuntimeEnv;
use crate::error::ClusterError;
use crate::platform::spawner::{LaunchCommand, ProcessSpawner};
use crate::platform::{spawn_with, Platform, PlatformAdapter, SpawnHandle};
use crate::services::ServiceSpec;
use std::sync::Arc;

/// Headless variant: the service runs detached with no terminal attached.
pub struct BackgroundAdapter {
    env: RuntimeEnv,
    spawner: Arc<dyn ProcessSpawner>,
}

impl BackgroundAdapter {
    pub fn new(env: RuntimeEnv, spawner: Arc<dyn ProcessSpawner>) -> Self {
        Self { env, spawner }
    }

    pub fn launch_command(&self, spec: &ServiceSpec) -> LaunchCommand {
        // No shell to activate the venv, so run its interpreter directly
        LaunchCommand::new(self.env.resolve(&spec.command))
            .args(spec.args.iter().cloned())
            .current_dir(self.env.service_dir(spec))
            .detached()
    }
}

impl PlatformAdapter for BackgroundAdapter {
    fn platform(&self) -> Platform {
        Platform::Background
    }

    fn spawn(&self, spec: &ServiceSpec) -> Result<SpawnHandle, ClusterError> {
        spawn_with(self.spawner.as_ref(), self.platform(), spec, &self.launch_command(spec))
    }
}
