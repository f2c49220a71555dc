/**
 * ============================================================================
 * CLUSTER LAUNCHER
 * ============================================================================
 *
 * PURPOSE: Start every catalog entry, in order, one at a time
 *
 * SEQUENCE:
 * 1. Bootstrap the runtime environment if it is missing
 * 2. For each service: spawn through the platform adapter
 * 3. Wait before the next one (stagger delay, or readiness probe)
 *
 * FAILURE: the first spawn error aborts the run. Services already started
 * keep running; `stop-cluster` is the way to clean them up.
 *
 * NOT GUARDED: two concurrent starts double-spawn the catalog, and a stop
 * that races an unfinished start only sees what has spawned so far.
 * ============================================================================
 */

pub mod readiness;

use crate::bootstrap::{BootstrapOutcome, EnvironmentBootstrapper, RuntimeEnv};
use crate::error::ClusterError;
use crate::platform::{Platform, PlatformAdapter, SpawnHandle};
use crate::services::{ServiceCatalog, ServiceSpec};
use readiness::{ReadinessConfig, ReadinessMode, ReadinessProbe, TcpProbe};
use std::time::Duration;
use tokio::time::{sleep, Instant};

#[derive(Debug, Clone, PartialEq)]
pub struct LaunchReport {
    pub platform: Platform,
    pub bootstrap: BootstrapOutcome,
    pub spawned: Vec<SpawnHandle>,
    pub elapsed: Duration,
}

pub struct ClusterLauncher<P = TcpProbe> {
    adapter: Box<dyn PlatformAdapter>,
    bootstrapper: EnvironmentBootstrapper,
    env: RuntimeEnv,
    readiness: ReadinessConfig,
    probe: P,
}

impl ClusterLauncher<TcpProbe> {
    pub fn new(
        adapter: Box<dyn PlatformAdapter>,
        bootstrapper: EnvironmentBootstrapper,
        env: RuntimeEnv,
        readiness: ReadinessConfig,
    ) -> Self {
        Self::with_probe(adapter, bootstrapper, env, readiness, TcpProbe)
    }
}

impl<P: ReadinessProbe> ClusterLauncher<P> {
    pub fn with_probe(
        adapter: Box<dyn PlatformAdapter>,
        bootstrapper: EnvironmentBootstrapper,
        env: RuntimeEnv,
        readiness: ReadinessConfig,
        probe: P,
    ) -> Self {
        Self {
            adapter,
            bootstrapper,
            env,
            readiness,
            probe,
        }
    }

    pub async fn launch(&self, catalog: &ServiceCatalog) -> Result<LaunchReport, ClusterError> {
        let started = Instant::now();
        let bootstrap = self.bootstrapper.ensure(&self.env)?;

        log::info!(
            "Starting {} service(s) via {}",
            catalog.len(),
            self.adapter.platform()
        );

        let mut spawned = Vec::with_capacity(catalog.len());
        for (index, spec) in catalog.services().iter().enumerate() {
            log::info!("[{}/{}] Starting {}", index + 1, catalog.len(), spec.title);

            let handle = self.adapter.spawn(spec).inspect_err(|e| {
                log::error!(
                    "Aborting start after {} of {} service(s): {}",
                    spawned.len(),
                    catalog.len(),
                    e
                );
            })?;
            spawned.push(handle);

            self.wait_before_next(spec).await;
        }

        let elapsed = started.elapsed();
        log::info!(
            "All {} service(s) launched in {:.1}s",
            spawned.len(),
            elapsed.as_secs_f64()
        );

        Ok(LaunchReport {
            platform: self.adapter.platform(),
            bootstrap,
            spawned,
            elapsed,
        })
    }

    async fn wait_before_next(&self, spec: &ServiceSpec) {
        match self.readiness.mode {
            ReadinessMode::Delay => {
                let delay = spec.startup_delay();
                if !delay.is_zero() {
                    log::debug!("Waiting {:?} after {}", delay, spec.name);
                    sleep(delay).await;
                }
            }
            ReadinessMode::Probe => {
                if !self.wait_ready(spec).await {
                    log::warn!(
                        "{} not reachable on port {} after {:?}, continuing",
                        spec.name,
                        spec.port,
                        self.readiness.timeout()
                    );
                }
            }
        }
    }

    /// Poll the service's port until it answers or the timeout passes.
    pub async fn wait_ready(&self, spec: &ServiceSpec) -> bool {
        let start = Instant::now();
        let deadline = start + self.readiness.timeout();
        let mut attempt = 0;

        while Instant::now() < deadline {
            attempt += 1;
            if self.probe.is_ready(spec.port).await {
                log::info!(
                    "{} ready on port {} after {} attempt(s) ({:.1}s)",
                    spec.name,
                    spec.port,
                    attempt,
                    start.elapsed().as_secs_f64()
                );
                return true;
            }
            if attempt % 20 == 0 {
                log::debug!("{} readiness attempt {} still failing", spec.name, attempt);
            }
            sleep(self.readiness.interval()).await;
        }
        false
    }
}
