/**
 * ============================================================================
 * BOOTSTRAP MODULE
 * ============================================================================
 *
 * PURPOSE: Make sure the Python environment the services run in exists
 *
 * SUBMODULES:
 * - environment: Paths of the project root, venv, interpreter and activation script
 * - installer: One-time `python -m venv` + `pip install -r requirements.txt`
 *
 * ============================================================================
 */

pub mod environment;
pub mod installer;

pub use environment::RuntimeEnv;
pub use installer::{BootstrapOutcome, EnvironmentBootstrapper};
