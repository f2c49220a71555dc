/**
 * ============================================================================
 * CLUSTER ERRORS
 * ============================================================================
 *
 * PURPOSE: Single error taxonomy for launching and stopping the cluster
 *
 * FATAL:
 * - EnvironmentMissing (only when no auto-bootstrap is attempted)
 * - UnsupportedPlatform, NoTerminalEmulator (raised before any spawn)
 * - Bootstrap, Spawn, Config, Io
 *
 * A zero-match termination sweep is NOT an error and has no variant here.
 * ============================================================================
 */

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum ClusterError {
    #[error("runtime environment not found at {0:?}; run `clusterctl start-cluster` once to create it")]
    EnvironmentMissing(PathBuf),

    #[error("failed to bootstrap runtime environment: {0}")]
    Bootstrap(String),

    #[error("unsupported host platform: {0}")]
    UnsupportedPlatform(String),

    #[error("no supported terminal emulator found (tried gnome-terminal, konsole, xterm)")]
    NoTerminalEmulator,

    #[error("failed to spawn service '{service}': {source}")]
    Spawn {
        service: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl ClusterError {
    /// Process exit code reported by the CLI for this failure.
    pub fn exit_code(&self) -> i32 {
        match self {
            ClusterError::UnsupportedPlatform(_) | ClusterError::NoTerminalEmulator => 2,
            ClusterError::EnvironmentMissing(_) | ClusterError::Bootstrap(_) => 3,
            _ => 1,
        }
    }
}
