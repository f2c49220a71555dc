/**
 * ============================================================================
 * PLATFORM MODULE
 * ============================================================================
 *
 * PURPOSE: Open one execution context per service on the host OS
 *
 * SUBMODULES:
 * - spawner: LaunchCommand + ProcessSpawner (real and fake process creation)
 * - terminal: macOS Terminal, Linux emulators, Windows console
 * - background: Detached headless processes
 *
 * SELECTION:
 * The platform is detected once per run and cached; adapters never branch
 * on the OS themselves.
 *
 * LINUX PROBE ORDER: gnome-terminal -> konsole -> xterm
 * ============================================================================
 */

pub mod background;
pub mod spawner;
pub mod terminal;

use crate::bootstrap::RuntimeEnv;
use crate::error::ClusterError;
use crate::services::ServiceSpec;
use once_cell::sync::OnceCell;
use spawner::{LaunchCommand, ProcessSpawner};
use std::sync::Arc;

pub use background::BackgroundAdapter;
pub use terminal::{LinuxTerminalAdapter, MacTerminalAdapter, WindowsConsoleAdapter};

static SELECTED_PLATFORM: OnceCell<Platform> = OnceCell::new();

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminalEmulator {
    GnomeTerminal,
    Konsole,
    Xterm,
}

impl TerminalEmulator {
    pub const PROBE_ORDER: [TerminalEmulator; 3] = [
        TerminalEmulator::GnomeTerminal,
        TerminalEmulator::Konsole,
        TerminalEmulator::Xterm,
    ];

    pub fn program(&self) -> &'static str {
        match self {
            TerminalEmulator::GnomeTerminal => "gnome-terminal",
            TerminalEmulator::Konsole => "konsole",
            TerminalEmulator::Xterm => "xterm",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    MacTerminal,
    Linux(TerminalEmulator),
    WindowsConsole,
    Background,
}

impl Platform {
    /**
     * Pick the launch mechanism for a host.
     * `os` takes the values of std::env::consts::OS.
     */
    pub fn detect(
        os: &str,
        headless: bool,
        spawner: &dyn ProcessSpawner,
    ) -> Result<Platform, ClusterError> {
        if headless {
            return Ok(Platform::Background);
        }

        match os {
            "macos" => Ok(Platform::MacTerminal),
            "windows" => Ok(Platform::WindowsConsole),
            "linux" => TerminalEmulator::PROBE_ORDER
                .iter()
                .copied()
                .find(|emulator| {
                    let found = spawner.is_installed(emulator.program());
                    log::debug!("Probing {}: {}", emulator.program(), found);
                    found
                })
                .map(Platform::Linux)
                .ok_or(ClusterError::NoTerminalEmulator),
            other => Err(ClusterError::UnsupportedPlatform(other.to_string())),
        }
    }

    /// Detect for this host on first call; later calls return the same answer.
    pub fn current(headless: bool, spawner: &dyn ProcessSpawner) -> Result<Platform, ClusterError> {
        SELECTED_PLATFORM
            .get_or_try_init(|| {
                let platform = Platform::detect(std::env::consts::OS, headless, spawner)?;
                log::info!("Launch platform: {}", platform);
                Ok(platform)
            })
            .copied()
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Platform::MacTerminal => write!(f, "macOS Terminal"),
            Platform::Linux(emulator) => write!(f, "Linux {}", emulator.program()),
            Platform::WindowsConsole => write!(f, "Windows console"),
            Platform::Background => write!(f, "headless background"),
        }
    }
}

/// What remains of a spawn. Only used for logging; `stop` never needs it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpawnHandle {
    pub service: String,
    pub pid: u32,
    pub platform: Platform,
}

pub trait PlatformAdapter: Send + Sync {
    fn platform(&self) -> Platform;

    fn spawn(&self, spec: &ServiceSpec) -> Result<SpawnHandle, ClusterError>;
}

/// Build the adapter variant for an already-detected platform.
pub fn select_adapter(
    platform: Platform,
    env: RuntimeEnv,
    spawner: Arc<dyn ProcessSpawner>,
) -> Box<dyn PlatformAdapter> {
    match platform {
        Platform::MacTerminal => Box::new(MacTerminalAdapter::new(env, spawner)),
        Platform::Linux(emulator) => Box::new(LinuxTerminalAdapter::new(emulator, env, spawner)),
        Platform::WindowsConsole => Box::new(WindowsConsoleAdapter::new(env, spawner)),
        Platform::Background => Box::new(BackgroundAdapter::new(env, spawner)),
    }
}

// Shared by every variant: hand the command to the spawner and wrap the PID
pub(crate) fn spawn_with(
    spawner: &dyn ProcessSpawner,
    platform: Platform,
    spec: &ServiceSpec,
    command: &LaunchCommand,
) -> Result<SpawnHandle, ClusterError> {
    let pid = spawner.spawn(command).map_err(|source| ClusterError::Spawn {
        service: spec.name.clone(),
        source,
    })?;
    log::info!("Started {} via {} (PID: {})", spec.name, platform, pid);
    Ok(SpawnHandle {
        service: spec.name.clone(),
        pid,
        platform,
    })
}
