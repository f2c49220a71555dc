/**
 * ============================================================================
 * TERMINAL ADAPTERS
 * ============================================================================
 *
 * PURPOSE: One visible terminal window per service
 *
 * SEQUENCE INSIDE EVERY WINDOW:
 * 1. cd into the service's working directory
 * 2. activate the virtual environment
 * 3. clear the screen
 * 4. print the banner (title, port)
 * 5. run the service command
 *
 * The service command is written out unquoted where possible so its
 * termination signature stays visible in the terminal's own command line.
 * ============================================================================
 */

use crate::bootstrap::RuntimeEnv;
use crate::error::ClusterError;
use crate::platform::spawner::{LaunchCommand, ProcessSpawner};
use crate::platform::{spawn_with, Platform, PlatformAdapter, SpawnHandle, TerminalEmulator};
use crate::services::ServiceSpec;
use std::sync::Arc;

// =============================================================================
// Script builders
// =============================================================================

fn applescript_escape(value: &str) -> String {
    value.replace('\\', r"\\").replace('"', "\\\"")
}

/// Activation, banner and command for bash/zsh.
pub fn unix_script(spec: &ServiceSpec, env: &RuntimeEnv) -> String {
    let banner = format!("=== {} ===", spec.title);
    let port = format!("Port: {}", spec.port);
    format!(
        "cd {} && source {} && clear && echo {} && echo {} && {}",
        shell_words::quote(&env.service_dir(spec).to_string_lossy()),
        shell_words::quote(&env.activate_script().to_string_lossy()),
        shell_words::quote(&banner),
        shell_words::quote(&port),
        shell_words::join(spec.command_line_parts()),
    )
}

/**
 * Caret-escape cmd.exe metacharacters that sit outside double quotes.
 * Each cmd.exe that parses the text strips one level of escaping.
 */
pub fn cmd_escape(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    let mut quoted = false;
    for c in value.chars() {
        if c == '"' {
            quoted = !quoted;
        } else if !quoted && "^&|<>()".contains(c) {
            escaped.push('^');
        }
        escaped.push(c);
    }
    escaped
}

/// Same sequence for the cmd.exe inside the new window.
pub fn windows_script(spec: &ServiceSpec, env: &RuntimeEnv) -> String {
    let command = spec
        .command_line_parts()
        .iter()
        .map(|part| {
            if part.contains(' ') {
                format!("\"{}\"", part)
            } else {
                cmd_escape(part)
            }
        })
        .collect::<Vec<_>>()
        .join(" ");
    format!(
        "cd /d \"{}\" && call \"{}\" && cls && echo === {} === && echo Port: {} && {}",
        env.service_dir(spec).display(),
        env.activate_script().display(),
        cmd_escape(&spec.title),
        spec.port,
        command,
    )
}

// =============================================================================
// macOS
// =============================================================================

pub struct MacTerminalAdapter {
    env: RuntimeEnv,
    spawner: Arc<dyn ProcessSpawner>,
}

impl MacTerminalAdapter {
    pub fn new(env: RuntimeEnv, spawner: Arc<dyn ProcessSpawner>) -> Self {
        Self { env, spawner }
    }

    pub fn launch_command(&self, spec: &ServiceSpec) -> LaunchCommand {
        let script = applescript_escape(&unix_script(spec, &self.env));
        let title = applescript_escape(&spec.title);
        LaunchCommand::new("osascript")
            .args(["-e", "tell application \"Terminal\""])
            .args(["-e", "activate"])
            .arg("-e")
            .arg(format!("set serviceTab to do script \"{}\"", script))
            .arg("-e")
            .arg(format!("set custom title of serviceTab to \"{}\"", title))
            .args(["-e", "end tell"])
            .current_dir(&self.env.root)
    }
}

impl PlatformAdapter for MacTerminalAdapter {
    fn platform(&self) -> Platform {
        Platform::MacTerminal
    }

    fn spawn(&self, spec: &ServiceSpec) -> Result<SpawnHandle, ClusterError> {
        spawn_with(self.spawner.as_ref(), self.platform(), spec, &self.launch_command(spec))
    }
}

// =============================================================================
// Linux
// =============================================================================

pub struct LinuxTerminalAdapter {
    emulator: TerminalEmulator,
    env: RuntimeEnv,
    spawner: Arc<dyn ProcessSpawner>,
}

impl LinuxTerminalAdapter {
    pub fn new(emulator: TerminalEmulator, env: RuntimeEnv, spawner: Arc<dyn ProcessSpawner>) -> Self {
        Self {
            emulator,
            env,
            spawner,
        }
    }

    pub fn launch_command(&self, spec: &ServiceSpec) -> LaunchCommand {
        // Keep the window open after the service exits so its output stays readable
        let script = format!("{}; exec bash", unix_script(spec, &self.env));
        let command = LaunchCommand::new(self.emulator.program()).current_dir(&self.env.root);
        let command = match self.emulator {
            TerminalEmulator::GnomeTerminal => command
                .arg(format!("--title={}", spec.title))
                .arg("--"),
            TerminalEmulator::Konsole => command
                .arg("--new-tab")
                .arg("-p")
                .arg(format!("tabtitle={}", spec.title))
                .arg("-e"),
            TerminalEmulator::Xterm => command.arg("-T").arg(spec.title.clone()).arg("-e"),
        };
        command.args(["bash", "-c"]).arg(script)
    }
}

impl PlatformAdapter for LinuxTerminalAdapter {
    fn platform(&self) -> Platform {
        Platform::Linux(self.emulator)
    }

    fn spawn(&self, spec: &ServiceSpec) -> Result<SpawnHandle, ClusterError> {
        spawn_with(self.spawner.as_ref(), self.platform(), spec, &self.launch_command(spec))
    }
}

// =============================================================================
// Windows
// =============================================================================

pub struct WindowsConsoleAdapter {
    env: RuntimeEnv,
    spawner: Arc<dyn ProcessSpawner>,
}

impl WindowsConsoleAdapter {
    pub fn new(env: RuntimeEnv, spawner: Arc<dyn ProcessSpawner>) -> Self {
        Self { env, spawner }
    }

    pub fn launch_command(&self, spec: &ServiceSpec) -> LaunchCommand {
        // `start` reads its first quoted argument as the window title.
        // The outer cmd strips one level of carets, so the `&&` chain reaches
        // the window's own cmd intact.
        LaunchCommand::new("cmd")
            .args(["/C", "start"])
            .arg(format!("\"{}\"", spec.title))
            .args(["cmd", "/K"])
            .arg(cmd_escape(&windows_script(spec, &self.env)))
            .current_dir(&self.env.root)
            .verbatim()
    }
}

impl PlatformAdapter for WindowsConsoleAdapter {
    fn platform(&self) -> Platform {
        Platform::WindowsConsole
    }

    fn spawn(&self, spec: &ServiceSpec) -> Result<SpawnHandle, ClusterError> {
        spawn_with(self.spawner.as_ref(), self.platform(), spec, &self.launch_command(spec))
    }
}
