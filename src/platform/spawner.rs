/**
 * ============================================================================
 * PROCESS SPAWNER
 * ============================================================================
 *
 * PURPOSE: The only place that touches std::process for launching
 *
 * Adapters describe what to run as a LaunchCommand; a ProcessSpawner turns
 * that into an OS process. Tests substitute a recording spawner.
 * ============================================================================
 */

use std::path::PathBuf;
use std::process::{Command, Stdio};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LaunchCommand {
    pub program: String,
    pub args: Vec<String>,
    pub current_dir: Option<PathBuf>,

    // Own process group, stdio discarded, never waited on
    pub detached: bool,

    // Arguments are already quoted for cmd.exe and must be passed through untouched
    pub verbatim: bool,
}

impl LaunchCommand {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            ..Default::default()
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.current_dir = Some(dir.into());
        self
    }

    pub fn detached(mut self) -> Self {
        self.detached = true;
        self
    }

    pub fn verbatim(mut self) -> Self {
        self.verbatim = true;
        self
    }

    /// Program and arguments joined by spaces, as a process table would show them.
    pub fn command_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

pub trait ProcessSpawner: Send + Sync {
    /// Start the command without waiting for it. Returns the new PID.
    fn spawn(&self, command: &LaunchCommand) -> std::io::Result<u32>;

    /// Run the command in the foreground with inherited stdio.
    fn run(&self, command: &LaunchCommand) -> std::io::Result<bool>;

    fn is_installed(&self, program: &str) -> bool;
}

/// Spawner backed by the real operating system.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemSpawner;

impl SystemSpawner {
    fn build(command: &LaunchCommand) -> Command {
        let mut cmd = Command::new(&command.program);

        #[cfg(windows)]
        {
            use std::os::windows::process::CommandExt;
            if command.verbatim {
                for arg in &command.args {
                    cmd.raw_arg(arg);
                }
            } else {
                cmd.args(&command.args);
            }
        }
        #[cfg(not(windows))]
        cmd.args(&command.args);

        if let Some(dir) = &command.current_dir {
            cmd.current_dir(dir);
        }
        cmd
    }
}

impl ProcessSpawner for SystemSpawner {
    fn spawn(&self, command: &LaunchCommand) -> std::io::Result<u32> {
        let mut cmd = Self::build(command);
        cmd.stdin(Stdio::null());

        if command.detached {
            cmd.stdout(Stdio::null());
            cmd.stderr(Stdio::null());

            #[cfg(unix)]
            {
                use std::os::unix::process::CommandExt;
                cmd.process_group(0);
            }
            #[cfg(windows)]
            {
                use std::os::windows::process::CommandExt;
                const DETACHED_PROCESS: u32 = 0x0000_0008;
                const CREATE_NEW_PROCESS_GROUP: u32 = 0x0000_0200;
                cmd.creation_flags(DETACHED_PROCESS | CREATE_NEW_PROCESS_GROUP);
            }
        }

        log::debug!("Spawning: {}", command.command_line());
        let child = cmd.spawn()?;
        Ok(child.id())
    }

    fn run(&self, command: &LaunchCommand) -> std::io::Result<bool> {
        log::debug!("Running: {}", command.command_line());
        let status = Self::build(command).status()?;
        if !status.success() {
            log::warn!("{} exited with status {:?}", command.program, status.code());
        }
        Ok(status.success())
    }

    fn is_installed(&self, program: &str) -> bool {
        find_in_path(program).is_some()
    }
}

/// Locate an executable on PATH (PATHEXT-aware on Windows).
pub fn find_in_path(program: &str) -> Option<PathBuf> {
    which::which(program).ok()
}
