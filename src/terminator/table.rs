use sysinfo::{Pid, ProcessRefreshKind, System, UpdateKind};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessEntry {
    pub pid: u32,
    pub parent: Option<u32>,
    pub command_line: String,
}

impl ProcessEntry {
    pub fn new(pid: u32, parent: Option<u32>, command_line: impl Into<String>) -> Self {
        Self {
            pid,
            parent,
            command_line: command_line.into(),
        }
    }
}

/// Source of running processes and the means to kill them.
pub trait ProcessTable {
    fn snapshot(&mut self) -> Vec<ProcessEntry>;

    /// Forceful kill. Returns false when the OS refused or the PID is gone.
    fn kill(&mut self, pid: u32) -> bool;

    /// PID that must never be matched (the running orchestrator).
    fn own_pid(&self) -> Option<u32> {
        None
    }
}

/// Process table of the host, read through sysinfo.
pub struct SystemProcessTable {
    system: System,
    own_pid: Option<u32>,
}

impl SystemProcessTable {
    pub fn new() -> Self {
        let own_pid = match sysinfo::get_current_pid() {
            Ok(pid) => Some(pid.as_u32()),
            Err(e) => {
                log::warn!("Could not determine own PID: {}", e);
                None
            }
        };
        Self {
            system: System::new(),
            own_pid,
        }
    }
}

impl Default for SystemProcessTable {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessTable for SystemProcessTable {
    fn snapshot(&mut self) -> Vec<ProcessEntry> {
        self.system.refresh_processes_specifics(
            ProcessRefreshKind::new().with_cmd(UpdateKind::Always),
        );

        self.system
            .processes()
            .iter()
            .filter_map(|(pid, process)| {
                let cmd = process.cmd();
                // Kernel threads and processes we may not inspect report no arguments
                if cmd.is_empty() {
                    return None;
                }
                Some(ProcessEntry {
                    pid: pid.as_u32(),
                    parent: process.parent().map(|p| p.as_u32()),
                    command_line: cmd.join(" "),
                })
            })
            .collect()
    }

    fn kill(&mut self, pid: u32) -> bool {
        match self.system.process(Pid::from_u32(pid)) {
            Some(process) => process.kill(),
            None => false,
        }
    }

    fn own_pid(&self) -> Option<u32> {
        self.own_pid
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::TerminationSignature;
    use crate::terminator::find_matches;

    #[test]
    fn test_snapshot_contains_current_process() {
        let mut table = SystemProcessTable::new();
        let own_pid = table.own_pid().unwrap();
        let snapshot = table.snapshot();
        assert!(snapshot.iter().any(|p| p.pid == own_pid));
    }

    #[test]
    fn test_own_command_line_never_matches_itself() {
        let mut table = SystemProcessTable::new();
        let own_pid = table.own_pid().unwrap();
        let snapshot = table.snapshot();
        let own = snapshot.iter().find(|p| p.pid == own_pid).unwrap();
        let signature = TerminationSignature::new(own.command_line.clone());

        // Test harness worker threads show up as entries of their own on Linux
        let matches = find_matches(&snapshot, &[signature], Some(own_pid));
        assert!(matches.is_empty());
    }

    #[test]
    fn test_killing_unknown_pid_fails() {
        let mut table = SystemProcessTable::new();
        table.snapshot();
        assert!(!table.kill(u32::MAX - 1));
    }
}
