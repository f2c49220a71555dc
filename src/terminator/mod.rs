/**
 * ============================================================================
 * PROCESS TERMINATOR
 * ============================================================================
 *
 * PURPOSE: Find cluster processes by command-line signature and kill them
 *
 * The cluster keeps no PID file. Every stop rescans the OS process table,
 * so a stop works no matter which run (or crash) left the services behind.
 *
 * RULES:
 * - A process is a target only if its full command line contains a signature
 * - Kills are forceful (SIGKILL / TerminateProcess), no grace period
 * - Zero matches is a successful, empty sweep
 * - The orchestrator never kills itself
 * ============================================================================
 */

pub mod table;

use crate::services::TerminationSignature;
use serde::Serialize;
use std::collections::HashSet;

pub use table::{ProcessEntry, ProcessTable, SystemProcessTable};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatchedProcess {
    pub pid: u32,
    pub parent: Option<u32>,
    pub signature: TerminationSignature,
    pub command_line: String,
}

/**
 * Pure matching step: which of `processes` carry one of `signatures`.
 * `exclude_pid` is dropped together with its thread entries (same command
 * line, `exclude_pid` as parent). Real children of it still match.
 */
pub fn find_matches(
    processes: &[ProcessEntry],
    signatures: &[TerminationSignature],
    exclude_pid: Option<u32>,
) -> Vec<MatchedProcess> {
    let own_command_line = exclude_pid.and_then(|own| {
        processes
            .iter()
            .find(|p| p.pid == own)
            .map(|p| p.command_line.as_str())
    });
    let is_self = |p: &ProcessEntry| match exclude_pid {
        Some(own) => {
            p.pid == own
                || (p.parent == Some(own) && Some(p.command_line.as_str()) == own_command_line)
        }
        None => false,
    };

    processes
        .iter()
        .filter(|p| !is_self(*p))
        .filter_map(|p| {
            signatures
                .iter()
                .find(|s| s.matches(&p.command_line))
                .map(|signature| MatchedProcess {
                    pid: p.pid,
                    parent: p.parent,
                    signature: signature.clone(),
                    command_line: p.command_line.clone(),
                })
        })
        .collect()
}

pub struct ProcessTerminator<T: ProcessTable> {
    table: T,
}

impl<T: ProcessTable> ProcessTerminator<T> {
    pub fn new(table: T) -> Self {
        Self { table }
    }

    #[cfg(test)]
    pub(crate) fn table(&self) -> &T {
        &self.table
    }

    /// Read-only sweep used by `status`.
    pub fn matching(&mut self, signatures: &[TerminationSignature]) -> Vec<MatchedProcess> {
        let processes = self.table.snapshot();
        find_matches(&processes, signatures, self.table.own_pid())
    }

    /**
     * Kill every process carrying a signature. Returns how many distinct
     * processes were terminated.
     */
    pub fn terminate(&mut self, signatures: &[TerminationSignature]) -> usize {
        let matches = self.matching(signatures);
        if matches.is_empty() {
            log::info!("No cluster processes found");
            return 0;
        }

        // Some process tables list each thread as its own entry with the
        // owning process as parent. Those die with the owner and are not counted.
        let duplicates: HashSet<u32> = matches
            .iter()
            .filter(|m| {
                m.parent.is_some_and(|parent| {
                    matches
                        .iter()
                        .any(|owner| owner.pid == parent && owner.command_line == m.command_line)
                })
            })
            .map(|m| m.pid)
            .collect();

        let mut terminated = 0;
        for matched in &matches {
            if self.table.kill(matched.pid) {
                if !duplicates.contains(&matched.pid) {
                    log::info!(
                        "Terminated PID {} ({})",
                        matched.pid,
                        matched.signature
                    );
                    terminated += 1;
                }
            } else if !duplicates.contains(&matched.pid) {
                log::warn!(
                    "Could not terminate PID {} ({}); it may have already exited",
                    matched.pid,
                    matched.signature
                );
            }
        }

        log::info!("Terminated {} cluster process(es)", terminated);
        terminated
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct FakeTable {
        processes: Vec<ProcessEntry>,
        killed: Vec<u32>,
        own_pid: Option<u32>,
    }

    impl FakeTable {
        fn with(processes: &[(u32, &str)]) -> Self {
            Self {
                processes: processes
                    .iter()
                    .map(|(pid, cmd)| ProcessEntry::new(*pid, None, *cmd))
                    .collect(),
                ..Default::default()
            }
        }
    }

    impl ProcessTable for FakeTable {
        fn snapshot(&mut self) -> Vec<ProcessEntry> {
            self.processes.clone()
        }

        fn kill(&mut self, pid: u32) -> bool {
            let before = self.processes.len();
            self.processes.retain(|p| p.pid != pid);
            if self.processes.len() < before {
                self.killed.push(pid);
                true
            } else {
                false
            }
        }

        fn own_pid(&self) -> Option<u32> {
            self.own_pid
        }
    }

    fn sigs(values: &[&str]) -> Vec<TerminationSignature> {
        values.iter().map(|v| TerminationSignature::new(*v)).collect()
    }

    #[test]
    fn test_only_processes_with_signature_are_killed() {
        let table = FakeTable::with(&[
            (10, "python auth-server.py"),
            (11, "python oauth-server-helper.py"),
            (12, "vim auth-server.rs"),
            (13, "python payment-server.py"),
        ]);
        let mut terminator = ProcessTerminator::new(table);

        let count = terminator.terminate(&sigs(&["auth-server.py", "payment-server.py"]));

        assert_eq!(count, 2);
        assert_eq!(terminator.table().killed, vec![10, 13]);
    }

    #[test]
    fn test_second_sweep_finds_nothing() {
        let table = FakeTable::with(&[(20, "python chatbot-server.py")]);
        let mut terminator = ProcessTerminator::new(table);
        let signatures = sigs(&["chatbot-server.py"]);

        assert_eq!(terminator.terminate(&signatures), 1);
        assert_eq!(terminator.terminate(&signatures), 0);
    }

    #[test]
    fn test_node_signatures_do_not_cross_match() {
        let processes = vec![
            ProcessEntry::new(31, None, "python main.py --config config-node1.json"),
            ProcessEntry::new(32, None, "python main.py --config config-node2.json"),
            ProcessEntry::new(33, None, "python main.py --config config-node3.json"),
        ];
        for (index, pid) in [31, 32, 33].iter().enumerate() {
            let config = format!("config-node{}.json", index + 1);
            let signature = sigs(&[config.as_str()]);
            let matches = find_matches(&processes, &signature, None);
            assert_eq!(matches.len(), 1);
            assert_eq!(matches[0].pid, *pid);
        }
    }

    #[test]
    fn test_own_process_is_never_matched() {
        let mut table = FakeTable::with(&[(40, "clusterctl stop-cluster --config auth-server.py")]);
        table.own_pid = Some(40);
        let mut terminator = ProcessTerminator::new(table);

        assert_eq!(terminator.terminate(&sigs(&["auth-server.py"])), 0);
        assert!(terminator.table().killed.is_empty());
    }

    #[test]
    fn test_own_thread_entries_are_never_matched() {
        let own = "clusterctl stop-cluster --config /srv/auth-server.py.d/cluster.json";
        let mut table = FakeTable::with(&[(70, own)]);
        table.own_pid = Some(70);
        table.processes.push(ProcessEntry::new(71, Some(70), own));
        table.processes.push(ProcessEntry::new(72, Some(70), own));
        // A real child of the orchestrator running the service
        table
            .processes
            .push(ProcessEntry::new(73, Some(70), "python auth-server.py"));
        let mut terminator = ProcessTerminator::new(table);

        let matches = terminator.matching(&sigs(&["auth-server.py"]));
        assert_eq!(matches.iter().map(|m| m.pid).collect::<Vec<_>>(), vec![73]);

        assert_eq!(terminator.terminate(&sigs(&["auth-server.py"])), 1);
        assert_eq!(terminator.table().killed, vec![73]);
    }

    #[test]
    fn test_empty_signature_list_kills_nothing() {
        let table = FakeTable::with(&[(50, "python auth-server.py")]);
        let mut terminator = ProcessTerminator::new(table);
        assert_eq!(terminator.terminate(&sigs(&[""])), 0);
        assert_eq!(terminator.terminate(&[]), 0);
    }

    #[test]
    fn test_threads_listed_as_entries_count_once() {
        let mut table = FakeTable::with(&[(60, "python main.py --config config-node1.json")]);
        table
            .processes
            .push(ProcessEntry::new(61, Some(60), "python main.py --config config-node1.json"));
        let mut terminator = ProcessTerminator::new(table);

        assert_eq!(terminator.terminate(&sigs(&["config-node1.json"])), 1);
    }
}
