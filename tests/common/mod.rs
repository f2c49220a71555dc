#![allow(dead_code)]

use clusterctl::config::ClusterConfig;
use clusterctl::platform::spawner::{LaunchCommand, ProcessSpawner};
use clusterctl::terminator::{ProcessEntry, ProcessTable};
use clusterctl::Cluster;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

/// In-memory host: spawned commands show up in a shared process table.
pub struct FakeHost {
    pub installed: Vec<&'static str>,
    pub events: Mutex<Vec<String>>,
    pub spawned: Mutex<Vec<LaunchCommand>>,
    pub processes: Arc<Mutex<Vec<ProcessEntry>>>,
    next_pid: AtomicU32,
}

impl FakeHost {
    pub fn new(installed: Vec<&'static str>) -> Arc<Self> {
        Arc::new(Self {
            installed,
            events: Mutex::new(Vec::new()),
            spawned: Mutex::new(Vec::new()),
            processes: Arc::new(Mutex::new(Vec::new())),
            next_pid: AtomicU32::new(1000),
        })
    }

    /// A process the cluster did not start.
    pub fn add_foreign_process(&self, pid: u32, command_line: &str) {
        self.processes
            .lock()
            .unwrap()
            .push(ProcessEntry::new(pid, None, command_line));
    }

    pub fn table(&self) -> FakeTable {
        FakeTable {
            processes: self.processes.clone(),
        }
    }

    pub fn spawn_count(&self) -> usize {
        self.spawned.lock().unwrap().len()
    }

    pub fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }
}

impl ProcessSpawner for FakeHost {
    fn spawn(&self, command: &LaunchCommand) -> std::io::Result<u32> {
        let pid = self.next_pid.fetch_add(1, Ordering::SeqCst);
        self.events
            .lock()
            .unwrap()
            .push(format!("spawn {}", command.program));
        self.spawned.lock().unwrap().push(command.clone());
        self.processes
            .lock()
            .unwrap()
            .push(ProcessEntry::new(pid, None, command.command_line()));
        Ok(pid)
    }

    fn run(&self, command: &LaunchCommand) -> std::io::Result<bool> {
        self.events
            .lock()
            .unwrap()
            .push(format!("run {}", command.args.join(" ")));
        if command.args.iter().any(|a| a == "venv") {
            if let Some(dir) = command.args.last() {
                std::fs::create_dir_all(dir)?;
            }
        }
        Ok(true)
    }

    fn is_installed(&self, program: &str) -> bool {
        self.installed.contains(&program)
    }
}

pub struct FakeTable {
    processes: Arc<Mutex<Vec<ProcessEntry>>>,
}

impl ProcessTable for FakeTable {
    fn snapshot(&mut self) -> Vec<ProcessEntry> {
        self.processes.lock().unwrap().clone()
    }

    fn kill(&mut self, pid: u32) -> bool {
        let mut processes = self.processes.lock().unwrap();
        let before = processes.len();
        processes.retain(|p| p.pid != pid);
        processes.len() < before
    }
}

/// Project root with an existing virtual environment.
pub fn project_root() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(dir.path().join("venv")).unwrap();
    dir
}

pub fn cluster(root: &TempDir, host: &Arc<FakeHost>) -> Cluster {
    cluster_with(root, host, ClusterConfig::default())
}

pub fn cluster_with(root: &TempDir, host: &Arc<FakeHost>, config: ClusterConfig) -> Cluster {
    Cluster::with_spawner(root.path(), config, host.clone())
}
