use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Substring of a process command line that identifies exactly one service.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TerminationSignature(String);

impl TerminationSignature {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    // An empty signature would match every process on the host
    pub fn matches(&self, command_line: &str) -> bool {
        !self.0.is_empty() && command_line.contains(&self.0)
    }
}

impl std::fmt::Display for TerminationSignature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/**
 * One managed service. Identity is the name; the catalog position decides
 * startup order.
 */
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceSpec {
    pub name: String,

    // Executable, resolved inside the runtime environment when launched headless
    pub command: String,

    #[serde(default)]
    pub args: Vec<String>,

    // Relative to the project root
    pub working_dir: PathBuf,

    pub title: String,

    pub port: u16,

    // Stagger applied after this entry is spawned
    #[serde(default)]
    pub delay_ms: u64,

    pub signature: TerminationSignature,
}

impl ServiceSpec {
    pub fn startup_delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }

    pub fn command_line_parts(&self) -> Vec<&str> {
        std::iter::once(self.command.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect()
    }

    /// Command and arguments joined the way the OS reports them.
    pub fn command_line(&self) -> String {
        self.command_line_parts().join(" ")
    }
}

/// Result of a status sweep for one catalog entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceStatus {
    pub name: String,
    pub title: String,
    pub running: bool,
    pub pids: Vec<u32>,
    pub port: u16,
    pub signature: TerminationSignature,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_signature_matches_nothing() {
        let signature = TerminationSignature::new("");
        assert!(!signature.matches("python auth-server.py"));
        assert!(!signature.matches(""));
    }

    #[test]
    fn test_signature_is_substring_match() {
        let signature = TerminationSignature::new("config-node2.json");
        assert!(signature.matches("/usr/bin/python3 main.py --config config-node2.json"));
        assert!(!signature.matches("/usr/bin/python3 main.py --config config-node1.json"));
    }

    #[test]
    fn test_spec_deserializes_with_defaults() {
        let json = r#"{
            "name": "auth",
            "command": "python",
            "working_dir": "auth-service",
            "title": "Auth Service",
            "port": 8000,
            "signature": "auth-server.py"
        }"#;
        let spec: ServiceSpec = serde_json::from_str(json).unwrap();
        assert!(spec.args.is_empty());
        assert_eq!(spec.startup_delay(), Duration::ZERO);
        assert_eq!(spec.signature.as_str(), "auth-server.py");
        assert_eq!(spec.command_line(), "python");
    }
}
