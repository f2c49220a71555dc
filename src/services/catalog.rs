/**
 * ============================================================================
 * SERVICE CATALOG
 * ============================================================================
 *
 * PURPOSE: Ordered, validated list of the services the cluster runs
 *
 * ORDER:
 * 1. auth, payment, chatbot (auxiliary services the nodes call into)
 * 2. node1 with the longest head start, then node2 and node3
 *
 * Booking nodes share a script name, so their signatures are the config
 * file argument rather than `main.py`.
 * ============================================================================
 */

use crate::error::ClusterError;
use crate::services::types::{ServiceSpec, TerminationSignature};
use std::collections::HashSet;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct ServiceCatalog {
    services: Vec<ServiceSpec>,
}

impl ServiceCatalog {
    /**
     * Build a catalog, rejecting entries whose signature would also match
     * another entry's command line.
     */
    pub fn new(services: Vec<ServiceSpec>) -> Result<Self, ClusterError> {
        let mut names = HashSet::new();
        for spec in &services {
            if !names.insert(spec.name.as_str()) {
                return Err(ClusterError::Config(format!(
                    "duplicate service name '{}'",
                    spec.name
                )));
            }
            if spec.signature.is_empty() {
                return Err(ClusterError::Config(format!(
                    "service '{}' has an empty signature",
                    spec.name
                )));
            }
            if !spec.signature.matches(&spec.command_line()) {
                return Err(ClusterError::Config(format!(
                    "signature '{}' does not occur in the command line of '{}'",
                    spec.signature, spec.name
                )));
            }
        }

        for spec in &services {
            for other in services.iter().filter(|o| o.name != spec.name) {
                if spec.signature.matches(&other.command_line()) {
                    return Err(ClusterError::Config(format!(
                        "signature '{}' of '{}' also matches '{}'",
                        spec.signature, spec.name, other.name
                    )));
                }
            }
        }

        Ok(Self { services })
    }

    /// The six-service booking cluster.
    pub fn reference() -> Self {
        Self {
            services: reference_services(),
        }
    }

    pub fn services(&self) -> &[ServiceSpec] {
        &self.services
    }

    pub fn signatures(&self) -> Vec<TerminationSignature> {
        self.services.iter().map(|s| s.signature.clone()).collect()
    }

    pub fn get(&self, name: &str) -> Option<&ServiceSpec> {
        self.services.iter().find(|s| s.name == name)
    }

    pub fn len(&self) -> usize {
        self.services.len()
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }
}

fn python_service(
    name: &str,
    dir: &str,
    args: &[&str],
    title: &str,
    port: u16,
    delay_ms: u64,
    signature: &str,
) -> ServiceSpec {
    ServiceSpec {
        name: name.to_string(),
        command: "python".to_string(),
        args: args.iter().map(|a| a.to_string()).collect(),
        working_dir: PathBuf::from(dir),
        title: title.to_string(),
        port,
        delay_ms,
        signature: TerminationSignature::new(signature),
    }
}

fn reference_services() -> Vec<ServiceSpec> {
    vec![
        python_service("auth", "auth-service", &["auth-server.py"], "Auth Service", 8000, 2000, "auth-server.py"),
        python_service("payment", "payment-service", &["payment-server.py"], "Payment Service", 6000, 2000, "payment-server.py"),
        python_service("chatbot", "chatbot-service", &["chatbot-server.py"], "Chatbot Service", 7000, 2000, "chatbot-server.py"),
        python_service("node1", "booking-node", &["main.py", "--config", "config-node1.json"], "Booking Node 1", 50051, 4000, "config-node1.json"),
        python_service("node2", "booking-node", &["main.py", "--config", "config-node2.json"], "Booking Node 2", 50052, 2000, "config-node2.json"),
        python_service("node3", "booking-node", &["main.py", "--config", "config-node3.json"], "Booking Node 3", 50053, 1000, "config-node3.json"),
    ]
}
