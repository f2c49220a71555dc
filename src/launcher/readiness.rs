use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;
use tokio::net::TcpStream;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReadinessMode {
    // Sleep for each entry's stagger delay
    #[default]
    Delay,
    // Poll the advertised port until it accepts connections
    Probe,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReadinessConfig {
    pub mode: ReadinessMode,
    pub timeout_secs: u64,
    pub interval_ms: u64,
}

impl Default for ReadinessConfig {
    fn default() -> Self {
        Self {
            mode: ReadinessMode::Delay,
            timeout_secs: 30,
            interval_ms: 250,
        }
    }
}

impl ReadinessConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms.max(10))
    }
}

pub trait ReadinessProbe {
    fn is_ready(&self, port: u16) -> impl Future<Output = bool> + Send;
}

/// Ready once something accepts a TCP connection on 127.0.0.1:port.
#[derive(Debug, Default, Clone, Copy)]
pub struct TcpProbe;

impl ReadinessProbe for TcpProbe {
    fn is_ready(&self, port: u16) -> impl Future<Output = bool> + Send {
        async move {
            matches!(
                tokio::time::timeout(
                    Duration::from_secs(1),
                    TcpStream::connect(("127.0.0.1", port))
                )
                .await,
                Ok(Ok(_))
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_readiness_config_parses_partial_json() {
        let config: ReadinessConfig = serde_json::from_str(r#"{"mode": "probe"}"#).unwrap();
        assert_eq!(config.mode, ReadinessMode::Probe);
        assert_eq!(config.timeout(), Duration::from_secs(30));
    }

    #[tokio::test]
    async fn test_tcp_probe_sees_listener() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        assert!(TcpProbe.is_ready(port).await);

        drop(listener);
        assert!(!TcpProbe.is_ready(port).await);
    }
}
