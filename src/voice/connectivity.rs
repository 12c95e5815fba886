//! Network reachability checks gating new turns

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::config::DialogueConfig;

/// Answers whether the dialogue service can currently be reached
#[async_trait]
pub trait Connectivity: Send + Sync {
    /// Whether a turn may start now
    async fn is_online(&self) -> bool;
}

#[async_trait]
impl<T: Connectivity + ?Sized> Connectivity for Arc<T> {
    async fn is_online(&self) -> bool {
        (**self).is_online().await
    }
}

/// Assumes the network is always available
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysOnline;

#[async_trait]
impl Connectivity for AlwaysOnline {
    async fn is_online(&self) -> bool {
        true
    }
}

/// Checks the dialogue host with a TCP connect
#[derive(Debug, Clone)]
pub struct HostCheck {
    address: String,
    timeout: Duration,
}

impl HostCheck {
    /// Check `address` (`host:port`), giving up after `timeout`
    #[must_use]
    pub fn new(address: impl Into<String>, timeout: Duration) -> Self {
        Self {
            address: address.into(),
            timeout,
        }
    }

    /// Check the configured dialogue host
    ///
    /// Hosts without an explicit port are checked on 443, or 80 without TLS.
    #[must_use]
    pub fn for_dialogue(config: &DialogueConfig) -> Self {
        let address = if has_port(&config.host) {
            config.host.clone()
        } else {
            let port = if config.use_tls { 443 } else { 80 };
            format!("{}:{port}", config.host)
        };
        Self::new(address, config.timeout.min(Duration::from_secs(3)))
    }

    /// Address being checked
    #[must_use]
    pub fn address(&self) -> &str {
        &self.address
    }
}

#[async_trait]
impl Connectivity for HostCheck {
    async fn is_online(&self) -> bool {
        let connect = tokio::net::TcpStream::connect(self.address.as_str());
        match tokio::time::timeout(self.timeout, connect).await {
            Ok(Ok(_)) => true,
            Ok(Err(e)) => {
                tracing::debug!(address = %self.address, error = %e, "host unreachable");
                false
            }
            Err(_) => {
                tracing::debug!(address = %self.address, "host check timed out");
                false
            }
        }
    }
}

fn has_port(host: &str) -> bool {
    host.rsplit_once(':')
        .is_some_and(|(_, port)| !port.is_empty() && port.bytes().all(|b| b.is_ascii_digit()))
}
