//! Remote host identity

use crate::ports::PortAllocator;
use crate::tunnel::SshTunnel;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;

/// Identity of a single SSH-reachable machine
///
/// A host may be reachable directly or through a gateway host, in which case
/// every connection to it goes over a local-forwarded port (see
/// [`SshTunnel`]).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Host {
    /// Hostname or IP address
    hostname: String,
    /// SSH user (system default when not specified)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    user: Option<String>,
    /// SSH port (22 when not specified)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    port: Option<u16>,
    /// Path to identity file (private key)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    identity_file: Option<PathBuf>,
    /// Gateway host every connection must pass through
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tunnel_via: Option<Box<Host>>,
}

impl Host {
    /// Create a new host for the given hostname
    pub fn new(hostname: impl Into<String>) -> Self {
        Self {
            hostname: hostname.into(),
            user: None,
            port: None,
            identity_file: None,
            tunnel_via: None,
        }
    }

    /// Set the SSH user
    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self
    }

    /// Set the SSH port
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// Set the identity file (private key)
    pub fn with_identity_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.identity_file = Some(path.into());
        self
    }

    /// Route every connection to this host through a gateway
    pub fn with_tunnel_via(mut self, gateway: Host) -> Self {
        self.tunnel_via = Some(Box::new(gateway));
        self
    }

    /// Get the hostname
    pub fn hostname(&self) -> &str {
        &self.hostname
    }

    /// Get the SSH user, if one is set
    pub fn user(&self) -> Option<&str> {
        self.user.as_deref()
    }

    /// Get the explicit SSH port, if one is set
    pub fn port(&self) -> Option<u16> {
        self.port
    }

    /// Get the identity file, if one is set
    pub fn identity_file(&self) -> Option<&PathBuf> {
        self.identity_file.as_ref()
    }

    /// Get the gateway host, if connections are tunneled
    pub fn tunnel_via(&self) -> Option<&Host> {
        self.tunnel_via.as_deref()
    }

    /// Get the connection string (`user@host` when a user is specified)
    pub fn host_string(&self) -> String {
        if let Some(user) = &self.user {
            format!("{}@{}", user, self.hostname)
        } else {
            self.hostname.clone()
        }
    }

    /// Create a tunnel to this host's SSH daemon
    ///
    /// Each call is one acquisition: the caller owns setup and teardown of
    /// the returned tunnel. Hosts without a gateway produce a direct
    /// (non-forwarding) tunnel.
    pub fn ssh_tunnel(&self, ports: Arc<PortAllocator>) -> SshTunnel {
        SshTunnel::to_ssh_daemon(self.clone(), ports)
    }

    /// Create a tunnel forwarding a remote service port (e.g. a database)
    pub fn service_tunnel(&self, remote_port: u16, ports: Arc<PortAllocator>) -> SshTunnel {
        SshTunnel::to_service(self.clone(), remote_port, ports)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_host_string() {
        let host = Host::new("example.com").with_user("deploy");
        assert_eq!(host.host_string(), "deploy@example.com");

        let bare = Host::new("example.com");
        assert_eq!(bare.host_string(), "example.com");
    }

    #[test]
    fn test_builder() {
        let host = Host::new("web1.example.com")
            .with_user("deploy")
            .with_port(2222)
            .with_identity_file("/home/deploy/.ssh/id_rsa")
            .with_tunnel_via(Host::new("bastion.example.com").with_user("jump"));

        assert_eq!(host.port(), Some(2222));
        assert_eq!(host.tunnel_via().unwrap().hostname(), "bastion.example.com");
    }
}
