//! Deployment environments

use db_tools::Database;
use ssh_tunnel::{Host, PortAllocator, SshTunnel};
use std::sync::Arc;

/// A named deployment target: an ordered group of hosts plus configuration
///
/// Host insertion order is precedence order; the first host is the default
/// for steps that only run on one host. Dev environments relax safety
/// checks: no notifications, no authorization codes for dangerous
/// operations.
#[derive(Debug, Clone)]
pub struct Environment {
    name: String,
    hosts: Vec<Host>,
    is_dev: bool,
    databases: Vec<Database>,
    tunnel_ports: Arc<PortAllocator>,
}

impl Environment {
    /// Create an empty environment
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            hosts: Vec::new(),
            is_dev: false,
            databases: Vec::new(),
            tunnel_ports: Arc::new(PortAllocator::default()),
        }
    }

    /// Mark this environment as a development environment
    pub fn with_dev(mut self, is_dev: bool) -> Self {
        self.is_dev = is_dev;
        self
    }

    /// Append a host (first host added becomes the default)
    pub fn with_host(mut self, host: Host) -> Self {
        self.hosts.push(host);
        self
    }

    /// Append a database to the environment's configuration
    pub fn with_database(mut self, database: Database) -> Self {
        self.databases.push(database);
        self
    }

    /// Get the environment name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether this is a dev environment
    pub fn is_dev(&self) -> bool {
        self.is_dev
    }

    /// All hosts in precedence order
    pub fn hosts(&self) -> &[Host] {
        &self.hosts
    }

    /// The default host, when the environment has any
    pub fn first_host(&self) -> Option<&Host> {
        self.hosts.first()
    }

    /// Find a host by hostname
    pub fn host_by_name(&self, hostname: &str) -> Option<&Host> {
        self.hosts.iter().find(|h| h.hostname() == hostname)
    }

    /// All configured databases
    pub fn databases(&self) -> &[Database] {
        &self.databases
    }

    /// The shared local-port allocator for this environment's tunnels
    pub fn tunnel_ports(&self) -> Arc<PortAllocator> {
        Arc::clone(&self.tunnel_ports)
    }

    /// Acquire a tunnel to a host's SSH daemon
    pub fn ssh_tunnel_to(&self, host: &Host) -> SshTunnel {
        host.ssh_tunnel(self.tunnel_ports())
    }

    /// Acquire a tunnel forwarding a service port on a host
    pub fn service_tunnel_to(&self, host: &Host, remote_port: u16) -> SshTunnel {
        host.service_tunnel(remote_port, self.tunnel_ports())
    }
}
