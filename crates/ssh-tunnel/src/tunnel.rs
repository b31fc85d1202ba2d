//! SSH tunnel lifecycle and command-line assembly

use crate::error::{Error, Result};
use crate::escape::shell_escape;
use crate::host::Host;
use crate::ports::PortAllocator;
use async_process::{Child, Command, Stdio};
use std::sync::Arc;
use tracing::{debug, warn};

/// Lifecycle state of a tunnel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TunnelState {
    /// Created but not yet set up
    Unopened,
    /// Set up; bound to a local port or connecting directly
    Active,
    /// Torn down
    Closed,
}

/// What the local port forwards to
#[derive(Debug, Clone, Copy)]
enum Forward {
    /// The target host's SSH daemon, reached through its gateway
    SshDaemon,
    /// A service port on the target host (e.g. a database)
    Service(u16),
}

/// A local port forward (or direct passthrough) used to reach a remote host
///
/// One tunnel corresponds to one acquisition: call [`set_up`](Self::set_up)
/// before use and [`tear_down`](Self::tear_down) afterwards. Teardown is
/// idempotent and also runs on drop, so the allocated port is released on
/// every exit path.
pub struct SshTunnel {
    host: Host,
    forward: Forward,
    ports: Arc<PortAllocator>,
    state: TunnelState,
    local_port: Option<u16>,
    child: Option<Child>,
}

impl SshTunnel {
    /// Create a tunnel to the host's SSH daemon
    ///
    /// Only hosts with a gateway actually forward a port; others connect
    /// directly and never touch the allocator.
    pub fn to_ssh_daemon(host: Host, ports: Arc<PortAllocator>) -> Self {
        Self {
            host,
            forward: Forward::SshDaemon,
            ports,
            state: TunnelState::Unopened,
            local_port: None,
            child: None,
        }
    }

    /// Create a tunnel forwarding a service port on the host
    pub fn to_service(host: Host, remote_port: u16, ports: Arc<PortAllocator>) -> Self {
        Self {
            host,
            forward: Forward::Service(remote_port),
            ports,
            state: TunnelState::Unopened,
            local_port: None,
            child: None,
        }
    }

    /// Get the tunnel's lifecycle state
    pub fn state(&self) -> TunnelState {
        self.state
    }

    /// Get the allocated local port, if forwarding is active
    pub fn local_port(&self) -> Option<u16> {
        self.local_port
    }

    /// Get the target host
    pub fn host(&self) -> &Host {
        &self.host
    }

    /// Open the tunnel
    ///
    /// Returns the allocated local port, or `None` when the host is reached
    /// directly. Calling this on an already-active tunnel returns the
    /// existing port without forwarding a second one.
    pub fn set_up(&mut self) -> Result<Option<u16>> {
        if self.state == TunnelState::Active {
            return Ok(self.local_port);
        }

        match self.forward {
            Forward::SshDaemon => match self.host.tunnel_via() {
                None => {
                    debug!(host = self.host.hostname(), "direct connection, no tunnel");
                    self.state = TunnelState::Active;
                    Ok(None)
                }
                Some(gateway) => {
                    let gateway = gateway.clone();
                    let ssh_port = self.host.port().unwrap_or(22);
                    let destination = format!("{}:{}", self.host.hostname(), ssh_port);
                    self.open_forward(&gateway, &destination)
                }
            },
            Forward::Service(remote_port) => {
                let endpoint = self.host.clone();
                let destination = format!("localhost:{}", remote_port);
                self.open_forward(&endpoint, &destination)
            }
        }
    }

    /// Close the tunnel
    ///
    /// Safe to call on a never-opened or already-closed tunnel; callers
    /// invoke it unconditionally in failure-cleanup paths.
    pub fn tear_down(&mut self) {
        if self.state != TunnelState::Active {
            return;
        }

        if let Some(mut child) = self.child.take() {
            if let Err(e) = child.kill() {
                warn!(host = self.host.hostname(), error = %e, "failed to stop ssh forwarding process");
            }
        }

        if let Some(port) = self.local_port.take() {
            self.ports.release(port);
            debug!(host = self.host.hostname(), port, "released tunnel port");
        }

        self.state = TunnelState::Closed;
    }

    /// Compose the final `ssh` command line for running a command on the host
    ///
    /// This is a pure function of tunnel state: an active forward connects
    /// through the allocated local port, otherwise the host is addressed
    /// directly. `extra_flags` are passed through to ssh (e.g. `-t` for an
    /// interactive session).
    pub fn assemble_ssh_command(&self, inner_command: &str, extra_flags: &[&str]) -> String {
        let mut parts = vec!["ssh".to_string()];

        if let Some(identity) = self.host.identity_file() {
            parts.push("-i".to_string());
            parts.push(shell_escape(&identity.to_string_lossy()));
        }

        for flag in extra_flags {
            parts.push((*flag).to_string());
        }

        let (connect_host, connect_port) = self.connect_endpoint();
        if let Some(port) = connect_port {
            parts.push("-p".to_string());
            parts.push(port.to_string());
        }

        if let Some(user) = self.host.user() {
            parts.push(format!("{}@{}", user, connect_host));
        } else {
            parts.push(connect_host);
        }

        if !inner_command.is_empty() {
            parts.push(shell_escape(inner_command));
        }

        parts.join(" ")
    }

    /// Compose the `user@host:path` remote operand for scp and rsync
    pub fn remote_target(&self, path: &str) -> String {
        let (connect_host, _) = self.connect_endpoint();
        if let Some(user) = self.host.user() {
            format!("{}@{}:{}", user, connect_host, path)
        } else {
            format!("{}:{}", connect_host, path)
        }
    }

    /// Connection flags for scp (`-P`/`-i`)
    pub fn scp_args(&self) -> Vec<String> {
        let mut args = Vec::new();

        let (_, connect_port) = self.connect_endpoint();
        if let Some(port) = connect_port {
            args.push("-P".to_string());
            args.push(port.to_string());
        }

        if let Some(identity) = self.host.identity_file() {
            args.push("-i".to_string());
            args.push(shell_escape(&identity.to_string_lossy()));
        }

        args
    }

    /// The ssh transport string used as rsync's `-e` value
    pub fn ssh_transport(&self) -> String {
        let mut parts = vec!["ssh".to_string()];

        let (_, connect_port) = self.connect_endpoint();
        if let Some(port) = connect_port {
            parts.push("-p".to_string());
            parts.push(port.to_string());
        }

        if let Some(identity) = self.host.identity_file() {
            parts.push("-i".to_string());
            parts.push(identity.to_string_lossy().to_string());
        }

        parts.join(" ")
    }

    /// Local endpoint of an active service forward
    ///
    /// Database clients connect here instead of the remote host.
    pub fn local_endpoint(&self) -> Option<(&'static str, u16)> {
        match self.forward {
            Forward::Service(_) => self.local_port.map(|port| ("127.0.0.1", port)),
            Forward::SshDaemon => None,
        }
    }

    /// Spawn the ssh forwarding process through `via`, allocating a port
    fn open_forward(&mut self, via: &Host, destination: &str) -> Result<Option<u16>> {
        let local_port = self.ports.allocate()?;

        let mut cmd = Command::new("ssh");
        cmd.arg("-o")
            .arg("ExitOnForwardFailure=yes")
            .arg("-o")
            .arg("BatchMode=yes")
            .arg("-N")
            .arg("-L")
            .arg(format!("{}:{}", local_port, destination));

        if let Some(identity) = via.identity_file() {
            cmd.arg("-i").arg(identity);
        }

        if let Some(port) = via.port() {
            cmd.arg("-p").arg(port.to_string());
        }

        cmd.arg(via.host_string());
        cmd.stdin(Stdio::null()).stdout(Stdio::null()).stderr(Stdio::null());

        match cmd.spawn() {
            Ok(child) => {
                debug!(
                    host = self.host.hostname(),
                    via = via.hostname(),
                    port = local_port,
                    "tunnel opened"
                );
                self.child = Some(child);
                self.local_port = Some(local_port);
                self.state = TunnelState::Active;
                Ok(Some(local_port))
            }
            Err(e) => {
                self.ports.release(local_port);
                Err(Error::TunnelFailed {
                    host: self.host.hostname().to_string(),
                    reason: e.to_string(),
                })
            }
        }
    }

    /// Where connections to the host should go, given tunnel state
    fn connect_endpoint(&self) -> (String, Option<u16>) {
        match (self.forward, self.local_port) {
            (Forward::SshDaemon, Some(port)) => ("127.0.0.1".to_string(), Some(port)),
            _ => (self.host.hostname().to_string(), self.host.port()),
        }
    }
}

impl Drop for SshTunnel {
    fn drop(&mut self) {
        // Teardown must happen exactly once per acquisition even when the
        // owning step errors out before its cleanup runs.
        self.tear_down();
    }
}
