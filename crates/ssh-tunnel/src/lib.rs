//! SSH host and tunnel management
//!
//! This crate provides the building blocks for reaching remote machines over
//! SSH: host identities, local port forwarding with deterministic teardown,
//! and pure assembly of `ssh`/`scp`/`rsync` command lines.

#![warn(missing_docs)]

pub mod error;
pub mod host;
pub mod ports;
pub mod tunnel;

mod escape;

pub use error::{Error, Result};
pub use escape::shell_escape;
pub use host::Host;
pub use ports::PortAllocator;
pub use tunnel::{SshTunnel, TunnelState};
