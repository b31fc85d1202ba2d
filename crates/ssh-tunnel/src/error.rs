//! Error types for tunnel management

use thiserror::Error;

/// Unified error type for host and tunnel operations
#[derive(Error, Debug)]
pub enum Error {
    /// No free local port left in the allocator's range
    #[error("no free local port available in range {start}-{end}")]
    PortsExhausted {
        /// First port of the configured range
        start: u16,
        /// Last port of the configured range
        end: u16,
    },

    /// Failed to spawn the ssh forwarding process
    #[error("failed to open tunnel to {host}: {reason}")]
    TunnelFailed {
        /// The host the tunnel was targeting
        host: String,
        /// The reason the ssh process could not be started
        reason: String,
    },

    /// I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
