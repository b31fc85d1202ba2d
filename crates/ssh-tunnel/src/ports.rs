//! Local port allocation for tunnels

use crate::error::{Error, Result};
use std::collections::HashSet;
use std::net::TcpListener;
use std::sync::Mutex;

/// Allocator for the local forwarded-port space
///
/// Tunnels share one allocator per environment so that no two concurrently
/// active tunnels claim the same local port. Ports are handed out from a
/// fixed range, verified free by a bind probe, and returned to the pool on
/// release so long-running scripts do not exhaust the range.
#[derive(Debug)]
pub struct PortAllocator {
    /// First port of the range (inclusive)
    start: u16,
    /// Last port of the range (inclusive)
    end: u16,
    /// Ports currently held by active tunnels
    in_use: Mutex<HashSet<u16>>,
}

impl PortAllocator {
    /// Create an allocator handing out ports from `start..=end`
    pub fn new(start: u16, end: u16) -> Self {
        Self {
            start,
            end,
            in_use: Mutex::new(HashSet::new()),
        }
    }

    /// Allocate a free local port
    ///
    /// Scans from the beginning of the range so released ports are reused.
    pub fn allocate(&self) -> Result<u16> {
        let mut in_use = self.lock();

        for port in self.start..=self.end {
            if in_use.contains(&port) {
                continue;
            }

            // Probe the port; something outside our control may hold it
            if TcpListener::bind(("127.0.0.1", port)).is_err() {
                continue;
            }

            in_use.insert(port);
            return Ok(port);
        }

        Err(Error::PortsExhausted {
            start: self.start,
            end: self.end,
        })
    }

    /// Return a port to the pool
    ///
    /// Releasing a port that was never allocated is a no-op.
    pub fn release(&self, port: u16) -> bool {
        self.lock().remove(&port)
    }

    /// Number of ports currently held by active tunnels
    pub fn active_count(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashSet<u16>> {
        self.in_use.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Default for PortAllocator {
    fn default() -> Self {
        Self::new(33800, 34099)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allocates_distinct_ports() {
        let allocator = PortAllocator::new(34200, 34210);

        let a = allocator.allocate().unwrap();
        let b = allocator.allocate().unwrap();

        assert_ne!(a, b);
        assert_eq!(allocator.active_count(), 2);
    }

    #[test]
    fn test_released_ports_are_reused() {
        let allocator = PortAllocator::new(34220, 34230);

        let a = allocator.allocate().unwrap();
        assert!(allocator.release(a));

        let b = allocator.allocate().unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_release_unallocated_port_is_noop() {
        let allocator = PortAllocator::new(34240, 34250);
        assert!(!allocator.release(34240));
        assert_eq!(allocator.active_count(), 0);
    }

    #[test]
    fn test_range_exhaustion() {
        let allocator = PortAllocator::new(34260, 34261);

        let _a = allocator.allocate().unwrap();
        let _b = allocator.allocate().unwrap();

        let result = allocator.allocate();
        assert!(matches!(result, Err(Error::PortsExhausted { .. })));
    }
}
