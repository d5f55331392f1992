//! Port Allocator (component F): hands out the smallest free TCP port at or
//! above a base, serialized so two concurrent allocations in the same
//! process never race each other onto the same port (§4.5).

use std::collections::HashSet;
use std::net::SocketAddr;

use tokio::net::TcpListener;
use tokio::sync::Mutex;

#[derive(Debug, thiserror::Error)]
pub enum PortAllocError {
    #[error("no free port found at or above {base} on {host} after {tried} attempts")]
    Exhausted { host: String, base: u16, tried: u32 },
}

/// Tracks ports already handed out by this process for one base range
/// (lobby ports and room ports use separate allocators since their ranges
/// are independent).
pub struct PortAllocator {
    host: String,
    handed_out: Mutex<HashSet<u16>>,
}

impl PortAllocator {
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            handed_out: Mutex::new(HashSet::new()),
        }
    }

    /// Returns the smallest `port >= base` not already handed out by this
    /// allocator that can currently be bound on `host`. The bind check uses a
    /// transient listener with `SO_REUSEADDR` semantics (the OS default for
    /// a freshly bound-then-dropped `TcpListener`), released before
    /// returning so the caller's own listener can bind it immediately after.
    pub async fn allocate(&self, base: u16) -> Result<u16, PortAllocError> {
        const MAX_ATTEMPTS: u32 = 2000;
        let mut guard = self.handed_out.lock().await;

        let mut port = base;
        for _ in 0..MAX_ATTEMPTS {
            if !guard.contains(&port) && Self::can_bind(&self.host, port).await {
                guard.insert(port);
                return Ok(port);
            }
            port = port.saturating_add(1);
        }

        Err(PortAllocError::Exhausted {
            host: self.host.clone(),
            base,
            tried: MAX_ATTEMPTS,
        })
    }

    /// Releases a previously allocated port, e.g. after a failed spawn so the
    /// number can be retried without waiting for the whole process to exit.
    pub async fn release(&self, port: u16) {
        self.handed_out.lock().await.remove(&port);
    }

    async fn can_bind(host: &str, port: u16) -> bool {
        let addr: SocketAddr = match format!("{host}:{port}").parse() {
            Ok(addr) => addr,
            Err(_) => return false,
        };
        TcpListener::bind(addr).await.is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn allocates_distinct_increasing_ports() {
        let allocator = PortAllocator::new("127.0.0.1");
        let a = allocator.allocate(20000).await.unwrap();
        let b = allocator.allocate(20000).await.unwrap();
        let c = allocator.allocate(20000).await.unwrap();
        assert_eq!([a, b, c].iter().collect::<std::collections::HashSet<_>>().len(), 3);
        assert!(a >= 20000 && b >= 20000 && c >= 20000);
    }

    #[tokio::test]
    async fn released_port_can_be_reallocated() {
        let allocator = PortAllocator::new("127.0.0.1");
        let a = allocator.allocate(21000).await.unwrap();
        allocator.release(a).await;
        let b = allocator.allocate(21000).await.unwrap();
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn concurrent_allocations_are_serialized() {
        let allocator = std::sync::Arc::new(PortAllocator::new("127.0.0.1"));
        let mut tasks = Vec::new();
        for _ in 0..8 {
            let allocator = allocator.clone();
            tasks.push(tokio::spawn(async move { allocator.allocate(22000).await.unwrap() }));
        }
        let mut ports = Vec::new();
        for task in tasks {
            ports.push(task.await.unwrap());
        }
        let unique: std::collections::HashSet<_> = ports.iter().collect();
        assert_eq!(unique.len(), ports.len(), "expected all allocated ports to be distinct");
    }
}
