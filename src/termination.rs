//! Last-chance flushing of open writers on process termination.
//!
//! Writers register a weak handle here. The application calls
//! [`Registry::run_handlers`] from whatever termination hook it installs
//! (the CLI uses a panic hook), and every writer still alive gets to flush
//! and finish its output.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, Weak};

use log::{debug, warn};

use crate::error::Result;

/// Something that can bring its output to a consistent state on shutdown.
pub trait TerminationHandler: Send + Sync {
    /// Short description for log messages.
    fn describe(&self) -> String;

    fn terminate(&self) -> Result<()>;
}

struct Entry {
    id: u64,
    handler: Weak<dyn TerminationHandler>,
}

/// A set of weakly held termination handlers.
#[derive(Default)]
pub struct Registry {
    entries: Mutex<Vec<Entry>>,
    next_id: AtomicU64,
}

impl Registry {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn entries(&self) -> MutexGuard<'_, Vec<Entry>> {
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Add a handler. It stays registered until the returned
    /// [`Registration`] is dropped or the handler itself is gone.
    pub fn register(self: &Arc<Self>, handler: Weak<dyn TerminationHandler>) -> Registration {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.entries().push(Entry { id, handler });
        Registration {
            registry: Arc::downgrade(self),
            id,
        }
    }

    fn deregister(&self, id: u64) {
        self.entries().retain(|entry| entry.id != id);
    }

    /// Number of registered handlers that are still alive.
    pub fn len(&self) -> usize {
        self.entries()
            .iter()
            .filter(|entry| entry.handler.strong_count() > 0)
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Run every live handler once. Returns how many succeeded.
    ///
    /// Handlers are collected first and run without the registry lock held,
    /// so a handler may deregister itself.
    pub fn run_handlers(&self) -> usize {
        let live: Vec<Arc<dyn TerminationHandler>> = {
            let mut entries = self.entries();
            entries.retain(|entry| entry.handler.strong_count() > 0);
            entries.iter().filter_map(|entry| entry.handler.upgrade()).collect()
        };

        let mut succeeded = 0;
        for handler in live {
            match handler.terminate() {
                Ok(()) => {
                    debug!("terminated {}", handler.describe());
                    succeeded += 1;
                }
                Err(e) => warn!("failed to terminate {}: {}", handler.describe(), e),
            }
        }
        succeeded
    }
}

/// Keeps a handler registered; deregisters on drop.
///
/// Holds the registry weakly, so it never keeps the registry alive.
#[derive(Debug)]
pub struct Registration {
    registry: Weak<Registry>,
    id: u64,
}

impl Drop for Registration {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            registry.deregister(self.id);
        }
    }
}

/// The process-wide registry.
pub fn global() -> &'static Arc<Registry> {
    static GLOBAL: OnceLock<Arc<Registry>> = OnceLock::new();
    GLOBAL.get_or_init(Registry::new)
}
