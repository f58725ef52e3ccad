use super::backend::StorageBackend;
use super::InventorySnapshot;
use crate::error::{InventoryError, Result};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// In-memory storage backend for testing.
///
/// Interior mutability goes through `parking_lot::Mutex` and atomics so the
/// backend can sit behind the shared [`crate::api::PlantShelf`] facade.
#[derive(Default)]
pub struct MemBackend {
    snapshot: Mutex<Option<InventorySnapshot>>,
    simulate_write_error: AtomicBool,
    saves: AtomicUsize,
}

impl MemBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts from an existing snapshot, as if it had been saved earlier.
    pub fn with_snapshot(snapshot: InventorySnapshot) -> Self {
        Self {
            snapshot: Mutex::new(Some(snapshot)),
            ..Self::default()
        }
    }

    /// Enable write error simulation for testing error handling.
    pub fn set_simulate_write_error(&self, simulate: bool) {
        self.simulate_write_error.store(simulate, Ordering::SeqCst);
    }

    /// Number of successful saves so far.
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    pub fn stored(&self) -> Option<InventorySnapshot> {
        self.snapshot.lock().clone()
    }
}

impl StorageBackend for MemBackend {
    fn load(&self) -> Result<Option<InventorySnapshot>> {
        Ok(self.snapshot.lock().clone())
    }

    fn save(&self, snapshot: &InventorySnapshot) -> Result<()> {
        if self.simulate_write_error.load(Ordering::SeqCst) {
            return Err(InventoryError::Store("Simulated write error".to_string()));
        }
        *self.snapshot.lock() = Some(snapshot.clone());
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
