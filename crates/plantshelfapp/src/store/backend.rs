use super::InventorySnapshot;
use crate::error::Result;

/// Abstract interface for snapshot I/O.
///
/// The backend handles the "how" of persistence (filesystem vs memory); the
/// inventory handles the "what" (records, invariants, rebuilding indexes).
pub trait StorageBackend {
    /// Load the last saved snapshot.
    /// Returns Ok(None) when nothing has been saved yet.
    fn load(&self) -> Result<Option<InventorySnapshot>>;

    /// Replace the saved snapshot.
    /// MUST be atomic: a failed save leaves the previous snapshot readable.
    fn save(&self, snapshot: &InventorySnapshot) -> Result<()>;
}
