//! Pagination position over the entity catalog.

use uuid::Uuid;

use warden_core::Entity;

/// Opaque catalog position. Entities with `id > cursor` are fetched next.
///
/// The nil UUID means "start from the lowest id"; the loop resets to nil
/// whenever the store reports no entity beyond the current position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cursor(Uuid);

impl Cursor {
    /// Start from a random position. Replicas each pick their own start,
    /// which scatters concurrent sweeps across the catalog instead of
    /// stampeding the low end on every restart.
    pub fn scattered() -> Self {
        Self(Uuid::new_v4())
    }

    /// Start from the beginning of the catalog.
    pub fn start() -> Self {
        Self(Uuid::nil())
    }

    pub fn position(&self) -> Uuid {
        self.0
    }

    /// Move past the batch: the new position is the last entity's id.
    /// An empty batch leaves the cursor where it is.
    pub fn advance(&mut self, batch: &[Entity]) {
        if let Some(last) = batch.last() {
            self.0 = last.id;
        }
    }

    /// Rewind to the beginning so the next tick starts a new sweep.
    pub fn reset(&mut self) {
        self.0 = Uuid::nil();
    }

    /// Whether the cursor is at the beginning of the catalog.
    pub fn is_start(&self) -> bool {
        self.0.is_nil()
    }
}
