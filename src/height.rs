//! Chain height source used for tenure and provenance
use super::error::RegistryError;
use std::sync::atomic::{AtomicU64, Ordering};

/// Supplies the current chain height. Must never go backwards.
pub trait HeightSource: Send + Sync {
    fn current_height(&self) -> u64;
}

/// In-process height counter, advanced by whoever drives block production.
#[derive(Debug, Default)]
pub struct ChainHeight(AtomicU64);

impl ChainHeight {
    pub fn new(start: u64) -> Self {
        Self(AtomicU64::new(start))
    }

    pub fn advance_by(&self, blocks: u64) -> Result<u64, RegistryError> {
        let prev = self
            .0
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |h| h.checked_add(blocks))
            .map_err(|h| {
                RegistryError::integrity(format!("height {h} cannot advance by {blocks} blocks"))
            })?;
        Ok(prev + blocks)
    }

    /// Move to an absolute height. Rejects any attempt to rewind.
    pub fn advance_to(&self, height: u64) -> Result<u64, RegistryError> {
        let prev = self.0.fetch_max(height, Ordering::SeqCst);
        if height < prev {
            return Err(RegistryError::integrity(format!(
                "height cannot move from {prev} back to {height}"
            )));
        }
        Ok(height)
    }
}

impl HeightSource for ChainHeight {
    fn current_height(&self) -> u64 {
        self.0.load(Ordering::SeqCst)
    }
}
