//! Record store: one CBOR-encoded entry per manuscript id
use super::error::RegistryError;
use super::manuscript::{Manuscript, ManuscriptId};
use sled::{Batch, Db};
use std::sync::Arc;

const RECORD_PREFIX: &str = "manuscript/";

/// Reads committed manuscripts. Writes are staged into a batch owned by the caller.
#[derive(Debug, Clone)]
pub struct RecordStore {
    instance: Arc<Db>,
}

impl RecordStore {
    pub fn new(instance: Arc<Db>) -> Self {
        Self { instance }
    }

    fn key(id: ManuscriptId) -> Vec<u8> {
        // zero padded so a prefix scan yields ids in order
        format!("{RECORD_PREFIX}{:020}", id.0).into_bytes()
    }

    pub fn get(&self, id: ManuscriptId) -> Result<Option<Manuscript>, RegistryError> {
        match self.instance.get(Self::key(id))? {
            Some(bytes) => Ok(Some(minicbor::decode(&bytes)?)),
            None => Ok(None),
        }
    }

    pub fn put(&self, batch: &mut Batch, record: &Manuscript) -> Result<(), RegistryError> {
        batch.insert(Self::key(record.id), minicbor::to_vec(record)?);
        Ok(())
    }

    pub fn delete(&self, batch: &mut Batch, id: ManuscriptId) {
        batch.remove(Self::key(id));
    }

    /// Number of manuscripts currently held, removed ones excluded
    pub fn len(&self) -> usize {
        self.instance.scan_prefix(RECORD_PREFIX).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
