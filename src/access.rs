//! Access matrix: explicit (manuscript, viewer) view grants
//!
//! Only explicit grants live here. Custodian and administrator access is implicit
//! and is resolved by [`crate::policy::can_view`].
use super::error::RegistryError;
use super::identity::Principal;
use super::manuscript::ManuscriptId;
use sled::{Batch, Db};
use std::sync::Arc;

const GRANT_PREFIX: &str = "grant/";

#[derive(Debug, Clone)]
pub struct AccessMatrix {
    instance: Arc<Db>,
}

impl AccessMatrix {
    pub fn new(instance: Arc<Db>) -> Self {
        Self { instance }
    }

    fn prefix(id: ManuscriptId) -> String {
        format!("{GRANT_PREFIX}{:020}/", id.0)
    }

    fn key(id: ManuscriptId, viewer: &Principal) -> Vec<u8> {
        format!("{}{}", Self::prefix(id), viewer).into_bytes()
    }

    /// Absent entries read as `false`
    pub fn get(&self, id: ManuscriptId, viewer: &Principal) -> Result<bool, RegistryError> {
        match self.instance.get(Self::key(id, viewer))? {
            Some(bytes) => Ok(minicbor::decode(&bytes)?),
            None => Ok(false),
        }
    }

    pub fn set(
        &self,
        batch: &mut Batch,
        id: ManuscriptId,
        viewer: &Principal,
        granted: bool,
    ) -> Result<(), RegistryError> {
        batch.insert(Self::key(id, viewer), minicbor::to_vec(granted)?);
        Ok(())
    }

    pub fn delete(&self, batch: &mut Batch, id: ManuscriptId, viewer: &Principal) {
        batch.remove(Self::key(id, viewer));
    }

    /// Every viewer holding an explicit `true` grant on the manuscript
    pub fn grantees(&self, id: ManuscriptId) -> Result<Vec<Principal>, RegistryError> {
        let prefix = Self::prefix(id);
        let mut viewers = vec![];

        for entry in self.instance.scan_prefix(prefix.as_bytes()) {
            let (key, value) = entry?;
            let granted: bool = minicbor::decode(&value)?;
            if !granted {
                continue;
            }
            let viewer = std::str::from_utf8(&key[prefix.len()..])
                .map_err(|e| RegistryError::Codec(e.to_string()))?;
            viewers.push(Principal::new(viewer));
        }

        Ok(viewers)
    }
}
