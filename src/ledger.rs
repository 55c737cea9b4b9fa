//! Global registry state: id sequence, storage utilisation and the administrator
use super::error::RegistryError;
use super::identity::Principal;
use super::manuscript::ManuscriptId;
use sled::{Batch, Db};
use std::sync::Arc;

const STATE_KEY: &str = "ledger/state";

#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, PartialEq, Eq)]
pub struct GlobalState {
    #[n(0)]
    pub administrator: Principal, // fixed at deployment
    #[n(1)]
    pub next_id: u64,
    #[n(2)]
    pub storage_used: u64,
    #[n(3)]
    pub next_event: u64,
}

impl GlobalState {
    pub fn genesis(administrator: Principal) -> Self {
        Self {
            administrator,
            next_id: 1,
            storage_used: 0,
            next_event: 0,
        }
    }

    /// Number of identifiers issued so far
    pub fn issued(&self) -> u64 {
        self.next_id - 1
    }

    pub fn allocate_id(&mut self) -> ManuscriptId {
        let id = ManuscriptId(self.next_id);
        self.next_id += 1;
        id
    }

    pub fn next_sequence(&mut self) -> u64 {
        let seq = self.next_event;
        self.next_event += 1;
        seq
    }

    pub fn reserve_storage(&mut self, bytes: u64) -> Result<(), RegistryError> {
        self.storage_used = self
            .storage_used
            .checked_add(bytes)
            .ok_or_else(|| RegistryError::integrity("storage utilisation overflowed"))?;
        Ok(())
    }

    pub fn release_storage(&mut self, bytes: u64) -> Result<(), RegistryError> {
        self.storage_used = self.storage_used.checked_sub(bytes).ok_or_else(|| {
            RegistryError::integrity(format!(
                "releasing {bytes} bytes exceeds recorded utilisation of {}",
                self.storage_used
            ))
        })?;
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct Ledger {
    instance: Arc<Db>,
}

impl Ledger {
    pub fn new(instance: Arc<Db>) -> Self {
        Self { instance }
    }

    pub fn load(&self) -> Result<Option<GlobalState>, RegistryError> {
        match self.instance.get(STATE_KEY)? {
            Some(bytes) => Ok(Some(minicbor::decode(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Loads the committed state, failing if it was never initialised
    pub fn current(&self) -> Result<GlobalState, RegistryError> {
        self.load()?
            .ok_or_else(|| RegistryError::integrity("registry state is missing"))
    }

    pub fn stage(&self, batch: &mut Batch, state: &GlobalState) -> Result<(), RegistryError> {
        batch.insert(STATE_KEY, minicbor::to_vec(state)?);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_start_at_one() {
        let mut state = GlobalState::genesis(Principal::new("admin"));

        assert_eq!(state.issued(), 0);
        assert_eq!(state.allocate_id(), ManuscriptId(1));
        assert_eq!(state.allocate_id(), ManuscriptId(2));
        assert_eq!(state.issued(), 2);
    }

    #[test]
    fn storage_accounting_is_checked() {
        let mut state = GlobalState::genesis(Principal::new("admin"));

        state.reserve_storage(500).unwrap();
        state.release_storage(200).unwrap();
        assert_eq!(state.storage_used, 300);

        assert!(matches!(
            state.release_storage(301),
            Err(RegistryError::SystemIntegrityCompromised(_))
        ));
        assert_eq!(state.storage_used, 300);

        state.storage_used = u64::MAX;
        assert!(state.reserve_storage(1).is_err());
    }
}
