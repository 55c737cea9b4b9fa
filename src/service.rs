//! Service layer API for manuscript registry operations
//!
//! Every operation loads the target record, runs its guards, and only then stages
//! writes into a single [`sled::Batch`]. The batch, the updated global state and a
//! provenance entry are applied together, so a rejected call leaves nothing behind.
use super::access::AccessMatrix;
use super::analytics::{AuthenticityReport, ManuscriptAnalytics};
use super::config::RegistryConfig;
use super::error::RegistryError;
use super::height::HeightSource;
use super::identity::Principal;
use super::ledger::{GlobalState, Ledger};
use super::manuscript::{
    ARCHIVAL_TAG, Manuscript, ManuscriptDraft, ManuscriptId, RESTRICTION_TAG,
};
use super::policy;
use super::provenance::{ProvenanceAction, ProvenanceEntry, ProvenanceLog};
use super::records::RecordStore;
use parking_lot::Mutex;
use sled::{Batch, Db};
use std::sync::Arc;

pub struct RegistryService {
    instance: Arc<Db>,
    records: RecordStore,
    access: AccessMatrix,
    ledger: Ledger,
    provenance: ProvenanceLog,
    heights: Arc<dyn HeightSource>,
    administrator: Principal,
    max_storage_bytes: u64,
    // one operation at a time, held across guards and commit
    op_lock: Mutex<()>,
}

impl RegistryService {
    /// Open the registry over `instance`, initialising global state on first use.
    ///
    /// Reopening with a different administrator than the one recorded at deployment
    /// fails with [`RegistryError::SystemIntegrityCompromised`].
    pub fn open(
        instance: Arc<Db>,
        config: &RegistryConfig,
        heights: Arc<dyn HeightSource>,
    ) -> anyhow::Result<Self> {
        config.validate()?;
        let ledger = Ledger::new(instance.clone());

        match ledger.load()? {
            Some(state) if state.administrator != config.administrator => {
                return Err(RegistryError::integrity(format!(
                    "registry was deployed with administrator {}, not {}",
                    state.administrator, config.administrator
                ))
                .into());
            }
            Some(state) => {
                tracing::debug!(issued = state.issued(), "reopened manuscript registry");
            }
            None if !RecordStore::new(instance.clone()).is_empty() => {
                return Err(RegistryError::integrity(
                    "manuscripts are present but the registry state is missing",
                )
                .into());
            }
            None => {
                let mut batch = Batch::default();
                ledger.stage(&mut batch, &GlobalState::genesis(config.administrator.clone()))?;
                instance.apply_batch(batch)?;
                tracing::info!(administrator = %config.administrator, "initialised manuscript registry");
            }
        }

        Ok(Self {
            records: RecordStore::new(instance.clone()),
            access: AccessMatrix::new(instance.clone()),
            provenance: ProvenanceLog::new(instance.clone()),
            ledger,
            instance,
            heights,
            administrator: config.administrator.clone(),
            max_storage_bytes: config.max_storage_bytes,
            op_lock: Mutex::new(()),
        })
    }

    /// Load a manuscript from the database
    fn load_record(&self, id: ManuscriptId) -> Result<Manuscript, RegistryError> {
        self.records.get(id)?.ok_or_else(|| {
            tracing::debug!(manuscript = %id, "manuscript not found");
            RegistryError::RecordNotFound(id.0)
        })
    }

    fn require_custodian(record: &Manuscript, caller: &Principal) -> Result<(), RegistryError> {
        if record.custodian != *caller {
            tracing::debug!(manuscript = %record.id, caller = %caller, "caller is not custodian");
            return Err(RegistryError::NotOwner);
        }
        Ok(())
    }

    fn require_view(&self, record: &Manuscript, caller: &Principal) -> Result<(), RegistryError> {
        let granted = self.access.get(record.id, caller)?;
        if !policy::can_view(Some(record), granted, caller, &self.administrator) {
            tracing::debug!(manuscript = %record.id, caller = %caller, "view access denied");
            return Err(RegistryError::ViewingAccessDenied);
        }
        Ok(())
    }

    // Stage the provenance entry and global state next to the operation's writes, then apply.
    // Returns the content hash of the new provenance entry.
    fn commit(
        &self,
        mut batch: Batch,
        mut state: GlobalState,
        id: ManuscriptId,
        actor: &Principal,
        height: u64,
        action: ProvenanceAction,
    ) -> Result<String, RegistryError> {
        let entry = ProvenanceEntry::new(
            id,
            state.next_sequence(),
            actor.clone(),
            height,
            action,
            self.provenance.head(id)?,
        );
        let hash = self.provenance.append(&mut batch, &entry)?;
        self.ledger.stage(&mut batch, &state)?;
        self.instance.apply_batch(batch)?;

        tracing::debug!(manuscript = %id, sequence = entry.sequence, hash = %hash, "provenance recorded");
        Ok(hash)
    }

    /// Register a new manuscript with `caller` as its custodian
    pub fn register_manuscript(
        &self,
        caller: &Principal,
        draft: ManuscriptDraft,
    ) -> Result<Manuscript, RegistryError> {
        let _guard = self.op_lock.lock();
        let mut state = self.ledger.current()?;
        let height = self.heights.current_height();

        let id = state.allocate_id();
        let record =
            draft.validate_and_finalise(id, caller.clone(), height, self.max_storage_bytes)?;
        state.reserve_storage(record.storage_size)?;

        let mut batch = Batch::default();
        self.records.put(&mut batch, &record)?;
        self.commit(
            batch,
            state,
            id,
            caller,
            height,
            ProvenanceAction::Registered {
                storage_size: record.storage_size,
            },
        )?;

        tracing::info!(manuscript = %id, custodian = %caller, height, "manuscript registered");
        Ok(record)
    }

    /// Give `recipient` explicit view access
    pub fn grant_view(
        &self,
        caller: &Principal,
        id: ManuscriptId,
        recipient: &Principal,
    ) -> Result<(), RegistryError> {
        let _guard = self.op_lock.lock();
        let record = self.load_record(id)?;
        Self::require_custodian(&record, caller)?;
        if recipient == caller {
            return Err(RegistryError::SelfGrantRejected);
        }

        let mut batch = Batch::default();
        self.access.set(&mut batch, id, recipient, true)?;
        self.commit(
            batch,
            self.ledger.current()?,
            id,
            caller,
            self.heights.current_height(),
            ProvenanceAction::ViewGranted {
                recipient: recipient.clone(),
            },
        )?;

        tracing::info!(manuscript = %id, recipient = %recipient, "view access granted");
        Ok(())
    }

    /// Remove an explicit grant. Neither the custodian nor the administrator can be targeted.
    pub fn revoke_view(
        &self,
        caller: &Principal,
        id: ManuscriptId,
        target: &Principal,
    ) -> Result<(), RegistryError> {
        let _guard = self.op_lock.lock();
        let record = self.load_record(id)?;
        Self::require_custodian(&record, caller)?;
        if target == caller || *target == self.administrator {
            tracing::debug!(manuscript = %id, target = %target, "revocation target is protected");
            return Err(RegistryError::GovernanceRestriction);
        }

        let mut batch = Batch::default();
        self.access.delete(&mut batch, id, target);
        self.commit(
            batch,
            self.ledger.current()?,
            id,
            caller,
            self.heights.current_height(),
            ProvenanceAction::ViewRevoked {
                target: target.clone(),
            },
        )?;

        tracing::info!(manuscript = %id, target = %target, "view access revoked");
        Ok(())
    }

    /// Hand the manuscript to `new_custodian`.
    ///
    /// The new custodian receives an explicit grant that outlives any later transfer,
    /// and the outgoing custodian's explicit grant, if any, is removed.
    pub fn transfer_custodianship(
        &self,
        caller: &Principal,
        id: ManuscriptId,
        new_custodian: &Principal,
    ) -> Result<Manuscript, RegistryError> {
        let _guard = self.op_lock.lock();
        let mut record = self.load_record(id)?;
        Self::require_custodian(&record, caller)?;
        if *new_custodian == record.custodian {
            return Err(RegistryError::NoOpTransferRejected);
        }

        let previous = std::mem::replace(&mut record.custodian, new_custodian.clone());

        let mut batch = Batch::default();
        self.records.put(&mut batch, &record)?;
        self.access.set(&mut batch, id, new_custodian, true)?;
        self.access.delete(&mut batch, id, &previous);
        self.commit(
            batch,
            self.ledger.current()?,
            id,
            caller,
            self.heights.current_height(),
            ProvenanceAction::CustodyTransferred {
                from: previous.clone(),
                to: new_custodian.clone(),
            },
        )?;

        tracing::info!(manuscript = %id, from = %previous, to = %new_custodian, "custodianship transferred");
        Ok(record)
    }

    /// Tag the manuscript as administratively restricted. Open to the administrator and the custodian.
    pub fn enforce_administrative_restriction(
        &self,
        caller: &Principal,
        id: ManuscriptId,
    ) -> Result<Manuscript, RegistryError> {
        let _guard = self.op_lock.lock();
        let mut record = self.load_record(id)?;
        if *caller != self.administrator && *caller != record.custodian {
            tracing::debug!(manuscript = %id, caller = %caller, "restriction requires privilege");
            return Err(RegistryError::AdminPrivilegeRequired);
        }
        record.append_tag(RESTRICTION_TAG)?;

        let mut batch = Batch::default();
        self.records.put(&mut batch, &record)?;
        self.commit(
            batch,
            self.ledger.current()?,
            id,
            caller,
            self.heights.current_height(),
            ProvenanceAction::AdministrativelyRestricted,
        )?;

        tracing::info!(manuscript = %id, caller = %caller, "administrative restriction applied");
        Ok(record)
    }

    pub fn designate_archival_status(
        &self,
        caller: &Principal,
        id: ManuscriptId,
    ) -> Result<Manuscript, RegistryError> {
        let _guard = self.op_lock.lock();
        let mut record = self.load_record(id)?;
        Self::require_custodian(&record, caller)?;
        record.append_tag(ARCHIVAL_TAG)?;

        let mut batch = Batch::default();
        self.records.put(&mut batch, &record)?;
        self.commit(
            batch,
            self.ledger.current()?,
            id,
            caller,
            self.heights.current_height(),
            ProvenanceAction::Archived,
        )?;

        tracing::info!(manuscript = %id, "manuscript archived");
        Ok(record)
    }

    /// Erase the manuscript and release its storage.
    ///
    /// Explicit grants for the id are left in place; they become unreachable because
    /// every operation fails on the missing record first.
    pub fn permanently_remove(
        &self,
        caller: &Principal,
        id: ManuscriptId,
    ) -> Result<Manuscript, RegistryError> {
        let _guard = self.op_lock.lock();
        let record = self.load_record(id)?;
        Self::require_custodian(&record, caller)?;

        let mut state = self.ledger.current()?;
        state.release_storage(record.storage_size)?;

        let mut batch = Batch::default();
        self.records.delete(&mut batch, id);
        self.commit(
            batch,
            state,
            id,
            caller,
            self.heights.current_height(),
            ProvenanceAction::Removed {
                storage_size: record.storage_size,
            },
        )?;

        tracing::info!(manuscript = %id, freed = record.storage_size, "manuscript removed");
        Ok(record)
    }

    pub fn get_analytics(
        &self,
        caller: &Principal,
        id: ManuscriptId,
    ) -> Result<ManuscriptAnalytics, RegistryError> {
        let _guard = self.op_lock.lock();
        let record = self.load_record(id)?;
        self.require_view(&record, caller)?;

        ManuscriptAnalytics::derive(
            &record,
            self.heights.current_height(),
            self.max_storage_bytes,
        )
    }

    /// Compare `claimed_custodian` against the record. A mismatch is a normal result, not an error.
    pub fn verify_authenticity(
        &self,
        caller: &Principal,
        id: ManuscriptId,
        claimed_custodian: &Principal,
    ) -> Result<AuthenticityReport, RegistryError> {
        let _guard = self.op_lock.lock();
        let record = self.load_record(id)?;
        self.require_view(&record, caller)?;

        AuthenticityReport::derive(&record, claimed_custodian, self.heights.current_height())
    }

    pub fn get_manuscript(
        &self,
        caller: &Principal,
        id: ManuscriptId,
    ) -> Result<Manuscript, RegistryError> {
        let _guard = self.op_lock.lock();
        let record = self.load_record(id)?;
        self.require_view(&record, caller)?;

        Ok(record)
    }

    /// Effective view permission. Never fails on policy, only on storage.
    pub fn can_view(&self, id: ManuscriptId, requester: &Principal) -> Result<bool, RegistryError> {
        let _guard = self.op_lock.lock();
        let record = self.records.get(id)?;
        let granted = self.access.get(id, requester)?;

        Ok(policy::can_view(
            record.as_ref(),
            granted,
            requester,
            &self.administrator,
        ))
    }

    /// Principals holding an explicit grant, custodian and administrator excluded unless granted
    pub fn explicit_viewers(
        &self,
        caller: &Principal,
        id: ManuscriptId,
    ) -> Result<Vec<Principal>, RegistryError> {
        let _guard = self.op_lock.lock();
        let record = self.load_record(id)?;
        self.require_view(&record, caller)?;

        self.access.grantees(id)
    }

    pub fn provenance(
        &self,
        caller: &Principal,
        id: ManuscriptId,
    ) -> Result<Vec<ProvenanceEntry>, RegistryError> {
        let _guard = self.op_lock.lock();
        let record = self.load_record(id)?;
        self.require_view(&record, caller)?;

        self.provenance.history(id)
    }

    /// Whether every provenance entry of `id` chains to the hash of its predecessor
    pub fn verify_provenance(
        &self,
        caller: &Principal,
        id: ManuscriptId,
    ) -> Result<bool, RegistryError> {
        let _guard = self.op_lock.lock();
        let record = self.load_record(id)?;
        self.require_view(&record, caller)?;

        self.provenance.verify_chain(id)
    }

    /// Identifiers issued so far, including removed manuscripts
    pub fn total_manuscripts(&self) -> Result<u64, RegistryError> {
        let _guard = self.op_lock.lock();
        Ok(self.ledger.current()?.issued())
    }

    /// Manuscripts currently held, removed ones excluded
    pub fn live_manuscripts(&self) -> Result<u64, RegistryError> {
        let _guard = self.op_lock.lock();
        Ok(self.records.len() as u64)
    }

    pub fn storage_utilization(&self) -> Result<u64, RegistryError> {
        let _guard = self.op_lock.lock();
        Ok(self.ledger.current()?.storage_used)
    }

    pub fn administrator(&self) -> &Principal {
        &self.administrator
    }

    pub fn storage_capacity(&self) -> u64 {
        self.max_storage_bytes
    }
}
