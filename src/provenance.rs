//! Provenance trail of committed manuscript mutations
use super::error::RegistryError;
use super::identity::Principal;
use super::manuscript::ManuscriptId;
use chrono::{DateTime, TimeZone, Utc};
use sled::{Batch, Db};
use std::sync::Arc;

const PROVENANCE_PREFIX: &str = "provenance/";

#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Clone)]
pub struct TimeStamp<T: TimeZone>(DateTime<T>);

impl TimeStamp<Utc> {
    pub fn new() -> Self {
        Self(Utc::now())
    }
}

impl Default for TimeStamp<Utc> {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, PartialEq, Eq, minicbor::Encode, minicbor::Decode, Clone)]
pub enum ProvenanceAction {
    #[n(0)]
    Registered {
        #[n(0)]
        storage_size: u64,
    },
    #[n(1)]
    ViewGranted {
        #[n(0)]
        recipient: Principal,
    },
    #[n(2)]
    ViewRevoked {
        #[n(0)]
        target: Principal,
    },
    #[n(3)]
    CustodyTransferred {
        #[n(0)]
        from: Principal,
        #[n(1)]
        to: Principal,
    },
    #[n(4)]
    AdministrativelyRestricted,
    #[n(5)]
    Archived,
    #[n(6)]
    Removed {
        #[n(0)]
        storage_size: u64,
    },
}

#[derive(Debug, PartialEq, Eq, minicbor::Encode, minicbor::Decode, Clone)]
pub struct ProvenanceEntry {
    #[n(0)]
    pub manuscript_id: ManuscriptId,
    #[n(1)]
    pub sequence: u64, // registry wide, strictly increasing
    #[n(2)]
    pub actor: Principal,
    #[n(3)]
    pub height: u64,
    #[n(4)]
    pub recorded_at: TimeStamp<Utc>,
    #[n(5)]
    pub action: ProvenanceAction,
    #[n(6)]
    pub parent: Option<String>, // hash of the previous entry for the same manuscript
}

impl ProvenanceEntry {
    pub fn new(
        manuscript_id: ManuscriptId,
        sequence: u64,
        actor: Principal,
        height: u64,
        action: ProvenanceAction,
        parent: Option<String>,
    ) -> Self {
        Self {
            manuscript_id,
            sequence,
            actor,
            height,
            recorded_at: TimeStamp::new(),
            action,
            parent,
        }
    }
    pub fn build(&self) -> Result<(String, Vec<u8>), RegistryError> {
        let cbor = minicbor::to_vec(self)?;
        let hash = sha256::digest(&cbor);

        Ok((hash, cbor))
    }
}

#[derive(Debug, Clone)]
pub struct ProvenanceLog {
    instance: Arc<Db>,
}

impl ProvenanceLog {
    pub fn new(instance: Arc<Db>) -> Self {
        Self { instance }
    }

    fn prefix(id: ManuscriptId) -> String {
        format!("{PROVENANCE_PREFIX}{:020}/", id.0)
    }

    /// Stage an entry; returns its content hash
    pub fn append(
        &self,
        batch: &mut Batch,
        entry: &ProvenanceEntry,
    ) -> Result<String, RegistryError> {
        let (hash, cbor) = entry.build()?;
        let key = format!("{}{:020}", Self::prefix(entry.manuscript_id), entry.sequence);
        batch.insert(key.into_bytes(), cbor);
        Ok(hash)
    }

    /// Content hash of the latest committed entry for `id`
    pub fn head(&self, id: ManuscriptId) -> Result<Option<String>, RegistryError> {
        match self.instance.scan_prefix(Self::prefix(id)).next_back() {
            Some(entry) => {
                let (_, value) = entry?;
                Ok(Some(sha256::digest(value.to_vec())))
            }
            None => Ok(None),
        }
    }

    /// Checks that every entry names its predecessor's hash
    pub fn verify_chain(&self, id: ManuscriptId) -> Result<bool, RegistryError> {
        let mut parent = None;
        for entry in self.history(id)? {
            if entry.parent != parent {
                tracing::warn!(manuscript = %id, sequence = entry.sequence, "provenance chain is broken");
                return Ok(false);
            }
            parent = Some(entry.build()?.0);
        }
        Ok(true)
    }

    /// Entries for one manuscript in commit order
    pub fn history(&self, id: ManuscriptId) -> Result<Vec<ProvenanceEntry>, RegistryError> {
        self.instance
            .scan_prefix(Self::prefix(id))
            .map(|entry| -> Result<ProvenanceEntry, RegistryError> {
                let (_, value) = entry?;
                Ok(minicbor::decode(&value)?)
            })
            .collect()
    }
}

impl<C> minicbor::Encode<C> for TimeStamp<Utc> {
    fn encode<W: minicbor::encode::Write>(
        &self,
        e: &mut minicbor::Encoder<W>,
        _: &mut C,
    ) -> Result<(), minicbor::encode::Error<W::Error>> {
        if let Some(nsec) = self.0.timestamp_nanos_opt() {
            return e.i64(nsec)?.ok();
        }

        Err(minicbor::encode::Error::message(
            "failed to encode timestamp. timestamp_nanos_opt returned None",
        ))
    }
}
impl<'b, C> minicbor::Decode<'b, C> for TimeStamp<Utc> {
    fn decode(d: &mut minicbor::Decoder<'b>, _: &mut C) -> Result<Self, minicbor::decode::Error> {
        let nsecs = d.i64()?;

        Ok(TimeStamp(DateTime::from_timestamp_nanos(nsecs)))
    }
}
