//! Manuscript records and the draft builder used on registration
use super::error::{RegistryError, ValidationError};
use super::identity::Principal;
use std::fmt;

pub const MAX_TITLE_LEN: usize = 64;
pub const MAX_SYNOPSIS_LEN: usize = 128;
pub const MAX_TAG_LEN: usize = 32;
pub const MAX_TAGS: usize = 10;

pub const RESTRICTION_TAG: &str = "ADMIN-RESTRICTED";
pub const ARCHIVAL_TAG: &str = "ARCHIVED-STATUS";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ManuscriptId(pub u64);

// Key is the manuscript id; the record is stored encoded into CBOR
#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, PartialEq, Eq)]
pub struct Manuscript {
    #[n(0)]
    pub id: ManuscriptId,
    #[n(1)]
    pub title: String,
    #[n(2)]
    pub custodian: Principal,
    #[n(3)]
    pub storage_size: u64, // bytes
    #[n(4)]
    pub registration_height: u64, // never changes after registration
    #[n(5)]
    pub synopsis: String,
    #[n(6)]
    tags: Vec<String>,
}

// Used for constructing drafts prior to registration
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ManuscriptDraft {
    title: String,
    synopsis: String,
    storage_size: u64,
    tags: Vec<String>,
}

impl Manuscript {
    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    /// Appends a classification tag, failing rather than truncating once at capacity.
    pub fn append_tag(&mut self, tag: &str) -> Result<(), RegistryError> {
        if self.tags.len() >= MAX_TAGS {
            return Err(RegistryError::TagCapacityExceeded);
        }
        self.tags.push(tag.to_owned());
        Ok(())
    }

    /// Returns a SHA-256 digest of the record and its contents serialised into CBOR
    pub fn fingerprint(&self) -> Result<(String, Vec<u8>), RegistryError> {
        let cbor = minicbor::to_vec(self)?;
        let hash = sha256::digest(&cbor);

        Ok((hash, cbor))
    }
}

impl ManuscriptDraft {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn set_title(mut self, title: &str) -> Self {
        self.title = title.to_owned();
        self
    }
    pub fn set_synopsis(mut self, synopsis: &str) -> Self {
        self.synopsis = synopsis.to_owned();
        self
    }
    pub fn set_storage_size(mut self, bytes: u64) -> Self {
        self.storage_size = bytes;
        self
    }
    pub fn add_tag(mut self, tag: &str) -> Self {
        self.tags.push(tag.to_owned());
        self
    }

    // Checks fields against their bounds then produces the record to be stored
    pub fn validate_and_finalise(
        self,
        id: ManuscriptId,
        custodian: Principal,
        registration_height: u64,
        max_storage: u64,
    ) -> Result<Manuscript, ValidationError> {
        let title_len = self.title.chars().count();
        if title_len == 0 || title_len > MAX_TITLE_LEN {
            return Err(ValidationError::InvalidTitle);
        }
        if self.synopsis.chars().count() > MAX_SYNOPSIS_LEN {
            return Err(ValidationError::SynopsisTooLong);
        }
        if self.tags.len() > MAX_TAGS {
            return Err(ValidationError::TooManyTags);
        }
        if self
            .tags
            .iter()
            .any(|t| t.is_empty() || t.chars().count() > MAX_TAG_LEN)
        {
            return Err(ValidationError::InvalidTag);
        }
        if self.storage_size > max_storage {
            return Err(ValidationError::StorageTooLarge {
                size: self.storage_size,
                max: max_storage,
            });
        }

        Ok(Manuscript {
            id,
            title: self.title,
            custodian,
            storage_size: self.storage_size,
            registration_height,
            synopsis: self.synopsis,
            tags: self.tags,
        })
    }
}

impl fmt::Display for ManuscriptId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl<C> minicbor::Encode<C> for ManuscriptId {
    fn encode<W: minicbor::encode::Write>(
        &self,
        e: &mut minicbor::Encoder<W>,
        _: &mut C,
    ) -> Result<(), minicbor::encode::Error<W::Error>> {
        e.u64(self.0)?.ok()
    }
}

impl<'b, C> minicbor::Decode<'b, C> for ManuscriptId {
    fn decode(d: &mut minicbor::Decoder<'b>, _: &mut C) -> Result<Self, minicbor::decode::Error> {
        Ok(ManuscriptId(d.u64()?))
    }
}
