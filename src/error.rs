use super::manuscript::{MAX_SYNOPSIS_LEN, MAX_TAG_LEN, MAX_TAGS, MAX_TITLE_LEN};

/// Rejections raised by registry operations. Each guard maps to exactly one kind.
#[derive(thiserror::Error, Debug)]
pub enum RegistryError {
    #[error("Manuscript {0} does not exist")]
    RecordNotFound(u64),
    #[error("Caller is not the custodian of this manuscript")]
    NotOwner,
    #[error("Operation requires the administrator or the custodian")]
    AdminPrivilegeRequired,
    #[error("Caller is not permitted to view this manuscript")]
    ViewingAccessDenied,
    #[error("Custodian cannot grant view access to themselves")]
    SelfGrantRejected,
    #[error("Target is protected from revocation")]
    GovernanceRestriction,
    #[error("Custodianship is already held by the requested principal")]
    NoOpTransferRejected,
    #[error("Classification tags are at capacity")]
    TagCapacityExceeded,
    #[error("System integrity compromised: {0}")]
    SystemIntegrityCompromised(String),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("Storage failure: {0}")]
    Storage(#[from] sled::Error),
    #[error("Failed to encode or decode stored value: {0}")]
    Codec(String),
}

/// Field checks applied when a manuscript is first registered.
#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Title must be between 1 and {} characters", MAX_TITLE_LEN)]
    InvalidTitle,
    #[error("Synopsis exceeds {} characters", MAX_SYNOPSIS_LEN)]
    SynopsisTooLong,
    #[error("Tags must be between 1 and {} characters", MAX_TAG_LEN)]
    InvalidTag,
    #[error("At most {} tags may be supplied", MAX_TAGS)]
    TooManyTags,
    #[error("Storage size {size} exceeds the capacity ceiling of {max}")]
    StorageTooLarge { size: u64, max: u64 },
}

impl RegistryError {
    pub(crate) fn integrity(msg: impl Into<String>) -> Self {
        let msg = msg.into();
        tracing::warn!(reason = %msg, "integrity violation");
        RegistryError::SystemIntegrityCompromised(msg)
    }
}

impl<E: std::fmt::Display> From<minicbor::encode::Error<E>> for RegistryError {
    fn from(value: minicbor::encode::Error<E>) -> Self {
        RegistryError::Codec(value.to_string())
    }
}

impl From<minicbor::decode::Error> for RegistryError {
    fn from(value: minicbor::decode::Error) -> Self {
        RegistryError::Codec(value.to_string())
    }
}
