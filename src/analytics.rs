//! Read-only derivations over a manuscript at a given height
use super::error::RegistryError;
use super::identity::Principal;
use super::manuscript::Manuscript;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManuscriptAnalytics {
    pub tenure: u64,
    pub storage_size: u64,
    pub tag_count: usize,
    pub registration_height: u64,
    pub current_height: u64,
    pub storage_ratio: u64, // whole percent of the capacity ceiling
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticityReport {
    pub authentic: bool,
    pub tenure: u64,
    pub current_height: u64,
    pub fingerprint: String,
}

/// Heights elapsed since registration.
pub fn tenure(record: &Manuscript, current_height: u64) -> Result<u64, RegistryError> {
    current_height
        .checked_sub(record.registration_height)
        .ok_or_else(|| {
            RegistryError::integrity(format!(
                "current height {current_height} precedes registration height {}",
                record.registration_height
            ))
        })
}

/// `size * 100 / ceiling`, truncated. Widened so large sizes cannot overflow.
pub fn storage_ratio(storage_size: u64, capacity_ceiling: u64) -> Result<u64, RegistryError> {
    if capacity_ceiling == 0 {
        return Err(RegistryError::integrity("storage capacity ceiling is zero"));
    }
    let ratio = u128::from(storage_size) * 100 / u128::from(capacity_ceiling);
    u64::try_from(ratio).map_err(|_| RegistryError::integrity("storage ratio out of range"))
}

impl ManuscriptAnalytics {
    pub fn derive(
        record: &Manuscript,
        current_height: u64,
        capacity_ceiling: u64,
    ) -> Result<Self, RegistryError> {
        Ok(Self {
            tenure: tenure(record, current_height)?,
            storage_size: record.storage_size,
            tag_count: record.tags().len(),
            registration_height: record.registration_height,
            current_height,
            storage_ratio: storage_ratio(record.storage_size, capacity_ceiling)?,
        })
    }
}

impl AuthenticityReport {
    pub fn derive(
        record: &Manuscript,
        claimed_custodian: &Principal,
        current_height: u64,
    ) -> Result<Self, RegistryError> {
        let (fingerprint, _) = record.fingerprint()?;

        Ok(Self {
            authentic: record.custodian == *claimed_custodian,
            tenure: tenure(record, current_height)?,
            current_height,
            fingerprint,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ratio_truncates() {
        assert_eq!(storage_ratio(0, 1_000).unwrap(), 0);
        assert_eq!(storage_ratio(1_000, 1_000).unwrap(), 100);
        assert_eq!(storage_ratio(1, 3).unwrap(), 33);
        assert_eq!(storage_ratio(2, 3).unwrap(), 66);
        assert_eq!(storage_ratio(u64::MAX, u64::MAX).unwrap(), 100);
    }

    #[test]
    fn zero_ceiling_is_an_integrity_fault() {
        assert!(matches!(
            storage_ratio(1, 0),
            Err(RegistryError::SystemIntegrityCompromised(_))
        ));
    }
}
