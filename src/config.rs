//! Deployment configuration
//!
//! The administrator identity and the storage capacity ceiling are fixed when the
//! registry is deployed. Both can be supplied programmatically or loaded from the
//! environment with the `MANUSCRIPT_REGISTRY_` prefix.
use super::identity::Principal;
use anyhow::Context;
use std::env;
use std::path::PathBuf;

pub const DEFAULT_MAX_STORAGE_BYTES: u64 = 1_000_000_000;
pub const DEFAULT_DB_PATH: &str = "./manuscripts.db";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryConfig {
    /// Holds implicit, unrevokable view access to every manuscript
    pub administrator: Principal,
    /// Capacity ceiling for a single manuscript, and the denominator of the storage ratio
    pub max_storage_bytes: u64,
    pub db_path: PathBuf,
}

impl RegistryConfig {
    pub fn new(administrator: Principal) -> Self {
        Self {
            administrator,
            max_storage_bytes: DEFAULT_MAX_STORAGE_BYTES,
            db_path: PathBuf::from(DEFAULT_DB_PATH),
        }
    }

    pub fn with_max_storage_bytes(mut self, bytes: u64) -> Self {
        self.max_storage_bytes = bytes;
        self
    }

    pub fn with_db_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.db_path = path.into();
        self
    }

    /// Load configuration from environment variables
    ///
    /// - MANUSCRIPT_REGISTRY_ADMIN: administrator identity (required)
    /// - MANUSCRIPT_REGISTRY_MAX_STORAGE: capacity ceiling in bytes
    /// - MANUSCRIPT_REGISTRY_DB_PATH: sled database directory
    pub fn from_env() -> anyhow::Result<Self> {
        let admin = env::var("MANUSCRIPT_REGISTRY_ADMIN")
            .context("MANUSCRIPT_REGISTRY_ADMIN must name the administrator")?;
        let mut config = Self::new(Principal::new(admin));

        if let Ok(raw) = env::var("MANUSCRIPT_REGISTRY_MAX_STORAGE") {
            config.max_storage_bytes = raw
                .parse()
                .with_context(|| format!("invalid MANUSCRIPT_REGISTRY_MAX_STORAGE: {raw}"))?;
        }
        if let Ok(path) = env::var("MANUSCRIPT_REGISTRY_DB_PATH") {
            config.db_path = PathBuf::from(path);
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.administrator.as_str().is_empty() {
            anyhow::bail!("administrator identity must not be empty");
        }
        if self.max_storage_bytes == 0 {
            anyhow::bail!("max_storage_bytes must be greater than zero");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = RegistryConfig::new(Principal::new("admin"));

        assert_eq!(config.max_storage_bytes, DEFAULT_MAX_STORAGE_BYTES);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn zero_capacity_is_rejected() {
        let config = RegistryConfig::new(Principal::new("admin")).with_max_storage_bytes(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn empty_administrator_is_rejected() {
        assert!(RegistryConfig::new(Principal::new("")).validate().is_err());
    }
}
