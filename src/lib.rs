pub mod access;
pub mod analytics;
pub mod config;
pub mod error;
pub mod height;
pub mod identity;
pub mod ledger;
pub mod manuscript;
pub mod policy;
pub mod provenance;
pub mod records;
pub mod service;

pub use config::RegistryConfig;
pub use error::{RegistryError, ValidationError};
pub use height::{ChainHeight, HeightSource};
pub use identity::Principal;
pub use manuscript::{Manuscript, ManuscriptDraft, ManuscriptId};
pub use service::RegistryService;
