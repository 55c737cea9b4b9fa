use manuscript_registry::{
    ChainHeight, ManuscriptDraft, Principal, RegistryConfig, RegistryService,
};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

const DEMO_DB_PATH: &str = "sled";

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = match RegistryConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            tracing::warn!(error = %err, "no registry configuration in the environment, using a generated administrator");
            RegistryConfig::new(Principal::generate("admin_")?)
        }
    };

    // scratch database only; never the configured db_path, which may hold a live registry
    let db = Arc::new(sled::open(DEMO_DB_PATH)?);
    if !db.is_empty() {
        db.clear()?;
    }

    let heights = Arc::new(ChainHeight::new(100));
    let registry = RegistryService::open(db, &config, heights.clone())?;

    let alice = Principal::generate("user_")?;
    let bob = Principal::generate("user_")?;

    let draft = ManuscriptDraft::new()
        .set_title("Codex Gigas")
        .set_synopsis("Thirteenth century Bohemian compendium")
        .set_storage_size(75_000_000)
        .add_tag("vellum");
    let record = registry.register_manuscript(&alice, draft)?;

    heights.advance_by(50)?;
    registry.grant_view(&alice, record.id, &bob)?;
    registry.transfer_custodianship(&alice, record.id, &bob)?;

    println!("{:#?}", registry.get_analytics(&bob, record.id)?);
    println!("{:#?}", registry.verify_authenticity(&bob, record.id, &alice)?);
    for entry in registry.provenance(registry.administrator(), record.id)? {
        println!("{:>4} @{} {:?}", entry.sequence, entry.height, entry.action);
    }

    Ok(())
}
