use crate::config::Config;
use std::sync::Arc;
use welli_access::{
    AccessControlEngine, AccessEvent, EventSink, Identity, InMemoryEventLog,
    InMemoryIdentityRegistry, InMemoryPermissionStore, InMemoryResourceRegistry, PermissionStore,
    TracingEventSink,
};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<AccessControlEngine>,
    pub audit: Arc<AuditLog>,
    pub identities: Arc<InMemoryIdentityRegistry>,
    pub resources: Arc<InMemoryResourceRegistry>,
}

/// Keeps every event for `GET /events` and mirrors it to the tracing log
#[derive(Default)]
pub struct AuditLog {
    log: InMemoryEventLog,
    tracing: TracingEventSink,
}

impl AuditLog {
    pub fn events(&self) -> Vec<AccessEvent> {
        self.log.events()
    }
}

impl EventSink for AuditLog {
    fn publish(&self, event: AccessEvent) {
        self.tracing.publish(event.clone());
        self.log.publish(event);
    }
}

fn parse_identity(field: &str, value: &str) -> anyhow::Result<Identity> {
    Identity::parse(value).ok_or_else(|| anyhow::anyhow!("{field}: invalid identity '{value}'"))
}

impl AppState {
    pub async fn new(config: &Config) -> anyhow::Result<Self> {
        // Build permission store
        // Never silently downgrade: an unavailable backend fails startup
        let store: Arc<dyn PermissionStore> = match config.storage.backend.as_str() {
            "memory" => Arc::new(InMemoryPermissionStore::new()),
            "sqlite" => open_sqlite(config)?,
            other => {
                anyhow::bail!(
                    "Unknown storage backend '{}'. Valid options: 'memory', 'sqlite'",
                    other
                );
            }
        };

        // Seed the in-memory registries
        let identities = Arc::new(InMemoryIdentityRegistry::new());
        for raw in &config.registry.identities {
            identities.register(parse_identity("registry.identities", raw)?)?;
        }

        let resources = Arc::new(InMemoryResourceRegistry::new());
        for seed in &config.registry.resources {
            let owner = parse_identity("registry.resources.owner", &seed.owner)?;
            resources.register(seed.cid.clone(), owner)?;
        }

        let administrator = match &config.administrator {
            Some(raw) => parse_identity("administrator", raw)?,
            None => Identity::ZERO,
        };

        tracing::info!(
            backend = %config.storage.backend,
            identities = config.registry.identities.len(),
            resources = resources.len(),
            "access control engine configured"
        );

        let audit = Arc::new(AuditLog::default());
        let engine = AccessControlEngine::builder(administrator, identities.clone(), resources.clone())
            .store(store)
            .events(audit.clone())
            .build();

        Ok(Self {
            engine: Arc::new(engine),
            audit,
            identities,
            resources,
        })
    }
}

#[cfg(feature = "sqlite")]
fn open_sqlite(config: &Config) -> anyhow::Result<Arc<dyn PermissionStore>> {
    let path = config
        .storage
        .sqlite_path
        .as_ref()
        .ok_or_else(|| anyhow::anyhow!("sqlite storage requires sqlite_path"))?;
    tracing::info!(path = %path, "opening sqlite permission store");
    Ok(Arc::new(welli_access::SqlitePermissionStore::open(path)?))
}

#[cfg(not(feature = "sqlite"))]
fn open_sqlite(_config: &Config) -> anyhow::Result<Arc<dyn PermissionStore>> {
    anyhow::bail!("FATAL: sqlite storage requested but the server was built without `--features sqlite`")
}
