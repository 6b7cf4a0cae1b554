use figment::{
    Figment,
    providers::{Env, Format, Toml},
};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,

    /// Identity allowed to replace the registries; unset disables that
    #[serde(default)]
    pub administrator: Option<String>,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub registry: RegistryConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    #[serde(default = "default_backend")]
    pub backend: String, // "memory", "sqlite"
    pub sqlite_path: Option<String>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            sqlite_path: None,
        }
    }
}

/// Seed data for the in-memory identity and resource registries
#[derive(Debug, Deserialize, Default, Clone)]
pub struct RegistryConfig {
    #[serde(default)]
    pub identities: Vec<String>,
    #[serde(default)]
    pub resources: Vec<ResourceSeed>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ResourceSeed {
    pub cid: String,
    pub owner: String,
}

fn default_host() -> String {
    "127.0.0.1".into()
}
fn default_port() -> u16 {
    7230
}
fn default_backend() -> String {
    "memory".into()
}

impl Config {
    /// Layered sources: `welli-access-server.toml`, then `WELLI_*` env vars
    pub fn figment() -> Figment {
        Figment::new()
            .merge(Toml::file("welli-access-server.toml"))
            .merge(Env::prefixed("WELLI_").split("__"))
    }

    pub fn load() -> anyhow::Result<Self> {
        let config: Config = Self::figment().extract()?;
        Ok(config)
    }
}
