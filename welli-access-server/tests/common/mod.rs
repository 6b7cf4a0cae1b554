use std::net::SocketAddr;
use tokio::net::TcpListener;
use welli_access::Identity;
use welli_access_server::config::{Config, RegistryConfig, ResourceSeed, StorageConfig};
use welli_access_server::state::AppState;

pub struct TestServer {
    pub url: String,
    #[allow(dead_code)]
    pub addr: SocketAddr,
    #[allow(dead_code)]
    pub state: AppState,
}

pub fn patient() -> Identity {
    Identity::from_bytes([1; 20])
}

pub fn requester() -> Identity {
    Identity::from_bytes([2; 20])
}

#[allow(dead_code)]
pub fn admin() -> Identity {
    Identity::from_bytes([9; 20])
}

impl TestServer {
    pub async fn start() -> Self {
        Self::start_with(StorageConfig::default()).await
    }

    pub async fn start_with(storage: StorageConfig) -> Self {
        let config = Config {
            host: "127.0.0.1".into(),
            port: 0, // OS assigns port
            administrator: Some(admin().to_hex()),
            storage,
            registry: RegistryConfig {
                identities: vec![patient().to_hex()],
                resources: ["cidA", "cidB"]
                    .into_iter()
                    .map(|cid| ResourceSeed {
                        cid: cid.into(),
                        owner: patient().to_hex(),
                    })
                    .collect(),
            },
        };

        let state = AppState::new(&config).await.unwrap();
        let app = welli_access_server::routes::router(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        // Give server a moment to start
        tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;

        Self {
            url: format!("http://{addr}"),
            addr,
            state,
        }
    }
}

pub fn now() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_secs()
}
