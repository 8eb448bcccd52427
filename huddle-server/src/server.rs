use crate::config::ServerConfig;
use crate::mailbox::{CallMailbox, fetch_offer, submit_offer};
use crate::presence::{BackingSelector, PresenceBacking, PresenceStore, RedisBacking};
use crate::room::RoomService;
use crate::signaling::{ConnectionRegistry, SignalingRelay, ws_handler};
use anyhow::Result;
use axum::Router;
use axum::routing::{get, post};
use huddle_core::IceServerConfig;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<ConnectionRegistry>,
    pub rooms: Arc<RoomService>,
    pub relay: SignalingRelay,
    pub mailbox: Arc<CallMailbox>,
    pub ice_servers: Vec<IceServerConfig>,
}

impl AppState {
    pub fn new(store: PresenceStore, ice_servers: Vec<IceServerConfig>) -> Self {
        let registry = Arc::new(ConnectionRegistry::new());
        let rooms = Arc::new(RoomService::new(store, registry.clone()));
        let relay = SignalingRelay::new(registry.clone());

        Self {
            registry,
            rooms,
            relay,
            mailbox: Arc::new(CallMailbox::new()),
            ice_servers,
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/ws", get(ws_handler))
        .route("/api/submit-offer", post(submit_offer))
        .route("/api/fetch-offer", get(fetch_offer))
        .with_state(state)
}

pub async fn run(config: ServerConfig) -> Result<()> {
    let durable: Option<Arc<dyn PresenceBacking>> = match &config.redis_url {
        Some(url) => match RedisBacking::connect(url).await {
            Ok(backing) => {
                info!("Durable presence backing connected: {url}");
                Some(Arc::new(backing))
            }
            Err(e) => {
                // Same policy as a mid-flight fault: fall back to the local
                // backing and only retry on restart.
                warn!("Durable presence backing unavailable at startup ({e}); using local backing");
                None
            }
        },
        None => None,
    };

    let store = PresenceStore::new(durable, Arc::new(BackingSelector::new()));
    let state = AppState::new(store, config.ice_servers.clone());

    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;
    info!("Signaling server listening on {}", config.listen_addr);
    axum::serve(listener, router(state)).await?;
    Ok(())
}
