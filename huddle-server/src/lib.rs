pub mod config;
pub mod error;
pub mod mailbox;
pub mod presence;
pub mod room;
pub mod server;
pub mod signaling;

pub use config::ServerConfig;
pub use error::ServerError;
pub use mailbox::CallMailbox;
pub use presence::{
    BackingSelector, MemoryBacking, PresenceBacking, PresenceStore, RedisBacking, StoreError,
};
pub use room::RoomService;
pub use server::{AppState, router, run};
pub use signaling::{ConnectionRegistry, SignalingRelay};
