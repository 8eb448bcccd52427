mod backing;
mod memory;
mod redis;
mod selector;
mod store;

pub use backing::{PresenceBacking, StoreError};
pub use memory::MemoryBacking;
pub use self::redis::RedisBacking;
pub use selector::BackingSelector;
pub use store::PresenceStore;
