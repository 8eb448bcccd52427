mod registry;
mod relay;
mod ws_handler;

pub use registry::ConnectionRegistry;
pub use relay::SignalingRelay;
pub use ws_handler::ws_handler;
