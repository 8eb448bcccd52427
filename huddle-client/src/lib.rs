pub mod error;
pub mod link;
pub mod orchestrator;
pub mod rtc;
pub mod transport;

pub use error::ClientError;
pub use link::{LinkState, NegotiationRole, PeerLink};
pub use orchestrator::{PeerConnectionOrchestrator, PeerEvent};
pub use rtc::{RtcTransport, RtcTransportFactory};
pub use transport::{MediaTrack, PeerTransport, TransportEvent, TransportFactory};
