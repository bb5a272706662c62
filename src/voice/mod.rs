//! Voice transport: connects to a guild's channel and streams a
//! [`FrameSource`](crate::audio::mix::FrameSource) at real-time pace.

pub mod constants;
pub mod pump;
pub mod transport;
pub mod udp_link;
pub mod udp_transport;

pub use pump::{FramePump, PacketSink, PumpOutcome};
pub use transport::{CompletionSignal, VoiceTransport};
pub use udp_link::RtpLink;
pub use udp_transport::UdpTransport;
