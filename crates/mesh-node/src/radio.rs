//! The radio boundary (§6): the one I/O surface `NodeDriver` never
//! touches directly. A concrete adapter (LoRa module, SDR, or a
//! simulated link for tests) implements [`RadioAdapter`]; the binary
//! wires it to the driver's action loop in `main`.

use std::future::Future;

use crate::error::RadioError;

/// Where an outgoing frame should go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeTarget {
    /// A specific peer, by its textual node id.
    Peer(String),
    /// Every neighbor in radio range.
    Broadcast,
}

/// A frame pulled off the radio, with the link-layer quality metrics
/// §6 asks for alongside the bytes.
#[derive(Debug, Clone, PartialEq)]
pub struct ReceivedFrame {
    /// The raw encoded frame.
    pub bytes: Vec<u8>,
    /// Received signal strength, in dBm.
    pub rssi: i32,
    /// Signal-to-noise ratio, in dB.
    pub snr: f32,
}

/// External radio boundary (§6).
///
/// `transmit` may fail; failures are not retried here — retransmission
/// is `mesh-net`'s concern, driven by ack timeouts, not by transport
/// hiccups. `receive` yields arriving frames as they come in; a
/// concrete adapter typically backs this with a blocking read on a
/// background thread or a hardware interrupt queue, bridged into an
/// async channel.
pub trait RadioAdapter: Send + Sync + 'static {
    /// Hand an encoded frame to the radio for transmission toward
    /// `target`.
    fn transmit(&self, frame_bytes: Vec<u8>, target: NodeTarget) -> impl Future<Output = Result<(), RadioError>> + Send;

    /// Block until a frame arrives, or the adapter fails.
    fn receive(&self) -> impl Future<Output = Result<ReceivedFrame, RadioError>> + Send;
}
