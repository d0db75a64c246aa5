//! UDP-broadcast [`RadioAdapter`], used when the binary is run without
//! a real radio module attached.
//!
//! Physical mesh radios are a shared broadcast medium: every frame is
//! heard by every node in range regardless of its addressed
//! destination, and addressing/filtering happens at the protocol
//! layer (`mesh-net`'s TTL and destination checks), not at the radio.
//! This adapter models that faithfully over a UDP socket bound to
//! `SO_BROADCAST`: `transmit` always sends to the configured broadcast
//! address, ignoring `target` — it is metadata for a future adapter
//! with real directed transmission, not something this one can honor.
//!
//! There is no signal strength over UDP, so `rssi`/`snr` are reported
//! as fixed placeholder values; a node should not make admission
//! decisions on them unless a real adapter is wired in.

use std::net::SocketAddr;

use tokio::net::UdpSocket;

use crate::error::RadioError;
use crate::radio::{NodeTarget, RadioAdapter, ReceivedFrame};

/// Placeholder RSSI reported by [`UdpRadioAdapter`], in dBm.
pub const PLACEHOLDER_RSSI: i32 = 0;
/// Placeholder SNR reported by [`UdpRadioAdapter`], in dB.
pub const PLACEHOLDER_SNR: f32 = 0.0;

/// A [`RadioAdapter`] backed by a UDP broadcast socket.
pub struct UdpRadioAdapter {
    socket: UdpSocket,
    broadcast_addr: SocketAddr,
}

impl UdpRadioAdapter {
    /// Bind a socket at `bind_addr` and prepare to broadcast to
    /// `broadcast_addr`.
    ///
    /// # Errors
    ///
    /// Returns [`RadioError::TransmitFailed`] if the socket cannot be
    /// bound or configured for broadcast.
    pub async fn bind(bind_addr: SocketAddr, broadcast_addr: SocketAddr) -> Result<Self, RadioError> {
        let socket = UdpSocket::bind(bind_addr).await.map_err(|e| RadioError::TransmitFailed(e.to_string()))?;
        socket.set_broadcast(true).map_err(|e| RadioError::TransmitFailed(e.to_string()))?;
        Ok(Self { socket, broadcast_addr })
    }
}

impl RadioAdapter for UdpRadioAdapter {
    async fn transmit(&self, frame_bytes: Vec<u8>, _target: NodeTarget) -> Result<(), RadioError> {
        self.socket
            .send_to(&frame_bytes, self.broadcast_addr)
            .await
            .map(|_| ())
            .map_err(|e| RadioError::TransmitFailed(e.to_string()))
    }

    async fn receive(&self) -> Result<ReceivedFrame, RadioError> {
        let mut buf = vec![0u8; mesh_proto::MAX_FRAME_SIZE];
        let (len, _from) = self.socket.recv_from(&mut buf).await.map_err(|e| RadioError::ReceiveFailed(e.to_string()))?;
        buf.truncate(len);
        Ok(ReceivedFrame { bytes: buf, rssi: PLACEHOLDER_RSSI, snr: PLACEHOLDER_SNR })
    }
}
