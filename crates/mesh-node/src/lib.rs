//! Node wiring: the radio and reward-ledger boundaries (§6), the
//! node's action-pattern driver, and the CLI/runtime configuration
//! that assembles them into the `mesh-node` binary.
//!
//! Everything upstream of this crate (`mesh-proto` through
//! `mesh-secure`) is I/O-free. This crate is where that logic meets
//! real hardware and a real async runtime.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod config;
pub mod driver;
pub mod error;
pub mod radio;
pub mod reward;
pub mod udp_radio;
pub mod wire;

pub use config::{Args, NodeConfig};
pub use driver::{LogLevel, NodeAction, NodeDriver};
pub use error::{NodeError, RadioError};
pub use radio::{NodeTarget, RadioAdapter, ReceivedFrame};
pub use reward::{LoggingRewardSink, RewardSink};
pub use udp_radio::UdpRadioAdapter;
