//! Shared data model for the meshcore node.
//!
//! This crate owns the types that cross component boundaries (§3):
//! node identity, routing table entries, pending
//! discovery state, rate-limiter windows, retransmit bookkeeping,
//! session contexts, and bandwidth counters. It also owns the
//! [`env::Environment`] abstraction that decouples protocol logic from
//! wall-clock time and system randomness, and the shared error
//! taxonomy (§7).
//!
//! Behavior over this data (rate-limiter admission, route discovery,
//! retransmission scheduling) lives in `mesh-net`; this crate is data
//! only, plus the small amount of per-type bookkeeping logic (e.g.
//! [`bandwidth::BandwidthCounters::record_peer_served`]) that has no
//! sensible home anywhere else.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod bandwidth;
pub mod discovery;
pub mod env;
pub mod error;
pub mod identity;
pub mod rate;
pub mod retransmit;
pub mod route;
pub mod session;

pub use bandwidth::BandwidthCounters;
pub use discovery::PendingDiscovery;
pub use env::Environment;
pub use error::MeshError;
pub use identity::NodeIdentity;
pub use rate::RateWindow;
pub use retransmit::RetransmitEntry;
pub use route::{RouteEntry, SeenDiscoverySet};
pub use session::SessionContext;
