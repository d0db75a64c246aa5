//! Rate limiting, retransmission, and the mesh routing engine (§4.2, §4.3).
//!
//! This crate owns the behavior that sits above `mesh-proto`'s wire
//! framing and `mesh-core`'s shared data model: per-key admission
//! control, in-flight retransmission bookkeeping, the one-hop neighbor
//! table built from beacons, and the AODV-style on-demand routing
//! engine that discovers, maintains, and tears down multi-hop routes.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod error;
pub mod neighbor;
pub mod rate_limiter;
pub mod retransmit_manager;
pub mod router;
pub mod wire;

pub use error::RouterError;
pub use neighbor::{NeighborRecord, NeighborTable};
pub use rate_limiter::RateLimiter;
pub use retransmit_manager::RetransmitManager;
pub use router::{MeshRouter, RouterAction};
