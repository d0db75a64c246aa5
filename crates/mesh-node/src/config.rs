//! CLI arguments and the runtime configuration they produce, mirroring
//! the split between the server binary's `Args` and its
//! `ServerRuntimeConfig`.

use clap::Parser;

/// Mesh node binary.
#[derive(Parser, Debug)]
#[command(name = "mesh-node")]
#[command(about = "Mesh networking node: routing, secure messaging, and reward proofs")]
#[command(version)]
pub struct Args {
    /// This node's textual id, truncated/null-padded to 16 bytes on
    /// the wire.
    #[arg(long)]
    pub node_id: String,

    /// UDP address this node's [`crate::udp_radio::UdpRadioAdapter`]
    /// binds to; a real radio deployment would swap this for a device
    /// path interpreted by a hardware-specific adapter.
    #[arg(long, default_value = "0.0.0.0:9000")]
    pub radio: String,

    /// This node's approximate latitude, carried in beacons and route
    /// replies for proximity scoring.
    #[arg(long, default_value_t = 0.0)]
    pub lat: f64,

    /// This node's approximate longitude.
    #[arg(long, default_value_t = 0.0)]
    pub lon: f64,

    /// Minimum bytes served required for an incoming bandwidth proof
    /// to be considered valid.
    #[arg(long, default_value = "1000")]
    pub min_bandwidth_bytes: u64,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

/// Runtime configuration for [`crate::driver::NodeDriver`], derived
/// from [`Args`] plus defaults not worth exposing on the command line.
#[derive(Debug, Clone)]
pub struct NodeConfig {
    /// This node's approximate latitude.
    pub self_lat: f64,
    /// This node's approximate longitude.
    pub self_lon: f64,
    /// Bandwidth declared in this node's own beacons.
    pub declared_bandwidth: u64,
    /// Uptime percentage declared in this node's own beacons.
    pub declared_uptime: f64,
    /// Minimum bytes served for an incoming bandwidth proof to pass.
    pub min_bandwidth_bytes: u64,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self { self_lat: 0.0, self_lon: 0.0, declared_bandwidth: 0, declared_uptime: 100.0, min_bandwidth_bytes: 0 }
    }
}

impl From<&Args> for NodeConfig {
    fn from(args: &Args) -> Self {
        Self { self_lat: args.lat, self_lon: args.lon, min_bandwidth_bytes: args.min_bandwidth_bytes, ..Self::default() }
    }
}
