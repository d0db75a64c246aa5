//! Mesh node binary.
//!
//! # Usage
//!
//! ```bash
//! mesh-node --node-id node-a --radio 0.0.0.0:9000
//! ```
//!
//! Runs one receive task, one periodic beacon task, one periodic
//! retransmit task, and one periodic discovery-timeout task (§5), all
//! driving a single shared [`mesh_node::NodeDriver`]. No task ever
//! holds the driver's lock across a radio transmit.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use mesh_core::env::SystemEnv;
use mesh_core::{Environment, NodeIdentity};
use mesh_node::{Args, LogLevel, LoggingRewardSink, NodeAction, NodeConfig, NodeDriver, RadioAdapter, RewardSink, UdpRadioAdapter};
use tokio::sync::Mutex;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Beacon broadcast cadence, matching `mesh_net::router::BEACON_INTERVAL`.
const BEACON_INTERVAL: Duration = Duration::from_secs(60);
/// Retransmit-table scan cadence, well under the retry timeout so due
/// entries aren't held past their deadline.
const RETRANSMIT_SCAN_INTERVAL: Duration = Duration::from_millis(500);
/// Discovery-timeout scan cadence, well under `DISCOVERY_TIMEOUT`.
const DISCOVERY_SCAN_INTERVAL: Duration = Duration::from_secs(1);

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));
    tracing_subscriber::registry().with(fmt::layer()).with(filter).init();

    tracing::info!(node_id = %args.node_id, "mesh node starting");

    let env = SystemEnv::new();
    let static_secret = env.random_32();
    let identity = NodeIdentity::new(args.node_id.clone(), static_secret);
    let config = NodeConfig::from(&args);
    let driver = Arc::new(Mutex::new(NodeDriver::new(identity, env, config)));

    let bind_addr: SocketAddr = args.radio.parse().map_err(|e| format!("invalid --radio address {}: {e}", args.radio))?;
    let broadcast_addr: SocketAddr = "255.255.255.255:9000".parse().expect("literal broadcast address always parses");
    let radio = Arc::new(UdpRadioAdapter::bind(bind_addr, broadcast_addr).await?);
    let reward_sink = Arc::new(LoggingRewardSink);

    tracing::info!(bind = %bind_addr, "radio bound");

    let receive_task = tokio::spawn(receive_loop(driver.clone(), radio.clone(), reward_sink.clone()));
    let beacon_task = tokio::spawn(periodic(driver.clone(), radio.clone(), reward_sink.clone(), BEACON_INTERVAL, |d| d.beacon(&[])));
    let retransmit_task =
        tokio::spawn(periodic(driver.clone(), radio.clone(), reward_sink.clone(), RETRANSMIT_SCAN_INTERVAL, NodeDriver::retransmit_due));
    let discovery_task = tokio::spawn(periodic(
        driver.clone(),
        radio.clone(),
        reward_sink.clone(),
        DISCOVERY_SCAN_INTERVAL,
        NodeDriver::check_discovery_timeouts,
    ));

    tokio::select! {
        result = receive_task => result?,
        result = beacon_task => result?,
        result = retransmit_task => result?,
        result = discovery_task => result?,
    }

    Ok(())
}

async fn receive_loop<R: RadioAdapter, S: RewardSink>(driver: Arc<Mutex<NodeDriver<SystemEnv>>>, radio: Arc<R>, reward_sink: Arc<S>) {
    loop {
        match radio.receive().await {
            Ok(frame) => {
                let actions = { driver.lock().await.handle_received_frame(frame.bytes) };
                execute_actions(actions, &radio, &reward_sink).await;
            },
            Err(e) => tracing::warn!(error = %e, "radio receive failed"),
        }
    }
}

async fn periodic<R, S, F>(driver: Arc<Mutex<NodeDriver<SystemEnv>>>, radio: Arc<R>, reward_sink: Arc<S>, interval: Duration, mut run: F)
where
    R: RadioAdapter,
    S: RewardSink,
    F: FnMut(&mut NodeDriver<SystemEnv>) -> Vec<NodeAction>,
{
    let mut ticker = tokio::time::interval(interval);
    loop {
        ticker.tick().await;
        let actions = { run(&mut *driver.lock().await) };
        execute_actions(actions, &radio, &reward_sink).await;
    }
}

async fn execute_actions<R: RadioAdapter, S: RewardSink>(actions: Vec<NodeAction>, radio: &R, reward_sink: &S) {
    for action in actions {
        match action {
            NodeAction::Transmit { bytes, target } => {
                if let Err(e) = radio.transmit(bytes, target).await {
                    tracing::warn!(error = %e, "radio transmit failed");
                }
            },
            NodeAction::DiscoveryResolved { dest, waiters } => {
                tracing::info!(dest = %dest, waiter_count = waiters.len(), "route discovered");
            },
            NodeAction::DiscoveryFailed { dest, waiters } => {
                tracing::warn!(dest = %dest, waiter_count = waiters.len(), "route discovery timed out");
            },
            NodeAction::DataDelivered { sender, kind_tag, payload } => {
                tracing::info!(sender = %sender, kind_tag = %kind_tag, bytes = payload.len(), "application payload delivered");
            },
            NodeAction::VerifiedClaimReady(claim) => {
                reward_sink.emit_verified_claim(claim).await;
            },
            NodeAction::Log { level, message } => match level {
                LogLevel::Debug => tracing::debug!("{message}"),
                LogLevel::Info => tracing::info!("{message}"),
                LogLevel::Warn => tracing::warn!("{message}"),
                LogLevel::Error => tracing::error!("{message}"),
            },
        }
    }
}
