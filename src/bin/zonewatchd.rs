//! zonewatchd - zone-intrusion monitoring daemon
//!
//! Wires the pieces together:
//! 1. Loads startup configuration (JSON file + env overrides + flags)
//! 2. Builds the shared ConfigStore and LatestFrameState containers
//! 3. Spawns the capture supervisor on its own worker thread
//! 4. Spawns the HTTP API (MJPEG stream, status, configuration)
//! 5. Logs pipeline health periodically until Ctrl-C

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use zonewatch::api::{ApiConfig, ApiServer};
use zonewatch::{
    CaptureSupervisor, ConfigStore, LatestFrameState, RtspOpener, StreamUrls, TierRegistry,
    ZonewatchConfig,
};

#[derive(Debug, Parser)]
#[command(name = "zonewatchd", about = "Zone-intrusion monitoring daemon")]
struct Args {
    /// Path to a JSON config file (overrides ZONEWATCH_CONFIG).
    #[arg(long, env = "ZONEWATCH_CONFIG")]
    config: Option<PathBuf>,

    /// Listen address for the HTTP API (overrides the config file).
    #[arg(long)]
    addr: Option<String>,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let mut cfg = ZonewatchConfig::load_from(args.config.as_deref())?;
    if let Some(addr) = args.addr {
        cfg.api_addr = addr;
    }

    let config = Arc::new(ConfigStore::new(cfg.initial_stream_config()));
    let latest = Arc::new(LatestFrameState::new());
    let registry = Arc::new(TierRegistry::with_synthetic_tiers());

    let shutdown = Arc::new(AtomicBool::new(false));
    {
        let shutdown = shutdown.clone();
        ctrlc::set_handler(move || {
            log::info!("shutdown requested");
            shutdown.store(true, Ordering::SeqCst);
        })?;
    }

    let supervisor = CaptureSupervisor::new(
        Box::new(RtspOpener),
        StreamUrls {
            main: cfg.stream_main.clone(),
            sub: cfg.stream_sub.clone(),
        },
        registry.clone(),
        config.clone(),
        latest.clone(),
    );
    let worker = supervisor.spawn(shutdown.clone());

    let api = ApiServer::new(
        ApiConfig {
            addr: cfg.api_addr.clone(),
        },
        config.clone(),
        latest.clone(),
    )
    .spawn(shutdown.clone())?;
    log::info!("api listening on {}", api.addr);
    log::info!(
        "streams: main={} sub={} tiers={:?}",
        cfg.stream_main,
        cfg.stream_sub,
        registry.tiers()
    );

    let mut last_health_log = Instant::now();
    while !shutdown.load(Ordering::SeqCst) {
        if last_health_log.elapsed() >= cfg.health_log_interval {
            let snapshot = config.snapshot();
            match latest.read() {
                Some(result) => log::info!(
                    "health stream={} model={} output={}x{} people={} intruders={} alert={}",
                    snapshot.stream.as_str(),
                    snapshot.tier.as_str(),
                    snapshot.width,
                    snapshot.height,
                    result.people_count,
                    result.intruder_count,
                    result.alert
                ),
                None => log::info!(
                    "health stream={} waiting for first frame",
                    snapshot.stream.as_str()
                ),
            }
            last_health_log = Instant::now();
        }
        std::thread::sleep(Duration::from_millis(200));
    }

    let _ = worker.join();
    api.stop()?;
    log::info!("zonewatchd stopped");
    Ok(())
}
