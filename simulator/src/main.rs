mod telemetry;

use anyhow::Result;
use clap::Parser;
use rand::Rng;
use std::time::{Duration, Instant};
use telemetry::{IngestorClient, Sample};
use tracing::{error, info, warn};

#[derive(Debug, Parser)]
#[command(about = "Registers devices and streams random readings to the ingestor")]
struct Args {
    /// Base URL of the ingestor
    #[arg(long, env = "INGESTOR_URL", default_value = "http://localhost:8080")]
    url: String,

    /// Number of simulated devices
    #[arg(long, env = "DEVICES", default_value_t = 10)]
    devices: usize,

    /// Readings per second across all devices
    #[arg(long, env = "RATE", default_value_t = 100)]
    rate: u64,

    /// Stop after this many seconds (0 runs until interrupted)
    #[arg(long, env = "DURATION_SECS", default_value_t = 0)]
    duration_secs: u64,
}

const BURST_SIZE: u64 = 10;
const ANALYTICS_EVERY_BURSTS: u64 = 100;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    tracing_subscriber::fmt::init();

    info!("Starting telemetry simulator");
    info!(
        "Ingestor: {}, Rate: {} readings/s, Devices: {}",
        args.url, args.rate, args.devices
    );

    let client = IngestorClient::new(&args.url);
    let run_id: u32 = rand::thread_rng().gen();

    let mut devices = Vec::with_capacity(args.devices);
    for i in 0..args.devices {
        let device = client.register(&format!("sim-{}-{}", run_id, i)).await?;
        info!("Registered {} as id {}", device.name, device.id);
        devices.push(device);
    }
    if devices.is_empty() {
        warn!("No devices to simulate");
        return Ok(());
    }

    let burst_interval = Duration::from_millis((BURST_SIZE * 1000) / args.rate.max(1));
    let deadline = (args.duration_secs > 0)
        .then(|| Instant::now() + Duration::from_secs(args.duration_secs));
    info!(
        "Posting in bursts of {} readings every {:?}",
        BURST_SIZE, burst_interval
    );

    let mut counter = 0u64;
    let mut bursts = 0u64;
    loop {
        let burst_start = Instant::now();
        bursts += 1;

        for slot in 0..BURST_SIZE {
            let device = &devices[device_index(bursts, slot, devices.len())];
            let sample = Sample::random(&mut rand::thread_rng());

            match client.post_sample(device.id, sample).await {
                Ok(()) => counter += 1,
                Err(e) => warn!("Failed to post reading for {}: {}", device.name, e),
            }
        }

        if analytics_due(bursts) {
            info!("Posted {} readings", counter);
            match client.analytics(devices[0].id).await {
                Ok(stats) => info!("Analytics for {}: {}", devices[0].name, stats),
                Err(e) => error!("Analytics request failed: {}", e),
            }
        }

        if deadline.is_some_and(|d| Instant::now() >= d) {
            info!("Duration elapsed after {} readings", counter);
            return Ok(());
        }

        let elapsed = burst_start.elapsed();
        if elapsed < burst_interval {
            tokio::time::sleep(burst_interval - elapsed).await;
        } else if elapsed > burst_interval * 2 {
            warn!(
                "Burst took {:?}, target was {:?} - ingestor may be overloaded",
                elapsed, burst_interval
            );
        }
    }
}

/// Round-robin over devices by post attempt, so failed posts still rotate.
fn device_index(bursts: u64, slot: u64, devices: usize) -> usize {
    (((bursts - 1) * BURST_SIZE + slot) % devices as u64) as usize
}

/// Analytics are logged on a fixed burst cadence, independent of how many
/// posts succeeded.
fn analytics_due(bursts: u64) -> bool {
    bursts > 0 && bursts % ANALYTICS_EVERY_BURSTS == 0
}
