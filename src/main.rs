pub mod collector_core;

use collector_core::config::CollectorConfig;
use collector_core::feed::{FeedClient, FeedConfig};
use collector_core::features::FeatureEngine;
use collector_core::simulator::TradeSimulator;
use collector_core::sink::{CsvBackend, EventSink};
use collector_core::supervisor::Supervisor;

#[tokio::main]
pub async fn main() {
    dotenv::dotenv().ok();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Stderr)
        .init();

    let config = match CollectorConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            log::error!("❌ Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };

    log::info!("🚀 Starting bookflow collector");
    log::info!("   Feed URL: {}", config.feed_url);
    log::info!("   Output: {}", config.output_path);
    log::info!("   Flush every: {} ticks", config.flush_every);
    log::info!("   Window capacity: {} mid-prices", config.window_capacity);
    log::info!("   Reconnect delay: {}s", config.reconnect_delay.as_secs());

    let backend = match CsvBackend::new(&config.output_path) {
        Ok(backend) => backend,
        Err(e) => {
            log::error!("❌ Cannot prepare output path {}: {}", config.output_path, e);
            std::process::exit(1);
        }
    };

    let feed = FeedClient::new(FeedConfig::for_url(&config.feed_url));
    let engine = FeatureEngine::new(config.window_capacity);
    let simulator = TradeSimulator::new();
    let sink = EventSink::new(Box::new(backend), config.flush_every);

    Supervisor::new(feed, engine, simulator, sink, config.reconnect_delay)
        .run()
        .await;
}
