use std::time::{Duration, Instant};

use tokio::time::sleep;

use crate::collector_core::feed::{FeedClient, FeedConnection};
use crate::collector_core::features::FeatureEngine;
use crate::collector_core::parser::{self, ParseError};
use crate::collector_core::simulator::TradeSimulator;
use crate::collector_core::sink::EventSink;

const RATE_LOG_INTERVAL: Duration = Duration::from_secs(10);

/// Connection lifecycle states. There is no terminal state: the collector
/// runs until the operator stops the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupervisorState {
    Running,
    Backoff,
}

/// Owns the feed lifecycle and all pipeline state. The rolling window, the
/// simulator RNG and the event log live here so they survive reconnects.
pub struct Supervisor {
    feed: FeedClient,
    engine: FeatureEngine,
    simulator: TradeSimulator,
    sink: EventSink,
    reconnect_delay: Duration,
}

impl Supervisor {
    pub fn new(
        feed: FeedClient,
        engine: FeatureEngine,
        simulator: TradeSimulator,
        sink: EventSink,
        reconnect_delay: Duration,
    ) -> Self {
        Self {
            feed,
            engine,
            simulator,
            sink,
            reconnect_delay,
        }
    }

    /// Drive the collector forever: pump one connection until it finishes,
    /// wait out the fixed delay, dial again. The delay is constant and there
    /// is no retry cap.
    pub async fn run(mut self) {
        let mut state = SupervisorState::Running;

        loop {
            state = match state {
                SupervisorState::Running => {
                    match self.feed.connect().await {
                        Ok(conn) => self.pump(conn).await,
                        Err(e) => log::error!("❌ Feed connect failed: {}", e),
                    }
                    SupervisorState::Backoff
                }
                SupervisorState::Backoff => {
                    log::warn!("⏳ Reconnecting in {}s", self.reconnect_delay.as_secs());
                    sleep(self.reconnect_delay).await;
                    SupervisorState::Running
                }
            };
        }
    }

    /// Process messages until the connection finishes. A tick that fails to
    /// parse is skipped; the connection keeps going. Events are produced and
    /// appended strictly in arrival order.
    async fn pump(&mut self, mut conn: FeedConnection) {
        let mut tick_count = 0u64;
        let mut last_rate_log = Instant::now();

        while let Some(raw) = conn.next_message().await {
            match parser::parse(&raw) {
                Ok(top) => {
                    let tick = self.engine.observe(&top);
                    let event = self.simulator.simulate(tick, &top);
                    self.sink.append(event);
                    self.sink.maybe_flush().await;
                    tick_count += 1;
                }
                Err(ParseError::Empty) => {
                    log::debug!("Skipping snapshot with an empty book side");
                }
                Err(e) => {
                    log::warn!("Skipping unparseable snapshot: {}", e);
                }
            }

            if last_rate_log.elapsed() >= RATE_LOG_INTERVAL {
                let rate = tick_count as f64 / last_rate_log.elapsed().as_secs_f64();
                log::info!(
                    "📊 Ingestion rate: {:.1} ticks/sec (log total: {})",
                    rate,
                    self.sink.len()
                );
                tick_count = 0;
                last_rate_log = Instant::now();
            }
        }
    }
}
