use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::time::{interval_at, sleep_until, Instant, Interval, MissedTickBehavior};
use tokio_tungstenite::{
    connect_async, tungstenite::protocol::Message, MaybeTlsStream, WebSocketStream,
};

/// Transport keepalive parameters expected by the venue. Not operator knobs.
pub const PING_INTERVAL: Duration = Duration::from_secs(20);
pub const PONG_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug)]
pub enum FeedError {
    Connect(String),
    Protocol(String),
    HeartbeatTimeout,
    Closed { code: u16, reason: String },
}

impl std::fmt::Display for FeedError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FeedError::Connect(msg) => write!(f, "Connection failed: {}", msg),
            FeedError::Protocol(msg) => write!(f, "Transport error: {}", msg),
            FeedError::HeartbeatTimeout => {
                write!(f, "Heartbeat timeout: no pong within {:?}", PONG_TIMEOUT)
            }
            FeedError::Closed { code, reason } => {
                write!(f, "Closed by venue: code={} reason={:?}", code, reason)
            }
        }
    }
}

impl std::error::Error for FeedError {}

#[derive(Debug, Clone)]
pub struct FeedConfig {
    pub url: String,
    pub ping_interval: Duration,
    pub pong_timeout: Duration,
}

impl FeedConfig {
    pub fn for_url(url: &str) -> Self {
        Self {
            url: url.to_string(),
            ping_interval: PING_INTERVAL,
            pong_timeout: PONG_TIMEOUT,
        }
    }
}

/// Owns the dial side of the feed transport. One `connect()` call yields one
/// live connection; the caller decides when to dial again.
pub struct FeedClient {
    config: FeedConfig,
}

impl FeedClient {
    pub fn new(config: FeedConfig) -> Self {
        Self { config }
    }

    pub async fn connect(&self) -> Result<FeedConnection, FeedError> {
        log::info!("🔌 Connecting to feed: {}", self.config.url);

        let (ws, response) = connect_async(self.config.url.as_str())
            .await
            .map_err(|e| FeedError::Connect(e.to_string()))?;

        log::info!("✅ Feed connected (status {})", response.status());

        let first_ping = Instant::now() + self.config.ping_interval;
        let mut ping_timer = interval_at(first_ping, self.config.ping_interval);
        ping_timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

        Ok(FeedConnection {
            ws,
            ping_timer,
            pong_deadline: None,
            pong_timeout: self.config.pong_timeout,
        })
    }
}

/// A live connection, consumed as a lazy sequence of text payloads.
pub struct FeedConnection {
    ws: WebSocketStream<MaybeTlsStream<TcpStream>>,
    ping_timer: Interval,
    pong_deadline: Option<Instant>,
    pong_timeout: Duration,
}

impl FeedConnection {
    /// Receive the next text payload. Returns `None` once the connection is
    /// finished for any reason; connection-level failures are logged here and
    /// never raised, so the caller's only recovery action is to dial again.
    pub async fn next_message(&mut self) -> Option<String> {
        match self.recv_text().await {
            Ok(Some(text)) => Some(text),
            Ok(None) => {
                log::warn!("Feed stream ended");
                None
            }
            Err(e) => {
                log::warn!("Feed connection finished: {}", e);
                None
            }
        }
    }

    async fn recv_text(&mut self) -> Result<Option<String>, FeedError> {
        loop {
            let pong_due = self
                .pong_deadline
                .unwrap_or_else(|| Instant::now() + Duration::from_secs(86_400));

            tokio::select! {
                frame = self.ws.next() => match frame {
                    Some(Ok(Message::Text(text))) => return Ok(Some(text)),
                    Some(Ok(Message::Pong(_))) => {
                        self.pong_deadline = None;
                    }
                    Some(Ok(Message::Ping(payload))) => {
                        self.ws
                            .send(Message::Pong(payload))
                            .await
                            .map_err(|e| FeedError::Protocol(e.to_string()))?;
                    }
                    Some(Ok(Message::Close(frame))) => {
                        return Err(match frame {
                            Some(f) => FeedError::Closed {
                                code: u16::from(f.code),
                                reason: f.reason.into_owned(),
                            },
                            None => FeedError::Closed {
                                code: 1005,
                                reason: String::new(),
                            },
                        });
                    }
                    Some(Ok(Message::Binary(payload))) => {
                        log::debug!("Ignoring binary frame ({} bytes)", payload.len());
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => return Err(FeedError::Protocol(e.to_string())),
                    None => return Ok(None),
                },
                _ = self.ping_timer.tick() => {
                    self.ws
                        .send(Message::Ping(Vec::new()))
                        .await
                        .map_err(|e| FeedError::Protocol(e.to_string()))?;
                    if self.pong_deadline.is_none() {
                        self.pong_deadline = Some(Instant::now() + self.pong_timeout);
                    }
                }
                _ = sleep_until(pong_due), if self.pong_deadline.is_some() => {
                    return Err(FeedError::HeartbeatTimeout);
                }
            }
        }
    }
}
