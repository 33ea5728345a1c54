use std::env;
use std::time::Duration;

pub const DEFAULT_FEED_URL: &str =
    "wss://ws.gomarket-cpp.goquant.io/ws/l2-orderbook/okx/BTC-USDT-SWAP";
pub const DEFAULT_OUTPUT_PATH: &str = "realtime_orderbook.csv";
pub const DEFAULT_FLUSH_EVERY: usize = 500;
pub const DEFAULT_WINDOW_CAPACITY: usize = 20;
pub const DEFAULT_RECONNECT_DELAY_SECS: u64 = 5;

#[derive(Debug)]
pub enum ConfigError {
    InvalidValue(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::InvalidValue(msg) => write!(f, "Invalid configuration value: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

#[derive(Debug, Clone)]
pub struct CollectorConfig {
    pub feed_url: String,
    pub output_path: String,
    pub flush_every: usize,
    pub window_capacity: usize,
    pub reconnect_delay: Duration,
}

impl CollectorConfig {
    /// Read configuration from the environment. Every variable has a default,
    /// so an empty environment yields a working collector pointed at the
    /// public swap feed.
    pub fn from_env() -> Result<Self, ConfigError> {
        let feed_url = env::var("FEED_URL").unwrap_or_else(|_| DEFAULT_FEED_URL.to_string());
        let output_path =
            env::var("OUTPUT_PATH").unwrap_or_else(|_| DEFAULT_OUTPUT_PATH.to_string());
        let flush_every = parse_var("FLUSH_EVERY", DEFAULT_FLUSH_EVERY)?;
        let window_capacity = parse_var("WINDOW_CAPACITY", DEFAULT_WINDOW_CAPACITY)?;
        let reconnect_delay_secs =
            parse_var("RECONNECT_DELAY_SECS", DEFAULT_RECONNECT_DELAY_SECS)?;

        let config = Self {
            feed_url,
            output_path,
            flush_every,
            window_capacity,
            reconnect_delay: Duration::from_secs(reconnect_delay_secs),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.feed_url.starts_with("ws://") && !self.feed_url.starts_with("wss://") {
            return Err(ConfigError::InvalidValue(
                "FEED_URL must start with ws:// or wss://".to_string(),
            ));
        }

        if self.output_path.is_empty() {
            return Err(ConfigError::InvalidValue(
                "OUTPUT_PATH cannot be empty".to_string(),
            ));
        }

        if self.flush_every == 0 {
            return Err(ConfigError::InvalidValue(
                "FLUSH_EVERY must be at least 1".to_string(),
            ));
        }

        if self.window_capacity == 0 {
            return Err(ConfigError::InvalidValue(
                "WINDOW_CAPACITY must be at least 1".to_string(),
            ));
        }

        if self.reconnect_delay.is_zero() {
            return Err(ConfigError::InvalidValue(
                "RECONNECT_DELAY_SECS must be at least 1".to_string(),
            ));
        }

        Ok(())
    }
}

fn parse_var<T: std::str::FromStr>(name: &str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw.parse::<T>().map_err(|_| {
            ConfigError::InvalidValue(format!("{} must be a positive integer, got {:?}", name, raw))
        }),
        Err(_) => Ok(default),
    }
}
