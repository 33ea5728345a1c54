pub mod config;
pub mod feed;
pub mod features;
pub mod parser;
pub mod simulator;
pub mod sink;
pub mod supervisor;

pub use config::CollectorConfig;
pub use feed::{FeedClient, FeedConfig};
pub use features::{FeatureEngine, Tick};
pub use parser::TopOfBook;
pub use simulator::{Side, TradeEvent, TradeSimulator};
pub use sink::{CsvBackend, EventSink};
pub use supervisor::Supervisor;
