use serde::Deserialize;
use serde_json::Value;

/// Best bid/ask view of one inbound snapshot. A crossed book (bid above ask)
/// is valid input and passes through untouched.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TopOfBook {
    pub best_bid_price: f64,
    pub best_bid_size: f64,
    pub best_ask_price: f64,
    pub best_ask_size: f64,
}

#[derive(Debug)]
pub enum ParseError {
    /// One side of the book is absent or empty. Frequent during book resets;
    /// the tick is skipped, the connection stays up.
    Empty,
    Malformed(String),
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParseError::Empty => write!(f, "order book side absent or empty"),
            ParseError::Malformed(msg) => write!(f, "malformed snapshot: {}", msg),
        }
    }
}

impl std::error::Error for ParseError {}

#[derive(Deserialize)]
struct RawSnapshot {
    #[serde(default)]
    asks: Vec<Vec<Value>>,
    #[serde(default)]
    bids: Vec<Vec<Value>>,
}

/// Decode a raw feed payload into its top-of-book view.
///
/// `asks` and `bids` are ordered best level first; only the top level is
/// consumed. Venues encode price/size cells as strings or as bare numbers,
/// so both forms are accepted. Fields other than `asks`/`bids` are ignored.
pub fn parse(raw: &str) -> Result<TopOfBook, ParseError> {
    let snapshot: RawSnapshot =
        serde_json::from_str(raw).map_err(|e| ParseError::Malformed(e.to_string()))?;

    let best_ask = snapshot.asks.first().ok_or(ParseError::Empty)?;
    let best_bid = snapshot.bids.first().ok_or(ParseError::Empty)?;

    Ok(TopOfBook {
        best_bid_price: level_field(best_bid, 0)?,
        best_bid_size: level_field(best_bid, 1)?,
        best_ask_price: level_field(best_ask, 0)?,
        best_ask_size: level_field(best_ask, 1)?,
    })
}

fn level_field(level: &[Value], index: usize) -> Result<f64, ParseError> {
    let cell = level
        .get(index)
        .ok_or_else(|| ParseError::Malformed(format!("level has no field {}", index)))?;

    match cell {
        Value::Number(n) => n
            .as_f64()
            .ok_or_else(|| ParseError::Malformed(format!("non-finite number: {}", n))),
        Value::String(s) => s
            .parse::<f64>()
            .map_err(|e| ParseError::Malformed(format!("bad number {:?}: {}", s, e))),
        other => Err(ParseError::Malformed(format!(
            "unexpected cell type: {}",
            other
        ))),
    }
}
