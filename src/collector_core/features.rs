use std::collections::VecDeque;

use chrono::Utc;

use crate::collector_core::parser::TopOfBook;

/// One market-data update with its derived features. Immutable once produced.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tick {
    pub timestamp: i64,
    pub best_bid: f64,
    pub best_ask: f64,
    pub spread: f64,
    pub mid_price: f64,
    pub order_size: f64,
    pub volatility: f64,
}

/// Fixed-capacity FIFO of the most recent mid-prices.
#[derive(Debug)]
pub struct MidPriceWindow {
    capacity: usize,
    prices: VecDeque<f64>,
}

impl MidPriceWindow {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            prices: VecDeque::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, mid_price: f64) {
        if self.prices.len() == self.capacity {
            self.prices.pop_front();
        }
        self.prices.push_back(mid_price);
    }

    pub fn len(&self) -> usize {
        self.prices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }

    /// Sample standard deviation (n-1 denominator) of the current contents.
    /// Fewer than two observations carry no dispersion and read 0.0.
    pub fn std_dev(&self) -> f64 {
        let n = self.prices.len();
        if n < 2 {
            return 0.0;
        }

        let mean = self.prices.iter().sum::<f64>() / n as f64;
        let variance = self
            .prices
            .iter()
            .map(|p| {
                let d = p - mean;
                d * d
            })
            .sum::<f64>()
            / (n as f64 - 1.0);

        variance.sqrt()
    }
}

/// Derives per-tick features and owns the rolling mid-price state. The window
/// lives for the whole process: it carries across reconnects and is only
/// reset by a restart.
pub struct FeatureEngine {
    window: MidPriceWindow,
}

impl FeatureEngine {
    pub fn new(window_capacity: usize) -> Self {
        Self {
            window: MidPriceWindow::new(window_capacity),
        }
    }

    pub fn observe(&mut self, top: &TopOfBook) -> Tick {
        // Spread stays negative on a crossed book.
        let spread = top.best_ask_price - top.best_bid_price;
        let mid_price = (top.best_ask_price + top.best_bid_price) / 2.0;

        self.window.push(mid_price);

        Tick {
            timestamp: Utc::now().timestamp(),
            best_bid: top.best_bid_price,
            best_ask: top.best_ask_price,
            spread,
            mid_price,
            // order_size follows the ask side for both simulated directions.
            order_size: top.best_ask_size,
            volatility: self.window.std_dev(),
        }
    }
}
