use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::collector_core::features::Tick;
use crate::collector_core::parser::TopOfBook;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Buy => "buy",
            Side::Sell => "sell",
        }
    }
}

/// One synthesized trade against a top-of-book. The unit of record handed to
/// the sink; immutable once created.
#[derive(Debug, Clone, Copy)]
pub struct TradeEvent {
    pub tick: Tick,
    pub sim_price: f64,
    pub side: Side,
    pub is_taker: bool,
}

/// A taker order crosses the opposing best level; anything priced inside
/// rests on the book as a maker.
pub fn is_taker_order(side: Side, order_price: f64, best_bid: f64, best_ask: f64) -> bool {
    match side {
        Side::Buy => order_price >= best_ask,
        Side::Sell => order_price <= best_bid,
    }
}

/// Labels each tick with a counterfactual trade for downstream supervised
/// training. The RNG is the only shared state.
pub struct TradeSimulator {
    rng: StdRng,
}

impl TradeSimulator {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Pretend a trade happened at this tick: a uniformly random side, priced
    /// within half a quote unit of that side's best level, classified by the
    /// deterministic crossing rule.
    pub fn simulate(&mut self, tick: Tick, top: &TopOfBook) -> TradeEvent {
        let side = if self.rng.gen_bool(0.5) {
            Side::Buy
        } else {
            Side::Sell
        };
        let offset = self.rng.gen_range(-0.5..=0.5);

        let sim_price = match side {
            Side::Buy => top.best_ask_price + offset,
            Side::Sell => top.best_bid_price + offset,
        };

        let is_taker = is_taker_order(side, sim_price, top.best_bid_price, top.best_ask_price);

        TradeEvent {
            tick,
            sim_price,
            side,
            is_taker,
        }
    }
}

impl Default for TradeSimulator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn top(bid: f64, ask: f64) -> TopOfBook {
        TopOfBook {
            best_bid_price: bid,
            best_bid_size: 1.0,
            best_ask_price: ask,
            best_ask_size: 1.0,
        }
    }

    fn tick(bid: f64, ask: f64) -> Tick {
        Tick {
            timestamp: 1_700_000_000,
            best_bid: bid,
            best_ask: ask,
            spread: ask - bid,
            mid_price: (ask + bid) / 2.0,
            order_size: 1.0,
            volatility: 0.0,
        }
    }

    #[test]
    fn test_buy_at_ask_is_taker() {
        assert!(is_taker_order(Side::Buy, 101.0, 100.0, 101.0));
    }

    #[test]
    fn test_buy_below_ask_is_maker() {
        assert!(!is_taker_order(Side::Buy, 100.0, 100.0, 101.0));
    }

    #[test]
    fn test_sell_at_bid_is_taker() {
        assert!(is_taker_order(Side::Sell, 100.0, 100.0, 101.0));
    }

    #[test]
    fn test_sell_above_bid_is_maker() {
        assert!(!is_taker_order(Side::Sell, 101.0, 100.0, 101.0));
    }

    #[test]
    fn test_simulated_price_stays_near_the_touch() {
        let mut simulator = TradeSimulator::with_seed(42);
        let book = top(100.0, 101.0);

        for _ in 0..200 {
            let event = simulator.simulate(tick(100.0, 101.0), &book);
            let anchor = match event.side {
                Side::Buy => book.best_ask_price,
                Side::Sell => book.best_bid_price,
            };
            assert!((event.sim_price - anchor).abs() <= 0.5);
        }
    }

    #[test]
    fn test_classification_is_consistent_with_drawn_price() {
        let mut simulator = TradeSimulator::with_seed(7);
        let book = top(100.0, 101.0);

        for _ in 0..200 {
            let event = simulator.simulate(tick(100.0, 101.0), &book);
            let expected = is_taker_order(
                event.side,
                event.sim_price,
                book.best_bid_price,
                book.best_ask_price,
            );
            assert_eq!(event.is_taker, expected);
        }
    }

    #[test]
    fn test_both_sides_are_drawn() {
        let mut simulator = TradeSimulator::with_seed(1);
        let book = top(100.0, 101.0);
        let mut buys = 0;
        let mut sells = 0;

        for _ in 0..200 {
            match simulator.simulate(tick(100.0, 101.0), &book).side {
                Side::Buy => buys += 1,
                Side::Sell => sells += 1,
            }
        }

        assert!(buys > 0);
        assert!(sells > 0);
    }
}
