// src/utils/synthetic.rs

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::models::OhlcvRecord;

const HOUR_MS: i64 = 3_600_000;
/// 2024-01-01T00:00:00Z
const START_MS: i64 = 1_704_067_200_000;

/// Generates a reproducible hourly random walk for offline runs.
///
/// Each close moves up to 1% from the previous one; highs and lows wrap the
/// open/close pair by up to another 0.5%.
pub fn random_walk(n: usize, start: f64, seed: u64) -> Vec<OhlcvRecord> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut price = start;
    let mut records = Vec::with_capacity(n);

    for i in 0..n {
        let open = price;
        let close = (open * (1.0 + rng.gen_range(-0.01..0.01))).max(0.01);
        let high = open.max(close) * (1.0 + rng.gen_range(0.0..0.005));
        let low = open.min(close) * (1.0 - rng.gen_range(0.0..0.005));
        records.push(OhlcvRecord {
            timestamp: START_MS + i as i64 * HOUR_MS,
            open,
            high,
            low,
            close,
            volume: rng.gen_range(10.0..1000.0),
        });
        price = close;
    }

    records
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_seed_same_walk() {
        assert_eq!(random_walk(50, 100.0, 7), random_walk(50, 100.0, 7));
        assert_ne!(random_walk(50, 100.0, 7), random_walk(50, 100.0, 8));
    }

    #[test]
    fn test_candles_are_well_formed() {
        let walk = random_walk(200, 250.0, 42);
        assert_eq!(walk.len(), 200);
        assert_eq!(walk[0].open, 250.0);
        for pair in walk.windows(2) {
            assert_eq!(pair[1].timestamp - pair[0].timestamp, HOUR_MS);
            assert_eq!(pair[1].open, pair[0].close);
        }
        for candle in &walk {
            assert!(candle.high >= candle.open.max(candle.close));
            assert!(candle.low <= candle.open.min(candle.close));
            assert!(candle.close > 0.0);
        }
    }
}
