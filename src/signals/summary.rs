// src/signals/summary.rs

use crate::types::{Candle, CandleColor, CandleSummary};

/// Color/volume digest of the last three candles. Returns `None` when the
/// series is shorter than three candles.
pub fn last3_summary(candles: &[Candle]) -> Option<CandleSummary> {
    if candles.len() < 3 {
        return None;
    }
    let last = &candles[candles.len() - 3..];
    Some(CandleSummary {
        colors: last
            .iter()
            .map(|c| {
                if c.close > c.open {
                    CandleColor::Green
                } else {
                    CandleColor::Red
                }
            })
            .collect(),
        volumes: last.iter().map(|c| c.volume).collect(),
    })
}
