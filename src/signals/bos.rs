// src/signals/bos.rs
//
// Break of Structure: a candle that straddled a recent structure level
// (body or wick on the far side) before closing through it. The scan walks
// from the newest candle backward and keeps only the most recent event.

use crate::types::{Candle, EventKind, StructureEvent, Timeframe};

use super::MIN_STRUCTURE_CANDLES;

/// Candles forming the structure level ahead of the candidate candle.
pub const BOS_WINDOW: usize = 3;

pub fn detect_bos(
    candles: &[Candle],
    timeframe: Timeframe,
    window: usize,
) -> Option<StructureEvent> {
    if window == 0 || candles.len() < MIN_STRUCTURE_CANDLES {
        return None;
    }
    for i in (window..candles.len()).rev() {
        let candle = &candles[i];
        let structure = &candles[i - window..i];
        let prev_low = structure.iter().map(|c| c.low).fold(f64::INFINITY, f64::min);
        let prev_high = structure
            .iter()
            .map(|c| c.high)
            .fold(f64::NEG_INFINITY, f64::max);

        // Bearish: closed below the structure low after trading above it.
        if candle.close < prev_low && (candle.open > prev_low || candle.high > prev_low) {
            return Some(StructureEvent {
                kind: EventKind::Bearish,
                at_time: candle.open_time,
                price: candle.close,
                structure_level: Some(prev_low),
                timeframe,
            });
        }
        // Bullish: closed above the structure high after trading below it.
        if candle.close > prev_high && (candle.open < prev_high || candle.low < prev_high) {
            return Some(StructureEvent {
                kind: EventKind::Bullish,
                at_time: candle.open_time,
                price: candle.close,
                structure_level: Some(prev_high),
                timeframe,
            });
        }
    }
    None
}
