// src/signals/choch.rs
//
// Change of Character: a close crossing the most recent prior swing extreme,
// confirmed on the candle that actually crossed (the previous close had not).
// Like BOS this is a last-confirmed-event query, not an event log.

use crate::types::{Candle, EventKind, StructureEvent, Timeframe};

use super::swing::{swing_points, SwingKind};
use super::MIN_STRUCTURE_CANDLES;

pub fn detect_choch(
    candles: &[Candle],
    timeframe: Timeframe,
    lookback: usize,
) -> Option<StructureEvent> {
    if candles.len() < MIN_STRUCTURE_CANDLES {
        return None;
    }
    let highs: Vec<f64> = candles.iter().map(|c| c.high).collect();
    let lows: Vec<f64> = candles.iter().map(|c| c.low).collect();
    let swing_highs: Vec<_> = swing_points(&highs, lookback)
        .into_iter()
        .filter(|p| p.kind == SwingKind::High)
        .collect();
    let swing_lows: Vec<_> = swing_points(&lows, lookback)
        .into_iter()
        .filter(|p| p.kind == SwingKind::Low)
        .collect();

    for i in (1..candles.len()).rev() {
        let candle = &candles[i];
        let prev_close = candles[i - 1].close;

        // Bullish: this close crossed above the most recent prior swing-high.
        if let Some(swing) = swing_highs.iter().rev().find(|p| p.index < i) {
            if candle.close > swing.value && prev_close <= swing.value {
                return Some(StructureEvent {
                    kind: EventKind::Bullish,
                    at_time: candle.open_time,
                    price: candle.close,
                    structure_level: None,
                    timeframe,
                });
            }
        }
        // Bearish: this close crossed below the most recent prior swing-low.
        if let Some(swing) = swing_lows.iter().rev().find(|p| p.index < i) {
            if candle.close < swing.value && prev_close >= swing.value {
                return Some(StructureEvent {
                    kind: EventKind::Bearish,
                    at_time: candle.open_time,
                    price: candle.close,
                    structure_level: None,
                    timeframe,
                });
            }
        }
    }
    None
}
