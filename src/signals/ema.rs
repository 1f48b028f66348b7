// src/signals/ema.rs
//
// Exponential moving average, seeded with the arithmetic mean of the first
// `period` closes, then folded with k = 2 / (period + 1). Rounded to 4
// decimal places to match the values the dashboard has always displayed.

pub fn ema(closes: &[f64], period: usize) -> Option<f64> {
    if period == 0 || closes.len() < period {
        return None;
    }
    let k = 2.0 / (period as f64 + 1.0);
    let mut ema = closes[..period].iter().sum::<f64>() / period as f64;
    for close in &closes[period..] {
        ema = close * k + ema * (1.0 - k);
    }
    Some((ema * 10_000.0).round() / 10_000.0)
}
