// src/signals/mod.rs
//
// Pure signal detectors over ordered candle series. Deterministic, no state:
// the same series always yields the same result.

mod bos;
mod choch;
mod ema;
mod summary;
mod swing;

pub use bos::{detect_bos, BOS_WINDOW};
pub use choch::detect_choch;
pub use ema::ema;
pub use summary::last3_summary;
pub use swing::{swing_points, SwingKind, SwingPoint, SWING_LOOKBACK};

/// Both structural detectors want a minimum of history before they will
/// commit to an event; shorter series mean "no signal", not an error.
pub const MIN_STRUCTURE_CANDLES: usize = 10;
