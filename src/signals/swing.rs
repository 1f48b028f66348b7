// src/signals/swing.rs
//
// Local extrema confirmed by `lookback` strictly lower/higher neighbors on
// both sides.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwingKind {
    High,
    Low,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SwingPoint {
    pub index: usize,
    pub value: f64,
    pub kind: SwingKind,
}

/// Default confirmation window on each side of a swing point.
pub const SWING_LOOKBACK: usize = 2;

/// Ordered-by-index swing points of `values`. Index `i` is a swing-high iff
/// `values[i]` strictly exceeds every value in `i-lookback..i` and
/// `i+1..=i+lookback`; swing-lows are the symmetric strict minima.
pub fn swing_points(values: &[f64], lookback: usize) -> Vec<SwingPoint> {
    let mut points = Vec::new();
    if lookback == 0 || values.len() < 2 * lookback + 1 {
        return points;
    }
    for i in lookback..values.len() - lookback {
        let v = values[i];
        let neighbors = || (i - lookback..i).chain(i + 1..=i + lookback);
        if neighbors().all(|j| v > values[j]) {
            points.push(SwingPoint {
                index: i,
                value: v,
                kind: SwingKind::High,
            });
        } else if neighbors().all(|j| v < values[j]) {
            points.push(SwingPoint {
                index: i,
                value: v,
                kind: SwingKind::Low,
            });
        }
    }
    points
}
