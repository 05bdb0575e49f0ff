//! Exponential moving average, seeded with the SMA of its first window.
//!
//! `ema[t] = alpha * x[t] + (1 - alpha) * ema[t - 1]` with
//! `alpha = 2 / (period + 1)`.

/// EMA of `values`.
///
/// Leading NaNs are skipped so the MACD signal line can start on the first
/// defined MACD value. A NaN after the seed leaves the rest undefined.
pub fn ema_of_series(values: &[f64], period: usize) -> Vec<f64> {
    let mut out = vec![f64::NAN; values.len()];
    if period == 0 {
        return out;
    }
    let Some(start) = values.iter().position(|v| !v.is_nan()) else {
        return out;
    };
    let seed_at = start + period - 1;
    let Some(seed_window) = values.get(start..=seed_at) else {
        return out;
    };
    if seed_window.iter().any(|v| v.is_nan()) {
        return out;
    }

    let alpha = 2.0 / (period as f64 + 1.0);
    let mut prev = seed_window.iter().sum::<f64>() / period as f64;
    out[seed_at] = prev;

    for (slot, &x) in out[seed_at + 1..].iter_mut().zip(&values[seed_at + 1..]) {
        if x.is_nan() {
            break;
        }
        prev = alpha * x + (1.0 - alpha) * prev;
        *slot = prev;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, DEFAULT_EPSILON};

    #[test]
    fn period_one_tracks_input() {
        assert_eq!(ema_of_series(&[100.0, 200.0, 300.0], 1), vec![100.0, 200.0, 300.0]);
    }

    #[test]
    fn seeded_with_first_window_mean() {
        // alpha = 0.5, seed = mean(10, 11, 12) at index 2
        let out = ema_of_series(&[10.0, 11.0, 12.0, 13.0, 14.0], 3);
        assert!(out[0].is_nan() && out[1].is_nan());
        assert_approx(out[2], 11.0, DEFAULT_EPSILON);
        assert_approx(out[3], 12.0, DEFAULT_EPSILON);
        assert_approx(out[4], 13.0, DEFAULT_EPSILON);
    }

    #[test]
    fn leading_gap_shifts_the_seed() {
        let out = ema_of_series(&[f64::NAN, f64::NAN, 2.0, 4.0, 6.0, 8.0], 2);
        assert!(out[2].is_nan());
        assert_approx(out[3], 3.0, DEFAULT_EPSILON);
        assert_approx(out[4], 2.0 / 3.0 * 6.0 + 1.0 / 3.0 * 3.0, DEFAULT_EPSILON);
    }

    #[test]
    fn gap_inside_seed_window() {
        let out = ema_of_series(&[10.0, f64::NAN, 12.0, 13.0, 14.0], 3);
        assert!(out.iter().all(|v| v.is_nan()));
    }

    #[test]
    fn gap_after_seed_stops_the_recursion() {
        let out = ema_of_series(&[10.0, 11.0, 12.0, f64::NAN, 14.0], 3);
        assert_approx(out[2], 11.0, DEFAULT_EPSILON);
        assert!(out[3].is_nan());
        assert!(out[4].is_nan());
    }

    #[test]
    fn flat_input_stays_flat() {
        let out = ema_of_series(&[42.0; 30], 12);
        for v in &out[11..] {
            assert_approx(*v, 42.0, DEFAULT_EPSILON);
        }
    }

    #[test]
    fn too_short_for_seed() {
        assert!(ema_of_series(&[1.0, 2.0], 3).iter().all(|v| v.is_nan()));
    }
}
