//! Simple moving average over a trailing window.
//!
//! The first defined value sits at index `period - 1`. Any NaN inside a window
//! leaves that bar undefined.

/// Trailing mean of `values` over `period` bars.
pub fn sma_of_series(values: &[f64], period: usize) -> Vec<f64> {
    let mut out = vec![f64::NAN; values.len()];
    if period == 0 || values.len() < period {
        return out;
    }

    let mut sum = 0.0;
    let mut gaps = 0usize;
    for (i, &v) in values.iter().enumerate() {
        if v.is_nan() {
            gaps += 1;
        } else {
            sum += v;
        }
        if i >= period {
            let dropped = values[i - period];
            if dropped.is_nan() {
                gaps -= 1;
            } else {
                sum -= dropped;
            }
        }
        if i + 1 >= period && gaps == 0 {
            out[i] = sum / period as f64;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, DEFAULT_EPSILON};

    #[test]
    fn five_bar_window() {
        let out = sma_of_series(&[10.0, 11.0, 12.0, 13.0, 14.0, 15.0, 16.0], 5);
        assert_eq!(out.len(), 7);
        assert!(out[..4].iter().all(|v| v.is_nan()));
        assert_approx(out[4], 12.0, DEFAULT_EPSILON);
        assert_approx(out[5], 13.0, DEFAULT_EPSILON);
        assert_approx(out[6], 14.0, DEFAULT_EPSILON);
    }

    #[test]
    fn window_of_one_is_identity() {
        assert_eq!(sma_of_series(&[3.0, 1.5, 9.0], 1), vec![3.0, 1.5, 9.0]);
    }

    #[test]
    fn gap_blanks_every_window_touching_it() {
        let out = sma_of_series(&[10.0, 11.0, f64::NAN, 13.0, 14.0, 15.0], 3);
        assert!(out[2].is_nan());
        assert!(out[3].is_nan());
        assert!(out[4].is_nan());
        assert_approx(out[5], 14.0, DEFAULT_EPSILON);
    }

    #[test]
    fn short_input_is_all_undefined() {
        assert!(sma_of_series(&[10.0, 11.0], 5).iter().all(|v| v.is_nan()));
        assert!(sma_of_series(&[10.0, 11.0], 0).iter().all(|v| v.is_nan()));
    }
}
