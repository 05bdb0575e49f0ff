//! Relative Strength Index (RSI).
//!
//! Simple rolling means of gains and losses over the trailing `period`
//! close-to-close deltas (no Wilder smoothing).
//! RSI = 100 - 100 / (1 + avg_gain / avg_loss)
//! First defined value: index `period`.
//! Saturation: avg_loss == 0 gives exactly 100, including a flat window.

/// RSI of `values`; undefined until `period` deltas exist.
pub fn rsi_of_series(values: &[f64], period: usize) -> Vec<f64> {
    let n = values.len();
    let mut result = vec![f64::NAN; n];

    if period == 0 || n < period + 1 {
        return result;
    }

    let mut gains = vec![f64::NAN; n];
    let mut losses = vec![f64::NAN; n];
    for i in 1..n {
        let change = values[i] - values[i - 1];
        if change.is_nan() {
            continue;
        }
        gains[i] = change.max(0.0);
        losses[i] = (-change).max(0.0);
    }

    for i in period..n {
        let window = (i + 1 - period)..=i;
        let gain_window = &gains[window.clone()];
        let loss_window = &losses[window];
        if gain_window.iter().any(|g| g.is_nan()) {
            continue;
        }
        let avg_gain = gain_window.iter().sum::<f64>() / period as f64;
        let avg_loss = loss_window.iter().sum::<f64>() / period as f64;
        result[i] = compute_rsi(avg_gain, avg_loss);
    }

    result
}

fn compute_rsi(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 {
        100.0
    } else {
        100.0 - 100.0 / (1.0 + avg_gain / avg_loss)
    }
}
