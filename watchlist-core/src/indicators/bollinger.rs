//! Bollinger Bands: moving average +/- k standard deviations.
//!
//! - Middle: SMA(close, period)
//! - Upper: middle + k * stddev(close, period)
//! - Lower: middle - k * stddev(close, period)
//!
//! Uses the sample stddev (divide by N - 1). Lookback: period - 1.

/// Upper/middle/lower bands, index-aligned with the input.
#[derive(Debug, Clone, PartialEq)]
pub struct BollingerBands {
    pub upper: Vec<f64>,
    pub middle: Vec<f64>,
    pub lower: Vec<f64>,
}

pub fn bollinger_of_series(values: &[f64], period: usize, k: f64) -> BollingerBands {
    let n = values.len();
    let mut bands = BollingerBands {
        upper: vec![f64::NAN; n],
        middle: vec![f64::NAN; n],
        lower: vec![f64::NAN; n],
    };

    if period == 0 || n < period {
        return bands;
    }

    for i in (period - 1)..n {
        let window = &values[(i + 1 - period)..=i];
        if window.iter().any(|v| v.is_nan()) {
            continue;
        }

        let mean = window.iter().sum::<f64>() / period as f64;
        let stddev = if period > 1 {
            let variance = window.iter().map(|v| (v - mean).powi(2)).sum::<f64>()
                / (period - 1) as f64;
            variance.sqrt()
        } else {
            0.0
        };

        bands.middle[i] = mean;
        bands.upper[i] = mean + k * stddev;
        bands.lower[i] = mean - k * stddev;
    }

    bands
}
