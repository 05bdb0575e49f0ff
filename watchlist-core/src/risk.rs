//! Position sizing helpers. Degenerate inputs resolve to 0, never to an error.

/// Upper bound on the recommended Kelly fraction.
pub const KELLY_CAP: f64 = 0.2;

/// Shares to buy so that hitting `stop_price` loses `risk_pct` percent of the account.
///
/// `(account_size * risk_pct / 100) / |entry - stop|`. Returns 0 when the
/// entry equals the stop or either price is 0, since risk per share is undefined.
pub fn position_size(account_size: f64, risk_pct: f64, entry_price: f64, stop_price: f64) -> f64 {
    if entry_price == 0.0 || stop_price == 0.0 {
        return 0.0;
    }
    let risk_per_share = (entry_price - stop_price).abs();
    if risk_per_share == 0.0 || !risk_per_share.is_finite() {
        return 0.0;
    }
    account_size * risk_pct / 100.0 / risk_per_share
}

/// Kelly fraction `w - (1 - w) / r`, capped at [`KELLY_CAP`].
///
/// Returns 0 when `win_loss_ratio` is 0. Negative edges also return 0: the
/// sizing is long-only and never recommends a negative stake.
pub fn kelly_fraction(win_rate: f64, win_loss_ratio: f64) -> f64 {
    if win_loss_ratio == 0.0 || win_loss_ratio.is_nan() || win_rate.is_nan() {
        return 0.0;
    }
    let kelly = win_rate - (1.0 - win_rate) / win_loss_ratio;
    kelly.clamp(0.0, KELLY_CAP)
}
