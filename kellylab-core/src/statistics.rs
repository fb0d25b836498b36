//! Descriptive statistics shared by the trajectory engine and aggregation.
//!
//! All functions are pure. Standard deviation is the population form
//! (divide by n) everywhere so per-trajectory Sharpe and cross-trajectory
//! dispersion use the same convention.

/// Trades per year assumed when annualizing the Sharpe ratio.
pub const TRADES_PER_YEAR: f64 = 365.0;

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation. 0.0 for fewer than two values.
pub fn population_std(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    let variance = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}

/// Sort a copy ascending using IEEE total ordering.
pub fn sorted(values: &[f64]) -> Vec<f64> {
    let mut out = values.to_vec();
    out.sort_by(|a, b| a.total_cmp(b));
    out
}

/// Percentile of a sorted slice using linear interpolation.
///
/// rank = p/100 × (n − 1); the result interpolates between the two closest
/// ranks. Monotonically non-decreasing in `p`. Returns 0.0 for an empty slice.
pub fn percentile_sorted(sorted: &[f64], p: f64) -> f64 {
    let n = sorted.len();
    if n == 0 {
        return 0.0;
    }
    if n == 1 {
        return sorted[0];
    }
    let rank = (p.clamp(0.0, 100.0) / 100.0) * (n - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = (lo + 1).min(n - 1);
    let frac = rank - lo as f64;
    // Bounded to the bracketing ranks so rounding cannot break monotonicity.
    (sorted[lo] + (sorted[hi] - sorted[lo]) * frac)
        .max(sorted[lo])
        .min(sorted[hi])
}

/// Median of a sorted slice.
pub fn median_sorted(sorted: &[f64]) -> f64 {
    percentile_sorted(sorted, 50.0)
}

/// Annualized Sharpe ratio of per-trade returns.
///
/// mean / std × sqrt(periods_per_year). Defined as 0.0 with fewer than two
/// returns or zero dispersion. Identical returns count as zero dispersion even
/// when the computed std carries rounding residue.
pub fn annualized_sharpe(returns: &[f64], periods_per_year: f64) -> f64 {
    let Some((&first, rest)) = returns.split_first() else {
        return 0.0;
    };
    if rest.iter().all(|&r| r == first) {
        return 0.0;
    }
    let std = population_std(returns);
    if std == 0.0 {
        return 0.0;
    }
    mean(returns) / std * periods_per_year.sqrt()
}

/// Peak-to-current decline in percent for every point of an equity curve.
///
/// The running peak starts at the first point; a zero peak yields 0.
pub fn drawdown_pct_curve(equity_curve: &[f64]) -> Vec<f64> {
    let Some(&first) = equity_curve.first() else {
        return Vec::new();
    };
    let mut peak = first;
    equity_curve
        .iter()
        .map(|&equity| {
            if equity > peak {
                peak = equity;
            }
            if peak > 0.0 {
                (peak - equity) / peak * 100.0
            } else {
                0.0
            }
        })
        .collect()
}
