use crate::model::{Macd, OhlcBar, TechnicalIndicators};

pub const RSI_PERIOD: usize = 14;
pub const MACD_FAST: usize = 12;
pub const MACD_SLOW: usize = 26;
/// The signal line is this fraction of the MACD line, not a 9-period EMA.
pub const SIGNAL_RATIO: f64 = 0.9;

/// RSI over the last [`RSI_PERIOD`] close-to-close moves.
pub fn compute_rsi(series: &[OhlcBar]) -> f64 {
    compute_rsi_with_period(series, RSI_PERIOD)
}

/// Returns 50 when there are fewer than `period + 1` bars and 100 when the
/// window holds no losses.
pub fn compute_rsi_with_period(series: &[OhlcBar], period: usize) -> f64 {
    if period == 0 || series.len() < period + 1 {
        return 50.0;
    }

    let mut gains = 0.0;
    let mut losses = 0.0;

    for w in series[series.len() - period - 1..].windows(2) {
        let delta = w[1].close - w[0].close;
        if delta >= 0.0 {
            gains += delta;
        } else {
            losses -= delta;
        }
    }

    let avg_gain = gains / period as f64;
    let avg_loss = losses / period as f64;

    if avg_loss == 0.0 {
        return 100.0;
    }

    let rs = avg_gain / avg_loss;
    100.0 - (100.0 / (1.0 + rs))
}

/// Full-length EMA seeded with the first value, `k = 2 / (period + 1)`.
pub fn ema(values: &[f64], period: usize) -> Vec<f64> {
    let k = 2.0 / (period as f64 + 1.0);
    let mut out = Vec::with_capacity(values.len());
    let mut iter = values.iter();

    if let Some(&first) = iter.next() {
        let mut current = first;
        out.push(current);
        for &value in iter {
            current = value * k + current * (1.0 - k);
            out.push(current);
        }
    }

    out
}

/// MACD(12, 26) with the simplified signal line. An empty series yields zeros.
pub fn compute_macd(series: &[OhlcBar]) -> Macd {
    let closes: Vec<f64> = series.iter().map(|bar| bar.close).collect();

    let (Some(fast), Some(slow)) = (
        ema(&closes, MACD_FAST).last().copied(),
        ema(&closes, MACD_SLOW).last().copied(),
    ) else {
        return Macd::default();
    };

    let macd_line = fast - slow;
    let signal_line = macd_line * SIGNAL_RATIO;

    Macd {
        macd_line,
        signal_line,
        histogram: macd_line - signal_line,
    }
}

pub fn latest_indicators(series: &[OhlcBar]) -> TechnicalIndicators {
    TechnicalIndicators {
        rsi: compute_rsi(series),
        macd: compute_macd(series),
    }
}
