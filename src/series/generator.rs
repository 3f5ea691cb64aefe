use crate::model::{OhlcBar, Series};
use crate::utils::{is_weekend, round_to_cents};
use chrono::{Days, NaiveDate};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Max day-over-day close change, as a full band width (+/- 1.5%).
const DAILY_CHANGE_BAND: f64 = 0.03;
const VOLATILITY_RATIO: f64 = 0.02;
const OPEN_NOISE: f64 = 0.2;
const WICK_NOISE: f64 = 0.6;
const MIN_VOLUME: u64 = 500_000;
const MAX_VOLUME: u64 = 1_500_000;
const MAX_PREALLOCATED_BARS: usize = 4096;

/// Seed derived from the symbol: the sum of its UTF-16 code units.
fn symbol_seed(symbol: &str) -> u64 {
    symbol.encode_utf16().map(u64::from).sum()
}

/// Generates a synthetic daily series ending at `end_date` whose last close
/// is `anchor_price`.
///
/// The walk runs backward from the anchor for `day_count` calendar days.
/// Weekends use up a day but emit no bar, so the result can be shorter than
/// `day_count`. Bars are returned oldest first.
pub fn generate_series(
    symbol: &str,
    day_count: usize,
    anchor_price: f64,
    end_date: NaiveDate,
) -> Series {
    debug_assert!(anchor_price > 0.0, "anchor price must be positive");

    let mut rng = StdRng::seed_from_u64(symbol_seed(symbol));
    let mut price = anchor_price;
    // Capped: day_count is caller-controlled and may exceed any representable history.
    let mut bars = Vec::with_capacity(day_count.min(MAX_PREALLOCATED_BARS));

    for offset in 0..day_count {
        let Some(date) = end_date.checked_sub_days(Days::new(offset as u64)) else {
            break;
        };
        if is_weekend(date) {
            continue;
        }

        let volatility = price * VOLATILITY_RATIO;
        let change = (rng.random::<f64>() - 0.5) * DAILY_CHANGE_BAND;
        let prev_close = price / (1.0 + change);

        let open = prev_close + (rng.random::<f64>() - 0.5) * volatility * OPEN_NOISE;
        let close = price;
        // No clamping: the wicks are sampled independently of open/close.
        let high = open.max(close) + rng.random::<f64>() * volatility * WICK_NOISE;
        let low = open.min(close) - rng.random::<f64>() * volatility * WICK_NOISE;
        let volume = rng.random_range(MIN_VOLUME..MAX_VOLUME);

        bars.push(OhlcBar {
            date,
            open: round_to_cents(open),
            high: round_to_cents(high),
            low: round_to_cents(low),
            close: round_to_cents(close),
            volume,
        });

        price = prev_close;
    }

    bars.reverse();
    bars
}
