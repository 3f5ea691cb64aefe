use serde::Serialize;

/// Where the anchor price of a series came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PriceOrigin {
    Live,
    Fallback,
}

pub const DEFAULT_FALLBACK_PRICE: f64 = 100.0;

/// Static seed price used when no live quote is available.
pub fn fallback_price(symbol: &str) -> f64 {
    match symbol {
        "TSLA" => 350.0,
        "NVDA" => 135.0,
        "AAPL" => 230.0,
        "GOOGL" => 180.0,
        "MSFT" => 420.0,
        "AMZN" => 210.0,
        "AMD" => 160.0,
        "NFLX" => 850.0,
        _ => DEFAULT_FALLBACK_PRICE,
    }
}

/// Picks the live price when it is usable, otherwise the fallback table value.
pub fn resolve_anchor(symbol: &str, live: Option<f64>) -> (f64, PriceOrigin) {
    match live {
        Some(price) if price.is_finite() && price > 0.0 => (price, PriceOrigin::Live),
        _ => (fallback_price(symbol), PriceOrigin::Fallback),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_symbols_have_fixed_prices() {
        assert_eq!(fallback_price("NVDA"), 135.0);
        assert_eq!(fallback_price("NFLX"), 850.0);
        assert_eq!(fallback_price("ZZZZ"), DEFAULT_FALLBACK_PRICE);
    }

    #[test]
    fn resolve_anchor_prefers_live_price() {
        assert_eq!(resolve_anchor("AAPL", Some(241.5)), (241.5, PriceOrigin::Live));
    }

    #[test]
    fn resolve_anchor_rejects_unusable_prices() {
        assert_eq!(resolve_anchor("AAPL", None), (230.0, PriceOrigin::Fallback));
        assert_eq!(resolve_anchor("AAPL", Some(0.0)), (230.0, PriceOrigin::Fallback));
        assert_eq!(resolve_anchor("AAPL", Some(-3.0)), (230.0, PriceOrigin::Fallback));
        assert_eq!(resolve_anchor("AAPL", Some(f64::NAN)), (230.0, PriceOrigin::Fallback));
    }
}
