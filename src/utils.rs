// Utility functions
use chrono::{Datelike, NaiveDate, Weekday};

/// Rounds a price to whole cents.
pub fn round_to_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

pub fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// Trims and upper-cases a ticker so lookups are case-insensitive.
pub fn normalize_symbol(symbol: &str) -> String {
    symbol.trim().to_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rounds_half_cents_away_from_zero() {
        assert_eq!(round_to_cents(100.0), 100.0);
        assert_eq!(round_to_cents(12.345_6), 12.35);
        assert_eq!(round_to_cents(12.344), 12.34);
    }

    #[test]
    fn detects_weekends() {
        let saturday = NaiveDate::from_ymd_opt(2026, 10, 17).unwrap();
        let sunday = NaiveDate::from_ymd_opt(2026, 10, 18).unwrap();
        let monday = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();
        assert!(is_weekend(saturday));
        assert!(is_weekend(sunday));
        assert!(!is_weekend(monday));
    }

    #[test]
    fn normalizes_symbols() {
        assert_eq!(normalize_symbol("  nvda "), "NVDA");
    }
}
