use crate::model::StockSymbol;

/// Relative distance from the target inside which an alert fires.
pub const ALERT_PROXIMITY: f64 = 0.05;

/// An alert that fired for a fresh live price.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceAlert {
    pub symbol: String,
    pub target: f64,
    pub live_price: f64,
}

/// True when `live_price` is within 5% of `target`, measured against the live price.
pub fn alert_triggered(live_price: f64, target: f64) -> bool {
    if !live_price.is_finite() || live_price <= 0.0 {
        return false;
    }
    (live_price - target).abs() / live_price < ALERT_PROXIMITY
}

/// Runs the alert rule for a watchlist entry that has a target set.
pub fn check_alert(stock: &StockSymbol, live_price: f64) -> Option<PriceAlert> {
    let target = stock.alert_price?;
    alert_triggered(live_price, target).then(|| PriceAlert {
        symbol: stock.symbol.clone(),
        target,
        live_price,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stock(alert_price: Option<f64>) -> StockSymbol {
        StockSymbol {
            symbol: "AAPL".into(),
            name: "Apple".into(),
            sector: "Technology".into(),
            alert_price,
        }
    }

    #[test]
    fn fires_near_target() {
        assert!(alert_triggered(103.0, 100.0));
        assert!(alert_triggered(100.0, 100.0));
        assert!(alert_triggered(97.0, 100.0));
    }

    #[test]
    fn stays_quiet_far_from_target() {
        assert!(!alert_triggered(90.0, 100.0));
        assert!(!alert_triggered(120.0, 100.0));
    }

    #[test]
    fn boundary_is_exclusive() {
        // |100 - 95| / 100 == 0.05 exactly.
        assert!(!alert_triggered(100.0, 95.0));
    }

    #[test]
    fn ignores_unusable_live_price() {
        assert!(!alert_triggered(0.0, 0.0));
        assert!(!alert_triggered(-1.0, -1.0));
        assert!(!alert_triggered(f64::NAN, 100.0));
    }

    #[test]
    fn check_alert_needs_a_target() {
        assert_eq!(check_alert(&stock(None), 230.0), None);
        assert_eq!(check_alert(&stock(Some(300.0)), 230.0), None);

        let alert = check_alert(&stock(Some(235.0)), 230.0).expect("should fire");
        assert_eq!(alert.symbol, "AAPL");
        assert_eq!(alert.target, 235.0);
        assert_eq!(alert.live_price, 230.0);
    }
}
