// Live price lookup: best-effort, callers fall back to the static table.
use crate::model::QuoteError;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, warn};

#[async_trait::async_trait]
pub trait PriceSource: Send + Sync {
    async fn fetch_price(&self, symbol: &str) -> Result<f64, QuoteError>;
}

/// Fetches a live price, mapping errors, timeouts and non-positive values to `None`.
pub async fn fetch_live_price<S>(source: &S, symbol: &str, limit: Duration) -> Option<f64>
where
    S: PriceSource + ?Sized,
{
    match timeout(limit, source.fetch_price(symbol)).await {
        Ok(Ok(price)) if price.is_finite() && price > 0.0 => {
            debug!("[{}] live price {:.2}", symbol, price);
            Some(price)
        }
        Ok(Ok(price)) => {
            warn!("[{}] ignoring unusable live price {}", symbol, price);
            None
        }
        Ok(Err(e)) => {
            warn!("[{}] live price lookup failed: {}", symbol, e);
            None
        }
        Err(_) => {
            warn!("[{}] live price lookup timed out after {:?}", symbol, limit);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedSource(f64);

    #[async_trait::async_trait]
    impl PriceSource for FixedSource {
        async fn fetch_price(&self, _symbol: &str) -> Result<f64, QuoteError> {
            Ok(self.0)
        }
    }

    struct FailingSource;

    #[async_trait::async_trait]
    impl PriceSource for FailingSource {
        async fn fetch_price(&self, symbol: &str) -> Result<f64, QuoteError> {
            Err(QuoteError::InvalidResponse(format!("no quote for {symbol}")))
        }
    }

    struct SlowSource;

    #[async_trait::async_trait]
    impl PriceSource for SlowSource {
        async fn fetch_price(&self, _symbol: &str) -> Result<f64, QuoteError> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(1.0)
        }
    }

    const LIMIT: Duration = Duration::from_millis(50);

    #[tokio::test]
    async fn returns_positive_price() {
        assert_eq!(fetch_live_price(&FixedSource(142.5), "NVDA", LIMIT).await, Some(142.5));
    }

    #[tokio::test]
    async fn drops_non_positive_price() {
        assert_eq!(fetch_live_price(&FixedSource(0.0), "NVDA", LIMIT).await, None);
        assert_eq!(fetch_live_price(&FixedSource(f64::INFINITY), "NVDA", LIMIT).await, None);
    }

    #[tokio::test]
    async fn errors_become_none() {
        assert_eq!(fetch_live_price(&FailingSource, "NVDA", LIMIT).await, None);
    }

    #[tokio::test]
    async fn timeouts_become_none() {
        assert_eq!(fetch_live_price(&SlowSource, "NVDA", LIMIT).await, None);
    }

    #[tokio::test]
    async fn works_through_trait_objects() {
        let source: Box<dyn PriceSource> = Box::new(FixedSource(10.0));
        assert_eq!(fetch_live_price(source.as_ref(), "AMD", LIMIT).await, Some(10.0));
    }
}
