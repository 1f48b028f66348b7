// src/fetcher.rs - rate-limit-aware candle fetching with a per-series cache
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use log::{debug, warn};

use crate::errors::ScannerError;
use crate::provider::{MarketDataProvider, KLINE_LIMIT};
use crate::types::{Candle, Timeframe};

/// Ceiling on a single backoff pause; an oversized retry budget waits at
/// this cadence instead of overflowing the exponent.
const MAX_BACKOFF: Duration = Duration::from_secs(60);

/// Retry an operation on throttling responses with exponential backoff
/// (`base_delay * 2^attempt`, clamped to [`MAX_BACKOFF`]). Any non-throttle
/// error propagates immediately; exhausting the retries surfaces the last
/// throttle error.
pub async fn with_retry<T, Fut, F>(
    label: &str,
    max_retries: u32,
    base_delay: Duration,
    mut op: F,
) -> Result<T, ScannerError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ScannerError>>,
{
    let mut attempt = 0u32;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_throttled() && attempt < max_retries => {
                let delay = base_delay
                    .saturating_mul(2u32.saturating_pow(attempt))
                    .min(MAX_BACKOFF);
                warn!(
                    "⏳ [FETCH] {} throttled, retry {}/{} in {}ms",
                    label,
                    attempt + 1,
                    max_retries,
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

struct CachedSeries {
    candles: Arc<Vec<Candle>>,
    fetched_at: Instant,
}

/// Issues candle-series requests, absorbing provider throttling with bounded
/// backoff and serving repeat requests from a per-(symbol, timeframe) cache.
///
/// Entries are replaced wholesale on refresh, never mutated; dashmap gives
/// the key-level concurrent-readers/single-writer discipline the cache needs.
pub struct RateLimitedFetcher {
    provider: Arc<dyn MarketDataProvider>,
    cache: DashMap<(String, Timeframe), CachedSeries>,
    ttl: Duration,
    max_retries: u32,
    base_delay: Duration,
}

impl RateLimitedFetcher {
    pub fn new(
        provider: Arc<dyn MarketDataProvider>,
        ttl: Duration,
        max_retries: u32,
        base_delay: Duration,
    ) -> Self {
        Self {
            provider,
            cache: DashMap::new(),
            ttl,
            max_retries,
            base_delay,
        }
    }

    /// Last 100 candles for (symbol, timeframe), fresh-from-cache or fetched.
    /// A failure here means "timeframe unavailable this cycle", not a fatal
    /// batch error.
    pub async fn fetch_series(
        &self,
        symbol: &str,
        timeframe: Timeframe,
    ) -> Result<Arc<Vec<Candle>>, ScannerError> {
        let key = (symbol.to_string(), timeframe);
        if let Some(entry) = self.cache.get(&key) {
            if entry.fetched_at.elapsed() < self.ttl {
                debug!("📦 [FETCH] cache hit for {}/{}", symbol, timeframe);
                return Ok(entry.candles.clone());
            }
        }

        let label = format!("{}/{}", symbol, timeframe);
        let candles = with_retry(&label, self.max_retries, self.base_delay, || {
            self.provider.klines(symbol, timeframe, KLINE_LIMIT)
        })
        .await?;

        debug!("🕯️ [FETCH] fetched {} candles for {}", candles.len(), label);
        let candles = Arc::new(candles);
        self.cache.insert(
            key,
            CachedSeries {
                candles: candles.clone(),
                fetched_at: Instant::now(),
            },
        );
        Ok(candles)
    }
}
