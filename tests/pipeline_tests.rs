// tests/pipeline_tests.rs
//
// Exercises the fetcher cache/retry behavior, the orchestrator's
// degrade-vs-drop policy, and the snapshot cache's stale fallback against a
// mock provider.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use structure_scanner::config::ScannerConfig;
use structure_scanner::errors::ScannerError;
use structure_scanner::fetcher::RateLimitedFetcher;
use structure_scanner::orchestrator::ScanOrchestrator;
use structure_scanner::provider::MarketDataProvider;
use structure_scanner::snapshot::SnapshotCache;
use structure_scanner::types::{Candle, Ticker, Timeframe};

#[derive(Default)]
struct MockProvider {
    kline_calls: AtomicUsize,
    ticker_calls: AtomicUsize,
    /// Throttle the first N kline calls with a 429.
    throttle_first: usize,
    /// Fail every kline call with a non-retryable provider error.
    fail_all_klines: bool,
    /// Fail only the 1h series for this symbol.
    fail_h1_for: Option<String>,
    fail_tickers: AtomicBool,
    tickers: Vec<Ticker>,
}

#[async_trait]
impl MarketDataProvider for MockProvider {
    async fn klines(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        limit: usize,
    ) -> Result<Vec<Candle>, ScannerError> {
        let call = self.kline_calls.fetch_add(1, Ordering::SeqCst);
        if call < self.throttle_first {
            return Err(ScannerError::Throttled { status: 429 });
        }
        if self.fail_all_klines {
            return Err(ScannerError::Provider {
                status: Some(500),
                message: "mock outage".to_string(),
            });
        }
        if let Some(failing) = &self.fail_h1_for {
            if symbol == failing && timeframe == Timeframe::H1 {
                return Err(ScannerError::Provider {
                    status: Some(502),
                    message: "mock 1h outage".to_string(),
                });
            }
        }
        Ok(trending_candles(limit))
    }

    async fn tickers_24h(&self) -> Result<Vec<Ticker>, ScannerError> {
        self.ticker_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_tickers.load(Ordering::SeqCst) {
            return Err(ScannerError::Provider {
                status: Some(503),
                message: "mock listing outage".to_string(),
            });
        }
        Ok(self.tickers.clone())
    }
}

fn trending_candles(n: usize) -> Vec<Candle> {
    (0..n)
        .map(|i| {
            let close = 100.0 + i as f64 * 0.1;
            Candle {
                open_time: i as i64 * 900_000,
                open: close - 0.05,
                high: close + 0.1,
                low: close - 0.1,
                close,
                volume: 1_000.0,
            }
        })
        .collect()
}

fn ticker(symbol: &str, last_price: &str, quote_volume: &str) -> Ticker {
    Ticker {
        symbol: symbol.to_string(),
        last_price: last_price.to_string(),
        quote_volume: quote_volume.to_string(),
        price_change_percent: "1.5".to_string(),
    }
}

fn test_config() -> ScannerConfig {
    ScannerConfig {
        top_n: 10,
        series_ttl: Duration::ZERO,
        snapshot_ttl: Duration::ZERO,
        batch_size: 2,
        inter_group_delay: Duration::ZERO,
        max_retries: 0,
        base_delay: Duration::from_millis(1),
        ..ScannerConfig::default()
    }
}

#[tokio::test]
async fn series_cache_serves_repeat_fetches_within_ttl() {
    let provider = Arc::new(MockProvider::default());
    let fetcher = RateLimitedFetcher::new(
        provider.clone(),
        Duration::from_secs(300),
        5,
        Duration::from_millis(1),
    );

    let first = fetcher.fetch_series("BTCUSDT", Timeframe::M15).await.unwrap();
    let second = fetcher.fetch_series("BTCUSDT", Timeframe::M15).await.unwrap();
    assert_eq!(provider.kline_calls.load(Ordering::SeqCst), 1);
    assert_eq!(first, second);

    // a different key is a different cache entry
    fetcher.fetch_series("BTCUSDT", Timeframe::H1).await.unwrap();
    assert_eq!(provider.kline_calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn expired_series_entry_is_refetched() {
    let provider = Arc::new(MockProvider::default());
    let fetcher = RateLimitedFetcher::new(
        provider.clone(),
        Duration::ZERO,
        5,
        Duration::from_millis(1),
    );

    fetcher.fetch_series("BTCUSDT", Timeframe::M15).await.unwrap();
    fetcher.fetch_series("BTCUSDT", Timeframe::M15).await.unwrap();
    assert_eq!(provider.kline_calls.load(Ordering::SeqCst), 2);
}

#[tokio::test(start_paused = true)]
async fn throttling_retries_back_off_exponentially() {
    let provider = Arc::new(MockProvider {
        throttle_first: 4,
        ..MockProvider::default()
    });
    let fetcher = RateLimitedFetcher::new(
        provider.clone(),
        Duration::from_secs(300),
        5,
        Duration::from_secs(1),
    );

    let started = tokio::time::Instant::now();
    let candles = fetcher.fetch_series("BTCUSDT", Timeframe::M15).await.unwrap();
    assert_eq!(candles.len(), 100);
    assert_eq!(provider.kline_calls.load(Ordering::SeqCst), 5);
    // 1s + 2s + 4s + 8s of backoff before the fifth attempt
    assert!(started.elapsed() >= Duration::from_millis(15_000));
}

#[tokio::test(start_paused = true)]
async fn exhausted_retries_surface_the_last_throttle() {
    let provider = Arc::new(MockProvider {
        throttle_first: usize::MAX,
        ..MockProvider::default()
    });
    let fetcher = RateLimitedFetcher::new(
        provider.clone(),
        Duration::from_secs(300),
        5,
        Duration::from_secs(1),
    );

    let err = fetcher
        .fetch_series("BTCUSDT", Timeframe::M15)
        .await
        .unwrap_err();
    assert!(matches!(err, ScannerError::Throttled { status: 429 }));
    // initial attempt plus five retries
    assert_eq!(provider.kline_calls.load(Ordering::SeqCst), 6);
}

#[tokio::test(start_paused = true)]
async fn oversized_retry_budget_clamps_backoff_instead_of_overflowing() {
    // enough retries to push the exponent past 2^32; the delay must clamp
    // rather than panic
    let provider = Arc::new(MockProvider {
        throttle_first: 35,
        ..MockProvider::default()
    });
    let fetcher = RateLimitedFetcher::new(
        provider.clone(),
        Duration::from_secs(300),
        40,
        Duration::from_secs(1),
    );

    let candles = fetcher.fetch_series("BTCUSDT", Timeframe::M15).await.unwrap();
    assert_eq!(candles.len(), 100);
    assert_eq!(provider.kline_calls.load(Ordering::SeqCst), 36);
}

#[tokio::test]
async fn non_throttle_errors_are_not_retried() {
    let provider = Arc::new(MockProvider {
        fail_all_klines: true,
        ..MockProvider::default()
    });
    let fetcher = RateLimitedFetcher::new(
        provider.clone(),
        Duration::from_secs(300),
        5,
        Duration::from_millis(1),
    );

    let err = fetcher
        .fetch_series("BTCUSDT", Timeframe::M15)
        .await
        .unwrap_err();
    assert!(matches!(err, ScannerError::Provider { .. }));
    assert_eq!(provider.kline_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn cycle_degrades_failing_timeframe_and_keeps_the_record() {
    let provider = Arc::new(MockProvider {
        fail_h1_for: Some("BBBUSDT".to_string()),
        tickers: vec![
            ticker("AAAUSDT", "10.0", "300.0"),
            ticker("BBBUSDT", "20.0", "200.0"),
            ticker("CCCUSDT", "30.0", "100.0"),
        ],
        ..MockProvider::default()
    });
    let orchestrator = ScanOrchestrator::new(provider, test_config());

    let signals = orchestrator.run_cycle().await.unwrap();
    assert_eq!(signals.len(), 3);
    let symbols: Vec<&str> = signals.iter().map(|s| s.symbol.as_str()).collect();
    assert_eq!(symbols, vec!["AAAUSDT", "BBBUSDT", "CCCUSDT"]);

    let degraded = &signals[1];
    assert!(!degraded.emas.contains_key(&Timeframe::H1));
    assert!(degraded.last_bos_h1.is_none());
    assert!(degraded.last_choch_h1.is_none());
    // everything not derived from 1h is still populated
    assert_eq!(degraded.current_price, 20.0);
    assert_eq!(degraded.volume24h, 200.0);
    for tf in [Timeframe::M5, Timeframe::M15, Timeframe::H4, Timeframe::D1] {
        let emas = degraded.emas.get(&tf).expect("timeframe should be present");
        assert!(emas.ema34.is_some());
        assert!(emas.ema89.is_some());
    }
    assert!(degraded.m15_last3_candles.is_some());

    let healthy = &signals[0];
    assert_eq!(healthy.emas.len(), Timeframe::ALL.len());
}

#[tokio::test]
async fn unparseable_ticker_drops_only_that_instrument() {
    let provider = Arc::new(MockProvider {
        tickers: vec![
            ticker("AAAUSDT", "10.0", "300.0"),
            ticker("BADUSDT", "not-a-number", "250.0"),
            ticker("CCCUSDT", "30.0", "100.0"),
        ],
        ..MockProvider::default()
    });
    let orchestrator = ScanOrchestrator::new(provider, test_config());

    let signals = orchestrator.run_cycle().await.unwrap();
    let symbols: Vec<&str> = signals.iter().map(|s| s.symbol.as_str()).collect();
    assert_eq!(symbols, vec!["AAAUSDT", "CCCUSDT"]);
}

#[tokio::test]
async fn snapshot_falls_back_to_prior_cycle_on_failure() {
    let provider = Arc::new(MockProvider {
        tickers: vec![ticker("AAAUSDT", "10.0", "300.0")],
        ..MockProvider::default()
    });
    let orchestrator = ScanOrchestrator::new(provider.clone(), test_config());
    let cache = SnapshotCache::new(Duration::ZERO);

    let first = cache.get_snapshot(&orchestrator).await.unwrap();
    assert_eq!(first.signals.len(), 1);

    provider.fail_tickers.store(true, Ordering::SeqCst);
    let second = cache.get_snapshot(&orchestrator).await.unwrap();
    assert_eq!(second.fetched_at, first.fetched_at);
    assert_eq!(second.signals, first.signals);
}

#[tokio::test]
async fn cycle_failure_without_prior_snapshot_propagates() {
    let provider = Arc::new(MockProvider::default());
    provider.fail_tickers.store(true, Ordering::SeqCst);
    let orchestrator = ScanOrchestrator::new(provider, test_config());
    let cache = SnapshotCache::new(Duration::from_secs(60));

    let err = cache.get_snapshot(&orchestrator).await.unwrap_err();
    assert_eq!(err.kind(), "cycle_failed");
}

#[tokio::test]
async fn fresh_snapshot_is_served_without_a_new_cycle() {
    let provider = Arc::new(MockProvider {
        tickers: vec![ticker("AAAUSDT", "10.0", "300.0")],
        ..MockProvider::default()
    });
    let orchestrator = ScanOrchestrator::new(provider.clone(), test_config());
    let cache = SnapshotCache::new(Duration::from_secs(60));

    cache.get_snapshot(&orchestrator).await.unwrap();
    let listings_after_first = provider.ticker_calls.load(Ordering::SeqCst);
    cache.get_snapshot(&orchestrator).await.unwrap();
    assert_eq!(provider.ticker_calls.load(Ordering::SeqCst), listings_after_first);
}
