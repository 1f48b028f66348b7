// src/orchestrator.rs - grouped concurrent ingestion over the universe
use std::sync::Arc;
use std::time::Instant;

use futures::future::join_all;
use log::{info, warn};

use crate::config::ScannerConfig;
use crate::errors::ScannerError;
use crate::fetcher::RateLimitedFetcher;
use crate::provider::MarketDataProvider;
use crate::signals::{
    detect_bos, detect_choch, ema, last3_summary, BOS_WINDOW, SWING_LOOKBACK,
};
use crate::types::{EmaPair, InstrumentSignal, Ticker, Timeframe};
use crate::universe;

/// Drives one full ingestion cycle: universe selection, grouped concurrent
/// per-instrument analysis, and the degrade-vs-drop failure policy.
///
/// A timeframe that fails leaves its slots empty on the record; an instrument
/// that fails is dropped from the cycle; only a failed universe listing
/// aborts the cycle itself.
pub struct ScanOrchestrator {
    provider: Arc<dyn MarketDataProvider>,
    fetcher: RateLimitedFetcher,
    config: ScannerConfig,
}

impl ScanOrchestrator {
    pub fn new(provider: Arc<dyn MarketDataProvider>, config: ScannerConfig) -> Self {
        let fetcher = RateLimitedFetcher::new(
            provider.clone(),
            config.series_ttl,
            config.max_retries,
            config.base_delay,
        );
        Self {
            provider,
            fetcher,
            config,
        }
    }

    pub async fn run_cycle(&self) -> Result<Vec<InstrumentSignal>, ScannerError> {
        let cycle_start = Instant::now();
        let tickers = universe::top_instruments(self.provider.as_ref(), &self.config)
            .await
            .map_err(|e| ScannerError::CycleFailed { source: Box::new(e) })?;

        let mut signals = Vec::with_capacity(tickers.len());
        let mut dropped = 0usize;
        let group_count = tickers.len().div_ceil(self.config.batch_size);

        for (group_index, group) in tickers.chunks(self.config.batch_size).enumerate() {
            let outcomes = join_all(group.iter().map(|t| self.analyze_instrument(t))).await;
            for (ticker, outcome) in group.iter().zip(outcomes) {
                match outcome {
                    Ok(signal) => signals.push(signal),
                    Err(e) => {
                        dropped += 1;
                        warn!("❌ [BATCH] dropping {} this cycle: {}", ticker.symbol, e);
                    }
                }
            }
            // flow control against the provider's aggregate rate budget
            if group_index + 1 < group_count {
                tokio::time::sleep(self.config.inter_group_delay).await;
            }
        }

        info!(
            "🏁 [BATCH] cycle complete: {} records, {} dropped, {} groups, {:.2}s",
            signals.len(),
            dropped,
            group_count,
            cycle_start.elapsed().as_secs_f64()
        );
        Ok(signals)
    }

    /// All timeframes of one instrument, fetched and analyzed concurrently.
    /// Per-timeframe errors degrade the record; a ticker whose own numeric
    /// fields do not parse fails the instrument.
    async fn analyze_instrument(&self, ticker: &Ticker) -> Result<InstrumentSignal, ScannerError> {
        let mut signal = InstrumentSignal::from_ticker(ticker)?;

        let fetches = join_all(Timeframe::ALL.iter().map(|&tf| async move {
            (tf, self.fetcher.fetch_series(&ticker.symbol, tf).await)
        }))
        .await;

        for (timeframe, outcome) in fetches {
            let candles = match outcome {
                Ok(candles) => candles,
                Err(e) => {
                    warn!(
                        "⚠️ [BATCH] {}/{} unavailable this cycle: {}",
                        ticker.symbol, timeframe, e
                    );
                    continue;
                }
            };

            let closes: Vec<f64> = candles.iter().map(|c| c.close).collect();
            signal.emas.insert(
                timeframe,
                EmaPair {
                    ema34: ema(&closes, 34),
                    ema89: ema(&closes, 89),
                },
            );

            match timeframe {
                Timeframe::M15 => {
                    signal.m15_last3_candles = last3_summary(&candles);
                    signal.last_bos_m15 = detect_bos(&candles, timeframe, BOS_WINDOW);
                    signal.last_choch_m15 = detect_choch(&candles, timeframe, SWING_LOOKBACK);
                }
                Timeframe::H1 => {
                    signal.last_bos_h1 = detect_bos(&candles, timeframe, BOS_WINDOW);
                    signal.last_choch_h1 = detect_choch(&candles, timeframe, SWING_LOOKBACK);
                }
                _ => {}
            }
        }

        Ok(signal)
    }
}
