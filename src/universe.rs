// src/universe.rs - top-N instrument selection by traded quote volume
use log::{debug, info};

use crate::config::ScannerConfig;
use crate::errors::ScannerError;
use crate::fetcher::with_retry;
use crate::provider::MarketDataProvider;
use crate::types::Ticker;

/// One ticker-listing call (same retry contract as the candle fetcher),
/// ranked and truncated to the configured universe size.
pub async fn top_instruments(
    provider: &dyn MarketDataProvider,
    config: &ScannerConfig,
) -> Result<Vec<Ticker>, ScannerError> {
    let tickers = with_retry(
        "ticker/24hr",
        config.max_retries,
        config.base_delay,
        || provider.tickers_24h(),
    )
    .await?;
    let total = tickers.len();
    let universe = rank_tickers(tickers, &config.quote_asset, config.top_n);
    info!(
        "🌐 [UNIVERSE] selected top {} of {} tickers (quote {})",
        universe.len(),
        total,
        config.quote_asset
    );
    Ok(universe)
}

/// Filter to the settlement asset, sort descending by quote volume and keep
/// the top N. The sort is stable, so equal volumes keep provider order.
pub fn rank_tickers(tickers: Vec<Ticker>, quote_asset: &str, top_n: usize) -> Vec<Ticker> {
    let mut ranked: Vec<(f64, Ticker)> = tickers
        .into_iter()
        .filter(|t| t.symbol.ends_with(quote_asset))
        .filter_map(|t| match t.quote_volume_f64() {
            Ok(volume) if volume.is_finite() => Some((volume, t)),
            Ok(volume) => {
                debug!(
                    "🚫 [UNIVERSE] skipping {}: non-finite quoteVolume {}",
                    t.symbol, volume
                );
                None
            }
            Err(e) => {
                debug!("🚫 [UNIVERSE] skipping {}: {}", t.symbol, e);
                None
            }
        })
        .collect();
    ranked.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
    ranked.truncate(top_n);
    ranked.into_iter().map(|(_, t)| t).collect()
}
