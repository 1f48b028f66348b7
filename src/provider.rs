// src/provider.rs - Binance futures REST boundary
use async_trait::async_trait;
use serde_json::Value;

use crate::errors::ScannerError;
use crate::types::{Candle, Ticker, Timeframe};

/// Candles requested per series. 100 covers the longest EMA period (89).
pub const KLINE_LIMIT: usize = 100;

const DEFAULT_BASE_URL: &str = "https://fapi.binance.com/fapi/v1";
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// The remote market-data provider, kept behind a trait so the pipeline can
/// be driven by a mock in tests.
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    async fn klines(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        limit: usize,
    ) -> Result<Vec<Candle>, ScannerError>;

    async fn tickers_24h(&self) -> Result<Vec<Ticker>, ScannerError>;
}

pub struct BinanceFutures {
    client: reqwest::Client,
    base_url: String,
}

impl BinanceFutures {
    pub fn new() -> Result<Self, ScannerError> {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    pub fn with_base_url(base_url: &str) -> Result<Self, ScannerError> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
    ) -> Result<T, ScannerError> {
        let response = self.client.get(url).send().await?;
        let status = response.status().as_u16();
        // 429/418 are the provider's throttling responses; everything else
        // non-2xx is a plain provider failure.
        if status == 429 || status == 418 {
            return Err(ScannerError::Throttled { status });
        }
        if !response.status().is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ScannerError::Provider {
                status: Some(status),
                message,
            });
        }
        Ok(response.json().await?)
    }
}

#[async_trait]
impl MarketDataProvider for BinanceFutures {
    async fn klines(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        limit: usize,
    ) -> Result<Vec<Candle>, ScannerError> {
        let url = format!(
            "{}/klines?symbol={}&interval={}&limit={}",
            self.base_url, symbol, timeframe, limit
        );
        let rows: Vec<Value> = self.get_json(&url).await?;
        rows.iter().map(parse_kline_row).collect()
    }

    async fn tickers_24h(&self) -> Result<Vec<Ticker>, ScannerError> {
        let url = format!("{}/ticker/24hr", self.base_url);
        self.get_json(&url).await
    }
}

/// Kline rows are fixed-position tuples of numeric strings:
/// 0=openTime, 1=open, 2=high, 3=low, 4=close, 5=volume. Index-based access
/// is part of the provider contract.
pub fn parse_kline_row(row: &Value) -> Result<Candle, ScannerError> {
    let fields = row
        .as_array()
        .ok_or_else(|| ScannerError::Parse("kline row is not an array".to_string()))?;
    if fields.len() < 6 {
        return Err(ScannerError::Parse(format!(
            "kline row has {} fields, expected at least 6",
            fields.len()
        )));
    }
    Ok(Candle {
        open_time: fields[0]
            .as_i64()
            .ok_or_else(|| ScannerError::Parse("kline openTime is not an integer".to_string()))?,
        open: tuple_f64(&fields[1], "open")?,
        high: tuple_f64(&fields[2], "high")?,
        low: tuple_f64(&fields[3], "low")?,
        close: tuple_f64(&fields[4], "close")?,
        volume: tuple_f64(&fields[5], "volume")?,
    })
}

fn tuple_f64(value: &Value, field: &str) -> Result<f64, ScannerError> {
    match value {
        Value::String(s) => s
            .parse::<f64>()
            .map_err(|_| ScannerError::Parse(format!("kline {} is not numeric: {:?}", field, s))),
        Value::Number(n) => n
            .as_f64()
            .ok_or_else(|| ScannerError::Parse(format!("kline {} overflows f64", field))),
        other => Err(ScannerError::Parse(format!(
            "kline {} has unexpected type: {}",
            field, other
        ))),
    }
}
