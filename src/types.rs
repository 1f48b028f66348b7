// src/types.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::errors::ScannerError;

/// Candle aggregation intervals the scanner works on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Timeframe {
    #[serde(rename = "5m")]
    M5,
    #[serde(rename = "15m")]
    M15,
    #[serde(rename = "1h")]
    H1,
    #[serde(rename = "4h")]
    H4,
    #[serde(rename = "1d")]
    D1,
}

impl Timeframe {
    pub const ALL: [Timeframe; 5] = [
        Timeframe::M5,
        Timeframe::M15,
        Timeframe::H1,
        Timeframe::H4,
        Timeframe::D1,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Timeframe::M5 => "5m",
            Timeframe::M15 => "15m",
            Timeframe::H1 => "1h",
            Timeframe::H4 => "4h",
            Timeframe::D1 => "1d",
        }
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One price candle. Immutable once fetched; series are ordered by
/// strictly increasing open_time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candle {
    pub open_time: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

/// 24h ticker row as the provider returns it. Numeric fields arrive as
/// strings and are parsed at the point of use.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ticker {
    pub symbol: String,
    pub last_price: String,
    pub quote_volume: String,
    pub price_change_percent: String,
}

impl Ticker {
    pub fn last_price_f64(&self) -> Result<f64, ScannerError> {
        parse_decimal(&self.last_price, "lastPrice")
    }

    pub fn quote_volume_f64(&self) -> Result<f64, ScannerError> {
        parse_decimal(&self.quote_volume, "quoteVolume")
    }

    pub fn price_change_percent_f64(&self) -> Result<f64, ScannerError> {
        parse_decimal(&self.price_change_percent, "priceChangePercent")
    }
}

fn parse_decimal(raw: &str, field: &str) -> Result<f64, ScannerError> {
    raw.parse::<f64>()
        .map_err(|_| ScannerError::Parse(format!("{} is not numeric: {:?}", field, raw)))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Bullish,
    Bearish,
}

/// A confirmed structural break (BOS or CHoCH). Only the newest event per
/// (instrument, timeframe, detector) is retained.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructureEvent {
    pub kind: EventKind,
    #[serde(rename = "atTime")]
    pub at_time: i64,
    pub price: f64,
    #[serde(rename = "structureLevel", skip_serializing_if = "Option::is_none")]
    pub structure_level: Option<f64>,
    pub timeframe: Timeframe,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CandleColor {
    Green,
    Red,
}

/// Color/volume digest of the last three 15m candles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandleSummary {
    pub colors: Vec<CandleColor>,
    pub volumes: Vec<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct EmaPair {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ema34: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ema89: Option<f64>,
}

/// Aggregate per-instrument record for one ingestion cycle. Built once,
/// never mutated; the next cycle replaces it wholesale.
#[derive(Debug, Clone, PartialEq)]
pub struct InstrumentSignal {
    pub symbol: String,
    pub current_price: f64,
    pub volume24h: f64,
    pub price_change_percent: f64,
    /// EMA34/EMA89 per timeframe; a timeframe that failed this cycle is absent.
    pub emas: BTreeMap<Timeframe, EmaPair>,
    pub m15_last3_candles: Option<CandleSummary>,
    pub last_choch_m15: Option<StructureEvent>,
    pub last_choch_h1: Option<StructureEvent>,
    pub last_bos_m15: Option<StructureEvent>,
    pub last_bos_h1: Option<StructureEvent>,
}

/// Consumers read the per-timeframe EMAs as flat `ema34_<tf>`/`ema89_<tf>`
/// keys, so the map is flattened by hand instead of derived.
impl Serialize for InstrumentSignal {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeMap;

        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("symbol", &self.symbol)?;
        map.serialize_entry("currentPrice", &self.current_price)?;
        map.serialize_entry("volume24h", &self.volume24h)?;
        map.serialize_entry("priceChangePercent", &self.price_change_percent)?;
        for (timeframe, pair) in &self.emas {
            if let Some(ema34) = pair.ema34 {
                map.serialize_entry(&format!("ema34_{}", timeframe), &ema34)?;
            }
            if let Some(ema89) = pair.ema89 {
                map.serialize_entry(&format!("ema89_{}", timeframe), &ema89)?;
            }
        }
        map.serialize_entry("m15_last3_candles", &self.m15_last3_candles)?;
        map.serialize_entry("lastCHoCH", &self.last_choch_m15)?;
        map.serialize_entry("lastCHoCHH1", &self.last_choch_h1)?;
        map.serialize_entry("lastBOSM15", &self.last_bos_m15)?;
        map.serialize_entry("lastBOSH1", &self.last_bos_h1)?;
        map.end()
    }
}

impl InstrumentSignal {
    /// Skeleton record with the ticker-derived fields filled in and every
    /// derived slot still empty.
    pub fn from_ticker(ticker: &Ticker) -> Result<Self, ScannerError> {
        Ok(Self {
            symbol: ticker.symbol.clone(),
            current_price: ticker.last_price_f64()?,
            volume24h: ticker.quote_volume_f64()?,
            price_change_percent: ticker.price_change_percent_f64()?,
            emas: BTreeMap::new(),
            m15_last3_candles: None,
            last_choch_m15: None,
            last_choch_h1: None,
            last_bos_m15: None,
            last_bos_h1: None,
        })
    }
}

/// The process-wide aggregate served to consumers. Replaced atomically on a
/// successful cycle; readers never observe a partial update.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub fetched_at: DateTime<Utc>,
    pub signals: Vec<InstrumentSignal>,
}
