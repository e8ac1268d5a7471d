use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A 1-minute OHLCV bucket. `bucket_start` is always aligned to a whole
/// minute. Once `closed` is true the candle is never mutated again.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub bucket_start: DateTime<Utc>,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    pub volume: Decimal,
    pub closed: bool,
}

/// Which OHLC-derived price feeds the Renko engine (C2's `price_source`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PriceSource {
    Close,
    Hl2,
    Hlc3,
    Ohlc4,
}

impl Candle {
    pub fn open_at(bucket_start: DateTime<Utc>, price: Decimal, volume: Decimal) -> Self {
        Self {
            bucket_start,
            open: price,
            high: price,
            low: price,
            close: price,
            volume,
            closed: false,
        }
    }

    pub fn update(&mut self, price: Decimal, volume: Decimal) {
        debug_assert!(!self.closed, "a closed candle must never be mutated");
        self.high = self.high.max(price);
        self.low = self.low.min(price);
        self.close = price;
        self.volume += volume;
    }

    pub fn close_bucket(mut self) -> Self {
        self.closed = true;
        self
    }

    /// Selects the price that drives Renko brick formation for this candle.
    pub fn source_price(&self, source: PriceSource) -> Decimal {
        match source {
            PriceSource::Close => self.close,
            PriceSource::Hl2 => (self.high + self.low) / Decimal::TWO,
            PriceSource::Hlc3 => (self.high + self.low + self.close) / Decimal::from(3),
            PriceSource::Ohlc4 => (self.open + self.high + self.low + self.close) / Decimal::from(4),
        }
    }

    pub fn true_range(&self, prev_close: Option<Decimal>) -> Decimal {
        let hl = self.high - self.low;
        match prev_close {
            None => hl,
            Some(pc) => hl.max((self.high - pc).abs()).max((self.low - pc).abs()),
        }
    }
}
