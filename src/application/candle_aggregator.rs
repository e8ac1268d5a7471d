use rust_decimal::Decimal;

use crate::domain::errors::TickError;
use crate::domain::market::candle::Candle;
use crate::domain::market::tick::Tick;

/// Buckets ticks into 1-minute OHLCV candles (C1). Open stays fixed at the
/// bucket's first observed price; high/low are running extrema; volume is
/// summed. No synthetic high/low inflation from the incoming price — the
/// legacy ±0.01% padding this spec replaces is a defect, not a feature.
#[derive(Debug, Clone, Default)]
pub struct CandleAggregator {
    current: Option<Candle>,
}

impl CandleAggregator {
    pub fn new() -> Self {
        Self { current: None }
    }

    /// Returns the just-closed candle exactly when `tick` crosses a minute
    /// boundary. Gaps never synthesize intermediate candles — the next tick
    /// simply starts its own minute.
    pub fn ingest(&mut self, tick: &Tick) -> Result<Option<Candle>, TickError> {
        if tick.price <= Decimal::ZERO {
            return Err(TickError::InvalidPrice { price: tick.price });
        }
        if tick.volume < Decimal::ZERO {
            return Err(TickError::InvalidVolume { volume: tick.volume });
        }

        let bucket = tick.minute_bucket();

        match &mut self.current {
            None => {
                self.current = Some(Candle::open_at(bucket, tick.price, tick.volume));
                Ok(None)
            }
            Some(candle) if candle.bucket_start == bucket => {
                candle.update(tick.price, tick.volume);
                Ok(None)
            }
            Some(_) => {
                let closed = self.current.take().unwrap().close_bucket();
                self.current = Some(Candle::open_at(bucket, tick.price, tick.volume));
                Ok(Some(closed))
            }
        }
    }

    pub fn current(&self) -> Option<&Candle> {
        self.current.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use rust_decimal_macros::dec;

    fn tick_at(price: Decimal, volume: Decimal, hh: u32, mm: u32, ss: u32) -> Tick {
        let t = Utc.with_ymd_and_hms(2026, 1, 1, hh, mm, ss).unwrap();
        Tick::new(price, volume, t).unwrap()
    }

    #[test]
    fn first_tick_opens_a_bucket_with_no_emission() {
        let mut agg = CandleAggregator::new();
        let result = agg.ingest(&tick_at(dec!(100), dec!(1), 10, 0, 5)).unwrap();
        assert!(result.is_none());
        assert_eq!(agg.current().unwrap().open, dec!(100));
    }

    #[test]
    fn same_minute_ticks_update_without_emitting() {
        let mut agg = CandleAggregator::new();
        agg.ingest(&tick_at(dec!(100), dec!(1), 10, 0, 0)).unwrap();
        agg.ingest(&tick_at(dec!(105), dec!(2), 10, 0, 30)).unwrap();
        let result = agg.ingest(&tick_at(dec!(95), dec!(3), 10, 0, 59)).unwrap();
        assert!(result.is_none());
        let c = agg.current().unwrap();
        assert_eq!(c.high, dec!(105));
        assert_eq!(c.low, dec!(95));
        assert_eq!(c.close, dec!(95));
        assert_eq!(c.volume, dec!(6));
    }

    #[test]
    fn crossing_a_minute_emits_the_previous_bucket_closed() {
        let mut agg = CandleAggregator::new();
        agg.ingest(&tick_at(dec!(100), dec!(1), 10, 0, 0)).unwrap();
        let emitted = agg.ingest(&tick_at(dec!(110), dec!(1), 10, 1, 0)).unwrap().unwrap();
        assert!(emitted.closed);
        assert_eq!(emitted.close, dec!(100));
        // the new tick opens the new bucket, not a reopen of the old one
        assert_eq!(agg.current().unwrap().open, dec!(110));
    }

    #[test]
    fn gaps_do_not_synthesize_intermediate_candles() {
        let mut agg = CandleAggregator::new();
        agg.ingest(&tick_at(dec!(100), dec!(1), 10, 0, 0)).unwrap();
        let emitted = agg.ingest(&tick_at(dec!(120), dec!(1), 10, 7, 0)).unwrap();
        assert!(emitted.is_some(), "only one candle is emitted, not six");
        assert_eq!(agg.current().unwrap().bucket_start.format("%H:%M").to_string(), "10:07");
    }

    #[test]
    fn rejects_invalid_ticks_without_mutating_state() {
        let mut agg = CandleAggregator::new();
        agg.ingest(&tick_at(dec!(100), dec!(1), 10, 0, 0)).unwrap();
        let bad = Tick { price: dec!(-1), volume: dec!(1), arrival_time: Utc.with_ymd_and_hms(2026, 1, 1, 10, 0, 30).unwrap() };
        assert!(agg.ingest(&bad).is_err());
        assert_eq!(agg.current().unwrap().close, dec!(100));
    }
}
