use std::collections::VecDeque;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use tracing::{debug, info};

use crate::domain::errors::IndicatorError;
use crate::domain::market::brick::{Brick, Direction};
use crate::domain::market::candle::{Candle, PriceSource};

const CANDLE_HISTORY_CAP: usize = 200;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RenkoEvent {
    BrickSizeCalculated { brick_size: Decimal },
    NewBrick { brick: Brick },
    MultipleBricks { count: usize },
    TrendChange { from: Direction, to: Direction },
}

#[derive(Debug, Clone, Default)]
pub struct RenkoUpdate {
    pub bricks_formed: Vec<Brick>,
    pub events: Vec<RenkoEvent>,
}

impl RenkoUpdate {
    fn empty() -> Self {
        Self::default()
    }
}

#[derive(Debug, Clone)]
pub struct RenkoConfig {
    pub atr_period: usize,
    pub atr_multiplier: Decimal,
    pub price_source: PriceSource,
    pub price_precision: u32,
    pub max_brick_history: usize,
}

/// ATR-sized Renko construction engine (C2). Two independent instances run
/// in the session, one per strategy, with different `atr_multiplier`s —
/// they are never fused because the strategies need different brick sizes.
#[derive(Debug, Clone)]
pub struct RenkoEngine {
    config: RenkoConfig,
    candle_history: VecDeque<Candle>,
    candles_seen: u64,
    brick_size: Option<Decimal>,
    bricks: VecDeque<Brick>,
    next_seq: u64,
    last_brick_close: Option<Decimal>,
    current_direction: Direction,
    consecutive_count: u32,
    trend_strength: Decimal,
    trend_change_count: u64,
}

impl RenkoEngine {
    pub fn new(config: RenkoConfig) -> Self {
        Self {
            config,
            candle_history: VecDeque::with_capacity(CANDLE_HISTORY_CAP),
            candles_seen: 0,
            brick_size: None,
            bricks: VecDeque::new(),
            next_seq: 0,
            last_brick_close: None,
            current_direction: Direction::Init,
            consecutive_count: 0,
            trend_strength: Decimal::ZERO,
            trend_change_count: 0,
        }
    }

    pub fn brick_size(&self) -> Option<Decimal> {
        self.brick_size
    }

    pub fn bricks(&self) -> &VecDeque<Brick> {
        &self.bricks
    }

    pub fn current_direction(&self) -> Direction {
        self.current_direction
    }

    pub fn consecutive_count(&self) -> u32 {
        self.consecutive_count
    }

    pub fn trend_strength(&self) -> Decimal {
        self.trend_strength
    }

    pub fn trend_change_count(&self) -> u64 {
        self.trend_change_count
    }

    pub fn atr_period(&self) -> usize {
        self.config.atr_period
    }

    pub fn candles_seen(&self) -> usize {
        self.candles_seen as usize
    }

    pub fn on_candle(&mut self, candle: &Candle) -> Result<RenkoUpdate, IndicatorError> {
        let source_price = candle.source_price(self.config.price_source);
        if source_price <= Decimal::ZERO {
            return Err(IndicatorError::InvalidPrice { price: source_price });
        }

        self.candles_seen += 1;
        self.candle_history.push_back(*candle);
        if self.candle_history.len() > CANDLE_HISTORY_CAP {
            self.candle_history.pop_front();
        }

        let mut update = RenkoUpdate::empty();

        if self.brick_size.is_none() {
            if let Some(size) = self.try_compute_brick_size() {
                self.brick_size = Some(size);
                self.last_brick_close = Some(source_price);
                info!(brick_size = %size, "renko brick size calculated");
                update.events.push(RenkoEvent::BrickSizeCalculated { brick_size: size });
            } else {
                return Ok(update);
            }
        }

        let brick_size = self.brick_size.expect("brick size set above");
        let last_close = self.last_brick_close.expect("anchor set with brick size");
        let delta = source_price - last_close;

        if delta.abs() < brick_size {
            return Ok(update);
        }

        let n_bricks = (delta.abs() / brick_size).trunc().to_u64().unwrap_or(0);
        let dir = if delta > Decimal::ZERO { Direction::Up } else { Direction::Down };
        let sign = Decimal::from(dir.sign());

        let mut cursor = last_close;
        let mut flipped: Option<(Direction, Direction)> = None;

        for _ in 0..n_bricks {
            let open = cursor;
            let close = open + sign * brick_size;

            if self.current_direction != Direction::Init && dir.opposite_of(self.current_direction) {
                if flipped.is_none() {
                    flipped = Some((self.current_direction, dir));
                }
                self.consecutive_count = 1;
            } else {
                self.consecutive_count += 1;
            }
            self.current_direction = dir;

            let brick = Brick {
                seq: self.next_seq,
                direction: dir,
                open,
                close,
                size: brick_size,
                formed_at_candle: self.candles_seen,
                consecutive_count: self.consecutive_count,
            };
            self.next_seq += 1;
            cursor = close;

            self.trend_strength = (self.trend_strength + Decimal::new(1, 1) * sign).clamp(-Decimal::ONE, Decimal::ONE);
            self.trend_strength *= Decimal::new(98, 2);

            debug!(seq = brick.seq, ?dir, close = %brick.close, "renko brick formed");
            update.events.push(RenkoEvent::NewBrick { brick });
            update.bricks_formed.push(brick);
            self.bricks.push_back(brick);
        }

        self.last_brick_close = Some(cursor);

        if let Some((from, to)) = flipped {
            self.trend_change_count += 1;
            update.events.push(RenkoEvent::TrendChange { from, to });
        }
        if n_bricks > 1 {
            update.events.push(RenkoEvent::MultipleBricks { count: n_bricks as usize });
        }

        self.trim_brick_history();

        Ok(update)
    }

    fn trim_brick_history(&mut self) {
        if self.bricks.len() > self.config.max_brick_history {
            let keep = self.config.max_brick_history / 2;
            while self.bricks.len() > keep {
                self.bricks.pop_front();
            }
        }
    }

    fn try_compute_brick_size(&self) -> Option<Decimal> {
        let period = self.config.atr_period;
        if self.candle_history.len() < period + 1 {
            return None;
        }

        let window: Vec<&Candle> = self
            .candle_history
            .iter()
            .rev()
            .take(period + 1)
            .collect::<Vec<_>>()
            .into_iter()
            .rev()
            .collect();

        let mut tr_sum = Decimal::ZERO;
        for i in 1..window.len() {
            tr_sum += window[i].true_range(Some(window[i - 1].close));
        }
        let atr = tr_sum / Decimal::from(period);

        let close_sum: Decimal = window.iter().skip(1).map(|c| c.close).sum();
        let avg_close = close_sum / Decimal::from(period);

        let raw = (atr * self.config.atr_multiplier).max(avg_close * Decimal::new(1, 4));
        Some(raw.round_dp(self.config.price_precision))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use rust_decimal_macros::dec;

    fn candle_at(close: Decimal) -> Candle {
        Candle {
            bucket_start: Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap(),
            open: close,
            high: close,
            low: close,
            close,
            volume: Decimal::ZERO,
            closed: true,
        }
    }

    fn fixed_engine(brick_size: Decimal, last_close: Decimal) -> RenkoEngine {
        let mut engine = RenkoEngine::new(RenkoConfig {
            atr_period: 14,
            atr_multiplier: dec!(0.326),
            price_source: PriceSource::Close,
            price_precision: 2,
            max_brick_history: 1000,
        });
        engine.brick_size = Some(brick_size);
        engine.last_brick_close = Some(last_close);
        engine.candles_seen = 1;
        engine
    }

    /// S1 — brick_size=100, last_brick_close=100_000, candle closes at 100_350.
    #[test]
    fn s1_multi_brick_formation() {
        let mut engine = fixed_engine(dec!(100), dec!(100_000));
        let update = engine.on_candle(&candle_at(dec!(100_350))).unwrap();

        let closes: Vec<Decimal> = update.bricks_formed.iter().map(|b| b.close).collect();
        assert_eq!(closes, vec![dec!(100_100), dec!(100_200), dec!(100_300)]);
        assert_eq!(engine.last_brick_close, Some(dec!(100_300)));
        assert_eq!(engine.consecutive_count, 3);
        assert!(update.events.iter().any(|e| matches!(e, RenkoEvent::MultipleBricks { count: 3 })));
    }

    #[test]
    fn sub_threshold_move_forms_no_brick() {
        let mut engine = fixed_engine(dec!(100), dec!(100_000));
        let update = engine.on_candle(&candle_at(dec!(100_050))).unwrap();
        assert!(update.bricks_formed.is_empty());
        assert_eq!(engine.last_brick_close, Some(dec!(100_000)));
    }

    #[test]
    fn reversal_resets_then_continues_consecutive_count() {
        let mut engine = fixed_engine(dec!(100), dec!(100_000));
        engine.current_direction = Direction::Up;
        engine.consecutive_count = 5;

        let update = engine.on_candle(&candle_at(dec!(99_750))).unwrap();
        // delta = -250 -> 2 Down bricks
        assert_eq!(update.bricks_formed.len(), 2);
        assert_eq!(update.bricks_formed[0].consecutive_count, 1);
        assert_eq!(update.bricks_formed[1].consecutive_count, 2);
        assert!(update
            .events
            .iter()
            .any(|e| matches!(e, RenkoEvent::TrendChange { from: Direction::Up, to: Direction::Down })));
    }

    #[test]
    fn brick_open_chains_from_previous_close() {
        let mut engine = fixed_engine(dec!(50), dec!(1000));
        let update = engine.on_candle(&candle_at(dec!(1125))).unwrap();
        for pair in update.bricks_formed.windows(2) {
            assert_eq!(pair[1].open, pair[0].close);
        }
        for b in &update.bricks_formed {
            assert_eq!((b.close - b.open).abs(), b.size);
        }
    }

    #[test]
    fn pre_init_engine_refuses_to_form_bricks() {
        let mut engine = RenkoEngine::new(RenkoConfig {
            atr_period: 14,
            atr_multiplier: dec!(0.326),
            price_source: PriceSource::Close,
            price_precision: 2,
            max_brick_history: 1000,
        });
        let update = engine.on_candle(&candle_at(dec!(100))).unwrap();
        assert!(update.bricks_formed.is_empty());
        assert!(engine.brick_size().is_none());
    }

    #[test]
    fn brick_size_locks_after_enough_history() {
        let mut engine = RenkoEngine::new(RenkoConfig {
            atr_period: 3,
            atr_multiplier: dec!(1.0),
            price_source: PriceSource::Close,
            price_precision: 2,
            max_brick_history: 1000,
        });
        let closes = [dec!(100), dec!(101), dec!(99), dec!(102)];
        let mut last_size = None;
        for c in closes {
            let update = engine.on_candle(&candle_at(c)).unwrap();
            if let Some(size) = engine.brick_size() {
                last_size = Some(size);
                if update
                    .events
                    .iter()
                    .any(|e| matches!(e, RenkoEvent::BrickSizeCalculated { .. }))
                {
                    break;
                }
            }
        }
        assert!(last_size.is_some());
        let frozen = last_size.unwrap();
        engine.on_candle(&candle_at(dec!(500))).unwrap();
        assert_eq!(engine.brick_size(), Some(frozen), "brick size must stay frozen once computed");
    }

    #[test]
    fn invalid_price_is_rejected() {
        let mut engine = fixed_engine(dec!(100), dec!(100_000));
        let mut bad = candle_at(dec!(-5));
        bad.close = dec!(-5);
        let result = engine.on_candle(&bad);
        assert!(result.is_err());
    }

    #[test]
    fn trend_strength_decays_and_clamps() {
        let mut engine = fixed_engine(dec!(10), dec!(1000));
        for _ in 0..50 {
            engine.on_candle(&candle_at(engine.last_brick_close.unwrap() + dec!(20))).unwrap();
        }
        assert!(engine.trend_strength() <= Decimal::ONE);
        assert!(engine.trend_strength() >= -Decimal::ONE);
    }
}
