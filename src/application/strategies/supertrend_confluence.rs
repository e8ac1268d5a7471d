use chrono::{DateTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use tracing::{debug, warn};

use crate::domain::errors::{IndicatorError, SignalError};
use crate::domain::market::brick::Direction;
use crate::domain::market::indicators::{
    Crossover, Macd, MacdDirection, MacdOutput, SuperTrend, SuperTrendDirection, SuperTrendOutput,
    VolumeSurge, VolumeSurgeOutput,
};
use crate::domain::trading::signal::{OriginStrategy, Side, Signal, SignalAction, SignalKind};

use super::{ConfluenceStrategy, StrategyContext};

#[derive(Debug, Clone)]
pub struct SuperTrendConfluenceConfig {
    pub supertrend_period: usize,
    pub supertrend_multiplier: f64,
    pub macd_fast: usize,
    pub macd_slow: usize,
    pub macd_signal: usize,
    pub max_risk_per_trade: Decimal,
    pub min_risk_reward: Decimal,
    pub min_confluence_score: u8,
    pub cooldown_seconds: u64,
    pub stop_atr_multiplier: Decimal,
    pub volume_surge_threshold: f64,
    pub trend_strength_threshold: Decimal,
    pub min_consecutive_bricks: u32,
    pub opposite_bricks_exit: u32,
    pub trend_exhaustion_bricks: u32,
    /// Take-profit target, expressed as a brick count out from entry —
    /// independent of `min_risk_reward` so the R:R guard below can fail.
    pub target_bricks: u32,
}

impl Default for SuperTrendConfluenceConfig {
    fn default() -> Self {
        Self {
            supertrend_period: 10,
            supertrend_multiplier: 3.0,
            macd_fast: 12,
            macd_slow: 26,
            macd_signal: 9,
            max_risk_per_trade: Decimal::new(2, 2),
            min_risk_reward: Decimal::from(3),
            min_confluence_score: 7,
            cooldown_seconds: 30,
            stop_atr_multiplier: Decimal::new(15, 1),
            volume_surge_threshold: 1.5,
            trend_strength_threshold: Decimal::new(3, 1),
            min_consecutive_bricks: 3,
            opposite_bricks_exit: 2,
            trend_exhaustion_bricks: 15,
            target_bricks: 6,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct PrimaryCounters {
    pub signals: u64,
    pub confluence_sum: u64,
    pub super_trend_signals: u64,
    pub macd_confirmations: u64,
    pub volume_surges: u64,
    pub signals_rejected_confluence: u64,
    pub signals_rejected_risk_reward: u64,
    pub signals_rejected_not_flat: u64,
    pub signals_rejected_cooldown: u64,
}

impl PrimaryCounters {
    pub fn avg_confluence(&self) -> f64 {
        if self.signals == 0 {
            0.0
        } else {
            self.confluence_sum as f64 / self.signals as f64
        }
    }
}

/// Strategy A — SuperTrend-Renko confluence (C4). Owns its own `SuperTrend`
/// and `Macd` instances, fed one Renko brick at a time as bricks form.
pub struct SuperTrendConfluenceStrategy {
    config: SuperTrendConfluenceConfig,
    super_trend: SuperTrend,
    macd: Macd,
    volume_surge: VolumeSurge,
    last_super_trend: Option<SuperTrendOutput>,
    last_macd: Option<MacdOutput>,
    last_volume_surge: Option<VolumeSurgeOutput>,
    last_action_at: Option<DateTime<Utc>>,
    counters: PrimaryCounters,
}

impl SuperTrendConfluenceStrategy {
    pub fn new(config: SuperTrendConfluenceConfig) -> Self {
        Self {
            super_trend: SuperTrend::new(config.supertrend_period, config.supertrend_multiplier),
            macd: Macd::new(config.macd_fast, config.macd_slow, config.macd_signal),
            volume_surge: VolumeSurge::new(config.volume_surge_threshold),
            config,
            last_super_trend: None,
            last_macd: None,
            last_volume_surge: None,
            last_action_at: None,
            counters: PrimaryCounters::default(),
        }
    }

    pub fn counters(&self) -> &PrimaryCounters {
        &self.counters
    }

    fn confluence_score(&self, consecutive_count: u32, direction: Direction, trend_strength: Decimal) -> u8 {
        let mut score: u8 = 0;

        if let Some(st) = self.last_super_trend {
            if st.direction == SuperTrendDirection::Up {
                score += 3;
            }
        }
        if let Some(macd) = self.last_macd {
            if macd.direction == MacdDirection::Bullish {
                score += 2;
                if macd.crossover == Crossover::BullishCross {
                    score += 1;
                }
            }
        }
        if direction == Direction::Up && consecutive_count >= self.config.min_consecutive_bricks {
            score += 2;
        }
        if self.last_volume_surge.map(|v| v.surge).unwrap_or(false) {
            score += 1;
        }
        if trend_strength >= self.config.trend_strength_threshold {
            score += 1;
        }

        score
    }

    fn try_entry(&mut self, ctx: &StrategyContext) -> Option<Signal> {
        if !ctx.portfolio_flat {
            self.counters.signals_rejected_not_flat += 1;
            warn!(error = %SignalError::RejectedNotFlat, "signal rejected");
            return None;
        }
        if self.in_cooldown(ctx.now) {
            self.counters.signals_rejected_cooldown += 1;
            let remaining_secs = self.last_action_at.map(|last| {
                let elapsed = (ctx.now - last).num_seconds().max(0) as u64;
                self.config.cooldown_seconds.saturating_sub(elapsed)
            }).unwrap_or(0);
            warn!(error = %SignalError::RejectedCooldown { remaining_secs }, "signal rejected");
            return None;
        }
        let Some(brick_size) = ctx.renko.brick_size() else {
            let err = IndicatorError::InsufficientHistory {
                needed: ctx.renko.atr_period() + 1,
                available: ctx.renko.candles_seen(),
            };
            debug!(error = %err, "not enough history to evaluate entry");
            return None;
        };
        let direction = ctx.renko.current_direction();
        let consecutive_count = ctx.renko.consecutive_count();
        let trend_strength = ctx.renko.trend_strength();

        let score = self.confluence_score(consecutive_count, direction, trend_strength);
        if score < self.config.min_confluence_score {
            self.counters.signals_rejected_confluence += 1;
            warn!(error = %SignalError::RejectedConfluence { score, minimum: self.config.min_confluence_score }, "signal rejected");
            return None;
        }

        let atr_brick = Decimal::from_f64_retain(self.last_super_trend?.atr)?;
        let entry = ctx.new_bricks.last()?.close;
        let stop_distance = (brick_size * Decimal::TWO).max(self.config.stop_atr_multiplier * atr_brick);
        let stop = entry - stop_distance;
        if stop_distance <= Decimal::ZERO {
            self.counters.signals_rejected_risk_reward += 1;
            warn!(error = %SignalError::RejectedRiskReward { achieved: Decimal::ZERO, minimum: self.config.min_risk_reward }, "signal rejected");
            return None;
        }

        let take_profit = entry + brick_size * Decimal::from(self.config.target_bricks);
        let risk_reward = (take_profit - entry) / stop_distance;
        if risk_reward < self.config.min_risk_reward {
            self.counters.signals_rejected_risk_reward += 1;
            warn!(error = %SignalError::RejectedRiskReward { achieved: risk_reward, minimum: self.config.min_risk_reward }, "signal rejected");
            return None;
        }

        let risk_amount = self.config.max_risk_per_trade * ctx.equity / stop_distance;
        let cap_amount = ctx.max_position_fraction * ctx.equity / entry;
        let position_size = risk_amount.min(cap_amount);
        if position_size <= Decimal::ZERO {
            return None;
        }

        self.last_action_at = Some(ctx.now);
        self.counters.signals += 1;
        self.counters.confluence_sum += score as u64;
        if self.last_super_trend.map(|s| s.direction == SuperTrendDirection::Up).unwrap_or(false) {
            self.counters.super_trend_signals += 1;
        }
        if self.last_macd.map(|m| m.direction == MacdDirection::Bullish).unwrap_or(false) {
            self.counters.macd_confirmations += 1;
        }
        if self.last_volume_surge.map(|v| v.surge).unwrap_or(false) {
            self.counters.volume_surges += 1;
        }

        Some(Signal {
            action: SignalAction::Buy,
            kind: SignalKind::LongEntry,
            side: Side::Long,
            price: entry,
            confidence: Decimal::from(score) / Decimal::from(10),
            reason: format!("supertrend confluence score {score}/10"),
            take_profit: Some(take_profit),
            stop_loss: Some(stop),
            risk_reward: Some(risk_reward),
            confluence_score: Some(score),
            position_size,
            origin_strategy: OriginStrategy::A,
            time: ctx.now,
        })
    }

    fn try_exit(&mut self, ctx: &StrategyContext) -> Option<Signal> {
        let position = ctx.my_position?;
        let direction = ctx.renko.current_direction();
        let consecutive_count = ctx.renko.consecutive_count();

        let st_flip = self.last_super_trend.map(|s| s.direction == SuperTrendDirection::Down).unwrap_or(false);
        let opposite_bricks = direction == Direction::Down && consecutive_count >= self.config.opposite_bricks_exit;
        let exhaustion = direction == Direction::Up && consecutive_count >= self.config.trend_exhaustion_bricks;

        if !(st_flip || opposite_bricks || exhaustion) {
            return None;
        }

        let reason = if st_flip {
            "supertrend direction flipped against position"
        } else if opposite_bricks {
            "consecutive opposite bricks"
        } else {
            "trend exhaustion"
        };

        self.last_action_at = Some(ctx.now);
        let last_close = ctx.new_bricks.last().map(|b| b.close).unwrap_or(position.entry_price);

        Some(Signal {
            action: SignalAction::Sell,
            kind: SignalKind::Exit,
            side: Side::Long,
            price: last_close,
            confidence: Decimal::ONE,
            reason: reason.to_string(),
            take_profit: None,
            stop_loss: None,
            risk_reward: None,
            confluence_score: None,
            position_size: position.quantity,
            origin_strategy: OriginStrategy::A,
            time: ctx.now,
        })
    }
}

impl ConfluenceStrategy for SuperTrendConfluenceStrategy {
    fn name(&self) -> &'static str {
        "SuperTrend-Renko Confluence"
    }

    fn origin(&self) -> OriginStrategy {
        OriginStrategy::A
    }

    fn cooldown_seconds(&self) -> u64 {
        self.config.cooldown_seconds
    }

    fn last_action_at(&self) -> Option<DateTime<Utc>> {
        self.last_action_at
    }

    fn evaluate(&mut self, ctx: &StrategyContext) -> Option<Signal> {
        for brick in ctx.new_bricks {
            let bar = brick.into();
            if let Some(st) = self.super_trend.next(bar) {
                self.last_super_trend = Some(st);
            }
            if let Some(macd) = self.macd.next(brick.close.to_f64().unwrap_or(0.0)) {
                self.last_macd = Some(macd);
            }
        }
        if !ctx.new_bricks.is_empty() {
            if let Some(vs) = self.volume_surge.next(ctx.candle_volume.to_f64().unwrap_or(0.0)) {
                self.last_volume_surge = Some(vs);
            }
        }

        if ctx.my_position.is_some() {
            self.try_exit(ctx)
        } else {
            self.try_entry(ctx)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::market::renko::{RenkoConfig, RenkoEngine};
    use crate::domain::market::candle::{Candle, PriceSource};
    use chrono::{TimeZone, Utc};
    use rust_decimal_macros::dec;

    fn renko_with_bricks(closes: &[Decimal]) -> RenkoEngine {
        let mut engine = RenkoEngine::new(RenkoConfig {
            atr_period: 3,
            atr_multiplier: dec!(1.0),
            price_source: PriceSource::Close,
            price_precision: 2,
            max_brick_history: 1000,
        });
        let t = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        for &c in closes {
            engine
                .on_candle(&Candle {
                    bucket_start: t,
                    open: c,
                    high: c,
                    low: c,
                    close: c,
                    volume: dec!(1),
                    closed: true,
                })
                .unwrap();
        }
        engine
    }

    /// S3 — confluence reject below minimum.
    #[test]
    fn rejects_when_confluence_below_minimum() {
        let mut strategy = SuperTrendConfluenceStrategy::new(SuperTrendConfluenceConfig {
            min_confluence_score: 7,
            ..Default::default()
        });
        let engine = renko_with_bricks(&[dec!(100), dec!(101), dec!(99), dec!(100), dec!(101)]);
        let ctx = StrategyContext {
            new_bricks: &[],
            renko: &engine,
            now: Utc.with_ymd_and_hms(2026, 1, 1, 0, 5, 0).unwrap(),
            portfolio_flat: true,
            my_position: None,
            equity: dec!(100_000),
            max_position_fraction: dec!(1.0),
            candle_volume: dec!(1),
        };
        // With no SuperTrend/MACD warmed up, score is 0.
        assert!(strategy.try_entry(&ctx).is_none());
        assert_eq!(strategy.counters().signals_rejected_confluence, 1);
    }

    #[test]
    fn cooldown_blocks_entries_for_configured_window() {
        let strategy = SuperTrendConfluenceStrategy::new(SuperTrendConfluenceConfig::default());
        let t0 = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        assert!(!strategy.in_cooldown(t0));
    }

    #[test]
    fn not_flat_portfolio_is_rejected_and_counted() {
        let mut strategy = SuperTrendConfluenceStrategy::new(SuperTrendConfluenceConfig::default());
        let engine = renko_with_bricks(&[dec!(100), dec!(101), dec!(99), dec!(100), dec!(101)]);
        let ctx = StrategyContext {
            new_bricks: &[],
            renko: &engine,
            now: Utc.with_ymd_and_hms(2026, 1, 1, 0, 5, 0).unwrap(),
            portfolio_flat: false,
            my_position: None,
            equity: dec!(100_000),
            max_position_fraction: dec!(1.0),
            candle_volume: dec!(1),
        };
        assert!(strategy.try_entry(&ctx).is_none());
        assert_eq!(strategy.counters().signals_rejected_not_flat, 1);
    }

    #[test]
    fn cooldown_window_is_rejected_and_counted() {
        let mut strategy = SuperTrendConfluenceStrategy::new(SuperTrendConfluenceConfig {
            cooldown_seconds: 60,
            ..Default::default()
        });
        let engine = renko_with_bricks(&[dec!(100), dec!(101), dec!(99), dec!(100), dec!(101)]);
        let t0 = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        strategy.last_action_at = Some(t0);

        let ctx = StrategyContext {
            new_bricks: &[],
            renko: &engine,
            now: t0 + chrono::Duration::seconds(10),
            portfolio_flat: true,
            my_position: None,
            equity: dec!(100_000),
            max_position_fraction: dec!(1.0),
            candle_volume: dec!(1),
        };
        assert!(strategy.try_entry(&ctx).is_none());
        assert_eq!(strategy.counters().signals_rejected_cooldown, 1);
    }
}
