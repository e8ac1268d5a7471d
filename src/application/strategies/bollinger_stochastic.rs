use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use tracing::warn;

use crate::domain::errors::SignalError;
use crate::domain::market::indicators::{Bollinger, BollingerOutput, Ema, Stochastic, StochasticOutput};
use crate::domain::trading::signal::{OriginStrategy, Side, Signal, SignalAction, SignalKind};

use super::{ConfluenceStrategy, StrategyContext};

const SWING_LOW_WINDOW: usize = 10;

#[derive(Debug, Clone)]
pub struct BollingerStochasticConfig {
    pub bollinger_period: usize,
    pub bollinger_stddev: f64,
    pub stochastic_k: usize,
    pub stochastic_d: usize,
    pub ema_period: usize,
    pub max_risk_per_trade: Decimal,
    pub risk_reward_ratio: Decimal,
    pub cooldown_seconds: u64,
    pub swing_low_buffer: Decimal,
    pub stochastic_oversold: f64,
    pub stochastic_overbought: f64,
}

impl Default for BollingerStochasticConfig {
    fn default() -> Self {
        Self {
            bollinger_period: 20,
            bollinger_stddev: 2.0,
            stochastic_k: 14,
            stochastic_d: 3,
            ema_period: 21,
            max_risk_per_trade: Decimal::new(15, 3),
            risk_reward_ratio: Decimal::TWO,
            cooldown_seconds: 45,
            swing_low_buffer: Decimal::new(5, 1),
            stochastic_oversold: 20.0,
            stochastic_overbought: 80.0,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct SecondaryCounters {
    pub signals: u64,
    pub bollinger_bounces: u64,
    pub stochastic_crossovers: u64,
    pub ema_trend_filters: u64,
    pub signals_rejected_filter: u64,
    pub signals_rejected_not_flat: u64,
    pub signals_rejected_cooldown: u64,
}

/// Strategy B — Bollinger/Stochastic mean reversion (C5).
pub struct BollingerStochasticStrategy {
    config: BollingerStochasticConfig,
    bollinger: Bollinger,
    stochastic: Stochastic,
    ema: Ema,
    last_bollinger: Option<BollingerOutput>,
    last_stochastic: Option<StochasticOutput>,
    prev_stochastic: Option<StochasticOutput>,
    last_close: Option<Decimal>,
    recent_lows: VecDeque<Decimal>,
    last_action_at: Option<DateTime<Utc>>,
    counters: SecondaryCounters,
}

impl BollingerStochasticStrategy {
    pub fn new(config: BollingerStochasticConfig) -> Self {
        Self {
            bollinger: Bollinger::new(config.bollinger_period, config.bollinger_stddev),
            stochastic: Stochastic::new(config.stochastic_k, config.stochastic_d),
            ema: Ema::new(config.ema_period),
            config,
            last_bollinger: None,
            last_stochastic: None,
            prev_stochastic: None,
            last_close: None,
            recent_lows: VecDeque::with_capacity(SWING_LOW_WINDOW),
            last_action_at: None,
            counters: SecondaryCounters::default(),
        }
    }

    pub fn counters(&self) -> &SecondaryCounters {
        &self.counters
    }

    fn stoch_crossed_above_d(&self) -> bool {
        match (self.prev_stochastic, self.last_stochastic) {
            (Some(prev), Some(cur)) => prev.k <= prev.d && cur.k > cur.d,
            _ => false,
        }
    }

    fn stoch_crossed_below_d(&self) -> bool {
        match (self.prev_stochastic, self.last_stochastic) {
            (Some(prev), Some(cur)) => prev.k >= prev.d && cur.k < cur.d,
            _ => false,
        }
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
        let brick_size = ctx.renko.brick_size()?;
        let bollinger = self.last_bollinger?;
        let stochastic = self.last_stochastic?;
        let close = self.last_close?;
        let ema = self.ema.value()?;

        let bands_touch = close.to_f64().unwrap_or(0.0) <= bollinger.lower;
        let oversold = stochastic.k < self.config.stochastic_oversold;
        let stoch_cross = self.stoch_crossed_above_d();
        let ema_above = close.to_f64().unwrap_or(0.0) > ema;

        if !(bands_touch && oversold && stoch_cross && ema_above) {
            self.counters.signals_rejected_filter += 1;
            return None;
        }

        let swing_low = self.recent_lows.iter().copied().fold(Decimal::MAX, |a, b| a.min(b));
        let entry = close;
        let stop = swing_low - self.config.swing_low_buffer * brick_size;
        let stop_distance = entry - stop;
        if stop_distance <= Decimal::ZERO {
            self.counters.signals_rejected_filter += 1;
            return None;
        }
        let take_profit = entry + self.config.risk_reward_ratio * stop_distance;

        let confidence = (Decimal::new(4, 1)
            + Decimal::new(2, 1) * Decimal::from(bands_touch as u8)
            + Decimal::new(2, 1) * Decimal::from(stoch_cross as u8)
            + Decimal::new(2, 1) * Decimal::from(ema_above as u8))
        .min(Decimal::ONE);

        let risk_amount = self.config.max_risk_per_trade * ctx.equity / stop_distance;
        let cap_amount = ctx.max_position_fraction * ctx.equity / entry;
        let position_size = risk_amount.min(cap_amount);
        if position_size <= Decimal::ZERO {
            return None;
        }

        self.last_action_at = Some(ctx.now);
        self.counters.signals += 1;
        self.counters.bollinger_bounces += 1;
        self.counters.stochastic_crossovers += 1;
        if ema_above {
            self.counters.ema_trend_filters += 1;
        }

        Some(Signal {
            action: SignalAction::Buy,
            kind: SignalKind::LongEntry,
            side: Side::Long,
            price: entry,
            confidence,
            reason: "bollinger lower band bounce with stochastic cross".to_string(),
            take_profit: Some(take_profit),
            stop_loss: Some(stop),
            risk_reward: Some(self.config.risk_reward_ratio),
            confluence_score: None,
            position_size,
            origin_strategy: OriginStrategy::B,
            time: ctx.now,
        })
    }

    fn try_exit(&mut self, ctx: &StrategyContext) -> Option<Signal> {
        let position = ctx.my_position?;
        let bollinger = self.last_bollinger?;
        let stochastic = self.last_stochastic?;
        let close = self.last_close?;
        let ema = self.ema.value()?;

        let upper_cross = close.to_f64().unwrap_or(0.0) >= bollinger.upper;
        let overbought_cross = stochastic.k > self.config.stochastic_overbought && self.stoch_crossed_below_d();
        let below_ema = close.to_f64().unwrap_or(0.0) < ema;

        if !(upper_cross || overbought_cross || below_ema) {
            return None;
        }

        self.last_action_at = Some(ctx.now);
        Some(Signal {
            action: SignalAction::Sell,
            kind: SignalKind::Exit,
            side: Side::Long,
            price: close,
            confidence: Decimal::ONE,
            reason: "bollinger/stochastic/ema exit".to_string(),
            take_profit: None,
            stop_loss: None,
            risk_reward: None,
            confluence_score: None,
            position_size: position.quantity,
            origin_strategy: OriginStrategy::B,
            time: ctx.now,
        })
    }
}

impl ConfluenceStrategy for BollingerStochasticStrategy {
    fn name(&self) -> &'static str {
        "Bollinger-Stochastic-Renko"
    }

    fn origin(&self) -> OriginStrategy {
        OriginStrategy::B
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
            if let Some(bb) = self.bollinger.next(brick.close.to_f64().unwrap_or(0.0)) {
                self.last_bollinger = Some(bb);
            }
            if let Some(st) = self.stochastic.next(bar) {
                self.prev_stochastic = self.last_stochastic;
                self.last_stochastic = Some(st);
            }
            self.ema.next(brick.close.to_f64().unwrap_or(0.0));
            self.last_close = Some(brick.close);

            self.recent_lows.push_back(brick.low());
            if self.recent_lows.len() > SWING_LOW_WINDOW {
                self.recent_lows.pop_front();
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
    use crate::domain::market::candle::PriceSource;
    use crate::domain::market::renko::{RenkoConfig, RenkoEngine};
    use chrono::TimeZone;

    #[test]
    fn confidence_caps_at_one() {
        let strategy = BollingerStochasticStrategy::new(BollingerStochasticConfig::default());
        assert!(!strategy.in_cooldown(Utc::now()));
    }

    fn empty_engine() -> RenkoEngine {
        RenkoEngine::new(RenkoConfig {
            atr_period: 3,
            atr_multiplier: Decimal::ONE,
            price_source: PriceSource::Close,
            price_precision: 2,
            max_brick_history: 1000,
        })
    }

    #[test]
    fn not_flat_portfolio_is_rejected_and_counted() {
        let mut strategy = BollingerStochasticStrategy::new(BollingerStochasticConfig::default());
        let engine = empty_engine();
        let ctx = StrategyContext {
            new_bricks: &[],
            renko: &engine,
            now: Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap(),
            portfolio_flat: false,
            my_position: None,
            equity: Decimal::from(100_000),
            max_position_fraction: Decimal::ONE,
            candle_volume: Decimal::ONE,
        };
        assert!(strategy.try_entry(&ctx).is_none());
        assert_eq!(strategy.counters().signals_rejected_not_flat, 1);
    }

    #[test]
    fn cooldown_window_is_rejected_and_counted() {
        let mut strategy = BollingerStochasticStrategy::new(BollingerStochasticConfig {
            cooldown_seconds: 60,
            ..BollingerStochasticConfig::default()
        });
        let engine = empty_engine();
        let t0 = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        strategy.last_action_at = Some(t0);

        let ctx = StrategyContext {
            new_bricks: &[],
            renko: &engine,
            now: t0 + chrono::Duration::seconds(10),
            portfolio_flat: true,
            my_position: None,
            equity: Decimal::from(100_000),
            max_position_fraction: Decimal::ONE,
            candle_volume: Decimal::ONE,
        };
        assert!(strategy.try_entry(&ctx).is_none());
        assert_eq!(strategy.counters().signals_rejected_cooldown, 1);
    }
}
