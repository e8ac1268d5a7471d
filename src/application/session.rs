use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tracing::{info, warn};

use crate::application::arbiter;
use crate::application::candle_aggregator::CandleAggregator;
use crate::application::executor::{Executor, TradeEvent};
use crate::application::strategies::{
    BollingerStochasticStrategy, ConfluenceStrategy, StrategyContext, SuperTrendConfluenceStrategy,
};
use crate::config::SessionConfig;
use crate::domain::errors::ConfigError;
use crate::domain::market::candle::Candle;
use crate::domain::market::regime::RegimeDetector;
use crate::domain::market::renko::{RenkoConfig, RenkoEngine};
use crate::domain::market::tick::Tick;
use crate::domain::trading::portfolio::Portfolio;
use crate::domain::trading::signal::{OriginStrategy, SignalKind};
use crate::interfaces::snapshot::{SessionSnapshot, TradeRecord};

const TRADE_LOG_CAP: usize = 1000;

/// The orchestrator's single inbound event type (§5): ticks drive every
/// update, `Shutdown` drains the session.
#[derive(Debug, Clone)]
pub enum Event {
    Tick(Tick),
    Shutdown,
}

/// Single-threaded cooperative session orchestrator (C8). Owns every
/// component and all state; the only suspension point is the caller's
/// inbound-channel read, not anything inside `Session` itself.
pub struct Session {
    config: SessionConfig,
    aggregator: CandleAggregator,
    renko_a: RenkoEngine,
    renko_b: RenkoEngine,
    strategy_a: SuperTrendConfluenceStrategy,
    strategy_b: BollingerStochasticStrategy,
    regime_detector: RegimeDetector,
    portfolio: Portfolio,
    executor: Executor,
    start_time: DateTime<Utc>,
    last_price: Decimal,
    last_candle_time: Option<DateTime<Utc>>,
    last_snapshot_at: Option<DateTime<Utc>>,
    trade_log: VecDeque<TradeRecord>,
}

impl Session {
    pub fn new(config: SessionConfig, start_time: DateTime<Utc>) -> Result<Self, ConfigError> {
        config.validate()?;

        let renko_a = RenkoEngine::new(RenkoConfig {
            atr_period: config.atr_period,
            atr_multiplier: config.strategy_a_atr_multiplier,
            price_source: config.price_source,
            price_precision: config.price_precision,
            max_brick_history: config.max_brick_history,
        });
        let renko_b = RenkoEngine::new(RenkoConfig {
            atr_period: config.atr_period,
            atr_multiplier: config.strategy_b_atr_multiplier,
            price_source: config.price_source,
            price_precision: config.price_precision,
            max_brick_history: config.max_brick_history,
        });

        let strategy_a = SuperTrendConfluenceStrategy::new(config.strategy_a.clone());
        let strategy_b = BollingerStochasticStrategy::new(config.strategy_b.clone());
        let portfolio = Portfolio::new(config.initial_capital);
        let executor = Executor::new(config.max_position_fraction, config.symbol.clone());
        let regime_detector = RegimeDetector::new(start_time.timestamp() as f64);

        Ok(Self {
            config,
            aggregator: CandleAggregator::new(),
            renko_a,
            renko_b,
            strategy_a,
            strategy_b,
            regime_detector,
            portfolio,
            executor,
            start_time,
            last_price: Decimal::ZERO,
            last_candle_time: None,
            last_snapshot_at: None,
            trade_log: VecDeque::new(),
        })
    }

    /// The session's append-only, capacity-bounded trade log (§6).
    pub fn trade_log(&self) -> &VecDeque<TradeRecord> {
        &self.trade_log
    }

    fn record_trade_event(&mut self, event: &TradeEvent) {
        if let TradeEvent::Closed { trade } = event {
            self.trade_log.push_back(TradeRecord::from(trade));
            if self.trade_log.len() > TRADE_LOG_CAP {
                self.trade_log.pop_front();
            }
        }
    }

    /// Drives the whole session from an ordered stream of events, calling
    /// `on_snapshot` whenever one is emitted. Returns the final snapshot
    /// after shutdown drains.
    pub fn run<I, F>(&mut self, events: I, mut on_snapshot: F) -> SessionSnapshot
    where
        I: IntoIterator<Item = Event>,
        F: FnMut(&SessionSnapshot),
    {
        for event in events {
            match event {
                Event::Tick(tick) => {
                    if let Some(snapshot) = self.handle_tick(&tick) {
                        on_snapshot(&snapshot);
                    }
                }
                Event::Shutdown => break,
            }
        }
        let final_snapshot = self.shutdown();
        on_snapshot(&final_snapshot);
        final_snapshot
    }

    /// Processes one tick to completion (§5: a tick's full effect runs
    /// before the next is dequeued) and returns a snapshot if the cadence
    /// or a state change calls for one.
    pub fn handle_tick(&mut self, tick: &Tick) -> Option<SessionSnapshot> {
        self.last_price = tick.price;

        let event = self.executor.evaluate_tick(&mut self.portfolio, tick.price, tick.arrival_time);
        self.record_trade_event(&event);
        self.portfolio.track_equity(self.last_price);

        let mut state_changed = false;
        match self.aggregator.ingest(tick) {
            Ok(Some(candle)) => {
                self.handle_candle(&candle);
                state_changed = true;
            }
            Ok(None) => {}
            Err(e) => warn!(error = %e, "dropped invalid tick"),
        }

        if state_changed || self.snapshot_due(tick.arrival_time) {
            self.last_snapshot_at = Some(tick.arrival_time);
            Some(self.build_snapshot())
        } else {
            None
        }
    }

    fn snapshot_due(&self, now: DateTime<Utc>) -> bool {
        match self.last_snapshot_at {
            None => true,
            Some(last) => (now - last).num_seconds() >= self.config.snapshot_interval_seconds as i64,
        }
    }

    fn handle_candle(&mut self, candle: &Candle) {
        self.last_candle_time = Some(candle.bucket_start);

        let update_a = match self.renko_a.on_candle(candle) {
            Ok(u) => u,
            Err(e) => {
                warn!(error = %e, "renko A rejected candle");
                return;
            }
        };
        let update_b = match self.renko_b.on_candle(candle) {
            Ok(u) => u,
            Err(e) => {
                warn!(error = %e, "renko B rejected candle");
                return;
            }
        };

        let equity = self.portfolio.equity(candle.close);
        let flat = self.portfolio.is_flat();
        let my_position_a = self
            .portfolio
            .position
            .as_ref()
            .filter(|p| p.origin_strategy == OriginStrategy::A);
        let my_position_b = self
            .portfolio
            .position
            .as_ref()
            .filter(|p| p.origin_strategy == OriginStrategy::B);

        let ctx_a = StrategyContext {
            new_bricks: &update_a.bricks_formed,
            renko: &self.renko_a,
            now: candle.bucket_start,
            portfolio_flat: flat,
            my_position: my_position_a,
            equity,
            max_position_fraction: self.config.max_position_fraction,
            candle_volume: candle.volume,
        };
        let ctx_b = StrategyContext {
            new_bricks: &update_b.bricks_formed,
            renko: &self.renko_b,
            now: candle.bucket_start,
            portfolio_flat: flat,
            my_position: my_position_b,
            equity,
            max_position_fraction: self.config.max_position_fraction,
            candle_volume: candle.volume,
        };

        let sig_a = self.strategy_a.evaluate(&ctx_a);
        let sig_b = self.strategy_b.evaluate(&ctx_b);

        let total_trend_changes = self.renko_a.trend_change_count() + self.renko_b.trend_change_count();
        let regime = self.regime_detector.classify(total_trend_changes, candle.bucket_start.timestamp() as f64);

        // Exit signals bypass the arbiter (§4.6); at most one of sig_a/sig_b
        // can be an Exit, since a non-owning strategy's `my_position` is
        // always `None` and its entry path is gated on `portfolio_flat`.
        let chosen = if sig_a.as_ref().map(|s| s.kind == SignalKind::Exit).unwrap_or(false) {
            sig_a
        } else if sig_b.as_ref().map(|s| s.kind == SignalKind::Exit).unwrap_or(false) {
            sig_b
        } else {
            arbiter::arbitrate(regime, sig_a, sig_b)
        };

        if let Some(signal) = chosen {
            info!(?signal.kind, origin = ?signal.origin_strategy, price = %signal.price, "applying signal");
            let event = self.executor.apply(&mut self.portfolio, &signal);
            self.record_trade_event(&event);
        }

        let event = self.executor.evaluate_candle(&mut self.portfolio, candle);
        self.record_trade_event(&event);
        self.portfolio.track_equity(candle.close);
    }

    fn shutdown(&mut self) -> SessionSnapshot {
        let time = self.last_candle_time.unwrap_or(self.start_time);
        let event = self.executor.close_for_shutdown(&mut self.portfolio, self.last_price, time);
        self.record_trade_event(&event);
        info!("session shutdown, final snapshot emitted");
        self.build_snapshot()
    }

    fn build_snapshot(&self) -> SessionSnapshot {
        let total_trend_changes = self.renko_a.trend_change_count() + self.renko_b.trend_change_count();
        let now_secs = self.last_candle_time.unwrap_or(self.start_time).timestamp() as f64;
        let regime = self.regime_detector.classify(total_trend_changes, now_secs);
        let active = self.portfolio.position.as_ref().map(|p| p.origin_strategy);

        SessionSnapshot::build(
            &self.config.symbol,
            self.config.initial_capital,
            self.start_time,
            &self.portfolio,
            self.last_price,
            self.last_candle_time,
            regime,
            active,
            self.strategy_a.name(),
            self.strategy_a.counters(),
            self.strategy_b.name(),
            self.strategy_b.counters(),
        )
    }
}
