use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tracing::{info, warn};

use crate::domain::errors::SignalError;
use crate::domain::market::candle::Candle;
use crate::domain::trading::portfolio::{ClosedTrade, ExitReason, Portfolio};
use crate::domain::trading::position::Position;
use crate::domain::trading::signal::{Side, Signal, SignalKind};

/// The outcome of feeding one signal or price observation through C7.
#[derive(Debug, Clone, PartialEq)]
pub enum TradeEvent {
    Opened { position: Position },
    Closed { trade: ClosedTrade },
    Rejected { reason: SignalError },
    Noop,
}

/// Simulated long-only executor (C7). Holds no state of its own beyond the
/// `Portfolio` it is handed — the orchestrator owns that — so this is a
/// thin set of pure state-transition functions over it.
#[derive(Debug, Default)]
pub struct Executor {
    pub max_position_fraction: Decimal,
    pub symbol: String,
}

impl Executor {
    pub fn new(max_position_fraction: Decimal, symbol: impl Into<String>) -> Self {
        Self { max_position_fraction, symbol: symbol.into() }
    }

    /// Applies a strategy signal to the portfolio (the C7 state table).
    pub fn apply(&self, portfolio: &mut Portfolio, signal: &Signal) -> TradeEvent {
        match signal.kind {
            SignalKind::LongEntry => {
                if signal.side != Side::Long {
                    let err = SignalError::ShortNotSupported;
                    warn!(error = %err, "signal rejected");
                    return TradeEvent::Rejected { reason: err };
                }
                if !portfolio.is_flat() {
                    let err = SignalError::RejectedNotFlat;
                    warn!(error = %err, "signal rejected");
                    return TradeEvent::Rejected { reason: err };
                }
                let (Some(tp), Some(sl)) = (signal.take_profit, signal.stop_loss) else {
                    let err = SignalError::MissingTakeProfitOrStopLoss;
                    warn!(error = %err, "signal rejected");
                    return TradeEvent::Rejected { reason: err };
                };
                let cost = signal.position_size * signal.price;
                if cost > portfolio.cash {
                    let err = SignalError::InsufficientCash { required: cost, available: portfolio.cash };
                    warn!(error = %err, "signal rejected");
                    return TradeEvent::Rejected { reason: err };
                }
                let position = Position {
                    symbol: self.symbol.clone(),
                    quantity: signal.position_size,
                    entry_price: signal.price,
                    entry_time: signal.time,
                    take_profit: tp,
                    stop_loss: sl,
                    origin_strategy: signal.origin_strategy,
                    confidence: signal.confidence,
                    reason: signal.reason.clone(),
                    risk_reward: signal.risk_reward,
                    confluence_score: signal.confluence_score,
                };
                info!(price = %signal.price, qty = %signal.position_size, "position opened");
                portfolio.open(position);
                TradeEvent::Opened { position: portfolio.position.clone().unwrap() }
            }
            SignalKind::Exit => {
                if portfolio.is_flat() {
                    return TradeEvent::Noop;
                }
                match portfolio.close(signal.price, signal.time, ExitReason::StrategyExit) {
                    Some(trade) => TradeEvent::Closed { trade },
                    None => TradeEvent::Noop,
                }
            }
        }
    }

    /// Re-evaluates TP/SL against a closed candle's high/low (§4.7,
    /// pessimistic on ambiguity — stop wins).
    pub fn evaluate_candle(&self, portfolio: &mut Portfolio, candle: &Candle) -> TradeEvent {
        match portfolio.resolve_tp_sl_candle(candle.low, candle.high) {
            Some((price, reason)) => match portfolio.close(price, candle.bucket_start, reason) {
                Some(trade) => TradeEvent::Closed { trade },
                None => TradeEvent::Noop,
            },
            None => TradeEvent::Noop,
        }
    }

    /// Re-evaluates TP/SL against a single tick price.
    pub fn evaluate_tick(&self, portfolio: &mut Portfolio, price: Decimal, time: DateTime<Utc>) -> TradeEvent {
        match portfolio.resolve_tp_sl_tick(price) {
            Some((exit_price, reason)) => match portfolio.close(exit_price, time, reason) {
                Some(trade) => TradeEvent::Closed { trade },
                None => TradeEvent::Noop,
            },
            None => TradeEvent::Noop,
        }
    }

    /// Shutdown drain: flat-close any open position at the last known price.
    pub fn close_for_shutdown(
        &self,
        portfolio: &mut Portfolio,
        last_price: Decimal,
        time: DateTime<Utc>,
    ) -> TradeEvent {
        match portfolio.close(last_price, time, ExitReason::SessionEnded) {
            Some(trade) => TradeEvent::Closed { trade },
            None => TradeEvent::Noop,
        }
    }
}
