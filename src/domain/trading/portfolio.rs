use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::position::Position;
use super::signal::OriginStrategy;

const CLOSED_TRADE_CAP: usize = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExitReason {
    TakeProfit,
    StopLoss,
    StrategyExit,
    SessionEnded,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClosedTrade {
    pub symbol: String,
    pub entry_price: Decimal,
    pub entry_time: DateTime<Utc>,
    pub exit_price: Decimal,
    pub exit_time: DateTime<Utc>,
    pub quantity: Decimal,
    pub pnl: Decimal,
    pub pnl_pct: Decimal,
    pub holding_minutes: i64,
    pub exit_reason: ExitReason,
    pub origin_strategy: OriginStrategy,
    pub take_profit: Decimal,
    pub stop_loss: Decimal,
    pub confidence: Decimal,
    pub reason: String,
    pub risk_reward: Option<Decimal>,
    pub confluence_score: Option<u8>,
}

/// Single-position, long-only portfolio (C7's state). `closed_trades` is a
/// bounded ring buffer (§4.7/§5): older entries fall off the front once the
/// cap is reached, on the assumption an external persistence adapter has
/// already taken them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Portfolio {
    pub initial_capital: Decimal,
    pub cash: Decimal,
    pub position: Option<Position>,
    pub realized_pnl: Decimal,
    pub peak_equity: Decimal,
    pub trough_equity: Decimal,
    max_drawdown_pct: Decimal,
    pub closed_trades: VecDeque<ClosedTrade>,
}

impl Portfolio {
    pub fn new(initial_capital: Decimal) -> Self {
        Self {
            initial_capital,
            cash: initial_capital,
            position: None,
            realized_pnl: Decimal::ZERO,
            peak_equity: initial_capital,
            trough_equity: initial_capital,
            max_drawdown_pct: Decimal::ZERO,
            closed_trades: VecDeque::new(),
        }
    }

    pub fn is_flat(&self) -> bool {
        self.position.is_none()
    }

    pub fn equity(&self, last_price: Decimal) -> Decimal {
        match &self.position {
            Some(p) => self.cash + p.market_value(last_price),
            None => self.cash,
        }
    }

    pub fn unrealized_pnl(&self, last_price: Decimal) -> Decimal {
        self.position.as_ref().map(|p| p.unrealized_pnl(last_price)).unwrap_or(Decimal::ZERO)
    }

    /// Opens the sole position, reserving `quantity * entry_price` from cash.
    pub fn open(&mut self, position: Position) {
        debug_assert!(self.position.is_none(), "exactly-one-position invariant violated");
        let reserved = position.quantity * position.entry_price;
        self.cash -= reserved;
        self.position = Some(position);
    }

    /// Closes the open position at `exit_price`, releasing reserved cash and
    /// recording a `ClosedTrade`. No-op (returns `None`) if already flat.
    pub fn close(
        &mut self,
        exit_price: Decimal,
        exit_time: DateTime<Utc>,
        reason: ExitReason,
    ) -> Option<ClosedTrade> {
        let position = self.position.take()?;
        self.cash += position.quantity * exit_price;

        let pnl = position.quantity * (exit_price - position.entry_price);
        let pnl_pct = if position.entry_price.is_zero() {
            Decimal::ZERO
        } else {
            (exit_price - position.entry_price) / position.entry_price * Decimal::from(100)
        };
        let holding_minutes = (exit_time - position.entry_time).num_minutes();

        let trade = ClosedTrade {
            symbol: position.symbol.clone(),
            entry_price: position.entry_price,
            entry_time: position.entry_time,
            exit_price,
            exit_time,
            quantity: position.quantity,
            pnl,
            pnl_pct,
            holding_minutes,
            exit_reason: reason,
            origin_strategy: position.origin_strategy,
            take_profit: position.take_profit,
            stop_loss: position.stop_loss,
            confidence: position.confidence,
            reason: position.reason.clone(),
            risk_reward: position.risk_reward,
            confluence_score: position.confluence_score,
        };

        self.realized_pnl += trade.pnl;
        self.closed_trades.push_back(trade.clone());
        if self.closed_trades.len() > CLOSED_TRADE_CAP {
            self.closed_trades.pop_front();
        }

        Some(trade)
    }

    /// Re-evaluates TP/SL against a candle's high/low. Per §4.7, if both
    /// bounds are inside the candle the stop is assumed hit first.
    pub fn resolve_tp_sl_candle(&self, low: Decimal, high: Decimal) -> Option<(Decimal, ExitReason)> {
        let position = self.position.as_ref()?;
        let sl_hit = low <= position.stop_loss;
        let tp_hit = high >= position.take_profit;
        match (sl_hit, tp_hit) {
            (true, _) => Some((position.stop_loss, ExitReason::StopLoss)),
            (false, true) => Some((position.take_profit, ExitReason::TakeProfit)),
            (false, false) => None,
        }
    }

    /// Same policy as `resolve_tp_sl_candle` for a single tick price.
    pub fn resolve_tp_sl_tick(&self, price: Decimal) -> Option<(Decimal, ExitReason)> {
        let position = self.position.as_ref()?;
        if price <= position.stop_loss {
            Some((position.stop_loss, ExitReason::StopLoss))
        } else if price >= position.take_profit {
            Some((position.take_profit, ExitReason::TakeProfit))
        } else {
            None
        }
    }

    /// Updates peak/trough equity and the drawdown ratchet; call after every
    /// price observation. `max_drawdown_pct` only ever grows within a
    /// session (§8 invariant 10) — it is the running max of the
    /// instantaneous `(peak - equity) / peak` drawdown, not derived from
    /// the global trough alone.
    pub fn track_equity(&mut self, last_price: Decimal) {
        let equity = self.equity(last_price);
        self.peak_equity = self.peak_equity.max(equity);
        self.trough_equity = self.trough_equity.min(equity);

        if !self.peak_equity.is_zero() {
            let current_dd = (self.peak_equity - equity) / self.peak_equity * Decimal::from(100);
            self.max_drawdown_pct = self.max_drawdown_pct.max(current_dd);
        }
    }

    pub fn max_drawdown_pct(&self) -> Decimal {
        self.max_drawdown_pct
    }

    pub fn total_pnl(&self, last_price: Decimal) -> Decimal {
        self.realized_pnl + self.unrealized_pnl(last_price)
    }
}
