use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::application::strategies::{PrimaryCounters, SecondaryCounters};
use crate::domain::market::regime::MarketRegimeType;
use crate::domain::trading::portfolio::{ClosedTrade, ExitReason, Portfolio};
use crate::domain::trading::signal::OriginStrategy;

/// A deep-copied, serializable view of one open position (§6's
/// `portfolio.positions` array — at most one entry today, long-only).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PositionView {
    pub symbol: String,
    pub quantity: Decimal,
    pub avg_price: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortfolioView {
    pub cash: Decimal,
    pub equity: Decimal,
    pub positions: Vec<PositionView>,
    pub total_return_pct: Decimal,
    pub daily_pnl: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsView {
    pub total_trades: u64,
    pub winning_trades: u64,
    pub losing_trades: u64,
    pub total_pnl: Decimal,
    pub max_drawdown_pct: Decimal,
    pub win_rate_pct: Decimal,
    pub last_update: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrimaryStrategyView {
    pub name: String,
    pub signals: u64,
    pub avg_confluence: f64,
    pub super_trend_signals: u64,
    pub macd_confirmations: u64,
    pub volume_surges: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecondaryStrategyView {
    pub name: String,
    pub bollinger_bounces: u64,
    pub stochastic_crossovers: u64,
    pub ema_trend_filters: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrategiesView {
    pub primary: PrimaryStrategyView,
    pub secondary: SecondaryStrategyView,
}

/// Outbound session snapshot (§6), pushed to storage/dashboard adapters at
/// `snapshot_interval_seconds` cadence and on every state change. This type
/// alone owns serialization — core state never gets `Serialize` bolted on
/// just to satisfy this boundary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub symbol: String,
    pub strategy: String,
    pub market_regime: String,
    pub active_strategy: String,
    pub initial_capital: Decimal,
    pub start_time: DateTime<Utc>,
    pub portfolio: PortfolioView,
    pub metrics: MetricsView,
    pub strategies: StrategiesView,
    pub last_price: Decimal,
    pub last_candle_time: Option<DateTime<Utc>>,
    pub open_positions: usize,
}

impl SessionSnapshot {
    #[allow(clippy::too_many_arguments)]
    pub fn build(
        symbol: &str,
        initial_capital: Decimal,
        start_time: DateTime<Utc>,
        portfolio: &Portfolio,
        last_price: Decimal,
        last_candle_time: Option<DateTime<Utc>>,
        regime: MarketRegimeType,
        active_strategy: Option<OriginStrategy>,
        primary_name: &str,
        primary_counters: &PrimaryCounters,
        secondary_name: &str,
        secondary_counters: &SecondaryCounters,
    ) -> Self {
        let equity = portfolio.equity(last_price);
        let total_return_pct = if initial_capital.is_zero() {
            Decimal::ZERO
        } else {
            (equity - initial_capital) / initial_capital * Decimal::from(100)
        };

        let total_trades = portfolio.closed_trades.len() as u64;
        let winning_trades = portfolio.closed_trades.iter().filter(|t| t.pnl > Decimal::ZERO).count() as u64;
        let losing_trades = total_trades - winning_trades;
        let win_rate_pct = if total_trades == 0 {
            Decimal::ZERO
        } else {
            Decimal::from(winning_trades) / Decimal::from(total_trades) * Decimal::from(100)
        };

        let positions = portfolio
            .position
            .as_ref()
            .map(|p| {
                vec![PositionView {
                    symbol: p.symbol.clone(),
                    quantity: p.quantity,
                    avg_price: p.entry_price,
                }]
            })
            .unwrap_or_default();

        Self {
            symbol: symbol.to_string(),
            strategy: "Dual SuperTrend Renko System".to_string(),
            market_regime: regime.as_str().to_string(),
            active_strategy: active_strategy.map(|s| s.as_str().to_string()).unwrap_or_else(|| "PRIMARY".to_string()),
            initial_capital,
            start_time,
            portfolio: PortfolioView {
                cash: portfolio.cash,
                equity,
                positions,
                total_return_pct,
                daily_pnl: portfolio.total_pnl(last_price),
            },
            metrics: MetricsView {
                total_trades,
                winning_trades,
                losing_trades,
                total_pnl: portfolio.total_pnl(last_price),
                max_drawdown_pct: portfolio.max_drawdown_pct(),
                win_rate_pct,
                last_update: Utc::now(),
            },
            strategies: StrategiesView {
                primary: PrimaryStrategyView {
                    name: primary_name.to_string(),
                    signals: primary_counters.signals,
                    avg_confluence: primary_counters.avg_confluence(),
                    super_trend_signals: primary_counters.super_trend_signals,
                    macd_confirmations: primary_counters.macd_confirmations,
                    volume_surges: primary_counters.volume_surges,
                },
                secondary: SecondaryStrategyView {
                    name: secondary_name.to_string(),
                    bollinger_bounces: secondary_counters.bollinger_bounces,
                    stochastic_crossovers: secondary_counters.stochastic_crossovers,
                    ema_trend_filters: secondary_counters.ema_trend_filters,
                },
            },
            last_price,
            last_candle_time,
            open_positions: portfolio.position.is_some() as usize,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TradeStatus {
    Open,
    Closed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndicatorSnapshot {
    pub super_trend: Option<f64>,
    pub macd: Option<f64>,
    pub bollinger: Option<f64>,
    pub stochastic: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfluenceSnapshot {
    pub score: u8,
    pub max: u8,
    pub reasons: Vec<String>,
}

/// Outbound trade record (§6), appended to a day-sharded log by the storage
/// adapter. `exit_reason` mirrors `domain::trading::portfolio::ExitReason`
/// as a string so the boundary schema doesn't leak the core enum's repr.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeRecord {
    pub id: String,
    pub symbol: String,
    #[serde(rename = "type")]
    pub trade_type: &'static str,
    pub strategy: String,
    pub quantity: Decimal,
    pub entry_price: Decimal,
    pub entry_time: DateTime<Utc>,
    pub exit_price: Option<Decimal>,
    pub exit_time: Option<DateTime<Utc>>,
    pub pnl: Option<Decimal>,
    pub pnl_pct: Option<Decimal>,
    pub take_profit_price: Decimal,
    pub stop_loss_price: Decimal,
    pub confidence: Decimal,
    pub risk_reward: Option<Decimal>,
    pub status: TradeStatus,
    pub reason: String,
    pub exit_reason: Option<String>,
    pub holding_minutes: Option<i64>,
    pub indicators: IndicatorSnapshot,
    pub confluence: Option<ConfluenceSnapshot>,
}

impl From<&ClosedTrade> for TradeRecord {
    fn from(trade: &ClosedTrade) -> Self {
        TradeRecord {
            id: Uuid::new_v4().to_string(),
            symbol: trade.symbol.clone(),
            trade_type: "BUY",
            strategy: trade.origin_strategy.as_str().to_string(),
            quantity: trade.quantity,
            entry_price: trade.entry_price,
            entry_time: trade.entry_time,
            exit_price: Some(trade.exit_price),
            exit_time: Some(trade.exit_time),
            pnl: Some(trade.pnl),
            pnl_pct: Some(trade.pnl_pct),
            take_profit_price: trade.take_profit,
            stop_loss_price: trade.stop_loss,
            confidence: trade.confidence,
            risk_reward: trade.risk_reward,
            status: TradeStatus::Closed,
            reason: trade.reason.clone(),
            exit_reason: Some(exit_reason_str(trade.exit_reason).to_string()),
            holding_minutes: Some(trade.holding_minutes),
            indicators: IndicatorSnapshot { super_trend: None, macd: None, bollinger: None, stochastic: None },
            confluence: trade.confluence_score.map(|score| ConfluenceSnapshot {
                score,
                max: 10,
                reasons: vec![trade.reason.clone()],
            }),
        }
    }
}

pub fn exit_reason_str(reason: ExitReason) -> &'static str {
    match reason {
        ExitReason::TakeProfit => "TakeProfit",
        ExitReason::StopLoss => "StopLoss",
        ExitReason::StrategyExit => "StrategyExit",
        ExitReason::SessionEnded => "SessionEnded",
    }
}
