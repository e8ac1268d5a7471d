use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::signal::OriginStrategy;

/// The portfolio's single open position, if any. `quantity * entry_price`
/// must never exceed the cash reserved for it at entry (§3 invariant).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub symbol: String,
    pub quantity: Decimal,
    pub entry_price: Decimal,
    pub entry_time: DateTime<Utc>,
    pub take_profit: Decimal,
    pub stop_loss: Decimal,
    pub origin_strategy: OriginStrategy,
    pub confidence: Decimal,
    pub reason: String,
    pub risk_reward: Option<Decimal>,
    pub confluence_score: Option<u8>,
}

impl Position {
    pub fn unrealized_pnl(&self, last_price: Decimal) -> Decimal {
        self.quantity * (last_price - self.entry_price)
    }

    pub fn market_value(&self, last_price: Decimal) -> Decimal {
        self.quantity * last_price
    }
}
