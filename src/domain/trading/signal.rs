use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Long-only today; `Short` is an explicit extension point (§9 open
/// question) enforced off at the executor rather than removed from the type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Side {
    Long,
    Short,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SignalAction {
    Buy,
    Sell,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SignalKind {
    LongEntry,
    Exit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OriginStrategy {
    A,
    B,
}

impl OriginStrategy {
    pub fn as_str(self) -> &'static str {
        match self {
            OriginStrategy::A => "PRIMARY",
            OriginStrategy::B => "SECONDARY",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Signal {
    pub action: SignalAction,
    pub kind: SignalKind,
    pub side: Side,
    pub price: Decimal,
    pub confidence: Decimal,
    pub reason: String,
    pub take_profit: Option<Decimal>,
    pub stop_loss: Option<Decimal>,
    pub risk_reward: Option<Decimal>,
    pub confluence_score: Option<u8>,
    pub position_size: Decimal,
    pub origin_strategy: OriginStrategy,
    pub time: DateTime<Utc>,
}

impl Signal {
    pub fn is_long_entry(&self) -> bool {
        matches!(self.kind, SignalKind::LongEntry)
    }
}
