pub mod bollinger_stochastic;
pub mod supertrend_confluence;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::domain::market::brick::Brick;
use crate::domain::market::renko::RenkoEngine;
use crate::domain::trading::position::Position;
use crate::domain::trading::signal::{OriginStrategy, Signal};

pub use bollinger_stochastic::{BollingerStochasticConfig, BollingerStochasticStrategy, SecondaryCounters};
pub use supertrend_confluence::{PrimaryCounters, SuperTrendConfluenceConfig, SuperTrendConfluenceStrategy};

/// Everything a strategy needs to evaluate one candle's worth of new bricks.
/// `my_position` is `Some` only when the open position (if any) was opened
/// by this strategy — the other strategy sees `None` even if the portfolio
/// isn't flat.
pub struct StrategyContext<'a> {
    pub new_bricks: &'a [Brick],
    pub renko: &'a RenkoEngine,
    pub now: DateTime<Utc>,
    pub portfolio_flat: bool,
    pub my_position: Option<&'a Position>,
    pub equity: Decimal,
    pub max_position_fraction: Decimal,
    /// The closed candle's own volume — bricks carry no volume field of
    /// their own (§3), so volume surge is computed from the candle series
    /// that drives Renko formation, not from brick counts.
    pub candle_volume: Decimal,
}

/// Shared shape for C4/C5, matching the teacher's `TradingStrategy` trait
/// (`analyze`-style evaluation, a stable `name`), generalized with the
/// cooldown/origin bookkeeping both confluence strategies need.
pub trait ConfluenceStrategy {
    fn name(&self) -> &'static str;
    fn origin(&self) -> OriginStrategy;
    fn cooldown_seconds(&self) -> u64;
    fn last_action_at(&self) -> Option<DateTime<Utc>>;

    fn in_cooldown(&self, now: DateTime<Utc>) -> bool {
        match self.last_action_at() {
            Some(last) => (now - last).num_seconds() < self.cooldown_seconds() as i64,
            None => false,
        }
    }

    /// Feeds newly formed bricks to the strategy's indicators and returns at
    /// most one signal (entry or exit) for this candle.
    fn evaluate(&mut self, ctx: &StrategyContext) -> Option<Signal>;
}
