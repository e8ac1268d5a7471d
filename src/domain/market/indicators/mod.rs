//! Indicator Kit (C3). Every indicator here is a small stateful struct fed
//! one brick at a time via a `next`-style method, mirroring the shape the
//! teacher gets from `ta::Next<f64>` — state lives on the struct, a result
//! is only produced once the warmup window is full.
//!
//! Internal math is `f64`; domain `Decimal` values cross the boundary via
//! `ToPrimitive`/`Decimal::from_f64_retain`, the same conversion idiom the
//! teacher uses throughout its feature pipeline.

mod atr;
mod bollinger;
mod ema;
mod macd;
mod rsi;
mod sma;
mod stochastic;
mod supertrend;
mod volume;

pub use atr::WilderAtr;
pub use bollinger::{Bollinger, BollingerOutput};
pub use ema::Ema;
pub use macd::{Crossover, Macd, MacdDirection, MacdOutput};
pub use rsi::Rsi;
pub use sma::Sma;
pub use stochastic::{Stochastic, StochasticOutput};
pub use supertrend::{SuperTrend, SuperTrendDirection, SuperTrendOutput};
pub use volume::{VolumeSurge, VolumeSurgeOutput};

use rust_decimal::prelude::ToPrimitive;

use crate::domain::market::brick::Brick;

/// One OHLCV bar as seen by the indicator layer. Bricks are treated as
/// candles per §4.3: `high = max(open, close)`, `low = min(open, close)`,
/// `volume` defaults to 1 unless the brick carries a real one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bar {
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl From<&Brick> for Bar {
    fn from(brick: &Brick) -> Self {
        Bar {
            high: brick.high().to_f64().unwrap_or(0.0),
            low: brick.low().to_f64().unwrap_or(0.0),
            close: brick.close.to_f64().unwrap_or(0.0),
            volume: 1.0,
        }
    }
}

pub(crate) fn true_range(bar: Bar, prev_close: Option<f64>) -> f64 {
    let hl = bar.high - bar.low;
    match prev_close {
        None => hl,
        Some(pc) => hl.max((bar.high - pc).abs()).max((bar.low - pc).abs()),
    }
}
