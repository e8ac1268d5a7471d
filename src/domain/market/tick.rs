use chrono::{DateTime, Timelike, Utc};
use rust_decimal::Decimal;

use crate::domain::errors::TickError;

/// A single observed trade/quote on the instrument.
///
/// `rust_decimal::Decimal` has no NaN/infinity representation, so "finite"
/// from the spec's "must be positive finite" is automatic; only positivity
/// is actually checked here.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tick {
    pub price: Decimal,
    pub volume: Decimal,
    pub arrival_time: DateTime<Utc>,
}

impl Tick {
    pub fn new(
        price: Decimal,
        volume: Decimal,
        arrival_time: DateTime<Utc>,
    ) -> Result<Self, TickError> {
        if price <= Decimal::ZERO {
            return Err(TickError::InvalidPrice { price });
        }
        if volume < Decimal::ZERO {
            return Err(TickError::InvalidVolume { volume });
        }
        Ok(Self {
            price,
            volume,
            arrival_time,
        })
    }

    /// Floors the tick's arrival time to its enclosing whole minute.
    pub fn minute_bucket(&self) -> DateTime<Utc> {
        self.arrival_time
            .with_second(0)
            .and_then(|t| t.with_nanosecond(0))
            .unwrap_or(self.arrival_time)
    }
}
