use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Up,
    Down,
    Init,
}

impl Direction {
    pub fn sign(self) -> i8 {
        match self {
            Direction::Up => 1,
            Direction::Down => -1,
            Direction::Init => 0,
        }
    }

    pub fn opposite_of(self, other: Direction) -> bool {
        matches!(
            (self, other),
            (Direction::Up, Direction::Down) | (Direction::Down, Direction::Up)
        )
    }
}

/// A fixed-size Renko bar. Every non-`Init` brick's `open` equals the
/// previous brick's `close`, and `|close - open| == size`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Brick {
    pub seq: u64,
    pub direction: Direction,
    pub open: Decimal,
    pub close: Decimal,
    pub size: Decimal,
    pub formed_at_candle: u64,
    pub consecutive_count: u32,
}

impl Brick {
    pub fn high(&self) -> Decimal {
        self.open.max(self.close)
    }

    pub fn low(&self) -> Decimal {
        self.open.min(self.close)
    }
}
