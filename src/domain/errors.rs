use rust_decimal::Decimal;
use thiserror::Error;

/// Errors raised while folding ticks into candles (C1).
#[derive(Debug, Error, Clone, PartialEq)]
pub enum TickError {
    #[error("invalid tick price: {price} (must be positive and finite)")]
    InvalidPrice { price: Decimal },

    #[error("invalid tick volume: {volume} (must be non-negative)")]
    InvalidVolume { volume: Decimal },
}

/// Raised by the Renko engine or an indicator that does not yet have enough
/// history to produce a value (C2/C3).
#[derive(Debug, Error, Clone, PartialEq)]
pub enum IndicatorError {
    #[error("invalid source price: {price} (must be positive and finite)")]
    InvalidPrice { price: Decimal },

    #[error("insufficient history: need {needed}, have {available}")]
    InsufficientHistory { needed: usize, available: usize },
}

/// Reasons a strategy (C4/C5) or the executor (C7) declines to act on a
/// signal.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SignalError {
    #[error("confluence score {score} below minimum {minimum}")]
    RejectedConfluence { score: u8, minimum: u8 },

    #[error("risk/reward {achieved} below minimum {minimum}")]
    RejectedRiskReward { achieved: Decimal, minimum: Decimal },

    #[error("strategy in cooldown for another {remaining_secs}s")]
    RejectedCooldown { remaining_secs: u64 },

    #[error("portfolio is not flat")]
    RejectedNotFlat,

    #[error("short entries are not supported by the live core")]
    ShortNotSupported,

    #[error("entry signal is missing take-profit or stop-loss")]
    MissingTakeProfitOrStopLoss,

    #[error("insufficient cash: need {required}, have {available}")]
    InsufficientCash { required: Decimal, available: Decimal },
}

/// Startup configuration failures. Fatal: a session with a `ConfigError`
/// never constructs its engines or portfolio.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    #[error("initial_capital must be positive, got {0}")]
    NonPositiveCapital(Decimal),

    #[error("atr_period must be positive, got {0}")]
    NonPositiveAtrPeriod(usize),

    #[error("min_confluence_score must be in 0..=10, got {0}")]
    ConfluenceScoreOutOfRange(u8),

    #[error("price_precision must be in 0..=8, got {0}")]
    PricePrecisionOutOfRange(u32),

    #[error("candle_interval_seconds must be positive, got {0}")]
    NonPositiveCandleInterval(u64),

    #[error("{field} must be positive, got {value}")]
    NonPositiveDecimal { field: &'static str, value: Decimal },
}
