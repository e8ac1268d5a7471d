use std::env;

use anyhow::{Context, Result};
use rust_decimal::Decimal;

use crate::application::strategies::bollinger_stochastic::BollingerStochasticConfig;
use crate::application::strategies::supertrend_confluence::SuperTrendConfluenceConfig;
use crate::domain::errors::ConfigError;
use crate::domain::market::candle::PriceSource;

impl std::str::FromStr for PriceSource {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "close" => Ok(PriceSource::Close),
            "hl2" => Ok(PriceSource::Hl2),
            "hlc3" => Ok(PriceSource::Hlc3),
            "ohlc4" => Ok(PriceSource::Ohlc4),
            _ => anyhow::bail!("invalid PRICE_SOURCE: {s}. Must be close|hl2|hlc3|ohlc4"),
        }
    }
}

/// Every option in §6's Configuration table, plus the shared Renko/portfolio
/// settings both strategies draw from.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub symbol: String,
    pub initial_capital: Decimal,
    pub candle_interval_seconds: u64,

    pub atr_period: usize,
    pub price_source: PriceSource,
    pub price_precision: u32,
    pub max_brick_history: usize,

    pub strategy_a_atr_multiplier: Decimal,
    pub strategy_a: SuperTrendConfluenceConfig,

    pub strategy_b_atr_multiplier: Decimal,
    pub strategy_b: BollingerStochasticConfig,

    pub max_position_fraction: Decimal,
    pub pessimistic_tp_sl: bool,
    pub snapshot_interval_seconds: u64,
}

impl SessionConfig {
    pub fn default() -> Self {
        Self {
            symbol: "BTCUSD".to_string(),
            initial_capital: Decimal::from(100_000),
            candle_interval_seconds: 60,

            atr_period: 14,
            price_source: PriceSource::Close,
            price_precision: 2,
            max_brick_history: 1000,

            strategy_a_atr_multiplier: Decimal::new(326, 3),
            strategy_a: SuperTrendConfluenceConfig::default(),

            strategy_b_atr_multiplier: Decimal::new(217, 3),
            strategy_b: BollingerStochasticConfig::default(),

            max_position_fraction: Decimal::ONE,
            pessimistic_tp_sl: true,
            snapshot_interval_seconds: 20,
        }
    }

    /// Reads overrides from the process environment, same
    /// `env::var(...).unwrap_or_else(...).parse().context(...)` idiom the
    /// teacher uses for every field in its own `Config::from_env`.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        config.symbol = env::var("SYMBOL").unwrap_or(config.symbol);

        config.initial_capital = env::var("INITIAL_CAPITAL")
            .unwrap_or_else(|_| config.initial_capital.to_string())
            .parse()
            .context("invalid INITIAL_CAPITAL")?;

        config.candle_interval_seconds = env::var("CANDLE_INTERVAL_SECONDS")
            .unwrap_or_else(|_| config.candle_interval_seconds.to_string())
            .parse()
            .context("invalid CANDLE_INTERVAL_SECONDS")?;

        config.atr_period = env::var("ATR_PERIOD")
            .unwrap_or_else(|_| config.atr_period.to_string())
            .parse()
            .context("invalid ATR_PERIOD")?;

        config.price_source = env::var("PRICE_SOURCE")
            .unwrap_or_else(|_| "close".to_string())
            .parse()
            .context("invalid PRICE_SOURCE")?;

        config.price_precision = env::var("PRICE_PRECISION")
            .unwrap_or_else(|_| config.price_precision.to_string())
            .parse()
            .context("invalid PRICE_PRECISION")?;

        config.max_brick_history = env::var("MAX_BRICK_HISTORY")
            .unwrap_or_else(|_| config.max_brick_history.to_string())
            .parse()
            .context("invalid MAX_BRICK_HISTORY")?;

        config.strategy_a.min_confluence_score = env::var("MIN_CONFLUENCE_SCORE")
            .unwrap_or_else(|_| config.strategy_a.min_confluence_score.to_string())
            .parse()
            .context("invalid MIN_CONFLUENCE_SCORE")?;

        config.strategy_a.cooldown_seconds = env::var("STRATEGY_A_COOLDOWN_SECONDS")
            .unwrap_or_else(|_| config.strategy_a.cooldown_seconds.to_string())
            .parse()
            .context("invalid STRATEGY_A_COOLDOWN_SECONDS")?;

        config.strategy_b.cooldown_seconds = env::var("STRATEGY_B_COOLDOWN_SECONDS")
            .unwrap_or_else(|_| config.strategy_b.cooldown_seconds.to_string())
            .parse()
            .context("invalid STRATEGY_B_COOLDOWN_SECONDS")?;

        config.max_position_fraction = env::var("MAX_POSITION_FRACTION")
            .unwrap_or_else(|_| config.max_position_fraction.to_string())
            .parse()
            .context("invalid MAX_POSITION_FRACTION")?;

        config.snapshot_interval_seconds = env::var("SNAPSHOT_INTERVAL_SECONDS")
            .unwrap_or_else(|_| config.snapshot_interval_seconds.to_string())
            .parse()
            .context("invalid SNAPSHOT_INTERVAL_SECONDS")?;

        config.validate().map_err(anyhow::Error::from)?;
        Ok(config)
    }

    /// Startup validation (§7's `ConfigInvalid`, fatal — a session with a
    /// bad config never constructs its engines or portfolio).
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.initial_capital <= Decimal::ZERO {
            return Err(ConfigError::NonPositiveCapital(self.initial_capital));
        }
        if self.atr_period == 0 {
            return Err(ConfigError::NonPositiveAtrPeriod(self.atr_period));
        }
        if self.strategy_a.min_confluence_score > 10 {
            return Err(ConfigError::ConfluenceScoreOutOfRange(self.strategy_a.min_confluence_score));
        }
        if self.price_precision > 8 {
            return Err(ConfigError::PricePrecisionOutOfRange(self.price_precision));
        }
        if self.candle_interval_seconds == 0 {
            return Err(ConfigError::NonPositiveCandleInterval(self.candle_interval_seconds));
        }
        if self.strategy_a_atr_multiplier <= Decimal::ZERO {
            return Err(ConfigError::NonPositiveDecimal {
                field: "strategy_a_atr_multiplier",
                value: self.strategy_a_atr_multiplier,
            });
        }
        if self.strategy_b_atr_multiplier <= Decimal::ZERO {
            return Err(ConfigError::NonPositiveDecimal {
                field: "strategy_b_atr_multiplier",
                value: self.strategy_b_atr_multiplier,
            });
        }
        if self.max_position_fraction <= Decimal::ZERO {
            return Err(ConfigError::NonPositiveDecimal {
                field: "max_position_fraction",
                value: self.max_position_fraction,
            });
        }
        Ok(())
    }
}
