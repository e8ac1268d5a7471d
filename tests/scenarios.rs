use chrono::{TimeZone, Utc};
use renko_confluence_engine::application::strategies::{
    ConfluenceStrategy, StrategyContext, SuperTrendConfluenceConfig, SuperTrendConfluenceStrategy,
};
use renko_confluence_engine::domain::market::candle::{Candle, PriceSource};
use renko_confluence_engine::domain::market::renko::{RenkoConfig, RenkoEngine};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn t(mins: i64) -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap() + chrono::Duration::minutes(mins)
}

fn candle_closing_at(close: Decimal, mins: i64) -> Candle {
    Candle {
        bucket_start: t(mins),
        open: close,
        high: close,
        low: close,
        close,
        volume: dec!(10),
        closed: true,
    }
}

fn fast_warming_config() -> SuperTrendConfluenceConfig {
    SuperTrendConfluenceConfig {
        supertrend_period: 3,
        macd_fast: 2,
        macd_slow: 4,
        macd_signal: 2,
        min_confluence_score: 7,
        cooldown_seconds: 60,
        // Generous relative to the ATR-derived stop so these scenarios hit
        // their intended gate (confluence or cooldown) rather than getting
        // incidentally rejected by the R:R floor.
        target_bricks: 1000,
        ..SuperTrendConfluenceConfig::default()
    }
}

/// S3 — confluence reject: with no indicators warmed up yet, the first
/// candle's evaluation scores 0 and is rejected before any entry forms;
/// the rejection counter increments.
#[test]
fn s3_confluence_reject_increments_the_metric() {
    let mut strategy = SuperTrendConfluenceStrategy::new(fast_warming_config());
    let engine = RenkoEngine::new(RenkoConfig {
        atr_period: 3,
        atr_multiplier: dec!(1.0),
        price_source: PriceSource::Close,
        price_precision: 2,
        max_brick_history: 1000,
    });

    let ctx = StrategyContext {
        new_bricks: &[],
        renko: &engine,
        now: t(0),
        portfolio_flat: true,
        my_position: None,
        equity: dec!(100_000),
        max_position_fraction: dec!(1.0),
        candle_volume: dec!(10),
    };

    assert!(strategy.evaluate(&ctx).is_none());
    assert_eq!(strategy.counters().signals_rejected_confluence, 1);
}

/// Invariant 7 / S4 — whenever Strategy A actually produces an entry
/// signal, its confluence score is within 0..=10 and its risk/reward meets
/// the configured minimum. Take-profit is built from an independent
/// brick-count target, so this only holds because `target_bricks` is set
/// generously relative to the ATR-derived stop; `risk_reward_guard_rejects_a_target_too_tight_for_the_stop`
/// below drives the same guard into an actual rejection.
#[test]
fn confluence_score_is_bounded_and_risk_reward_always_meets_the_floor() {
    let config = SuperTrendConfluenceConfig { min_confluence_score: 0, ..fast_warming_config() };
    let min_rr = config.min_risk_reward;
    let mut strategy = SuperTrendConfluenceStrategy::new(config);

    let mut engine = RenkoEngine::new(RenkoConfig {
        atr_period: 3,
        atr_multiplier: dec!(0.2),
        price_source: PriceSource::Close,
        price_precision: 2,
        max_brick_history: 1000,
    });

    let mut price = dec!(100_000);
    let mut produced_a_signal = false;

    for i in 0..30 {
        price += dec!(40);
        let candle = candle_closing_at(price, i);
        let update = engine.on_candle(&candle).unwrap();

        let ctx = StrategyContext {
            new_bricks: &update.bricks_formed,
            renko: &engine,
            now: t(i),
            portfolio_flat: true,
            my_position: None,
            equity: dec!(100_000),
            max_position_fraction: dec!(1.0),
            candle_volume: candle.volume,
        };

        if let Some(signal) = strategy.evaluate(&ctx) {
            let score = signal.confluence_score.expect("entry signals always carry a confluence score");
            assert!(score <= 10, "confluence score must never exceed 10");
            let rr = signal.risk_reward.expect("entry signals always carry a risk/reward");
            assert!(rr >= min_rr, "risk/reward must meet the configured minimum by construction");
            produced_a_signal = true;
            break;
        }
    }

    assert!(produced_a_signal, "a sustained uptrend across 30 candles should eventually warm up a signal");
}

/// A target too tight for the floor-level stop distance pushes the
/// achieved risk/reward below the configured minimum, so the guard in
/// `try_entry` rejects every candidate entry and the counter tracks it.
#[test]
fn risk_reward_guard_rejects_a_target_too_tight_for_the_stop() {
    let config = SuperTrendConfluenceConfig {
        min_confluence_score: 0,
        target_bricks: 1,
        ..fast_warming_config()
    };
    let mut strategy = SuperTrendConfluenceStrategy::new(config);

    let mut engine = RenkoEngine::new(RenkoConfig {
        atr_period: 3,
        atr_multiplier: dec!(0.2),
        price_source: PriceSource::Close,
        price_precision: 2,
        max_brick_history: 1000,
    });

    let mut price = dec!(100_000);

    for i in 0..30 {
        price += dec!(40);
        let candle = candle_closing_at(price, i);
        let update = engine.on_candle(&candle).unwrap();

        let ctx = StrategyContext {
            new_bricks: &update.bricks_formed,
            renko: &engine,
            now: t(i),
            portfolio_flat: true,
            my_position: None,
            equity: dec!(100_000),
            max_position_fraction: dec!(1.0),
            candle_volume: candle.volume,
        };

        assert!(strategy.evaluate(&ctx).is_none(), "a 1-brick target can never clear the 2-brick stop floor");
    }

    assert!(
        strategy.counters().signals_rejected_risk_reward > 0,
        "the R:R guard should have rejected at least one candidate once bricks started forming"
    );
}

/// Invariant 8 — cooldown: a second entry attempt before `cooldown_seconds`
/// has elapsed never produces a signal, even when conditions would
/// otherwise qualify.
#[test]
fn cooldown_blocks_a_second_entry_within_the_window() {
    let config = SuperTrendConfluenceConfig { min_confluence_score: 0, cooldown_seconds: 300, ..fast_warming_config() };
    let mut strategy = SuperTrendConfluenceStrategy::new(config);

    let mut engine = RenkoEngine::new(RenkoConfig {
        atr_period: 3,
        atr_multiplier: dec!(0.2),
        price_source: PriceSource::Close,
        price_precision: 2,
        max_brick_history: 1000,
    });

    let mut price = dec!(100_000);
    let mut first_signal_at: Option<chrono::DateTime<Utc>> = None;

    for i in 0..30 {
        price += dec!(40);
        let candle = candle_closing_at(price, i);
        let update = engine.on_candle(&candle).unwrap();

        let ctx = StrategyContext {
            new_bricks: &update.bricks_formed,
            renko: &engine,
            now: t(i),
            portfolio_flat: true,
            my_position: None,
            equity: dec!(100_000),
            max_position_fraction: dec!(1.0),
            candle_volume: candle.volume,
        };

        let signal = strategy.evaluate(&ctx);
        if first_signal_at.is_none() {
            if signal.is_some() {
                first_signal_at = Some(t(i));
            }
            continue;
        }

        // Any candle after the first signal is still within the 300s
        // (5-candle) cooldown window for several iterations.
        if t(i) - first_signal_at.unwrap() < chrono::Duration::seconds(300) {
            assert!(signal.is_none(), "a second entry must not fire inside the cooldown window");
        } else {
            break;
        }
    }

    assert!(first_signal_at.is_some(), "setup should have produced an initial signal to test cooldown against");
}
