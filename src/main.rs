use chrono::Utc;
use clap::Parser;
use renko_confluence_engine::application::session::{Event, Session};
use renko_confluence_engine::config::SessionConfig;
use renko_confluence_engine::domain::market::tick::Tick;
use rust_decimal::Decimal;
use tracing::{error, info, Level};

/// Drives a `Session` with a synthetic tick feed. There is no live exchange
/// connector in scope here — this binary is a demo/soak-test harness, the
/// same role `rustrade`'s paper-trading CLI plays for its own engine.
#[derive(Parser, Debug)]
#[command(author, version, about = "Dual SuperTrend/Bollinger Renko confluence engine")]
struct Cli {
    /// Number of synthetic ticks to feed through the session before shutdown.
    #[arg(long, default_value_t = 5000)]
    ticks: u64,

    /// Simulated seconds of market time between ticks.
    #[arg(long, default_value_t = 5)]
    tick_interval_secs: i64,
}

/// Small deterministic xorshift PRNG for the synthetic feed below — this
/// binary isn't a market connector, so no rng crate is pulled in for it.
struct Xorshift64(u64);

impl Xorshift64 {
    fn next_u64(&mut self) -> u64 {
        let mut x = self.0;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.0 = x;
        x
    }

    /// Value in [-1.0, 1.0].
    fn next_signed_unit(&mut self) -> f64 {
        (self.next_u64() % 2_000_001) as f64 / 1_000_000.0 - 1.0
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .with_target(false)
        .init();

    let cli = Cli::parse();

    let config = match SessionConfig::from_env() {
        Ok(c) => c,
        Err(e) => {
            error!(error = %e, "invalid session configuration, refusing to start");
            return Err(e);
        }
    };

    info!(symbol = %config.symbol, capital = %config.initial_capital, "starting session");

    let start = Utc::now();
    let mut session = Session::new(config, start).map_err(anyhow::Error::from)?;

    let (tx, rx) = crossbeam_channel::unbounded::<Event>();
    let n_ticks = cli.ticks;
    let interval = cli.tick_interval_secs;
    std::thread::spawn(move || {
        let mut rng = Xorshift64(0x9E3779B97F4A7C15);
        let mut price = Decimal::new(100_000, 0);
        let mut time = start;
        for _ in 0..n_ticks {
            let drift = Decimal::from_f64_retain(rng.next_signed_unit() * 15.0).unwrap_or(Decimal::ZERO);
            price = (price + drift).max(Decimal::ONE);
            time += chrono::Duration::seconds(interval);
            if let Ok(tick) = Tick::new(price, Decimal::ONE, time) {
                if tx.send(Event::Tick(tick)).is_err() {
                    break;
                }
            }
        }
        let _ = tx.send(Event::Shutdown);
    });

    let final_snapshot = session.run(rx.iter(), |snapshot| {
        info!(
            regime = %snapshot.market_regime,
            equity = %snapshot.portfolio.equity,
            trades = snapshot.metrics.total_trades,
            "snapshot"
        );
    });

    println!("{}", serde_json::to_string_pretty(&final_snapshot)?);
    Ok(())
}
