use super::sma::Sma;
use super::{true_range, Bar};

/// Wilder-smoothed Average True Range. Distinct from the Renko engine's own
/// ATR (a plain SMA over candle true ranges, §4.3) — every other ATR
/// consumer in this kit is Wilder-smoothed, and that distinction is load
/// bearing so it is kept as two separate types rather than one with a mode
/// flag.
#[derive(Debug, Clone)]
pub struct WilderAtr {
    period: usize,
    seed: Sma,
    value: Option<f64>,
    prev_close: Option<f64>,
}

impl WilderAtr {
    pub fn new(period: usize) -> Self {
        Self {
            period,
            seed: Sma::new(period),
            value: None,
            prev_close: None,
        }
    }

    pub fn next(&mut self, bar: Bar) -> Option<f64> {
        let tr = true_range(bar, self.prev_close);
        self.prev_close = Some(bar.close);

        match self.value {
            None => {
                if let Some(sma) = self.seed.next(tr) {
                    self.value = Some(sma);
                }
            }
            Some(prev) => {
                let p = self.period as f64;
                self.value = Some((prev * (p - 1.0) + tr) / p);
            }
        }
        self.value
    }
}
