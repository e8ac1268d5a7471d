use super::sma::Sma;

/// Exponential moving average, seeded with an SMA of the first `period`
/// values rather than the single-value seed most libraries use — the
/// seeding matters for the SuperTrend persistence invariant, so it is
/// spelled out explicitly rather than left to a generic crate.
#[derive(Debug, Clone)]
pub struct Ema {
    alpha: f64,
    seed: Sma,
    value: Option<f64>,
}

impl Ema {
    pub fn new(period: usize) -> Self {
        Self {
            alpha: 2.0 / (period as f64 + 1.0),
            seed: Sma::new(period),
            value: None,
        }
    }

    pub fn next(&mut self, x: f64) -> Option<f64> {
        match self.value {
            None => {
                if let Some(sma) = self.seed.next(x) {
                    self.value = Some(sma);
                }
                self.value
            }
            Some(prev) => {
                let v = self.alpha * x + (1.0 - self.alpha) * prev;
                self.value = Some(v);
                self.value
            }
        }
    }

    pub fn value(&self) -> Option<f64> {
        self.value
    }
}
