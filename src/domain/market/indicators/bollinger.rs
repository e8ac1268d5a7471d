use std::collections::VecDeque;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BollingerOutput {
    pub upper: f64,
    pub middle: f64,
    pub lower: f64,
}

/// Bollinger Bands: SMA middle band, population standard deviation scaled
/// by `stddev_mult` for the outer bands, over the same trailing window.
#[derive(Debug, Clone)]
pub struct Bollinger {
    period: usize,
    stddev_mult: f64,
    window: VecDeque<f64>,
}

impl Bollinger {
    pub fn new(period: usize, stddev_mult: f64) -> Self {
        Self {
            period,
            stddev_mult,
            window: VecDeque::with_capacity(period),
        }
    }

    pub fn next(&mut self, close: f64) -> Option<BollingerOutput> {
        self.window.push_back(close);
        if self.window.len() > self.period {
            self.window.pop_front();
        }
        if self.window.len() < self.period {
            return None;
        }

        let n = self.period as f64;
        let mean = self.window.iter().sum::<f64>() / n;
        let variance = self.window.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n;
        let sd = variance.sqrt();

        Some(BollingerOutput {
            upper: mean + self.stddev_mult * sd,
            middle: mean,
            lower: mean - self.stddev_mult * sd,
        })
    }
}
