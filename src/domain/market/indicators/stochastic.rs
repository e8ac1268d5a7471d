use std::collections::VecDeque;

use super::sma::Sma;
use super::Bar;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StochasticOutput {
    pub k: f64,
    pub d: f64,
}

/// `%K = 100*(close - lowest_low) / (highest_high - lowest_low)` over a
/// trailing `k` window; `%D` is an SMA of the `%K` series.
#[derive(Debug, Clone)]
pub struct Stochastic {
    k_period: usize,
    window: VecDeque<Bar>,
    d_sma: Sma,
}

impl Stochastic {
    pub fn new(k_period: usize, d_period: usize) -> Self {
        Self {
            k_period,
            window: VecDeque::with_capacity(k_period),
            d_sma: Sma::new(d_period),
        }
    }

    pub fn next(&mut self, bar: Bar) -> Option<StochasticOutput> {
        self.window.push_back(bar);
        if self.window.len() > self.k_period {
            self.window.pop_front();
        }
        if self.window.len() < self.k_period {
            return None;
        }

        let highest = self.window.iter().map(|b| b.high).fold(f64::MIN, f64::max);
        let lowest = self.window.iter().map(|b| b.low).fold(f64::MAX, f64::min);
        let range = highest - lowest;
        let k = if range == 0.0 { 50.0 } else { 100.0 * (bar.close - lowest) / range };

        let d = self.d_sma.next(k)?;
        Some(StochasticOutput { k, d })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bar(h: f64, l: f64, c: f64) -> Bar {
        Bar { high: h, low: l, close: c, volume: 1.0 }
    }

    #[test]
    fn k_at_window_high_is_100() {
        let mut s = Stochastic::new(3, 1);
        s.next(bar(10.0, 8.0, 9.0));
        s.next(bar(12.0, 9.0, 11.0));
        let out = s.next(bar(15.0, 10.0, 15.0)).unwrap();
        assert_eq!(out.k, 100.0);
    }

    #[test]
    fn k_at_window_low_is_0() {
        let mut s = Stochastic::new(3, 1);
        s.next(bar(10.0, 8.0, 9.0));
        s.next(bar(12.0, 9.0, 11.0));
        let out = s.next(bar(15.0, 7.0, 7.0)).unwrap();
        assert_eq!(out.k, 0.0);
    }
}
