use super::sma::Sma;
use super::{true_range, Bar};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuperTrendDirection {
    Up,
    Down,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SuperTrendOutput {
    pub direction: SuperTrendDirection,
    pub value: f64,
    pub atr: f64,
    pub upper_band: f64,
    pub lower_band: f64,
}

#[derive(Debug, Clone, Copy)]
struct Cached {
    direction: SuperTrendDirection,
    final_upper: f64,
    final_lower: f64,
    close: f64,
}

/// The critical stateful indicator (§4.3). Its ATR leg is a plain SMA over
/// brick true ranges — deliberately not the Wilder ATR used elsewhere in
/// this kit — and its bands persist across calls rather than being
/// recomputed from scratch, which is what makes incremental and batch
/// evaluation agree (§8 invariant 3).
#[derive(Debug, Clone)]
pub struct SuperTrend {
    multiplier: f64,
    atr: Sma,
    prev_close_for_tr: Option<f64>,
    cached: Option<Cached>,
}

impl SuperTrend {
    pub fn new(period: usize, multiplier: f64) -> Self {
        Self {
            multiplier,
            atr: Sma::new(period),
            prev_close_for_tr: None,
            cached: None,
        }
    }

    pub fn next(&mut self, bar: Bar) -> Option<SuperTrendOutput> {
        let tr = true_range(bar, self.prev_close_for_tr);
        self.prev_close_for_tr = Some(bar.close);
        let atr = self.atr.next(tr)?;

        let hl2 = (bar.high + bar.low) / 2.0;
        let basic_upper = hl2 + self.multiplier * atr;
        let basic_lower = hl2 - self.multiplier * atr;

        let (final_upper, final_lower) = match &self.cached {
            Some(c) => {
                let fu = if basic_upper < c.final_upper && c.close > c.final_upper {
                    basic_upper
                } else {
                    c.final_upper
                };
                let fl = if basic_lower > c.final_lower && c.close < c.final_lower {
                    basic_lower
                } else {
                    c.final_lower
                };
                (fu, fl)
            }
            None => (basic_upper, basic_lower),
        };

        let (direction, value) = match &self.cached {
            Some(c) => match c.direction {
                SuperTrendDirection::Up if bar.close <= final_lower => {
                    (SuperTrendDirection::Down, final_upper)
                }
                SuperTrendDirection::Down if bar.close >= final_upper => {
                    (SuperTrendDirection::Up, final_lower)
                }
                SuperTrendDirection::Up => (SuperTrendDirection::Up, final_lower),
                SuperTrendDirection::Down => (SuperTrendDirection::Down, final_upper),
            },
            None => {
                if bar.close > hl2 {
                    (SuperTrendDirection::Up, final_lower)
                } else {
                    (SuperTrendDirection::Down, final_upper)
                }
            }
        };

        self.cached = Some(Cached { direction, final_upper, final_lower, close: bar.close });

        Some(SuperTrendOutput { direction, value, atr, upper_band: final_upper, lower_band: final_lower })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bar(h: f64, l: f64, c: f64) -> Bar {
        Bar { high: h, low: l, close: c, volume: 1.0 }
    }

    #[test]
    fn none_until_atr_window_fills() {
        let mut st = SuperTrend::new(3, 3.0);
        assert_eq!(st.next(bar(10.0, 9.0, 9.5)), None);
        assert_eq!(st.next(bar(11.0, 10.0, 10.5)), None);
        assert!(st.next(bar(12.0, 11.0, 11.5)).is_some());
    }

    #[test]
    fn incremental_matches_batch_replay() {
        let bars = [
            bar(100.0, 98.0, 99.0),
            bar(101.0, 99.0, 100.5),
            bar(102.0, 100.0, 101.5),
            bar(103.0, 101.0, 102.5),
            bar(90.0, 85.0, 86.0),
            bar(88.0, 83.0, 84.0),
        ];

        let mut incremental = SuperTrend::new(3, 3.0);
        let incremental_out: Vec<_> = bars.iter().map(|b| incremental.next(*b)).collect();

        let mut batch = SuperTrend::new(3, 3.0);
        let mut batch_out = Vec::new();
        for b in &bars {
            batch_out.push(batch.next(*b));
        }

        assert_eq!(incremental_out, batch_out);
        assert_eq!(incremental_out.last().unwrap(), batch_out.last().unwrap());
    }

    #[test]
    fn flips_down_when_close_breaches_lower_band() {
        let mut st = SuperTrend::new(3, 1.0);
        st.next(bar(100.0, 98.0, 99.0));
        st.next(bar(101.0, 99.0, 100.0));
        let out3 = st.next(bar(102.0, 100.0, 101.0)).unwrap();
        assert_eq!(out3.direction, SuperTrendDirection::Up);

        let out4 = st.next(bar(80.0, 70.0, 72.0)).unwrap();
        assert_eq!(out4.direction, SuperTrendDirection::Down);
    }
}
