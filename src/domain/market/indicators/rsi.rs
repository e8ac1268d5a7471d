use super::sma::Sma;

/// Wilder RSI: average gain/loss seeded with an SMA of the first `period`
/// gains/losses, then smoothed with the same `(prev*(p-1)+x)/p` recurrence
/// as Wilder ATR.
#[derive(Debug, Clone)]
pub struct Rsi {
    period: usize,
    gain_seed: Sma,
    loss_seed: Sma,
    avg_gain: Option<f64>,
    avg_loss: Option<f64>,
    prev_close: Option<f64>,
}

impl Rsi {
    pub fn new(period: usize) -> Self {
        Self {
            period,
            gain_seed: Sma::new(period),
            loss_seed: Sma::new(period),
            avg_gain: None,
            avg_loss: None,
            prev_close: None,
        }
    }

    pub fn next(&mut self, close: f64) -> Option<f64> {
        let prev = self.prev_close.replace(close);
        let prev = prev?;

        let change = close - prev;
        let gain = change.max(0.0);
        let loss = (-change).max(0.0);

        match (self.avg_gain, self.avg_loss) {
            (None, None) => {
                let g = self.gain_seed.next(gain);
                let l = self.loss_seed.next(loss);
                if let (Some(g), Some(l)) = (g, l) {
                    self.avg_gain = Some(g);
                    self.avg_loss = Some(l);
                }
            }
            (Some(ag), Some(al)) => {
                let p = self.period as f64;
                self.avg_gain = Some((ag * (p - 1.0) + gain) / p);
                self.avg_loss = Some((al * (p - 1.0) + loss) / p);
            }
            _ => unreachable!("avg_gain and avg_loss are always set together"),
        }

        match (self.avg_gain, self.avg_loss) {
            (Some(ag), Some(al)) if al == 0.0 => Some(if ag == 0.0 { 50.0 } else { 100.0 }),
            (Some(ag), Some(al)) => {
                let rs = ag / al;
                Some(100.0 - 100.0 / (1.0 + rs))
            }
            _ => None,
        }
    }
}
