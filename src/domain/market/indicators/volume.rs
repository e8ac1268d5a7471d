use std::collections::VecDeque;

const WINDOW: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VolumeSurgeOutput {
    pub surge: bool,
    pub ratio: f64,
    pub avg: f64,
}

/// Over a trailing window of 20 volumes, the latest is excluded from the
/// mean; `ratio = last / mean(preceding 19)`, surge when `ratio >= threshold`.
#[derive(Debug, Clone)]
pub struct VolumeSurge {
    threshold: f64,
    window: VecDeque<f64>,
}

impl VolumeSurge {
    pub fn new(threshold: f64) -> Self {
        Self { threshold, window: VecDeque::with_capacity(WINDOW) }
    }

    pub fn next(&mut self, volume: f64) -> Option<VolumeSurgeOutput> {
        self.window.push_back(volume);
        if self.window.len() > WINDOW {
            self.window.pop_front();
        }
        if self.window.len() < WINDOW {
            return None;
        }

        let last = *self.window.back().unwrap();
        let preceding_sum: f64 = self.window.iter().take(WINDOW - 1).sum();
        let avg = preceding_sum / (WINDOW - 1) as f64;
        let ratio = if avg == 0.0 { 0.0 } else { last / avg };

        Some(VolumeSurgeOutput { surge: ratio >= self.threshold, ratio, avg })
    }
}
