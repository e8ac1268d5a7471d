/// Coarse market classification derived from how often the Renko trend
/// flips across both strategies' engines (§4.6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum MarketRegimeType {
    Trending,
    Ranging,
}

impl MarketRegimeType {
    pub fn as_str(self) -> &'static str {
        match self {
            MarketRegimeType::Trending => "TRENDING",
            MarketRegimeType::Ranging => "RANGING",
        }
    }
}

const RANGING_THRESHOLD_PER_HOUR: f64 = 3.0;

/// Tracks combined trend-change counts from both Renko engines against
/// session wall-clock age to classify the regime.
#[derive(Debug, Clone)]
pub struct RegimeDetector {
    session_start_secs: f64,
}

impl RegimeDetector {
    pub fn new(session_start_secs: f64) -> Self {
        Self { session_start_secs }
    }

    /// `total_trend_changes` is the sum of both Renko engines' trend-change
    /// counters; `now_secs` is the same monotonic clock `session_start_secs`
    /// was sampled from.
    pub fn classify(&self, total_trend_changes: u64, now_secs: f64) -> MarketRegimeType {
        let elapsed_hours = ((now_secs - self.session_start_secs) / 3600.0).max(1.0 / 3600.0);
        let per_hour = total_trend_changes as f64 / elapsed_hours;
        if per_hour > RANGING_THRESHOLD_PER_HOUR {
            MarketRegimeType::Ranging
        } else {
            MarketRegimeType::Trending
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn low_flip_rate_is_trending() {
        let detector = RegimeDetector::new(0.0);
        assert_eq!(detector.classify(2, 3600.0), MarketRegimeType::Trending);
    }

    #[test]
    fn high_flip_rate_is_ranging() {
        let detector = RegimeDetector::new(0.0);
        assert_eq!(detector.classify(10, 3600.0), MarketRegimeType::Ranging);
    }

    #[test]
    fn boundary_is_trending_inclusive() {
        let detector = RegimeDetector::new(0.0);
        assert_eq!(detector.classify(3, 3600.0), MarketRegimeType::Trending);
    }
}
