use rust_decimal::Decimal;

use crate::domain::market::regime::MarketRegimeType;
use crate::domain::trading::signal::{OriginStrategy, Signal, SignalKind};

const TRENDING_PREFER_A_SCORE: u8 = 8;
const RANGING_PREFER_B_CONFIDENCE: Decimal = Decimal::from_parts(7, 0, 0, false, 1);

/// Picks at most one signal per candle from the two strategies (C6). Exit
/// signals never reach this — the orchestrator fires them directly from
/// whichever strategy owns the open position.
pub fn arbitrate(regime: MarketRegimeType, sig_a: Option<Signal>, sig_b: Option<Signal>) -> Option<Signal> {
    debug_assert!(sig_a.as_ref().map(|s| s.kind == SignalKind::LongEntry).unwrap_or(true));
    debug_assert!(sig_b.as_ref().map(|s| s.kind == SignalKind::LongEntry).unwrap_or(true));

    match regime {
        MarketRegimeType::Trending => match (&sig_a, &sig_b) {
            (Some(a), _) if a.confluence_score.unwrap_or(0) >= TRENDING_PREFER_A_SCORE => sig_a,
            (None, Some(_)) => sig_b,
            (Some(_), _) => sig_a,
            (None, None) => None,
        },
        MarketRegimeType::Ranging => match (&sig_a, &sig_b) {
            (_, Some(b)) if b.confidence >= RANGING_PREFER_B_CONFIDENCE => sig_b,
            (Some(_), None) => sig_a,
            (Some(a), Some(b)) => {
                if a.confidence >= b.confidence {
                    sig_a
                } else {
                    sig_b
                }
            }
            (None, Some(_)) => sig_b,
            (None, None) => None,
        },
    }
}
