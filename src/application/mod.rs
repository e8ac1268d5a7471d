pub mod arbiter;
pub mod candle_aggregator;
pub mod executor;
pub mod session;
pub mod strategies;
