pub mod brick;
pub mod candle;
pub mod indicators;
pub mod regime;
pub mod renko;
pub mod tick;
