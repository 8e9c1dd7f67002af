// Analyzer module: indicator math and per-record screening.

pub mod market_indicators;
pub mod price_analysis;

pub use price_analysis::{Analyzer, AnalyzerImpl, SkippedRecord};
