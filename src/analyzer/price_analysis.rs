use crate::analyzer::market_indicators::MarketIndicators;
use crate::config::AnalysisConfig;
use crate::model::{AnalysisResult, FetchedRecord, MarketRecord, RecordOutcome, SkipReason};
use crate::utils::round_to;
use serde::Serialize;
use std::collections::HashMap;

/// Trait defining the interface for a market record analyzer.
pub trait Analyzer: Send + Sync {
    /// Screens one record. Never panics on malformed input.
    fn analyze_record(&self, record: &MarketRecord, cfg: &AnalysisConfig) -> RecordOutcome;

    /// Screens every fetched element, keeping input order. Elements that
    /// failed to decode are recorded as `Malformed` skips.
    fn analyze_all(&self, records: &[FetchedRecord], cfg: &AnalysisConfig) -> AnalysisReport {
        let mut report = AnalysisReport::default();
        for fetched in records {
            match fetched {
                Ok(record) => {
                    let outcome = self.analyze_record(record, cfg);
                    report.push(record.label(), outcome);
                }
                Err(malformed) => report.push(&malformed.label, Err(SkipReason::Malformed)),
            }
        }
        report
    }
}

/// Implementation of the market record analyzer.
pub struct AnalyzerImpl;

impl AnalyzerImpl {
    pub fn new() -> Self {
        Self
    }
}

impl Default for AnalyzerImpl {
    fn default() -> Self {
        Self::new()
    }
}

fn required(value: Option<f64>, field: &'static str) -> Result<f64, SkipReason> {
    value.ok_or(SkipReason::MissingField(field))
}

fn finite(value: Option<f64>, indicator: &'static str) -> Result<f64, SkipReason> {
    match value {
        Some(v) if v.is_finite() => Ok(round_to(v, 2)),
        _ => Err(SkipReason::NonFinite(indicator)),
    }
}

impl Analyzer for AnalyzerImpl {
    /// Filters on 24h change and volume, then computes the indicators over
    /// the series `[high_24h, low_24h, current_price]`.
    fn analyze_record(&self, record: &MarketRecord, cfg: &AnalysisConfig) -> RecordOutcome {
        let price = required(record.current_price, "current_price")?;
        let change = record.price_change_percentage_24h.unwrap_or(0.0);
        let volume = required(record.total_volume, "total_volume")?;

        // NaN never passes either filter
        if !(change > cfg.threshold) {
            return Err(SkipReason::BelowThreshold);
        }
        if !(volume > cfg.min_volume) {
            return Err(SkipReason::BelowVolume);
        }

        let high = required(record.high_24h, "high_24h")?;
        let low = required(record.low_24h, "low_24h")?;
        let name = record.name.clone().ok_or(SkipReason::MissingField("name"))?;
        let symbol = record.symbol.clone().ok_or(SkipReason::MissingField("symbol"))?;

        let series = [high, low, price];
        let sma = MarketIndicators::moving_average(&series, cfg.sma_window).last().copied();
        let rsi = MarketIndicators::compute_rsi(&series, cfg.rsi_window).last().copied();
        // Undefined until the slow window fills; the row is kept without it.
        let macd = MarketIndicators::macd(&series, cfg.macd_fast, cfg.macd_slow)
            .last()
            .copied()
            .filter(|v| v.is_finite())
            .map(|v| round_to(v, 2));
        let band = MarketIndicators::bollinger(&series, cfg.bollinger_window, cfg.bollinger_dev)
            .last()
            .copied();

        Ok(AnalysisResult {
            name,
            symbol,
            price,
            change_24h: round_to(change, 2),
            volume,
            sma: finite(sma, "sma")?,
            rsi: finite(rsi, "rsi")?,
            macd,
            bollinger_mavg: finite(band.map(|b| b.mid), "bollinger_mavg")?,
            bollinger_upper: finite(band.map(|b| b.upper), "bollinger_upper")?,
            bollinger_lower: finite(band.map(|b| b.lower), "bollinger_lower")?,
        })
    }
}

/// Results of screening one batch, plus what was dropped and why.
#[derive(Debug, Default)]
pub struct AnalysisReport {
    pub results: Vec<AnalysisResult>,
    pub skipped: Vec<SkippedRecord>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SkippedRecord {
    pub coin: String,
    pub reason: SkipReason,
}

impl AnalysisReport {
    fn push(&mut self, label: &str, outcome: RecordOutcome) {
        match outcome {
            Ok(result) => self.results.push(result),
            Err(reason) => {
                tracing::debug!("Skipping {}: {}", label, reason);
                self.skipped.push(SkippedRecord {
                    coin: label.to_string(),
                    reason,
                });
            }
        }
    }

    /// Number of skipped records per reason.
    pub fn skip_counts(&self) -> HashMap<SkipReason, usize> {
        let mut counts = HashMap::new();
        for s in &self.skipped {
            *counts.entry(s.reason).or_insert(0) += 1;
        }
        counts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::MalformedRecord;

    fn coin(symbol: &str, change: Option<f64>, volume: f64) -> MarketRecord {
        MarketRecord {
            id: Some(symbol.to_string()),
            name: Some(symbol.to_uppercase()),
            symbol: Some(symbol.to_string()),
            current_price: Some(100.0),
            high_24h: Some(110.0),
            low_24h: Some(90.0),
            price_change_percentage_24h: change,
            total_volume: Some(volume),
            last_updated: None,
        }
    }

    fn analyze(record: &MarketRecord) -> RecordOutcome {
        AnalyzerImpl::new().analyze_record(record, &AnalysisConfig::default())
    }

    #[test]
    fn keeps_record_above_both_thresholds() {
        let result = analyze(&coin("abc", Some(7.456), 2_000_000.0)).unwrap();
        assert_eq!(result.symbol, "abc");
        assert_eq!(result.name, "ABC");
        assert_eq!(result.price, 100.0);
        assert_eq!(result.change_24h, 7.46);
        assert_eq!(result.volume, 2_000_000.0);
        assert!(result.bollinger_upper >= result.bollinger_mavg);
        assert!(result.bollinger_mavg >= result.bollinger_lower);
    }

    #[test]
    fn two_point_window_gives_trailing_mean_95_not_series_mean_100() {
        // [110, 90, 100]: the 2-period window averages 90 and 100 only, so the
        // series mean of 100 is not reachable at the default window.
        let result = analyze(&coin("abc", Some(10.0), 2_000_000.0)).unwrap();
        assert_eq!(result.sma, 95.0);
        assert_eq!(result.bollinger_mavg, 95.0);
        assert_ne!(result.sma, 100.0);
        assert_eq!(result.rsi, 50.0);
    }

    #[test]
    fn macd_is_empty_on_short_series_and_row_is_kept() {
        let result = analyze(&coin("abc", Some(10.0), 2_000_000.0)).unwrap();
        assert_eq!(result.macd, None);

        let cfg = AnalysisConfig {
            macd_fast: 1,
            macd_slow: 3,
            ..AnalysisConfig::default()
        };
        let result = AnalyzerImpl::new()
            .analyze_record(&coin("abc", Some(10.0), 2_000_000.0), &cfg)
            .unwrap();
        assert!(result.macd.is_some());
    }

    #[test]
    fn three_point_window_gives_series_mean_100() {
        let cfg = AnalysisConfig {
            sma_window: 3,
            bollinger_window: 3,
            ..AnalysisConfig::default()
        };
        let result = AnalyzerImpl::new()
            .analyze_record(&coin("abc", Some(10.0), 2_000_000.0), &cfg)
            .unwrap();
        assert_eq!(result.sma, 100.0);
        assert_eq!(result.bollinger_mavg, 100.0);
    }

    #[test]
    fn thresholds_are_strict() {
        assert_eq!(analyze(&coin("a", Some(5.0), 2_000_000.0)), Err(SkipReason::BelowThreshold));
        assert_eq!(analyze(&coin("a", Some(6.0), 1_000_000.0)), Err(SkipReason::BelowVolume));
        assert!(analyze(&coin("a", Some(5.01), 1_000_000.5)).is_ok());
    }

    #[test]
    fn missing_change_counts_as_zero() {
        assert_eq!(analyze(&coin("a", None, 5_000_000.0)), Err(SkipReason::BelowThreshold));

        let cfg = AnalysisConfig {
            threshold: -1.0,
            ..AnalysisConfig::default()
        };
        let result = AnalyzerImpl::new()
            .analyze_record(&coin("a", None, 5_000_000.0), &cfg)
            .unwrap();
        assert_eq!(result.change_24h, 0.0);
    }

    #[test]
    fn missing_fields_skip_the_record() {
        let mut record = coin("a", Some(10.0), 5_000_000.0);
        record.low_24h = None;
        assert_eq!(analyze(&record), Err(SkipReason::MissingField("low_24h")));

        let mut record = coin("a", Some(10.0), 5_000_000.0);
        record.current_price = None;
        assert_eq!(analyze(&record), Err(SkipReason::MissingField("current_price")));
    }

    #[test]
    fn filter_runs_before_high_low_lookup() {
        let mut record = coin("a", Some(1.0), 5_000_000.0);
        record.high_24h = None;
        assert_eq!(analyze(&record), Err(SkipReason::BelowThreshold));
    }

    #[test]
    fn non_finite_indicator_skips() {
        let mut record = coin("a", Some(10.0), 5_000_000.0);
        record.low_24h = Some(f64::INFINITY);
        assert_eq!(analyze(&record), Err(SkipReason::NonFinite("sma")));
    }

    #[test]
    fn nan_change_is_not_above_threshold() {
        assert_eq!(
            analyze(&coin("a", Some(f64::NAN), 5_000_000.0)),
            Err(SkipReason::BelowThreshold)
        );
    }

    #[test]
    fn report_keeps_order_and_counts_skips() {
        let records: Vec<FetchedRecord> = vec![
            Ok(coin("first", Some(9.0), 3_000_000.0)),
            Ok(coin("flat", Some(0.5), 3_000_000.0)),
            Err(MalformedRecord {
                label: "broken".into(),
                error: "invalid type".into(),
            }),
            Ok(coin("thin", Some(9.0), 10.0)),
            Ok(coin("second", Some(12.0), 8_000_000.0)),
            Ok(coin("nochange", None, 8_000_000.0)),
        ];
        let report = AnalyzerImpl::new().analyze_all(&records, &AnalysisConfig::default());
        let symbols: Vec<&str> = report.results.iter().map(|r| r.symbol.as_str()).collect();
        assert_eq!(symbols, vec!["first", "second"]);
        assert_eq!(report.skipped.len(), 4);
        assert_eq!(report.skipped[1].coin, "broken");
        assert_eq!(report.skipped[1].reason, SkipReason::Malformed);
        let counts = report.skip_counts();
        assert_eq!(counts[&SkipReason::BelowThreshold], 2);
        assert_eq!(counts[&SkipReason::BelowVolume], 1);
        assert_eq!(counts[&SkipReason::Malformed], 1);
    }

    #[test]
    fn membership_matches_filter_predicate() {
        let cfg = AnalysisConfig::default();
        let analyzer = AnalyzerImpl::new();
        for change in [-3.0, 0.0, 4.99, 5.0, 5.5, 20.0] {
            for volume in [0.0, 999_999.0, 1_000_000.0, 1_000_001.0, 1e9] {
                let kept = analyzer
                    .analyze_record(&coin("x", Some(change), volume), &cfg)
                    .is_ok();
                assert_eq!(kept, change > cfg.threshold && volume > cfg.min_volume);
            }
        }
    }
}
