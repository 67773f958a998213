//! End-to-end scenarios: series in, indicators, forecast, decision out.

use chrono::{Duration, NaiveDate, NaiveDateTime};

use coinlens_core::analysis::decision::MIXED_SIGNALS_REASON;
use coinlens_core::analysis::{
    analyze_series, decide, predict, sentiment_history, AnalysisConfig, DecisionConfig,
    DecisionLabel, Trend,
};
use coinlens_core::backtest::{backtest, Strategy};
use coinlens_core::correlation::correlate;
use coinlens_core::data::{synthetic_series, DataSource};
use coinlens_core::domain::{Bar, PriceSeries};
use coinlens_core::indicators::{IndicatorParams, IndicatorSet};
use coinlens_core::stats::{cleaning_report, CleaningReport};

fn start() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 1, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
}

fn series(closes: &[f64]) -> PriceSeries {
    let bars = closes
        .iter()
        .enumerate()
        .map(|(i, &close)| Bar {
            timestamp: start() + Duration::days(i as i64),
            open: close,
            high: close,
            low: close,
            close,
            volume: 1_000.0,
        })
        .collect();
    PriceSeries::new(bars).unwrap()
}

#[test]
fn gaining_sequence_indicators() {
    let closes = [
        100.0, 102.0, 104.0, 103.0, 105.0, 107.0, 106.0, 108.0, 110.0, 109.0, 111.0, 113.0,
        112.0, 114.0,
    ];
    let set = IndicatorSet::compute(&closes, &IndicatorParams::default());
    let last = set.last();
    assert!(last.rsi > 50.0, "rsi {}", last.rsi);
    assert!(last.macd > 0.0, "macd {}", last.macd);
    assert_eq!(set.len(), closes.len());
}

#[test]
fn empty_series_degrades_to_hold() {
    let empty = PriceSeries::empty();
    let report = cleaning_report(&empty);
    assert_eq!(report, CleaningReport::default());

    let prediction = predict(&empty.closes());
    assert_eq!(prediction.current_price, 0.0);
    assert_eq!(prediction.confidence_interval, (0.0, 0.0));

    let decision = decide(0.0, &report, &prediction, Trend::Stable, &DecisionConfig::default());
    assert_eq!(decision.label, DecisionLabel::Hold);
    assert_eq!(decision.reasons, vec![MIXED_SIGNALS_REASON.to_string()]);
}

#[test]
fn synthetic_fallback_runs_through_every_stage() {
    let end = start() + Duration::days(120);
    let btc = synthetic_series("BTC", end);
    let eth = synthetic_series("ETH", end);

    let config = AnalysisConfig::default();
    let analysis = analyze_series("BTC", &btc, DataSource::Synthetic, &config).unwrap();
    assert!(analysis.is_synthetic());
    assert_eq!(analysis.bars, 90);
    let p = &analysis.prediction;
    assert!((p.forecast - p.current_price).abs() <= p.current_price * 0.15 + 1e-9);
    assert!((0.0..=1.0).contains(&analysis.decision.confidence));

    let sentiment = sentiment_history(&btc).unwrap();
    assert_eq!(sentiment.history.len(), 90 - 7);
    assert!((0.0..=1.0).contains(&sentiment.score));

    let corr = correlate(&[("BTC", &btc), ("ETH", &eth)]).unwrap();
    assert_eq!(corr.periods, 89);
    assert_eq!(corr.matrix.get(0, 0), Some(1.0));

    for strategy in Strategy::ALL {
        let result = backtest(&btc, 10_000.0, strategy).unwrap();
        assert!(result.final_capital > 0.0);
        assert!(result.wins + result.losses <= result.trades.len());
    }
}

#[test]
fn analysis_is_deterministic() {
    let closes: Vec<f64> = (0..60)
        .map(|i| 100.0 + (i as f64 * 0.3).sin() * 8.0 + i as f64 * 0.2)
        .collect();
    let s = series(&closes);
    let a = analyze_series("X", &s, DataSource::Csv, &AnalysisConfig::default()).unwrap();
    let b = analyze_series("X", &s, DataSource::Csv, &AnalysisConfig::default()).unwrap();
    assert_eq!(a, b);
}
