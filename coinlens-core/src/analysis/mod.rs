//! Analysis core: trend, prediction, decision, sentiment, anomalies, alerts.
//!
//! Every function here is a pure transformation of explicit inputs. Nothing
//! reads shared state, so calls are safe from any number of worker threads.

pub mod alerts;
pub mod anomaly;
pub mod decision;
pub mod prediction;
pub mod report;
pub mod scoring;
pub mod sentiment;
pub mod snapshot;
pub mod trend;

pub use alerts::{evaluate_alerts, AlertCondition, AlertKind, AlertRule, TriggeredAlert};
pub use anomaly::{detect_anomalies, Anomaly, AnomalyKind};
pub use decision::{decide, Decision, DecisionConfig, DecisionLabel, FactorBreakdown};
pub use prediction::{predict, MethodEstimates, Prediction};
pub use report::{analyze_series, AnalysisConfig, AnalysisRecord, AssetAnalysis};
pub use scoring::{Factor, ThresholdTable, WeightedScorer};
pub use sentiment::{sentiment_history, SentimentLabel, SentimentPoint, SentimentReport};
pub use snapshot::AssetSnapshot;
pub use trend::{classify_trend, Trend, TrendReading};

use thiserror::Error;

/// Errors from analysis entry points that need a minimum amount of data.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum AnalysisError {
    #[error("insufficient data: need at least {needed} bars, got {got}")]
    InsufficientData { needed: usize, got: usize },

    #[error("unknown strategy '{0}' (expected rsi_macd, bollinger or golden_cross)")]
    UnknownStrategy(String),

    #[error("initial capital must be positive, got {0}")]
    InvalidCapital(f64),

    #[error("need at least {needed} assets with enough history, got {got}")]
    TooFewAssets { needed: usize, got: usize },
}
