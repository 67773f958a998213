//! CoinLens Core — ingestion, cleaning, indicators, trend, prediction, decisions.
//!
//! This crate contains the analysis pipeline:
//! - Domain types (bars, price series)
//! - Ingestion of messy CSV sources into canonical series, with a synthetic fallback
//! - Cleaning with IQR outlier fencing and descriptive statistics
//! - RSI, MACD, Bollinger and moving-average indicators
//! - Trend classification, ensemble price forecast, weighted-factor decision
//! - Sentiment history, anomaly detection and alert rules
//! - Cross-asset correlation with hierarchical clustering
//! - Rule-based strategy backtesting and Monte Carlo market simulation
//!
//! Every analysis entry point is a pure function of its inputs.

pub mod analysis;
pub mod backtest;
pub mod correlation;
pub mod data;
pub mod domain;
pub mod indicators;
pub mod simulation;
pub mod stats;
