//! Pump/dump and volatility anomaly detection over live snapshots.

use serde::{Deserialize, Serialize};

use super::snapshot::AssetSnapshot;

/// Forecast change (percent) beyond which a pump or dump is flagged.
pub const PUMP_DUMP_PCT: f64 = 10.0;
/// Volatility (percent of mean) beyond which a snapshot is flagged.
pub const HIGH_VOLATILITY_PCT: f64 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnomalyKind {
    Pump,
    Dump,
    HighVolatility,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Anomaly {
    pub kind: AnomalyKind,
    pub asset: String,
    pub value: f64,
    pub message: String,
}

pub fn detect_anomalies(snapshots: &[AssetSnapshot]) -> Vec<Anomaly> {
    let mut anomalies = Vec::new();
    for snap in snapshots {
        let change = snap.expected_change_pct;
        if change.abs() > PUMP_DUMP_PCT {
            let (kind, word) = if change > 0.0 {
                (AnomalyKind::Pump, "Pump")
            } else {
                (AnomalyKind::Dump, "Dump")
            };
            anomalies.push(Anomaly {
                kind,
                asset: snap.asset.clone(),
                value: change,
                message: format!("{word} detected on {}: {change:+.1}%", snap.asset),
            });
        }
        if snap.volatility_pct > HIGH_VOLATILITY_PCT {
            anomalies.push(Anomaly {
                kind: AnomalyKind::HighVolatility,
                asset: snap.asset.clone(),
                value: snap.volatility_pct,
                message: format!("High volatility on {}: {:.1}%", snap.asset, snap.volatility_pct),
            });
        }
    }
    anomalies
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::analysis::decision::DecisionLabel;
    use crate::analysis::trend::Trend;

    pub(crate) fn snapshot(
        asset: &str,
        expected_change_pct: f64,
        volatility_pct: f64,
    ) -> AssetSnapshot {
        AssetSnapshot {
            asset: asset.to_string(),
            price: 100.0,
            trend: Trend::Stable,
            change_pct: 0.0,
            volume: 0.0,
            high: 100.0,
            low: 100.0,
            decision: DecisionLabel::Hold,
            confidence: 0.5,
            forecast: 100.0 * (1.0 + expected_change_pct / 100.0),
            expected_change_pct,
            rsi: 50.0,
            macd: 0.0,
            mean: 100.0,
            volatility_pct,
            as_of: chrono::NaiveDate::from_ymd_opt(2024, 1, 1)
                .unwrap()
                .and_hms_opt(12, 0, 0)
                .unwrap(),
        }
    }

    #[test]
    fn flags_pump_dump_and_volatility() {
        let anomalies = detect_anomalies(&[
            snapshot("BTC", 12.0, 1.0),
            snapshot("ETH", -11.0, 15.0),
            snapshot("SOL", 10.0, 10.0),
        ]);
        let kinds: Vec<(AnomalyKind, &str)> =
            anomalies.iter().map(|a| (a.kind, a.asset.as_str())).collect();
        assert_eq!(
            kinds,
            vec![
                (AnomalyKind::Pump, "BTC"),
                (AnomalyKind::Dump, "ETH"),
                (AnomalyKind::HighVolatility, "ETH"),
            ]
        );
        assert_eq!(anomalies[0].message, "Pump detected on BTC: +12.0%");
    }
}
