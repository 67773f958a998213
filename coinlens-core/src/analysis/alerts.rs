//! User-defined alert rules evaluated against live snapshots.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::anomaly::{HIGH_VOLATILITY_PCT, PUMP_DUMP_PCT};
use super::snapshot::AssetSnapshot;

/// Target asset value that matches every snapshot.
pub const ALL_ASSETS: &str = "all";
pub const RSI_ALERT_HIGH: f64 = 80.0;
pub const RSI_ALERT_LOW: f64 = 20.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    Pump,
    Dump,
    Volatility,
    Rsi,
    Price,
    Change,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertCondition {
    Above,
    Below,
    Increase,
    Decrease,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertRule {
    pub id: u32,
    pub kind: AlertKind,
    /// Asset symbol, or [`ALL_ASSETS`].
    pub asset: String,
    #[serde(default)]
    pub value: Option<f64>,
    #[serde(default)]
    pub condition: Option<AlertCondition>,
    pub active: bool,
    pub created_at: NaiveDateTime,
}

impl AlertRule {
    fn targets(&self, asset: &str) -> bool {
        self.asset.eq_ignore_ascii_case(ALL_ASSETS) || self.asset.eq_ignore_ascii_case(asset)
    }

    /// Whether this rule fires for a snapshot. Price rules default to
    /// `Above`, change rules to `Increase`, missing values to 0.
    pub fn fires(&self, snap: &AssetSnapshot) -> bool {
        let value = self.value.unwrap_or(0.0);
        match self.kind {
            AlertKind::Pump => snap.expected_change_pct > PUMP_DUMP_PCT,
            AlertKind::Dump => snap.expected_change_pct < -PUMP_DUMP_PCT,
            AlertKind::Volatility => snap.volatility_pct > HIGH_VOLATILITY_PCT,
            AlertKind::Rsi => snap.rsi > RSI_ALERT_HIGH || snap.rsi < RSI_ALERT_LOW,
            AlertKind::Price => match self.condition.unwrap_or(AlertCondition::Above) {
                AlertCondition::Below | AlertCondition::Decrease => snap.price <= value,
                AlertCondition::Above | AlertCondition::Increase => snap.price >= value,
            },
            AlertKind::Change => match self.condition.unwrap_or(AlertCondition::Increase) {
                AlertCondition::Decrease | AlertCondition::Below => {
                    snap.expected_change_pct <= -value
                }
                AlertCondition::Increase | AlertCondition::Above => {
                    snap.expected_change_pct >= value
                }
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriggeredAlert {
    pub rule_id: u32,
    pub kind: AlertKind,
    pub asset: String,
}

/// Evaluate active rules against every snapshot they target.
pub fn evaluate_alerts(rules: &[AlertRule], snapshots: &[AssetSnapshot]) -> Vec<TriggeredAlert> {
    rules
        .iter()
        .filter(|rule| rule.active)
        .flat_map(|rule| {
            snapshots
                .iter()
                .filter(move |snap| rule.targets(&snap.asset) && rule.fires(snap))
                .map(move |snap| TriggeredAlert {
                    rule_id: rule.id,
                    kind: rule.kind,
                    asset: snap.asset.clone(),
                })
        })
        .collect()
}
