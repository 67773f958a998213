//! Persistent alert rule book (JSON file).

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::warn;

use coinlens_core::analysis::{
    evaluate_alerts, AlertCondition, AlertKind, AlertRule, AssetSnapshot, TriggeredAlert,
};

#[derive(Debug, Error)]
pub enum AlertBookError {
    #[error("I/O error on alert book '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid alert book JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("no alert rule with id {0}")]
    UnknownRule(u32),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AlertBook {
    rules: Vec<AlertRule>,
}

impl AlertBook {
    /// Load rules from `path`. A missing file is an empty book.
    pub fn load(path: &Path) -> Result<Self, AlertBookError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path).map_err(|source| AlertBookError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(serde_json::from_str(&text)?)
    }

    pub fn save(&self, path: &Path) -> Result<(), AlertBookError> {
        let io_err = |source| AlertBookError::Io {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json).map_err(io_err)
    }

    pub fn rules(&self) -> &[AlertRule] {
        &self.rules
    }

    /// Add an active rule; ids are assigned sequentially from 1.
    pub fn add(
        &mut self,
        kind: AlertKind,
        asset: &str,
        value: Option<f64>,
        condition: Option<AlertCondition>,
        created_at: NaiveDateTime,
    ) -> &AlertRule {
        let id = self.rules.iter().map(|r| r.id).max().unwrap_or(0) + 1;
        self.rules.push(AlertRule {
            id,
            kind,
            asset: asset.to_string(),
            value,
            condition,
            active: true,
            created_at,
        });
        &self.rules[self.rules.len() - 1]
    }

    pub fn set_active(&mut self, id: u32, active: bool) -> Result<(), AlertBookError> {
        let rule = self
            .rules
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or(AlertBookError::UnknownRule(id))?;
        rule.active = active;
        Ok(())
    }

    pub fn remove(&mut self, id: u32) -> Result<AlertRule, AlertBookError> {
        let idx = self
            .rules
            .iter()
            .position(|r| r.id == id)
            .ok_or(AlertBookError::UnknownRule(id))?;
        Ok(self.rules.remove(idx))
    }

    pub fn evaluate(&self, snapshots: &[AssetSnapshot]) -> Vec<TriggeredAlert> {
        let triggered = evaluate_alerts(&self.rules, snapshots);
        for alert in &triggered {
            warn!(
                rule = alert.rule_id,
                kind = ?alert.kind,
                asset = %alert.asset,
                "alert triggered"
            );
        }
        triggered
    }
}
