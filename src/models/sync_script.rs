//! `SyncScript` (§3, §4.4).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    SourceToTarget,
    TargetToSource,
}

impl Direction {
    pub fn reversed(self) -> Self {
        match self {
            Direction::SourceToTarget => Direction::TargetToSource,
            Direction::TargetToSource => Direction::SourceToTarget,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::SourceToTarget => "source_to_target",
            Direction::TargetToSource => "target_to_source",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncScript {
    pub comparison_id: String,
    pub direction: Direction,
    pub forward_sql: String,
    pub rollback_sql: String,
    pub warnings: Vec<String>,
    pub estimated_impact: String,
    pub estimated_duration_seconds: u64,
    pub requires_downtime: bool,
    pub data_loss_risk: bool,
    pub validated: bool,
    pub validation_errors: Vec<String>,
}
