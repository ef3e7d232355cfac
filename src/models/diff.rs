//! `Difference` and the closed `DiffType` sum (§3, §9 "Sum types over
//! enum-flag explosion"). The generator's dispatch is a total function from
//! `DiffType` to `(forward, rollback) | none` — see `crate::generator`.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Info,
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    /// Rank used by the sort keys of §4.3/§4.4.2 — higher is more severe.
    pub fn rank(&self) -> u8 {
        match self {
            Severity::Info => 0,
            Severity::Low => 1,
            Severity::Medium => 2,
            Severity::High => 3,
            Severity::Critical => 4,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectType {
    Schema,
    Table,
    Column,
    Index,
    Constraint,
    View,
    Trigger,
    Procedure,
    Function,
    Event,
}

impl ObjectType {
    /// Fix-order rank (§4.2.5, dependency order for DDL emission).
    pub fn fix_order(&self) -> u32 {
        match self {
            ObjectType::Schema => 1,
            ObjectType::Table => 2,
            ObjectType::Column => 3,
            ObjectType::Constraint => 4,
            ObjectType::Index => 5,
            ObjectType::View => 6,
            ObjectType::Trigger => 7,
            ObjectType::Procedure => 8,
            ObjectType::Function => 9,
            ObjectType::Event => 10,
        }
    }
}

/// The closed sum of divergence kinds the comparers can emit. Every variant
/// here must have either a generator branch (§4.4.3) or a documented gap
/// (CHECK constraints, PARTITION — §9 Open Questions).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DiffType {
    TableMissingSource,
    TableMissingTarget,
    TableEngineChanged,
    TableCollationChanged,
    TableCommentChanged,

    ColumnAdded,
    ColumnRemoved,
    ColumnTypeChanged,
    ColumnNullableChanged,
    ColumnDefaultChanged,
    ColumnExtraChanged,
    ColumnRenamed,

    IndexMissingSource,
    IndexMissingTarget,
    IndexColumnsChanged,
    IndexUniqueChanged,
    IndexTypeChanged,
    IndexRenamed,
    IndexDuplicateSource,
    IndexDuplicateTarget,

    ConstraintMissingSource,
    ConstraintMissingTarget,
    ConstraintColumnsChanged,
    ConstraintTargetChanged,
    ConstraintRuleChanged,
    ConstraintRenamed,
}

impl DiffType {
    /// Direction remap table of §4.4.1.
    pub fn reversed(self) -> Self {
        use DiffType::*;
        match self {
            TableMissingSource => TableMissingTarget,
            TableMissingTarget => TableMissingSource,
            ColumnAdded => ColumnRemoved,
            ColumnRemoved => ColumnAdded,
            IndexMissingSource => IndexMissingTarget,
            IndexMissingTarget => IndexMissingSource,
            IndexDuplicateSource => IndexDuplicateTarget,
            IndexDuplicateTarget => IndexDuplicateSource,
            ConstraintMissingSource => ConstraintMissingTarget,
            ConstraintMissingTarget => ConstraintMissingSource,
            // RENAMED and field-level changes stay the same diff_type; only
            // source_value/target_value swap (§4.4.1).
            other => other,
        }
    }

    pub fn object_type(&self) -> ObjectType {
        use DiffType::*;
        match self {
            TableMissingSource | TableMissingTarget | TableEngineChanged
            | TableCollationChanged | TableCommentChanged => ObjectType::Table,
            ColumnAdded | ColumnRemoved | ColumnTypeChanged | ColumnNullableChanged
            | ColumnDefaultChanged | ColumnExtraChanged | ColumnRenamed => ObjectType::Column,
            IndexMissingSource | IndexMissingTarget | IndexColumnsChanged | IndexUniqueChanged
            | IndexTypeChanged | IndexRenamed | IndexDuplicateSource | IndexDuplicateTarget => {
                ObjectType::Index
            }
            ConstraintMissingSource
            | ConstraintMissingTarget
            | ConstraintColumnsChanged
            | ConstraintTargetChanged
            | ConstraintRuleChanged
            | ConstraintRenamed => ObjectType::Constraint,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Difference {
    pub diff_type: DiffType,
    pub severity: Severity,
    pub object_type: ObjectType,
    pub schema: String,
    pub object_name: String,
    pub sub_object_name: Option<String>,
    pub source_value: Option<String>,
    pub target_value: Option<String>,
    pub source_display: String,
    pub target_display: String,
    pub description: String,
    pub can_auto_fix: bool,
    pub fix_order: u32,
    pub warnings: Vec<String>,
}

impl Difference {
    pub fn sort_key_forward(&self) -> (u32, u8, String) {
        (self.fix_order, self.severity.rank(), self.object_name.clone())
    }

    /// §4.4.2: sorted by `(fix_order, -severity_rank, object_name)` after
    /// direction transformation — highest severity first within a rank.
    pub fn sort_key_generator(&self) -> (u32, i16, String) {
        (
            self.fix_order,
            -(self.severity.rank() as i16),
            self.object_name.clone(),
        )
    }

    pub fn carries_data_loss_warning(&self) -> bool {
        self.warnings.iter().any(|w| w.to_ascii_lowercase().contains("data loss"))
    }
}
