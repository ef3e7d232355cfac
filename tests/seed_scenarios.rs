//! End-to-end seed scenarios exercised against the public generator/tunnel
//! API (no live MySQL or SSH server needed). Rename detection and duplicate
//! index detection live as inline unit tests in `compare::matcher`/
//! `compare::index` instead, since the comparer trait requires a live pool.

use std::collections::BTreeMap;

use schema_sync_core::generator::generate_sync_script;
use schema_sync_core::models::{Column, Difference, DiffType, Direction, ObjectType, Severity, Table};
use schema_sync_core::tunnel::TunnelInfo;

fn column(name: &str, comment: &str) -> Column {
    Column {
        name: name.to_string(),
        ordinal_position: 1,
        column_type: "varchar(255)".to_string(),
        data_type: "varchar".to_string(),
        nullable: false,
        default: None,
        extra: String::new(),
        charset: Some("utf8mb4".to_string()),
        collation: Some("utf8mb4_general_ci".to_string()),
        column_key: String::new(),
        comment: comment.to_string(),
        after_column: None,
    }
}

fn table(name: &str, columns: BTreeMap<String, Column>) -> Table {
    Table {
        schema: "db".to_string(),
        name: name.to_string(),
        engine: Some("InnoDB".to_string()),
        collation: Some("utf8mb4_general_ci".to_string()),
        comment: None,
        create_options: None,
        columns,
    }
}

/// Scenario 3: column comment preservation. Source column carries the real
/// comment, target has a stale one; the forward MODIFY COLUMN must render
/// the source's comment, not drop it.
#[test]
fn column_comment_is_preserved_through_modify_column() {
    let desired = column("email", "primary contact");
    let current = column("email", "old");

    let diff = Difference {
        diff_type: DiffType::ColumnExtraChanged,
        severity: Severity::Low,
        object_type: ObjectType::Column,
        schema: "db".to_string(),
        object_name: "users".to_string(),
        sub_object_name: Some("email".to_string()),
        source_value: Some(serde_json::to_string(&desired).unwrap()),
        target_value: Some(serde_json::to_string(&current).unwrap()),
        source_display: "users.email".to_string(),
        target_display: "users.email".to_string(),
        description: "column `email` comment changed".to_string(),
        can_auto_fix: true,
        fix_order: ObjectType::Column.fix_order(),
        warnings: Vec::new(),
    };

    let script = generate_sync_script("cmp-comment", vec![diff], Direction::SourceToTarget);
    assert!(script.forward_sql.contains("MODIFY COLUMN"));
    assert!(script.forward_sql.contains("COMMENT 'primary contact'"));
    assert!(!script.forward_sql.contains("COMMENT 'old'"));
}

/// Scenario 4: a table missing from source suppresses the child index diff
/// on that table, with a warning, and the forward script drops the table
/// but emits no DROP INDEX for it.
#[test]
fn dropped_table_suppresses_child_index_diff() {
    let mut cols = BTreeMap::new();
    cols.insert("id".to_string(), column("id", ""));
    cols.insert("note".to_string(), column("note", ""));
    let legacy = table("legacy_table", cols);

    let table_diff = Difference {
        diff_type: DiffType::TableMissingSource,
        severity: Severity::Critical,
        object_type: ObjectType::Table,
        schema: "db".to_string(),
        object_name: "legacy_table".to_string(),
        sub_object_name: None,
        source_value: None,
        target_value: Some(serde_json::to_string(&legacy).unwrap()),
        source_display: String::new(),
        target_display: "legacy_table".to_string(),
        description: "table `legacy_table` exists only in target".to_string(),
        can_auto_fix: true,
        fix_order: ObjectType::Table.fix_order(),
        warnings: Vec::new(),
    };

    let index_diff = Difference {
        diff_type: DiffType::IndexMissingSource,
        severity: Severity::Medium,
        object_type: ObjectType::Index,
        schema: "db".to_string(),
        object_name: "legacy_table".to_string(),
        sub_object_name: Some("idx_note".to_string()),
        source_value: None,
        target_value: Some("{}".to_string()),
        source_display: "legacy_table.idx_note".to_string(),
        target_display: "legacy_table.idx_note".to_string(),
        description: "index `idx_note` exists only in target".to_string(),
        can_auto_fix: true,
        fix_order: ObjectType::Index.fix_order(),
        warnings: Vec::new(),
    };

    let script = generate_sync_script("cmp-drop", vec![table_diff, index_diff], Direction::SourceToTarget);

    assert!(script.warnings.iter().any(|w| w == "Skipped 1 changes for tables that will be dropped"));
    assert!(script.forward_sql.contains("DROP TABLE IF EXISTS `db`.`legacy_table`;"));
    assert!(!script.forward_sql.contains("DROP INDEX"));
}

/// Scenario 5: reversing direction on a set with one TABLE_MISSING_TARGET
/// and one COLUMN_REMOVED swaps both into their opposite action.
#[test]
fn direction_reversal_swaps_table_and_column_actions() {
    let mut cols = BTreeMap::new();
    cols.insert("id".to_string(), column("id", ""));
    let widgets = table("widgets", cols);

    let table_diff = Difference {
        diff_type: DiffType::TableMissingTarget,
        severity: Severity::Critical,
        object_type: ObjectType::Table,
        schema: "db".to_string(),
        object_name: "widgets".to_string(),
        sub_object_name: None,
        source_value: Some(serde_json::to_string(&widgets).unwrap()),
        target_value: None,
        source_display: "widgets".to_string(),
        target_display: String::new(),
        description: "table `widgets` exists only in source".to_string(),
        can_auto_fix: true,
        fix_order: ObjectType::Table.fix_order(),
        warnings: Vec::new(),
    };

    let removed_column = column("legacy_flag", "");
    let column_diff = Difference {
        diff_type: DiffType::ColumnRemoved,
        severity: Severity::Medium,
        object_type: ObjectType::Column,
        schema: "db".to_string(),
        object_name: "accounts".to_string(),
        sub_object_name: Some("legacy_flag".to_string()),
        source_value: None,
        target_value: Some(serde_json::to_string(&removed_column).unwrap()),
        source_display: "accounts.legacy_flag".to_string(),
        target_display: "accounts.legacy_flag".to_string(),
        description: "column `legacy_flag` missing in source".to_string(),
        can_auto_fix: true,
        fix_order: ObjectType::Column.fix_order(),
        warnings: Vec::new(),
    };

    let script = generate_sync_script("cmp-reverse", vec![table_diff, column_diff], Direction::TargetToSource);

    assert!(script.forward_sql.contains("DROP TABLE IF EXISTS `db`.`widgets`;"));
    assert!(script.forward_sql.contains("ADD COLUMN `legacy_flag`"));
}

/// Scenario 6 (library-level slice): acquiring an already-CONNECTED tunnel
/// a second time must increment `connections_count` rather than leaving it
/// at the single-creation value. The full "two comparisons back-to-back
/// against a live bastion" scenario needs a real SSH endpoint and is not
/// exercised here; see `tunnel::state::tests` for the unit-level check this
/// builds on.
#[test]
fn tunnel_reuse_increments_connections_count() {
    let mut info = TunnelInfo::new("t-1".to_string(), "bastion:22:10.0.0.5:3306".to_string(), 10000);
    info.mark_connected();
    assert_eq!(info.connections_count, 1);

    info.mark_reused();
    assert!(info.connections_count >= 2);
}
