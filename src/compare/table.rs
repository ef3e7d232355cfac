//! Table comparer (§4.2, §4.2.3 "Table"). Tables themselves are matched by
//! exact key only — pass A and pass D of the common algorithm — since
//! nothing in §4.2.1 defines a table fingerprint and the `DiffType` enum has
//! no table-rename variant. Columns within a matched table go through the
//! full four-pass matcher, using `(ordinal_position, data_type)` as the
//! column fingerprint so a `RENAME COLUMN` that preserves position and type
//! surfaces as `ColumnRenamed` instead of an add+drop pair.

use std::collections::{BTreeMap, BTreeSet};

use async_trait::async_trait;
use sqlx::MySqlPool;

use crate::error::{CompareError, CompareResult};
use crate::introspect;
use crate::models::catalog::{Column, Table};
use crate::models::diff::{DiffType, Difference, ObjectType, Severity};
use crate::models::endpoint::ComparisonOptions;
use crate::models::progress::{Phase, ProgressEvent, ProgressSender};

use super::matcher::{match_objects, MatchOutcome, Side};
use super::Comparer;

pub struct TableComparer;

#[async_trait]
impl Comparer for TableComparer {
    fn object_type(&self) -> ObjectType {
        ObjectType::Table
    }

    async fn compare(
        &self,
        source_pool: &MySqlPool,
        target_pool: &MySqlPool,
        options: &ComparisonOptions,
        comparison_id: &str,
        progress: &ProgressSender,
    ) -> CompareResult<Vec<Difference>> {
        let _ = progress.send(
            ProgressEvent::new(comparison_id, Phase::Discovery, 0, 0)
                .with_message("discovering tables"),
        );

        let (source_tables, target_tables) = tokio::try_join!(
            introspect::discover_tables(source_pool, options),
            introspect::discover_tables(target_pool, options),
        )
        .map_err(CompareError::Catalog)?;

        let case_sensitive = options.case_sensitive;
        let mut source_by_key: BTreeMap<String, Table> = source_tables
            .into_values()
            .map(|t| (t.key(case_sensitive), t))
            .collect();
        let mut target_by_key: BTreeMap<String, Table> = target_tables
            .into_values()
            .map(|t| (t.key(case_sensitive), t))
            .collect();

        let all_keys: BTreeSet<String> = source_by_key
            .keys()
            .chain(target_by_key.keys())
            .cloned()
            .collect();
        let total = all_keys.len() as u32;
        let mut current = 0u32;
        let mut differences = Vec::new();

        for key in &all_keys {
            current += 1;
            let _ = progress.send(
                ProgressEvent::new(comparison_id, Phase::Comparison, current, total)
                    .with_object(key.clone()),
            );

            match (source_by_key.remove(key), target_by_key.remove(key)) {
                (Some(source), Some(target)) => {
                    differences.extend(compare_matched_table(&source, &target, options))
                }
                (Some(source), None) => differences.push(table_missing_target(&source)),
                (None, Some(target)) => differences.push(table_missing_source(&target)),
                (None, None) => unreachable!("key drawn from the union of both maps"),
            }
        }

        let _ = progress.send(
            ProgressEvent::new(comparison_id, Phase::Comparison, total, total)
                .with_message(format!("{} table-level differences", differences.len())),
        );

        Ok(differences)
    }
}

fn compare_matched_table(source: &Table, target: &Table, options: &ComparisonOptions) -> Vec<Difference> {
    let mut differences = Vec::new();

    if source.engine != target.engine {
        differences.push(table_property_diff(
            source,
            DiffType::TableEngineChanged,
            Severity::Medium,
            "engine",
            source.engine.as_deref(),
            target.engine.as_deref(),
        ));
    }

    if !options.ignore_collation && source.collation != target.collation {
        differences.push(table_property_diff(
            source,
            DiffType::TableCollationChanged,
            Severity::Medium,
            "collation",
            source.collation.as_deref(),
            target.collation.as_deref(),
        ));
    }

    if !options.ignore_comments && source.comment != target.comment {
        differences.push(table_property_diff(
            source,
            DiffType::TableCommentChanged,
            Severity::Low,
            "comment",
            source.comment.as_deref(),
            target.comment.as_deref(),
        ));
    }

    differences.extend(compare_columns(source, target, options));
    differences
}

fn compare_columns(source: &Table, target: &Table, options: &ComparisonOptions) -> Vec<Difference> {
    let case_sensitive = options.case_sensitive;
    let source_columns: Vec<Column> = source.ordered_columns().into_iter().cloned().collect();
    let target_columns: Vec<Column> = target.ordered_columns().into_iter().cloned().collect();

    let key_fn = move |c: &Column| {
        if case_sensitive {
            c.name.clone()
        } else {
            c.name.to_ascii_lowercase()
        }
    };
    let fingerprint_fn = |c: &Column| format!("{}|{}", c.ordinal_position, c.data_type);

    let outcomes = match_objects(source_columns, target_columns, key_fn, fingerprint_fn, |_| true);

    let mut differences = Vec::new();
    for outcome in outcomes {
        match outcome {
            MatchOutcome::Matched { source: s, target: t } => {
                differences.extend(compare_column_fields(&source.schema, &source.name, &s, &t, options))
            }
            MatchOutcome::Renamed { source: s, target: t } => {
                differences.push(column_renamed(&source.schema, &source.name, &s, &t))
            }
            MatchOutcome::Duplicate { .. } => {
                // No closed DiffType represents a duplicate column; the
                // matcher still marks it processed so it isn't also
                // reported missing.
            }
            MatchOutcome::Missing { object, side } => {
                differences.push(column_missing(&source.schema, &source.name, &object, side))
            }
        }
    }
    differences
}

fn compare_column_fields(
    schema: &str,
    table: &str,
    source: &Column,
    target: &Column,
    options: &ComparisonOptions,
) -> Vec<Difference> {
    let mut differences = Vec::new();

    if source.column_type != target.column_type {
        differences.push(column_diff(
            schema,
            table,
            &source.name,
            DiffType::ColumnTypeChanged,
            Severity::High,
            format!("column type changed from {} to {}", source.column_type, target.column_type),
            source,
            target,
            vec![],
        ));
    }

    if source.nullable != target.nullable {
        let becoming_not_null = source.nullable && !target.nullable;
        differences.push(column_diff(
            schema,
            table,
            &source.name,
            DiffType::ColumnNullableChanged,
            if becoming_not_null { Severity::High } else { Severity::Medium },
            format!(
                "nullability changed from {} to {}",
                nullable_label(source.nullable),
                nullable_label(target.nullable)
            ),
            source,
            target,
            vec![],
        ));
    }

    let suppress_auto_increment_default = options.ignore_auto_increment
        && (source.is_auto_increment() || target.is_auto_increment());

    if source.default != target.default && !suppress_auto_increment_default {
        differences.push(column_diff(
            schema,
            table,
            &source.name,
            DiffType::ColumnDefaultChanged,
            Severity::Low,
            "default value changed".to_string(),
            source,
            target,
            vec![],
        ));
    }

    // §4.2.3 groups extra/comment/charset/collation under a single
    // EXTRA_CHANGED diff per column — they all rebuild the same full
    // column definition on MODIFY COLUMN, so reporting them separately
    // would just emit duplicate identical statements.
    let source_extra = normalized_extra(&source.extra, options.ignore_auto_increment);
    let target_extra = normalized_extra(&target.extra, options.ignore_auto_increment);
    let mut changed_attributes = Vec::new();
    if source_extra != target_extra {
        changed_attributes.push("extra attribute");
    }
    if !options.ignore_comments && source.comment != target.comment {
        changed_attributes.push("comment");
    }
    if !options.ignore_charset && source.charset != target.charset {
        changed_attributes.push("charset");
    }
    if !options.ignore_collation && source.collation != target.collation {
        changed_attributes.push("collation");
    }
    if !changed_attributes.is_empty() {
        differences.push(column_diff(
            schema,
            table,
            &source.name,
            DiffType::ColumnExtraChanged,
            Severity::Medium,
            format!("{} changed", changed_attributes.join("/")),
            source,
            target,
            vec![],
        ));
    }

    differences
}

fn normalized_extra(extra: &str, ignore_auto_increment: bool) -> String {
    if !ignore_auto_increment {
        return extra.to_ascii_lowercase();
    }
    extra
        .to_ascii_lowercase()
        .replace("auto_increment", "")
        .trim()
        .to_string()
}

fn nullable_label(nullable: bool) -> &'static str {
    if nullable {
        "NULL"
    } else {
        "NOT NULL"
    }
}

/// Full column snapshot serialized for the generator (§4.4.4): every
/// attribute-level column diff carries both sides' complete definitions so
/// `build_column_definition` never has to guess at a preserved attribute.
fn column_json(column: &Column) -> String {
    serde_json::to_string(column).expect("Column serializes infallibly")
}

fn column_renamed(schema: &str, table: &str, source: &Column, target: &Column) -> Difference {
    Difference {
        diff_type: DiffType::ColumnRenamed,
        severity: Severity::Medium,
        object_type: ObjectType::Column,
        schema: schema.to_string(),
        object_name: table.to_string(),
        sub_object_name: Some(target.name.clone()),
        source_value: Some(column_json(source)),
        target_value: Some(column_json(target)),
        source_display: format!("{}.{}", table, source.name),
        target_display: format!("{}.{}", table, target.name),
        description: format!("column `{}` renamed to `{}`", target.name, source.name),
        can_auto_fix: true,
        fix_order: ObjectType::Column.fix_order(),
        warnings: vec![],
    }
}

/// Missing-column diffs mirror the table/index convention (§4.2.3, §4.2.5):
/// present only in source ⇒ the generator's forward direction must ADD it to
/// target; present only in target ⇒ forward must DROP it there. Each side's
/// full `Column` is carried as JSON so `build_column_definition` can rebuild
/// the complete definition (charset/collation/comment/extra) on ADD, and the
/// dropped definition survives for rollback.
fn column_missing(schema: &str, table: &str, column: &Column, side: Side) -> Difference {
    let (diff_type, severity, warnings, description, source_value, target_value) = match side {
        Side::Source => (
            DiffType::ColumnAdded,
            Severity::Low,
            vec![],
            format!("column `{}` exists only in source", column.name),
            Some(column_json(column)),
            None,
        ),
        Side::Target => (
            DiffType::ColumnRemoved,
            Severity::Critical,
            vec!["data loss".to_string()],
            format!("column `{}` exists only in target", column.name),
            None,
            Some(column_json(column)),
        ),
    };
    Difference {
        diff_type,
        severity,
        object_type: ObjectType::Column,
        schema: schema.to_string(),
        object_name: table.to_string(),
        sub_object_name: Some(column.name.clone()),
        source_value,
        target_value,
        source_display: format!("{}.{}", table, column.name),
        target_display: format!("{}.{}", table, column.name),
        description,
        can_auto_fix: true,
        fix_order: ObjectType::Column.fix_order(),
        warnings,
    }
}

#[allow(clippy::too_many_arguments)]
fn column_diff(
    schema: &str,
    table: &str,
    column_name: &str,
    diff_type: DiffType,
    severity: Severity,
    description: String,
    source: &Column,
    target: &Column,
    warnings: Vec<String>,
) -> Difference {
    Difference {
        diff_type,
        severity,
        object_type: ObjectType::Column,
        schema: schema.to_string(),
        object_name: table.to_string(),
        sub_object_name: Some(column_name.to_string()),
        source_display: format!("{}.{}", table, column_name),
        target_display: format!("{}.{}", table, column_name),
        source_value: Some(column_json(source)),
        target_value: Some(column_json(target)),
        description,
        can_auto_fix: true,
        fix_order: ObjectType::Column.fix_order() + 1,
        warnings,
    }
}

fn table_property_diff(
    table: &Table,
    diff_type: DiffType,
    severity: Severity,
    property: &str,
    source_value: Option<&str>,
    target_value: Option<&str>,
) -> Difference {
    Difference {
        diff_type,
        severity,
        object_type: ObjectType::Table,
        schema: table.schema.clone(),
        object_name: table.name.clone(),
        sub_object_name: None,
        source_value: source_value.map(str::to_string),
        target_value: target_value.map(str::to_string),
        source_display: table.name.clone(),
        target_display: table.name.clone(),
        description: format!("table `{}` {} changed", table.name, property),
        can_auto_fix: true,
        fix_order: ObjectType::Table.fix_order(),
        warnings: vec![],
    }
}

fn table_missing_target(source: &Table) -> Difference {
    Difference {
        diff_type: DiffType::TableMissingTarget,
        severity: Severity::Critical,
        object_type: ObjectType::Table,
        schema: source.schema.clone(),
        object_name: source.name.clone(),
        sub_object_name: None,
        // Full snapshot, not just the name: §4.4.3's CREATE TABLE rule
        // renders every column from this value via `build_column_definition`.
        source_value: Some(serde_json::to_string(source).expect("Table serializes infallibly")),
        target_value: None,
        source_display: source.name.clone(),
        target_display: String::new(),
        description: format!("table `{}` exists only in source", source.name),
        can_auto_fix: true,
        fix_order: ObjectType::Table.fix_order(),
        warnings: vec![],
    }
}

fn table_missing_source(target: &Table) -> Difference {
    Difference {
        diff_type: DiffType::TableMissingSource,
        severity: Severity::High,
        object_type: ObjectType::Table,
        schema: target.schema.clone(),
        object_name: target.name.clone(),
        sub_object_name: None,
        source_value: None,
        // Full snapshot, not just the name: a reversed direction (or a
        // rollback script) needs every column to recreate this table.
        target_value: Some(serde_json::to_string(target).expect("Table serializes infallibly")),
        source_display: String::new(),
        target_display: target.name.clone(),
        description: format!("table `{}` exists only in target", target.name),
        can_auto_fix: true,
        fix_order: ObjectType::Table.fix_order(),
        warnings: vec![],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn column(name: &str, ordinal: u32, data_type: &str) -> Column {
        Column {
            name: name.to_string(),
            ordinal_position: ordinal,
            column_type: format!("{data_type}(10)"),
            data_type: data_type.to_string(),
            nullable: true,
            default: None,
            extra: String::new(),
            charset: None,
            collation: None,
            column_key: String::new(),
            comment: String::new(),
            after_column: None,
        }
    }

    fn table_with_columns(name: &str, columns: Vec<Column>) -> Table {
        Table {
            schema: "app".to_string(),
            name: name.to_string(),
            engine: Some("InnoDB".to_string()),
            collation: Some("utf8mb4_general_ci".to_string()),
            comment: None,
            create_options: None,
            columns: columns.into_iter().map(|c| (c.name.clone(), c)).collect(),
        }
    }

    #[test]
    fn renamed_column_with_same_position_and_type_is_a_rename_not_add_drop() {
        let source = table_with_columns("users", vec![column("id", 1, "int"), column("full_name", 2, "varchar")]);
        let target = table_with_columns("users", vec![column("id", 1, "int"), column("display_name", 2, "varchar")]);

        let options = ComparisonOptions::all_enabled();
        let diffs = compare_matched_table(&source, &target, &options);

        assert!(diffs.iter().any(|d| d.diff_type == DiffType::ColumnRenamed));
        assert!(!diffs.iter().any(|d| d.diff_type == DiffType::ColumnAdded));
        assert!(!diffs.iter().any(|d| d.diff_type == DiffType::ColumnRemoved));
    }

    #[test]
    fn ignore_auto_increment_suppresses_default_diff_on_auto_increment_column() {
        let mut source_col = column("id", 1, "int");
        source_col.extra = "auto_increment".to_string();
        source_col.default = None;
        let mut target_col = column("id", 1, "int");
        target_col.extra = "auto_increment".to_string();
        target_col.default = Some("0".to_string());

        let source = table_with_columns("users", vec![source_col]);
        let target = table_with_columns("users", vec![target_col]);

        let mut options = ComparisonOptions::all_enabled();
        options.ignore_auto_increment = true;
        let diffs = compare_matched_table(&source, &target, &options);
        assert!(!diffs.iter().any(|d| d.diff_type == DiffType::ColumnDefaultChanged));
    }

    #[test]
    fn column_removed_carries_data_loss_warning() {
        let source = table_with_columns("users", vec![column("id", 1, "int"), column("legacy_flag", 2, "tinyint")]);
        let target = table_with_columns("users", vec![column("id", 1, "int")]);

        let options = ComparisonOptions::all_enabled();
        let diffs = compare_matched_table(&source, &target, &options);
        let removed = diffs.iter().find(|d| d.diff_type == DiffType::ColumnRemoved).unwrap();
        assert_eq!(removed.severity, Severity::Critical);
        assert!(removed.carries_data_loss_warning());
    }
}
