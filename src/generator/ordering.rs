//! Ordering and redundancy elimination (§4.4.2). Runs after the direction
//! transform: sorts by `(fix_order, -severity_rank, object_name)`, then
//! drops any non-table diff scoped to a table that is itself being created
//! or dropped — it is subsumed by the CREATE body or nullified by the DROP.

use std::collections::HashSet;

use crate::models::diff::{DiffType, Difference, ObjectType};

pub struct OrderedDifferences {
    pub differences: Vec<Difference>,
    pub warnings: Vec<String>,
}

pub fn order_and_deduplicate(mut differences: Vec<Difference>) -> OrderedDifferences {
    differences.sort_by(|a, b| a.sort_key_generator().cmp(&b.sort_key_generator()));

    let mut created_tables: HashSet<(String, String)> = HashSet::new();
    let mut dropped_tables: HashSet<(String, String)> = HashSet::new();
    for diff in &differences {
        match diff.diff_type {
            DiffType::TableMissingTarget => {
                created_tables.insert((diff.schema.clone(), diff.object_name.clone()));
            }
            DiffType::TableMissingSource => {
                dropped_tables.insert((diff.schema.clone(), diff.object_name.clone()));
            }
            _ => {}
        }
    }

    let mut suppressed_for_drop = 0u32;
    let mut suppressed_for_create = 0u32;
    let kept: Vec<Difference> = differences
        .into_iter()
        .filter(|diff| {
            if diff.object_type == ObjectType::Table {
                return true;
            }
            let key = (diff.schema.clone(), diff.object_name.clone());
            if dropped_tables.contains(&key) {
                suppressed_for_drop += 1;
                return false;
            }
            if created_tables.contains(&key) {
                suppressed_for_create += 1;
                return false;
            }
            true
        })
        .collect();

    let mut warnings = Vec::new();
    if suppressed_for_drop > 0 {
        warnings.push(format!("Skipped {suppressed_for_drop} changes for tables that will be dropped"));
    }
    if suppressed_for_create > 0 {
        warnings.push(format!("Skipped {suppressed_for_create} changes for tables that will be created"));
    }

    OrderedDifferences { differences: kept, warnings }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::diff::Severity;

    fn diff(diff_type: DiffType, object_type: ObjectType, object_name: &str) -> Difference {
        Difference {
            diff_type,
            severity: Severity::Medium,
            object_type,
            schema: "app".to_string(),
            object_name: object_name.to_string(),
            sub_object_name: None,
            source_value: None,
            target_value: None,
            source_display: String::new(),
            target_display: String::new(),
            description: String::new(),
            can_auto_fix: true,
            fix_order: object_type.fix_order(),
            warnings: vec![],
        }
    }

    #[test]
    fn non_table_diffs_scoped_to_a_dropped_table_are_suppressed() {
        let diffs = vec![
            diff(DiffType::TableMissingSource, ObjectType::Table, "legacy_table"),
            diff(DiffType::IndexMissingSource, ObjectType::Index, "legacy_table"),
        ];
        let result = order_and_deduplicate(diffs);
        assert_eq!(result.differences.len(), 1);
        assert_eq!(result.warnings, vec!["Skipped 1 changes for tables that will be dropped".to_string()]);
    }

    #[test]
    fn unrelated_tables_are_unaffected() {
        let diffs = vec![
            diff(DiffType::TableMissingSource, ObjectType::Table, "legacy_table"),
            diff(DiffType::IndexMissingSource, ObjectType::Index, "other_table"),
        ];
        let result = order_and_deduplicate(diffs);
        assert_eq!(result.differences.len(), 2);
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn sorts_by_fix_order_then_severity_then_name() {
        let mut high = diff(DiffType::ColumnTypeChanged, ObjectType::Column, "orders");
        high.severity = Severity::Critical;
        let mut low = diff(DiffType::ColumnTypeChanged, ObjectType::Column, "orders");
        low.severity = Severity::Low;
        let result = order_and_deduplicate(vec![low, high]);
        assert_eq!(result.differences[0].severity, Severity::Critical);
    }
}
