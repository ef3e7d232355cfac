//! Index comparer (§4.2.3 "Index", §4.2.4 missing severities, §4.4.3
//! "DUPLICATE INDEX"). PRIMARY never reaches this comparer — the
//! introspector drops it (§4.1) and it is owned by the constraint comparer
//! instead.

use async_trait::async_trait;
use sqlx::MySqlPool;

use crate::error::{CompareError, CompareResult};
use crate::introspect;
use crate::models::catalog::Index;
use crate::models::diff::{DiffType, Difference, ObjectType, Severity};
use crate::models::endpoint::ComparisonOptions;
use crate::models::progress::{Phase, ProgressEvent, ProgressSender};

use super::fingerprint::{index_fingerprint, index_key, index_rename_eligible};
use super::matcher::{match_objects, MatchOutcome, Side};
use super::Comparer;

pub struct IndexComparer;

#[async_trait]
impl Comparer for IndexComparer {
    fn object_type(&self) -> ObjectType {
        ObjectType::Index
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
                .with_message("discovering indexes"),
        );

        let (source_indexes, target_indexes) = tokio::try_join!(
            introspect::discover_indexes(source_pool, options),
            introspect::discover_indexes(target_pool, options),
        )
        .map_err(CompareError::Catalog)?;

        let case_sensitive = options.case_sensitive;
        let source: Vec<Index> = source_indexes.into_values().collect();
        let target: Vec<Index> = target_indexes.into_values().collect();
        let total = (source.len() + target.len()) as u32;

        let outcomes = match_objects(
            source,
            target,
            move |i: &Index| index_key(i, case_sensitive),
            index_fingerprint,
            index_rename_eligible,
        );

        let mut differences = Vec::new();
        let mut current = 0u32;
        for outcome in outcomes {
            current += 1;
            let _ = progress.send(ProgressEvent::new(comparison_id, Phase::Comparison, current, total));
            match outcome {
                MatchOutcome::Matched { source, target } => {
                    differences.extend(compare_index_fields(&source, &target))
                }
                MatchOutcome::Renamed { source, target } => differences.push(index_renamed(&source, &target)),
                MatchOutcome::Duplicate { canonical, duplicate, side } => {
                    differences.push(index_duplicate(&canonical, &duplicate, side))
                }
                MatchOutcome::Missing { object, side } => differences.push(index_missing(&object, side)),
            }
        }

        let _ = progress.send(
            ProgressEvent::new(comparison_id, Phase::Comparison, total, total)
                .with_message(format!("{} index differences", differences.len())),
        );

        Ok(differences)
    }
}

fn compare_index_fields(source: &Index, target: &Index) -> Vec<Difference> {
    let mut differences = Vec::new();

    if source.columns != target.columns {
        differences.push(index_diff(
            source,
            target,
            DiffType::IndexColumnsChanged,
            Severity::High,
            format!("index `{}` columns changed", source.name),
        ));
    }

    if source.is_unique != target.is_unique {
        differences.push(index_diff(
            source,
            target,
            DiffType::IndexUniqueChanged,
            if target.is_unique { Severity::High } else { Severity::Medium },
            format!("index `{}` uniqueness changed", source.name),
        ));
    }

    if source.index_type != target.index_type {
        differences.push(index_diff(
            source,
            target,
            DiffType::IndexTypeChanged,
            Severity::Medium,
            format!("index `{}` type changed", source.name),
        ));
    }

    differences
}

fn index_json(index: &Index) -> String {
    serde_json::to_string(index).expect("Index serializes infallibly")
}

/// Field-level index diffs are recreate-class (§4.4.3 "DROP/RECREATE
/// INDEX"): both full definitions travel so the generator can emit DROP
/// then CREATE from whichever side the direction calls for.
fn index_diff(
    source: &Index,
    target: &Index,
    diff_type: DiffType,
    severity: Severity,
    description: String,
) -> Difference {
    Difference {
        diff_type,
        severity,
        object_type: ObjectType::Index,
        schema: source.schema.clone(),
        object_name: source.table.clone(),
        sub_object_name: Some(source.name.clone()),
        source_value: Some(index_json(source)),
        target_value: Some(index_json(target)),
        source_display: format!("{}.{}", source.table, source.name),
        target_display: format!("{}.{}", target.table, target.name),
        description,
        can_auto_fix: true,
        fix_order: ObjectType::Index.fix_order(),
        warnings: vec![],
    }
}

fn index_renamed(source: &Index, target: &Index) -> Difference {
    Difference {
        diff_type: DiffType::IndexRenamed,
        severity: Severity::Low,
        object_type: ObjectType::Index,
        schema: source.schema.clone(),
        object_name: source.table.clone(),
        sub_object_name: Some(target.name.clone()),
        source_value: Some(source.name.clone()),
        target_value: Some(target.name.clone()),
        source_display: format!("{}.{}", source.table, source.name),
        target_display: format!("{}.{}", target.table, target.name),
        description: format!("index `{}` renamed to `{}`", source.name, target.name),
        can_auto_fix: true,
        fix_order: ObjectType::Index.fix_order(),
        warnings: vec![],
    }
}

fn index_duplicate(canonical: &Index, duplicate: &Index, side: Side) -> Difference {
    let diff_type = match side {
        Side::Source => DiffType::IndexDuplicateSource,
        Side::Target => DiffType::IndexDuplicateTarget,
    };
    Difference {
        diff_type,
        severity: Severity::Low,
        object_type: ObjectType::Index,
        schema: duplicate.schema.clone(),
        object_name: duplicate.table.clone(),
        sub_object_name: Some(duplicate.name.clone()),
        source_value: Some(duplicate.name.clone()),
        target_value: Some(canonical.name.clone()),
        source_display: format!("{}.{}", duplicate.table, duplicate.name),
        target_display: format!("{}.{}", canonical.table, canonical.name),
        description: format!(
            "index `{}` duplicates `{}` (same columns, uniqueness, and type)",
            duplicate.name, canonical.name
        ),
        can_auto_fix: true,
        fix_order: ObjectType::Index.fix_order(),
        warnings: vec![],
    }
}

fn index_missing(index: &Index, side: Side) -> Difference {
    let severity = if index.is_unique { Severity::High } else { Severity::Medium };
    let (diff_type, source_value, target_value, description) = match side {
        Side::Source => (
            DiffType::IndexMissingTarget,
            Some(index_json(index)),
            None,
            format!("index `{}` exists only in source", index.name),
        ),
        Side::Target => (
            DiffType::IndexMissingSource,
            None,
            Some(index_json(index)),
            format!("index `{}` exists only in target", index.name),
        ),
    };
    Difference {
        diff_type,
        severity,
        object_type: ObjectType::Index,
        schema: index.schema.clone(),
        object_name: index.table.clone(),
        sub_object_name: Some(index.name.clone()),
        source_value,
        target_value,
        source_display: format!("{}.{}", index.table, index.name),
        target_display: format!("{}.{}", index.table, index.name),
        description,
        can_auto_fix: true,
        fix_order: ObjectType::Index.fix_order(),
        warnings: vec![],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::catalog::IndexType;

    fn idx(name: &str, columns: &str, is_unique: bool) -> Index {
        Index {
            schema: "app".to_string(),
            table: "orders".to_string(),
            name: name.to_string(),
            is_unique,
            index_type: IndexType::Btree,
            columns: columns.to_string(),
            column_details: vec![],
            comment: String::new(),
        }
    }

    #[test]
    fn missing_unique_index_is_high_severity() {
        let diff = index_missing(&idx("idx_email", "email", true), Side::Target);
        assert_eq!(diff.severity, Severity::High);
        assert_eq!(diff.diff_type, DiffType::IndexMissingSource);
    }

    #[test]
    fn missing_non_unique_index_is_medium_severity() {
        let diff = index_missing(&idx("idx_created", "created_at", false), Side::Source);
        assert_eq!(diff.severity, Severity::Medium);
        assert_eq!(diff.diff_type, DiffType::IndexMissingTarget);
    }

    #[test]
    fn unique_change_to_unique_is_high_otherwise_medium() {
        let source = idx("idx_a", "a", false);
        let mut target = idx("idx_a", "a", true);
        let diffs = compare_index_fields(&source, &target);
        let unique_diff = diffs.iter().find(|d| d.diff_type == DiffType::IndexUniqueChanged).unwrap();
        assert_eq!(unique_diff.severity, Severity::High);

        target.is_unique = false;
        let mut source2 = idx("idx_a", "a", true);
        source2.is_unique = true;
        let diffs2 = compare_index_fields(&source2, &target);
        let unique_diff2 = diffs2.iter().find(|d| d.diff_type == DiffType::IndexUniqueChanged).unwrap();
        assert_eq!(unique_diff2.severity, Severity::Medium);
    }
}
