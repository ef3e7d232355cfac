//! Constraint comparer (§4.2.3 "Constraint", §4.2.4, I4). PRIMARY KEY
//! constraints are matched by position only — `fingerprint::constraint_
//! rename_eligible` excludes them from pass C regardless of fingerprint
//! match. UNIQUE is deliberately not represented here (§9): MySQL enforces
//! it as an index, so it is the index comparer's concern.

use async_trait::async_trait;
use sqlx::MySqlPool;

use crate::error::{CompareError, CompareResult};
use crate::introspect;
use crate::models::catalog::{Constraint, ConstraintKind};
use crate::models::diff::{DiffType, Difference, ObjectType, Severity};
use crate::models::endpoint::ComparisonOptions;
use crate::models::progress::{Phase, ProgressEvent, ProgressSender};

use super::fingerprint::{constraint_fingerprint, constraint_key, constraint_rename_eligible};
use super::matcher::{match_objects, MatchOutcome, Side};
use super::Comparer;

pub struct ConstraintComparer;

#[async_trait]
impl Comparer for ConstraintComparer {
    fn object_type(&self) -> ObjectType {
        ObjectType::Constraint
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
                .with_message("discovering constraints"),
        );

        let (source_constraints, target_constraints) = tokio::try_join!(
            introspect::discover_constraints(source_pool, options),
            introspect::discover_constraints(target_pool, options),
        )
        .map_err(CompareError::Catalog)?;

        let case_sensitive = options.case_sensitive;
        let source: Vec<Constraint> = source_constraints.into_values().collect();
        let target: Vec<Constraint> = target_constraints.into_values().collect();
        let total = (source.len() + target.len()) as u32;

        let outcomes = match_objects(
            source,
            target,
            move |c: &Constraint| constraint_key(c, case_sensitive),
            constraint_fingerprint,
            constraint_rename_eligible,
        );

        let mut differences = Vec::new();
        let mut current = 0u32;
        for outcome in outcomes {
            current += 1;
            let _ = progress.send(ProgressEvent::new(comparison_id, Phase::Comparison, current, total));
            match outcome {
                MatchOutcome::Matched { source, target } => {
                    differences.extend(compare_constraint_fields(&source, &target))
                }
                MatchOutcome::Renamed { source, target } => {
                    differences.push(constraint_renamed(&source, &target))
                }
                // No closed DiffType represents a duplicate constraint; the
                // matcher still marks it processed.
                MatchOutcome::Duplicate { .. } => {}
                MatchOutcome::Missing { object, side } => differences.push(constraint_missing(&object, side)),
            }
        }

        let _ = progress.send(
            ProgressEvent::new(comparison_id, Phase::Comparison, total, total)
                .with_message(format!("{} constraint differences", differences.len())),
        );

        Ok(differences)
    }
}

fn compare_constraint_fields(source: &Constraint, target: &Constraint) -> Vec<Difference> {
    let mut differences = Vec::new();

    match source.kind {
        ConstraintKind::ForeignKey => {
            let target_changed = source.referenced_schema != target.referenced_schema
                || source.referenced_table != target.referenced_table
                || source.referenced_columns != target.referenced_columns;
            if target_changed {
                differences.push(constraint_diff(
                    source,
                    target,
                    DiffType::ConstraintTargetChanged,
                    Severity::High,
                    format!("foreign key `{}` reference target changed", source.name),
                    vec![],
                ));
            }
            if source.columns != target.columns {
                differences.push(constraint_diff(
                    source,
                    target,
                    DiffType::ConstraintColumnsChanged,
                    Severity::High,
                    format!("foreign key `{}` columns changed", source.name),
                    vec![],
                ));
            }
            if source.update_rule != target.update_rule || source.delete_rule != target.delete_rule {
                differences.push(constraint_diff(
                    source,
                    target,
                    DiffType::ConstraintRuleChanged,
                    Severity::Medium,
                    format!("foreign key `{}` update/delete rule changed", source.name),
                    vec![],
                ));
            }
        }
        ConstraintKind::PrimaryKey => {
            if source.columns != target.columns {
                differences.push(constraint_diff(
                    source,
                    target,
                    DiffType::ConstraintColumnsChanged,
                    Severity::High,
                    format!("primary key `{}` columns changed", source.name),
                    vec!["table rebuild".to_string()],
                ));
            }
        }
        ConstraintKind::Check => {
            if source.check_clause != target.check_clause {
                differences.push(constraint_diff(
                    source,
                    target,
                    DiffType::ConstraintColumnsChanged,
                    Severity::Medium,
                    format!("check constraint `{}` clause changed", source.name),
                    vec![],
                ));
            }
        }
    }

    differences
}

fn constraint_json(constraint: &Constraint) -> String {
    serde_json::to_string(constraint).expect("Constraint serializes infallibly")
}

/// Field-level constraint diffs are recreate-class (§4.4.3: FOREIGN KEY must
/// be dropped and recreated on any field change) — both full definitions
/// travel so the generator can build the new `ADD CONSTRAINT` from the
/// desired side.
fn constraint_diff(
    source: &Constraint,
    target: &Constraint,
    diff_type: DiffType,
    severity: Severity,
    description: String,
    warnings: Vec<String>,
) -> Difference {
    Difference {
        diff_type,
        severity,
        object_type: ObjectType::Constraint,
        schema: source.schema.clone(),
        object_name: source.table.clone(),
        sub_object_name: Some(source.name.clone()),
        source_value: Some(constraint_json(source)),
        target_value: Some(constraint_json(target)),
        source_display: format!("{}.{}", source.table, source.name),
        target_display: format!("{}.{}", target.table, target.name),
        description,
        can_auto_fix: !matches!(source.kind, ConstraintKind::PrimaryKey),
        fix_order: ObjectType::Constraint.fix_order(),
        warnings,
    }
}

fn constraint_renamed(source: &Constraint, target: &Constraint) -> Difference {
    Difference {
        diff_type: DiffType::ConstraintRenamed,
        severity: Severity::Low,
        object_type: ObjectType::Constraint,
        schema: source.schema.clone(),
        object_name: source.table.clone(),
        sub_object_name: Some(target.name.clone()),
        // Full definitions, not just names: a FOREIGN KEY rename must drop
        // and recreate the constraint (§4.4.3), which needs the complete
        // column/reference/rule set, not only the new name.
        source_value: Some(constraint_json(source)),
        target_value: Some(constraint_json(target)),
        source_display: format!("{}.{}", source.table, source.name),
        target_display: format!("{}.{}", target.table, target.name),
        description: format!(
            "{} `{}` renamed to `{}`",
            source.kind.as_sql().to_ascii_lowercase(),
            source.name,
            target.name
        ),
        can_auto_fix: true,
        fix_order: ObjectType::Constraint.fix_order(),
        warnings: vec![],
    }
}

fn constraint_missing(constraint: &Constraint, side: Side) -> Difference {
    let severity = match constraint.kind {
        ConstraintKind::ForeignKey => Severity::High,
        ConstraintKind::PrimaryKey => Severity::High,
        ConstraintKind::Check => Severity::Medium,
    };
    let (diff_type, source_value, target_value, description) = match side {
        Side::Source => (
            DiffType::ConstraintMissingTarget,
            Some(constraint_json(constraint)),
            None,
            format!(
                "{} `{}` exists only in source",
                constraint.kind.as_sql().to_ascii_lowercase(),
                constraint.name
            ),
        ),
        Side::Target => (
            DiffType::ConstraintMissingSource,
            None,
            Some(constraint_json(constraint)),
            format!(
                "{} `{}` exists only in target",
                constraint.kind.as_sql().to_ascii_lowercase(),
                constraint.name
            ),
        ),
    };
    Difference {
        diff_type,
        severity,
        object_type: ObjectType::Constraint,
        schema: constraint.schema.clone(),
        object_name: constraint.table.clone(),
        sub_object_name: Some(constraint.name.clone()),
        source_value,
        target_value,
        source_display: format!("{}.{}", constraint.table, constraint.name),
        target_display: format!("{}.{}", constraint.table, constraint.name),
        description,
        can_auto_fix: !matches!(constraint.kind, ConstraintKind::PrimaryKey),
        fix_order: ObjectType::Constraint.fix_order(),
        warnings: vec![],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fk(name: &str, ref_table: &str) -> Constraint {
        Constraint {
            schema: "app".to_string(),
            table: "orders".to_string(),
            name: name.to_string(),
            kind: ConstraintKind::ForeignKey,
            columns: "customer_id".to_string(),
            referenced_schema: Some("app".to_string()),
            referenced_table: Some(ref_table.to_string()),
            referenced_columns: Some("id".to_string()),
            update_rule: Some("CASCADE".to_string()),
            delete_rule: Some("RESTRICT".to_string()),
            check_clause: None,
        }
    }

    #[test]
    fn foreign_key_target_change_is_high_severity() {
        let source = fk("fk_customer", "customers");
        let target = fk("fk_customer", "archived_customers");
        let diffs = compare_constraint_fields(&source, &target);
        let target_diff = diffs.iter().find(|d| d.diff_type == DiffType::ConstraintTargetChanged).unwrap();
        assert_eq!(target_diff.severity, Severity::High);
    }

    #[test]
    fn primary_key_missing_cannot_auto_fix() {
        let pk = Constraint {
            schema: "app".to_string(),
            table: "orders".to_string(),
            name: "PRIMARY".to_string(),
            kind: ConstraintKind::PrimaryKey,
            columns: "id".to_string(),
            referenced_schema: None,
            referenced_table: None,
            referenced_columns: None,
            update_rule: None,
            delete_rule: None,
            check_clause: None,
        };
        let diff = constraint_missing(&pk, Side::Target);
        assert!(!diff.can_auto_fix);
        assert_eq!(diff.severity, Severity::High);
    }
}
