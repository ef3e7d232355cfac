//! Sync-Script Generator (C4, §4.4). Top-level entry point: direction
//! transform, then ordering + redundancy elimination, then per-`Difference`
//! statement generation, then output framing into forward/rollback
//! `SyncScript.forward_sql`/`rollback_sql`. One function composes the
//! lower-level modules, the same shape `services/tunnel.rs` uses to
//! assemble a tunnel's lifecycle out of its parts.

mod column_def;
mod direction;
mod framing;
mod ordering;
mod statements;

pub use column_def::build_column_definition;
pub use direction::transform as transform_direction;
pub use framing::{frame, GeneratedStatement, Section, FORWARD_SECTION_ORDER, ROLLBACK_SECTION_ORDER};
pub use ordering::{order_and_deduplicate, OrderedDifferences};
pub use statements::generate_statement;

use crate::models::diff::Difference;
use crate::models::sync_script::{Direction, SyncScript};

/// Runs the full §4.4 pipeline over a stored `ComparisonResult`'s
/// differences and returns the `SyncScript` the caller persists/serves.
pub fn generate_sync_script(comparison_id: &str, differences: Vec<Difference>, direction: Direction) -> SyncScript {
    let transformed = direction::transform(differences, direction);
    let OrderedDifferences { differences: ordered, warnings: mut script_warnings } = ordering::order_and_deduplicate(transformed);

    let mut generated: Vec<GeneratedStatement> = Vec::with_capacity(ordered.len());
    for diff in &ordered {
        match statements::generate_statement(diff) {
            Ok(statement) => generated.push(statement),
            Err(error) => script_warnings.push(format!("{error}")),
        }
    }

    let requires_downtime = generated.iter().any(|s| s.requires_downtime);
    let data_loss_risk = generated.iter().any(|s| s.data_loss_risk);
    let estimated_duration_seconds: u64 = generated.iter().map(|s| s.duration_estimate_secs).sum();
    for statement in &generated {
        script_warnings.extend(statement.warnings.iter().cloned());
    }

    let refs: Vec<&GeneratedStatement> = generated.iter().collect();
    let description = format!("{} statements generated from {} differences", generated.len(), ordered.len());

    let forward_sql = framing::frame(
        "Schema sync script",
        &description,
        direction,
        &refs,
        framing::FORWARD_SECTION_ORDER,
        |s| &s.forward,
    );
    let rollback_sql = framing::frame(
        "Schema sync rollback script",
        &description,
        direction,
        &refs,
        framing::ROLLBACK_SECTION_ORDER,
        |s| &s.rollback,
    );

    let estimated_impact = if requires_downtime {
        "requires downtime".to_string()
    } else if data_loss_risk {
        "potential data loss".to_string()
    } else {
        "low impact".to_string()
    };

    SyncScript {
        comparison_id: comparison_id.to_string(),
        direction,
        forward_sql,
        rollback_sql,
        warnings: script_warnings,
        estimated_impact,
        estimated_duration_seconds,
        requires_downtime,
        data_loss_risk,
        validated: false,
        validation_errors: Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::catalog::{Column, Table};
    use crate::models::diff::{DiffType, ObjectType, Severity};
    use std::collections::BTreeMap;

    fn missing_target_table_diff() -> Difference {
        let mut columns = BTreeMap::new();
        columns.insert(
            "id".to_string(),
            Column {
                name: "id".to_string(),
                ordinal_position: 1,
                column_type: "int(11)".to_string(),
                data_type: "int".to_string(),
                nullable: false,
                default: None,
                extra: "auto_increment".to_string(),
                charset: None,
                collation: None,
                column_key: "PRI".to_string(),
                comment: String::new(),
                after_column: None,
            },
        );
        let table = Table {
            schema: "app".to_string(),
            name: "widgets".to_string(),
            engine: Some("InnoDB".to_string()),
            collation: Some("utf8mb4_general_ci".to_string()),
            comment: None,
            create_options: None,
            columns,
        };
        Difference {
            diff_type: DiffType::TableMissingTarget,
            severity: Severity::Critical,
            object_type: ObjectType::Table,
            schema: "app".to_string(),
            object_name: "widgets".to_string(),
            sub_object_name: None,
            source_value: Some(serde_json::to_string(&table).unwrap()),
            target_value: None,
            source_display: "widgets".to_string(),
            target_display: String::new(),
            description: "table widgets exists only in source".to_string(),
            can_auto_fix: true,
            fix_order: 2,
            warnings: Vec::new(),
        }
    }

    #[test]
    fn generates_create_table_statement_for_missing_target() {
        let script = generate_sync_script("cmp-1", vec![missing_target_table_diff()], Direction::SourceToTarget);
        assert!(script.forward_sql.contains("CREATE TABLE `app`.`widgets`"));
        assert!(script.rollback_sql.contains("DROP TABLE IF EXISTS `app`.`widgets`;"));
        assert!(!script.requires_downtime);
    }

    #[test]
    fn empty_difference_set_yields_empty_framed_script() {
        let script = generate_sync_script("cmp-2", Vec::new(), Direction::SourceToTarget);
        assert!(script.forward_sql.contains("SET FOREIGN_KEY_CHECKS = 0;"));
        assert!(script.forward_sql.contains("SET FOREIGN_KEY_CHECKS = 1;"));
        assert!(!script.requires_downtime);
        assert!(!script.data_loss_risk);
    }
}
