//! Per-`DiffType` statement generation (§4.4.3). Each rule produces a
//! `(forward, rollback)` pair plus the impact metadata the framer and the
//! top-level `SyncScript` flags fold in.

use crate::error::{GeneratorError, GeneratorResult};
use crate::models::catalog::{Column, Constraint, ConstraintKind, Index, Table};
use crate::models::diff::{DiffType, Difference, Severity};

use super::column_def::{build_column_definition, position_clause};
use super::framing::{GeneratedStatement, Section};
use super::quoting::{qualified, quote_comment, quote_ident};

fn parse_side<T: serde::de::DeserializeOwned>(diff: &Difference, value: &Option<String>, side: &str) -> GeneratorResult<T> {
    let raw = value.as_deref().ok_or_else(|| GeneratorError::MalformedDifference {
        object_type: format!("{:?}", diff.object_type),
        object_name: diff.object_name.clone(),
        reason: format!("{side}_value missing"),
    })?;
    serde_json::from_str(raw).map_err(|e| GeneratorError::MalformedDifference {
        object_type: format!("{:?}", diff.object_type),
        object_name: diff.object_name.clone(),
        reason: format!("{side}_value did not parse: {e}"),
    })
}

fn parse_source<T: serde::de::DeserializeOwned>(diff: &Difference) -> GeneratorResult<T> {
    parse_side(diff, &diff.source_value, "source")
}

fn parse_target<T: serde::de::DeserializeOwned>(diff: &Difference) -> GeneratorResult<T> {
    parse_side(diff, &diff.target_value, "target")
}

fn duration_for(diff: &Difference) -> u64 {
    use crate::models::diff::ObjectType;
    if diff.diff_type == DiffType::ColumnTypeChanged {
        60
    } else if diff.object_type == ObjectType::Table {
        5
    } else if diff.object_type == ObjectType::Index {
        30
    } else {
        2
    }
}

fn requires_downtime_for(diff: &Difference, constraint_kind: Option<ConstraintKind>) -> bool {
    if diff.diff_type == DiffType::ColumnTypeChanged && diff.severity == Severity::Critical {
        return true;
    }
    matches!(constraint_kind, Some(ConstraintKind::PrimaryKey))
}

fn data_loss_for(diff: &Difference) -> bool {
    diff.diff_type == DiffType::TableMissingSource
        || diff.diff_type == DiffType::ColumnRemoved
        || diff.diff_type == DiffType::ColumnTypeChanged
        || diff.carries_data_loss_warning()
}

/// Dispatches one (already direction-transformed) `Difference` to its
/// generator rule. `Ok(None)` is never returned — unsupported diff types are
/// `Err(GeneratorError::Unsupported)`, which the caller turns into a
/// `SyncScript` warning per §7's GeneratorUnsupported policy.
pub fn generate_statement(diff: &Difference) -> GeneratorResult<GeneratedStatement> {
    match diff.diff_type {
        DiffType::TableMissingTarget => create_table(diff),
        DiffType::TableMissingSource => drop_table(diff),
        DiffType::TableEngineChanged => alter_table_property(diff, "ENGINE", false),
        DiffType::TableCollationChanged => alter_table_property(diff, "COLLATE", false),
        DiffType::TableCommentChanged => alter_table_property(diff, "COMMENT", true),

        DiffType::ColumnAdded => add_column(diff),
        DiffType::ColumnRemoved => drop_column(diff),
        DiffType::ColumnRenamed => rename_column(diff),
        DiffType::ColumnTypeChanged
        | DiffType::ColumnNullableChanged
        | DiffType::ColumnDefaultChanged
        | DiffType::ColumnExtraChanged => modify_column(diff),

        DiffType::IndexMissingTarget => create_index(diff),
        DiffType::IndexMissingSource => drop_index(diff),
        DiffType::IndexColumnsChanged | DiffType::IndexUniqueChanged | DiffType::IndexTypeChanged => recreate_index(diff),
        DiffType::IndexRenamed => rename_index(diff),
        DiffType::IndexDuplicateSource | DiffType::IndexDuplicateTarget => drop_duplicate_index(diff),

        DiffType::ConstraintMissingTarget => create_constraint(diff),
        DiffType::ConstraintMissingSource => drop_constraint(diff),
        DiffType::ConstraintColumnsChanged | DiffType::ConstraintTargetChanged | DiffType::ConstraintRuleChanged => {
            recreate_constraint(diff)
        }
        DiffType::ConstraintRenamed => rename_constraint(diff),
    }
}

fn create_table(diff: &Difference) -> GeneratorResult<GeneratedStatement> {
    let table: Table = parse_source(diff)?;
    let table_name = qualified(&table.schema, &table.name);

    let mut clauses: Vec<String> = table
        .ordered_columns()
        .into_iter()
        .map(|c| format!("  {} {}", quote_ident(&c.name), build_column_definition(c)))
        .collect();

    let pk_columns: Vec<&Column> = {
        let mut cols: Vec<&Column> = table.ordered_columns().into_iter().filter(|c| c.is_primary()).collect();
        cols.sort_by_key(|c| c.ordinal_position);
        cols
    };
    if !pk_columns.is_empty() {
        let cols = pk_columns.iter().map(|c| quote_ident(&c.name)).collect::<Vec<_>>().join(", ");
        clauses.push(format!("  PRIMARY KEY ({cols})"));
    }

    let mut forward = format!("CREATE TABLE {table_name} (\n{}\n)", clauses.join(",\n"));
    if let Some(engine) = &table.engine {
        forward.push_str(&format!(" ENGINE={engine}"));
    }
    if let Some(collation) = &table.collation {
        forward.push_str(&format!(" COLLATE={collation}"));
    }
    if let Some(comment) = table.comment.as_deref().filter(|c| !c.is_empty()) {
        forward.push_str(&format!(" COMMENT={}", quote_comment(comment)));
    }
    forward.push(';');

    Ok(GeneratedStatement {
        section: Section::TableCreation,
        forward,
        rollback: format!("DROP TABLE IF EXISTS {table_name};"),
        warnings: diff.warnings.clone(),
        requires_downtime: false,
        data_loss_risk: data_loss_for(diff),
        duration_estimate_secs: duration_for(diff),
    })
}

fn drop_table(diff: &Difference) -> GeneratorResult<GeneratedStatement> {
    let table: Table = parse_target(diff)?;
    let table_name = qualified(&table.schema, &table.name);
    let mut warnings = diff.warnings.clone();
    warnings.push("ensure data is backed up".to_string());

    Ok(GeneratedStatement {
        section: Section::TableCreation,
        forward: format!("DROP TABLE IF EXISTS {table_name};"),
        rollback: format!("-- TODO: recreate table {table_name} (original definition not replayed)"),
        warnings,
        requires_downtime: false,
        data_loss_risk: true,
        duration_estimate_secs: duration_for(diff),
    })
}

fn alter_table_property(diff: &Difference, property: &str, quoted: bool) -> GeneratorResult<GeneratedStatement> {
    let table_name = qualified(&diff.schema, &diff.object_name);
    let render = |value: &str| if quoted { quote_comment(value) } else { value.to_string() };
    let forward_value = diff.source_value.as_deref().unwrap_or_default();
    let rollback_value = diff.target_value.as_deref().unwrap_or_default();

    Ok(GeneratedStatement {
        section: Section::TableCreation,
        forward: format!("ALTER TABLE {table_name} {property}={};", render(forward_value)),
        rollback: format!("ALTER TABLE {table_name} {property}={};", render(rollback_value)),
        warnings: diff.warnings.clone(),
        requires_downtime: false,
        data_loss_risk: data_loss_for(diff),
        duration_estimate_secs: duration_for(diff),
    })
}

fn add_column(diff: &Difference) -> GeneratorResult<GeneratedStatement> {
    let column: Column = parse_source(diff)?;
    let table_name = qualified(&diff.schema, &diff.object_name);
    let definition = build_column_definition(&column);

    Ok(GeneratedStatement {
        section: Section::ColumnModifications,
        forward: format!(
            "ALTER TABLE {table_name} ADD COLUMN {} {}{};",
            quote_ident(&column.name),
            definition,
            position_clause(&column)
        ),
        rollback: format!("ALTER TABLE {table_name} DROP COLUMN {};", quote_ident(&column.name)),
        warnings: diff.warnings.clone(),
        requires_downtime: false,
        data_loss_risk: data_loss_for(diff),
        duration_estimate_secs: duration_for(diff),
    })
}

fn drop_column(diff: &Difference) -> GeneratorResult<GeneratedStatement> {
    let column: Column = parse_target(diff)?;
    let table_name = qualified(&diff.schema, &diff.object_name);
    let definition = build_column_definition(&column);
    let mut warnings = diff.warnings.clone();
    if !diff.carries_data_loss_warning() {
        warnings.push("data loss".to_string());
    }

    Ok(GeneratedStatement {
        section: Section::ColumnModifications,
        forward: format!("ALTER TABLE {table_name} DROP COLUMN {};", quote_ident(&column.name)),
        rollback: format!(
            "ALTER TABLE {table_name} ADD COLUMN {} {}{};",
            quote_ident(&column.name),
            definition,
            position_clause(&column)
        ),
        warnings,
        requires_downtime: false,
        data_loss_risk: true,
        duration_estimate_secs: duration_for(diff),
    })
}

fn rename_column(diff: &Difference) -> GeneratorResult<GeneratedStatement> {
    let desired: Column = parse_source(diff)?;
    let current: Column = parse_target(diff)?;
    let table_name = qualified(&diff.schema, &diff.object_name);

    Ok(GeneratedStatement {
        section: Section::ColumnModifications,
        forward: format!(
            "ALTER TABLE {table_name} CHANGE COLUMN {} {} {};",
            quote_ident(&current.name),
            quote_ident(&desired.name),
            build_column_definition(&desired)
        ),
        rollback: format!(
            "ALTER TABLE {table_name} CHANGE COLUMN {} {} {};",
            quote_ident(&desired.name),
            quote_ident(&current.name),
            build_column_definition(&current)
        ),
        warnings: diff.warnings.clone(),
        requires_downtime: false,
        data_loss_risk: data_loss_for(diff),
        duration_estimate_secs: duration_for(diff),
    })
}

fn modify_column(diff: &Difference) -> GeneratorResult<GeneratedStatement> {
    let desired: Column = parse_source(diff)?;
    let current: Column = parse_target(diff)?;
    let table_name = qualified(&diff.schema, &diff.object_name);

    Ok(GeneratedStatement {
        section: Section::ColumnModifications,
        forward: format!(
            "ALTER TABLE {table_name} MODIFY COLUMN {} {};",
            quote_ident(&desired.name),
            build_column_definition(&desired)
        ),
        rollback: format!(
            "ALTER TABLE {table_name} MODIFY COLUMN {} {};",
            quote_ident(&current.name),
            build_column_definition(&current)
        ),
        warnings: diff.warnings.clone(),
        requires_downtime: diff.diff_type == DiffType::ColumnTypeChanged && diff.severity == Severity::Critical,
        data_loss_risk: data_loss_for(diff),
        duration_estimate_secs: duration_for(diff),
    })
}

fn index_create_clause(table_name: &str, index: &Index) -> String {
    let unique = if index.is_unique { "UNIQUE " } else { "" };
    let mut stmt = format!(
        "CREATE {unique}INDEX {} ON {table_name}({})",
        quote_ident(&index.name),
        index.columns.split(',').map(str::trim).map(quote_ident).collect::<Vec<_>>().join(", ")
    );
    if index.index_type != crate::models::catalog::IndexType::Btree {
        stmt.push_str(&format!(" USING {}", index.index_type.as_mysql()));
    }
    stmt.push(';');
    stmt
}

fn index_drop_clause(table_name: &str, index_name: &str) -> String {
    format!("DROP INDEX {} ON {table_name};", quote_ident(index_name))
}

fn create_index(diff: &Difference) -> GeneratorResult<GeneratedStatement> {
    let index: Index = parse_source(diff)?;
    let table_name = qualified(&diff.schema, &diff.object_name);

    Ok(GeneratedStatement {
        section: Section::IndexModifications,
        forward: index_create_clause(&table_name, &index),
        rollback: index_drop_clause(&table_name, &index.name),
        warnings: diff.warnings.clone(),
        requires_downtime: false,
        data_loss_risk: data_loss_for(diff),
        duration_estimate_secs: duration_for(diff),
    })
}

fn drop_index(diff: &Difference) -> GeneratorResult<GeneratedStatement> {
    let index: Index = parse_target(diff)?;
    let table_name = qualified(&diff.schema, &diff.object_name);

    Ok(GeneratedStatement {
        section: Section::IndexModifications,
        forward: index_drop_clause(&table_name, &index.name),
        rollback: index_create_clause(&table_name, &index),
        warnings: diff.warnings.clone(),
        requires_downtime: false,
        data_loss_risk: data_loss_for(diff),
        duration_estimate_secs: duration_for(diff),
    })
}

fn recreate_index(diff: &Difference) -> GeneratorResult<GeneratedStatement> {
    let desired: Index = parse_source(diff)?;
    let current: Index = parse_target(diff)?;
    let table_name = qualified(&diff.schema, &diff.object_name);

    Ok(GeneratedStatement {
        section: Section::IndexModifications,
        forward: format!(
            "{}\n{}",
            index_drop_clause(&table_name, &current.name),
            index_create_clause(&table_name, &desired)
        ),
        rollback: format!(
            "{}\n{}",
            index_drop_clause(&table_name, &desired.name),
            index_create_clause(&table_name, &current)
        ),
        warnings: diff.warnings.clone(),
        requires_downtime: false,
        data_loss_risk: data_loss_for(diff),
        duration_estimate_secs: duration_for(diff),
    })
}

fn rename_index(diff: &Difference) -> GeneratorResult<GeneratedStatement> {
    let desired_name = diff.source_value.clone().ok_or_else(|| GeneratorError::MalformedDifference {
        object_type: format!("{:?}", diff.object_type),
        object_name: diff.object_name.clone(),
        reason: "source_value missing".to_string(),
    })?;
    let current_name = diff.target_value.clone().ok_or_else(|| GeneratorError::MalformedDifference {
        object_type: format!("{:?}", diff.object_type),
        object_name: diff.object_name.clone(),
        reason: "target_value missing".to_string(),
    })?;
    let table_name = qualified(&diff.schema, &diff.object_name);

    Ok(GeneratedStatement {
        section: Section::IndexModifications,
        forward: format!(
            "ALTER TABLE {table_name} RENAME INDEX {} TO {};",
            quote_ident(&current_name),
            quote_ident(&desired_name)
        ),
        rollback: format!(
            "ALTER TABLE {table_name} RENAME INDEX {} TO {};",
            quote_ident(&desired_name),
            quote_ident(&current_name)
        ),
        warnings: diff.warnings.clone(),
        requires_downtime: false,
        data_loss_risk: false,
        duration_estimate_secs: duration_for(diff),
    })
}

fn drop_duplicate_index(diff: &Difference) -> GeneratorResult<GeneratedStatement> {
    let duplicate_name = diff.source_value.as_deref().unwrap_or_default();
    let canonical_name = diff.target_value.as_deref().unwrap_or_default();
    let table_name = qualified(&diff.schema, &diff.object_name);

    Ok(GeneratedStatement {
        section: Section::IndexModifications,
        forward: format!(
            "{}\n-- duplicate of {}",
            index_drop_clause(&table_name, duplicate_name),
            quote_ident(canonical_name)
        ),
        rollback: format!("-- rollback not applicable: duplicate index {} removal is not reversed", quote_ident(duplicate_name)),
        warnings: diff.warnings.clone(),
        requires_downtime: false,
        data_loss_risk: false,
        duration_estimate_secs: duration_for(diff),
    })
}

fn foreign_key_clause(name: &str, constraint: &Constraint) -> String {
    let columns = constraint.columns.split(',').map(str::trim).map(quote_ident).collect::<Vec<_>>().join(", ");
    let ref_table = qualified(
        constraint.referenced_schema.as_deref().unwrap_or_default(),
        constraint.referenced_table.as_deref().unwrap_or_default(),
    );
    let ref_columns = constraint
        .referenced_columns
        .as_deref()
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .map(quote_ident)
        .collect::<Vec<_>>()
        .join(", ");
    let mut clause = format!("ADD CONSTRAINT {} FOREIGN KEY ({columns}) REFERENCES {ref_table} ({ref_columns})", quote_ident(name));
    if let Some(rule) = &constraint.update_rule {
        clause.push_str(&format!(" ON UPDATE {rule}"));
    }
    if let Some(rule) = &constraint.delete_rule {
        clause.push_str(&format!(" ON DELETE {rule}"));
    }
    clause
}

fn primary_key_clause(constraint: &Constraint) -> String {
    let columns = constraint.columns.split(',').map(str::trim).map(quote_ident).collect::<Vec<_>>().join(", ");
    format!("ADD PRIMARY KEY ({columns})")
}

fn add_clause(constraint: &Constraint) -> GeneratorResult<String> {
    match constraint.kind {
        ConstraintKind::PrimaryKey => Ok(primary_key_clause(constraint)),
        ConstraintKind::ForeignKey => Ok(foreign_key_clause(&constraint.name, constraint)),
        ConstraintKind::Check => Err(GeneratorError::Unsupported(DiffType::ConstraintMissingTarget)),
    }
}

fn drop_clause(constraint: &Constraint) -> GeneratorResult<String> {
    match constraint.kind {
        ConstraintKind::PrimaryKey => Ok("DROP PRIMARY KEY".to_string()),
        ConstraintKind::ForeignKey => Ok(format!("DROP FOREIGN KEY {}", quote_ident(&constraint.name))),
        ConstraintKind::Check => Err(GeneratorError::Unsupported(DiffType::ConstraintMissingSource)),
    }
}

fn create_constraint(diff: &Difference) -> GeneratorResult<GeneratedStatement> {
    let constraint: Constraint = parse_source(diff)?;
    let table_name = qualified(&diff.schema, &diff.object_name);
    let add = add_clause(&constraint)?;
    let drop = drop_clause(&constraint)?;

    Ok(GeneratedStatement {
        section: Section::ConstraintModifications,
        forward: format!("ALTER TABLE {table_name} {add};"),
        rollback: format!("ALTER TABLE {table_name} {drop};"),
        warnings: diff.warnings.clone(),
        requires_downtime: requires_downtime_for(diff, Some(constraint.kind)),
        data_loss_risk: data_loss_for(diff),
        duration_estimate_secs: duration_for(diff),
    })
}

fn drop_constraint(diff: &Difference) -> GeneratorResult<GeneratedStatement> {
    let constraint: Constraint = parse_target(diff)?;
    let table_name = qualified(&diff.schema, &diff.object_name);
    let drop = drop_clause(&constraint)?;
    let add = add_clause(&constraint)?;

    Ok(GeneratedStatement {
        section: Section::ConstraintModifications,
        forward: format!("ALTER TABLE {table_name} {drop};"),
        rollback: format!("ALTER TABLE {table_name} {add};"),
        warnings: diff.warnings.clone(),
        requires_downtime: requires_downtime_for(diff, Some(constraint.kind)),
        data_loss_risk: data_loss_for(diff),
        duration_estimate_secs: duration_for(diff),
    })
}

fn recreate_constraint(diff: &Difference) -> GeneratorResult<GeneratedStatement> {
    let desired: Constraint = parse_source(diff)?;
    let current: Constraint = parse_target(diff)?;
    let table_name = qualified(&diff.schema, &diff.object_name);
    let drop_current = drop_clause(&current)?;
    let add_desired = add_clause(&desired)?;
    let drop_desired = drop_clause(&desired)?;
    let add_current = add_clause(&current)?;

    Ok(GeneratedStatement {
        section: Section::ConstraintModifications,
        forward: format!("ALTER TABLE {table_name} {drop_current};\nALTER TABLE {table_name} {add_desired};"),
        rollback: format!("ALTER TABLE {table_name} {drop_desired};\nALTER TABLE {table_name} {add_current};"),
        warnings: diff.warnings.clone(),
        requires_downtime: requires_downtime_for(diff, Some(desired.kind)),
        data_loss_risk: data_loss_for(diff),
        duration_estimate_secs: duration_for(diff),
    })
}

fn rename_constraint(diff: &Difference) -> GeneratorResult<GeneratedStatement> {
    let desired: Constraint = parse_source(diff)?;
    let current: Constraint = parse_target(diff)?;
    if desired.kind != ConstraintKind::ForeignKey {
        return Err(GeneratorError::Unsupported(DiffType::ConstraintRenamed));
    }
    let table_name = qualified(&diff.schema, &diff.object_name);

    Ok(GeneratedStatement {
        section: Section::ConstraintModifications,
        forward: format!(
            "ALTER TABLE {table_name} DROP FOREIGN KEY {};\nALTER TABLE {table_name} {};",
            quote_ident(&current.name),
            foreign_key_clause(&desired.name, &desired)
        ),
        rollback: format!(
            "ALTER TABLE {table_name} DROP FOREIGN KEY {};\nALTER TABLE {table_name} {};",
            quote_ident(&desired.name),
            foreign_key_clause(&current.name, &current)
        ),
        warnings: diff.warnings.clone(),
        requires_downtime: false,
        data_loss_risk: data_loss_for(diff),
        duration_estimate_secs: duration_for(diff),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::catalog::IndexType;
    use crate::models::diff::ObjectType;

    fn column(name: &str, ordinal: u32) -> Column {
        Column {
            name: name.to_string(),
            ordinal_position: ordinal,
            column_type: "varchar(255)".to_string(),
            data_type: "varchar".to_string(),
            nullable: true,
            default: None,
            extra: String::new(),
            charset: None,
            collation: None,
            column_key: String::new(),
            comment: String::new(),
            after_column: if ordinal > 1 { Some("id".to_string()) } else { None },
        }
    }

    fn diff_with(diff_type: DiffType, object_type: ObjectType, source: Option<String>, target: Option<String>) -> Difference {
        Difference {
            diff_type,
            severity: Severity::Medium,
            object_type,
            schema: "app".to_string(),
            object_name: "orders".to_string(),
            sub_object_name: Some("email".to_string()),
            source_value: source,
            target_value: target,
            source_display: String::new(),
            target_display: String::new(),
            description: String::new(),
            can_auto_fix: true,
            fix_order: object_type.fix_order(),
            warnings: vec![],
        }
    }

    #[test]
    fn add_column_emits_alter_with_position_clause() {
        let col = column("email", 2);
        let diff = diff_with(
            DiffType::ColumnAdded,
            ObjectType::Column,
            Some(serde_json::to_string(&col).unwrap()),
            None,
        );
        let statement = generate_statement(&diff).unwrap();
        assert!(statement.forward.contains("ADD COLUMN `email` varchar(255) NULL AFTER `id`"));
        assert!(statement.rollback.contains("DROP COLUMN `email`"));
    }

    #[test]
    fn drop_column_marks_data_loss() {
        let col = column("legacy_flag", 3);
        let diff = diff_with(
            DiffType::ColumnRemoved,
            ObjectType::Column,
            None,
            Some(serde_json::to_string(&col).unwrap()),
        );
        let statement = generate_statement(&diff).unwrap();
        assert!(statement.data_loss_risk);
        assert!(statement.forward.contains("DROP COLUMN `legacy_flag`"));
    }

    #[test]
    fn create_index_uses_column_list_and_using_clause() {
        let index = Index {
            schema: "app".to_string(),
            table: "orders".to_string(),
            name: "idx_email".to_string(),
            is_unique: true,
            index_type: IndexType::Hash,
            columns: "email".to_string(),
            column_details: vec![],
            comment: String::new(),
        };
        let diff = diff_with(
            DiffType::IndexMissingTarget,
            ObjectType::Index,
            Some(serde_json::to_string(&index).unwrap()),
            None,
        );
        let statement = generate_statement(&diff).unwrap();
        assert!(statement.forward.contains("CREATE UNIQUE INDEX `idx_email` ON `app`.`orders`(`email`) USING HASH"));
    }

    #[test]
    fn check_constraint_create_is_unsupported() {
        let constraint = Constraint {
            schema: "app".to_string(),
            table: "orders".to_string(),
            name: "chk_total".to_string(),
            kind: ConstraintKind::Check,
            columns: "total".to_string(),
            referenced_schema: None,
            referenced_table: None,
            referenced_columns: None,
            update_rule: None,
            delete_rule: None,
            check_clause: Some("total >= 0".to_string()),
        };
        let diff = diff_with(
            DiffType::ConstraintMissingTarget,
            crate::models::diff::ObjectType::Constraint,
            Some(serde_json::to_string(&constraint).unwrap()),
            None,
        );
        assert!(matches!(generate_statement(&diff), Err(GeneratorError::Unsupported(_))));
    }
}
