//! Constraint discovery (§4.1): three independent queries — PRIMARY KEY,
//! FOREIGN KEY, and CHECK (the last may be unsupported on older servers;
//! its error is swallowed and it contributes no rows).

use std::collections::BTreeMap;

use sqlx::{MySqlPool, Row};

use crate::error::{CatalogError, CatalogResult};
use crate::models::catalog::{Constraint, ConstraintKind};
use crate::models::endpoint::ComparisonOptions;

use super::queries;

const KIND: &str = "constraints";

pub async fn discover_constraints(
    pool: &MySqlPool,
    options: &ComparisonOptions,
) -> CatalogResult<BTreeMap<String, Constraint>> {
    let mut constraints = BTreeMap::new();
    discover_primary_keys(pool, options, &mut constraints).await?;
    discover_foreign_keys(pool, options, &mut constraints).await?;
    discover_check_constraints(pool, options, &mut constraints).await;
    Ok(constraints)
}

async fn discover_primary_keys(
    pool: &MySqlPool,
    options: &ComparisonOptions,
    out: &mut BTreeMap<String, Constraint>,
) -> CatalogResult<()> {
    let query = queries::bind_system_schemas(sqlx::query(queries::PRIMARY_KEY_CONSTRAINTS));
    let rows = query
        .fetch_all(pool)
        .await
        .map_err(|source| CatalogError::QueryFailed { kind: KIND, source })?;

    for row in &rows {
        let schema: String = row
            .try_get("table_schema")
            .map_err(|source| CatalogError::QueryFailed { kind: KIND, source })?;
        let table: String = row
            .try_get("table_name")
            .map_err(|source| CatalogError::QueryFailed { kind: KIND, source })?;
        if !options.schema_allowed(&schema) || !options.table_allowed(&table) {
            continue;
        }
        let name: String = row
            .try_get("constraint_name")
            .map_err(|source| CatalogError::QueryFailed { kind: KIND, source })?;
        let column: String = row
            .try_get("column_name")
            .map_err(|source| CatalogError::QueryFailed { kind: KIND, source })?;

        let key = format!("{schema}.{table}.{name}");
        let entry = out.entry(key).or_insert_with(|| Constraint {
            schema: schema.clone(),
            table: table.clone(),
            name: name.clone(),
            kind: ConstraintKind::PrimaryKey,
            columns: String::new(),
            referenced_schema: None,
            referenced_table: None,
            referenced_columns: None,
            update_rule: None,
            delete_rule: None,
            check_clause: None,
        });
        append_column(&mut entry.columns, &column);
    }

    Ok(())
}

async fn discover_foreign_keys(
    pool: &MySqlPool,
    options: &ComparisonOptions,
    out: &mut BTreeMap<String, Constraint>,
) -> CatalogResult<()> {
    let query = queries::bind_system_schemas(sqlx::query(queries::FOREIGN_KEY_CONSTRAINTS));
    let rows = query
        .fetch_all(pool)
        .await
        .map_err(|source| CatalogError::QueryFailed { kind: KIND, source })?;

    for row in &rows {
        let schema: String = row
            .try_get("table_schema")
            .map_err(|source| CatalogError::QueryFailed { kind: KIND, source })?;
        let table: String = row
            .try_get("table_name")
            .map_err(|source| CatalogError::QueryFailed { kind: KIND, source })?;
        if !options.schema_allowed(&schema) || !options.table_allowed(&table) {
            continue;
        }
        let name: String = row
            .try_get("constraint_name")
            .map_err(|source| CatalogError::QueryFailed { kind: KIND, source })?;
        let column: String = row
            .try_get("column_name")
            .map_err(|source| CatalogError::QueryFailed { kind: KIND, source })?;
        let referenced_schema: Option<String> = row
            .try_get("referenced_schema")
            .map_err(|source| CatalogError::QueryFailed { kind: KIND, source })?;
        let referenced_table: Option<String> = row
            .try_get("referenced_table")
            .map_err(|source| CatalogError::QueryFailed { kind: KIND, source })?;
        let referenced_column: Option<String> = row
            .try_get("referenced_column")
            .map_err(|source| CatalogError::QueryFailed { kind: KIND, source })?;
        let update_rule: Option<String> = row
            .try_get("update_rule")
            .map_err(|source| CatalogError::QueryFailed { kind: KIND, source })?;
        let delete_rule: Option<String> = row
            .try_get("delete_rule")
            .map_err(|source| CatalogError::QueryFailed { kind: KIND, source })?;

        let key = format!("{schema}.{table}.{name}");
        let entry = out.entry(key).or_insert_with(|| Constraint {
            schema: schema.clone(),
            table: table.clone(),
            name: name.clone(),
            kind: ConstraintKind::ForeignKey,
            columns: String::new(),
            referenced_schema: referenced_schema.clone(),
            referenced_table: referenced_table.clone(),
            referenced_columns: None,
            update_rule,
            delete_rule,
            check_clause: None,
        });
        append_column(&mut entry.columns, &column);
        if let Some(referenced_column) = referenced_column {
            let joined = entry.referenced_columns.get_or_insert_with(String::new);
            append_column(joined, &referenced_column);
        }
    }

    Ok(())
}

/// CHECK_CONSTRAINTS may not exist (pre-8.0.16 MySQL, some forks); the
/// error is swallowed per §4.1 rather than failing the whole discovery.
async fn discover_check_constraints(
    pool: &MySqlPool,
    options: &ComparisonOptions,
    out: &mut BTreeMap<String, Constraint>,
) {
    let query = queries::bind_system_schemas(sqlx::query(queries::CHECK_CONSTRAINTS));
    let rows = match query.fetch_all(pool).await {
        Ok(rows) => rows,
        Err(e) => {
            tracing::debug!(error = %e, "CHECK_CONSTRAINTS unsupported on this server, skipping");
            return;
        }
    };

    for row in &rows {
        let (Ok(schema), Ok(table), Ok(name), Ok(check_clause)) = (
            row.try_get::<String, _>("table_schema"),
            row.try_get::<String, _>("table_name"),
            row.try_get::<String, _>("constraint_name"),
            row.try_get::<String, _>("check_clause"),
        ) else {
            continue;
        };
        if !options.schema_allowed(&schema) || !options.table_allowed(&table) {
            continue;
        }

        let key = format!("{schema}.{table}.{name}");
        out.insert(
            key,
            Constraint {
                schema,
                table,
                name,
                kind: ConstraintKind::Check,
                columns: String::new(),
                referenced_schema: None,
                referenced_table: None,
                referenced_columns: None,
                update_rule: None,
                delete_rule: None,
                check_clause: Some(check_clause),
            },
        );
    }
}

fn append_column(joined: &mut String, column: &str) {
    if !joined.is_empty() {
        joined.push(',');
    }
    joined.push_str(column);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn append_column_comma_joins_in_call_order() {
        let mut joined = String::new();
        append_column(&mut joined, "customer_id");
        append_column(&mut joined, "order_id");
        assert_eq!(joined, "customer_id,order_id");
    }
}
