//! Table + column discovery (§4.1: "join TABLES×COLUMNS; keep only
//! TABLE_TYPE='BASE TABLE'; ordered by (schema, table, ordinal_position)").

use std::collections::BTreeMap;

use sqlx::{MySqlPool, Row};

use crate::error::{CatalogError, CatalogResult};
use crate::models::catalog::{Column, Table};
use crate::models::endpoint::ComparisonOptions;

use super::queries;

const KIND: &str = "tables";

pub async fn discover_tables(
    pool: &MySqlPool,
    options: &ComparisonOptions,
) -> CatalogResult<BTreeMap<String, Table>> {
    let query = queries::bind_system_schemas(sqlx::query(queries::TABLES_AND_COLUMNS));
    let rows = query
        .fetch_all(pool)
        .await
        .map_err(|source| CatalogError::QueryFailed { kind: KIND, source })?;

    let mut tables: BTreeMap<String, Table> = BTreeMap::new();

    for row in &rows {
        let schema: String = row
            .try_get("table_schema")
            .map_err(|source| CatalogError::QueryFailed { kind: KIND, source })?;
        let name: String = row
            .try_get("table_name")
            .map_err(|source| CatalogError::QueryFailed { kind: KIND, source })?;

        if !options.schema_allowed(&schema) || !options.table_allowed(&name) {
            continue;
        }

        let table_key = format!("{schema}.{name}");
        let table = tables.entry(table_key).or_insert_with(|| Table {
            schema: schema.clone(),
            name: name.clone(),
            engine: None,
            collation: None,
            comment: None,
            create_options: None,
            columns: BTreeMap::new(),
        });
        table.engine = row
            .try_get("engine")
            .map_err(|source| CatalogError::QueryFailed { kind: KIND, source })?;
        table.collation = row
            .try_get("table_collation")
            .map_err(|source| CatalogError::QueryFailed { kind: KIND, source })?;
        table.comment = non_empty(
            row.try_get("table_comment")
                .map_err(|source| CatalogError::QueryFailed { kind: KIND, source })?,
        );
        table.create_options = non_empty(
            row.try_get("create_options")
                .map_err(|source| CatalogError::QueryFailed { kind: KIND, source })?,
        );

        let column = column_from_row(row)?;
        table.columns.insert(column.name.clone(), column);
    }

    assign_after_columns(&mut tables);

    Ok(tables)
}

fn column_from_row(row: &sqlx::mysql::MySqlRow) -> CatalogResult<Column> {
    let is_nullable: String = row
        .try_get("is_nullable")
        .map_err(|source| CatalogError::QueryFailed { kind: KIND, source })?;

    Ok(Column {
        name: row
            .try_get("column_name")
            .map_err(|source| CatalogError::QueryFailed { kind: KIND, source })?,
        ordinal_position: row
            .try_get::<i64, _>("ordinal_position")
            .map_err(|source| CatalogError::QueryFailed { kind: KIND, source })? as u32,
        column_type: row
            .try_get("column_type")
            .map_err(|source| CatalogError::QueryFailed { kind: KIND, source })?,
        data_type: row
            .try_get("data_type")
            .map_err(|source| CatalogError::QueryFailed { kind: KIND, source })?,
        nullable: is_nullable.eq_ignore_ascii_case("YES"),
        default: row
            .try_get("column_default")
            .map_err(|source| CatalogError::QueryFailed { kind: KIND, source })?,
        extra: row
            .try_get::<Option<String>, _>("extra")
            .map_err(|source| CatalogError::QueryFailed { kind: KIND, source })?
            .unwrap_or_default(),
        charset: row
            .try_get("character_set_name")
            .map_err(|source| CatalogError::QueryFailed { kind: KIND, source })?,
        collation: row
            .try_get("collation_name")
            .map_err(|source| CatalogError::QueryFailed { kind: KIND, source })?,
        column_key: row
            .try_get::<Option<String>, _>("column_key")
            .map_err(|source| CatalogError::QueryFailed { kind: KIND, source })?
            .unwrap_or_default(),
        comment: row
            .try_get::<Option<String>, _>("column_comment")
            .map_err(|source| CatalogError::QueryFailed { kind: KIND, source })?
            .unwrap_or_default(),
        after_column: None,
    })
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

/// Fills in `after_column` from ordinal order, needed by the generator's
/// `AFTER` clause (§4.4.3 ADD COLUMN).
fn assign_after_columns(tables: &mut BTreeMap<String, Table>) {
    for table in tables.values_mut() {
        let ordered_names: Vec<String> = {
            let mut cols: Vec<&Column> = table.columns.values().collect();
            cols.sort_by_key(|c| c.ordinal_position);
            cols.into_iter().map(|c| c.name.clone()).collect()
        };
        for window in ordered_names.windows(2) {
            let (prev, current) = (&window[0], &window[1]);
            if let Some(col) = table.columns.get_mut(current) {
                col.after_column = Some(prev.clone());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assign_after_columns_chains_in_ordinal_order() {
        let mut tables = BTreeMap::new();
        let mut columns = BTreeMap::new();
        columns.insert(
            "id".to_string(),
            Column {
                name: "id".to_string(),
                ordinal_position: 1,
                column_type: "int".to_string(),
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
        columns.insert(
            "name".to_string(),
            Column {
                name: "name".to_string(),
                ordinal_position: 2,
                column_type: "varchar(255)".to_string(),
                data_type: "varchar".to_string(),
                nullable: true,
                default: None,
                extra: String::new(),
                charset: Some("utf8mb4".to_string()),
                collation: Some("utf8mb4_general_ci".to_string()),
                column_key: String::new(),
                comment: String::new(),
                after_column: None,
            },
        );
        tables.insert(
            "app.users".to_string(),
            Table {
                schema: "app".to_string(),
                name: "users".to_string(),
                engine: Some("InnoDB".to_string()),
                collation: Some("utf8mb4_general_ci".to_string()),
                comment: None,
                create_options: None,
                columns,
            },
        );

        assign_after_columns(&mut tables);

        let table = &tables["app.users"];
        assert_eq!(table.columns["id"].after_column, None);
        assert_eq!(table.columns["name"].after_column.as_deref(), Some("id"));
    }
}
