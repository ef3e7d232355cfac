//! Index discovery (§4.1: "aggregate STATISTICS, grouping by (schema, table,
//! index_name, non_unique, index_type), concatenating columns in
//! seq_in_index order. PRIMARY is dropped here"). Grouping is done in Rust
//! rather than via `GROUP_CONCAT` so row order — and therefore the
//! concatenation order — never depends on server-side aggregation limits.

use std::collections::BTreeMap;

use sqlx::{MySqlPool, Row};

use crate::error::{CatalogError, CatalogResult};
use crate::models::catalog::{Index, IndexColumnDetail, IndexType};
use crate::models::endpoint::ComparisonOptions;

use super::queries;

const KIND: &str = "indexes";

pub async fn discover_indexes(
    pool: &MySqlPool,
    options: &ComparisonOptions,
) -> CatalogResult<BTreeMap<String, Index>> {
    let query = queries::bind_system_schemas(sqlx::query(queries::INDEX_STATISTICS));
    let rows = query
        .fetch_all(pool)
        .await
        .map_err(|source| CatalogError::QueryFailed { kind: KIND, source })?;

    let mut indexes: BTreeMap<String, Index> = BTreeMap::new();

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

        let index_name: String = row
            .try_get("index_name")
            .map_err(|source| CatalogError::QueryFailed { kind: KIND, source })?;
        let non_unique: i64 = row
            .try_get("non_unique")
            .map_err(|source| CatalogError::QueryFailed { kind: KIND, source })?;
        let index_type: String = row
            .try_get("index_type")
            .map_err(|source| CatalogError::QueryFailed { kind: KIND, source })?;
        let column_name: String = row
            .try_get("column_name")
            .map_err(|source| CatalogError::QueryFailed { kind: KIND, source })?;
        let seq_in_index: i64 = row
            .try_get("seq_in_index")
            .map_err(|source| CatalogError::QueryFailed { kind: KIND, source })?;
        let sub_part: Option<i64> = row
            .try_get("sub_part")
            .map_err(|source| CatalogError::QueryFailed { kind: KIND, source })?;
        let index_comment: Option<String> = row
            .try_get("index_comment")
            .map_err(|source| CatalogError::QueryFailed { kind: KIND, source })?;

        let group_key = format!("{schema}.{table}.{index_name}");
        let entry = indexes.entry(group_key).or_insert_with(|| Index {
            schema: schema.clone(),
            table: table.clone(),
            name: index_name.clone(),
            is_unique: non_unique == 0,
            index_type: IndexType::from_mysql(&index_type),
            columns: String::new(),
            column_details: Vec::new(),
            comment: index_comment.unwrap_or_default(),
        });

        entry.column_details.push(IndexColumnDetail {
            column_name,
            seq_in_index: seq_in_index as u32,
            sub_part: sub_part.map(|p| p as u32),
        });
    }

    for index in indexes.values_mut() {
        index.column_details.sort_by_key(|c| c.seq_in_index);
        index.columns = index
            .column_details
            .iter()
            .map(|c| c.column_name.as_str())
            .collect::<Vec<_>>()
            .join(",");
    }

    Ok(indexes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn columns_join_in_seq_in_index_order() {
        let mut index = Index {
            schema: "app".to_string(),
            table: "orders".to_string(),
            name: "idx_customer_date".to_string(),
            is_unique: false,
            index_type: IndexType::Btree,
            columns: String::new(),
            column_details: vec![
                IndexColumnDetail {
                    column_name: "order_date".to_string(),
                    seq_in_index: 2,
                    sub_part: None,
                },
                IndexColumnDetail {
                    column_name: "customer_id".to_string(),
                    seq_in_index: 1,
                    sub_part: None,
                },
            ],
            comment: String::new(),
        };
        index.column_details.sort_by_key(|c| c.seq_in_index);
        index.columns = index
            .column_details
            .iter()
            .map(|c| c.column_name.as_str())
            .collect::<Vec<_>>()
            .join(",");
        assert_eq!(index.columns, "customer_id,order_date");
    }
}
