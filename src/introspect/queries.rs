//! Canonical information_schema queries (§4.1). One query per object kind;
//! no per-table round-trips. System-schema exclusion is bound as trailing
//! parameters rather than interpolated, so the schema list can change
//! without touching the query text.

use crate::config::SYSTEM_SCHEMAS;

pub const TABLES_AND_COLUMNS: &str = r#"
SELECT
    t.TABLE_SCHEMA        AS table_schema,
    t.TABLE_NAME          AS table_name,
    t.ENGINE              AS engine,
    t.TABLE_COLLATION     AS table_collation,
    t.TABLE_COMMENT       AS table_comment,
    t.CREATE_OPTIONS      AS create_options,
    c.COLUMN_NAME         AS column_name,
    c.ORDINAL_POSITION    AS ordinal_position,
    c.COLUMN_TYPE         AS column_type,
    c.DATA_TYPE           AS data_type,
    c.IS_NULLABLE         AS is_nullable,
    c.COLUMN_DEFAULT      AS column_default,
    c.EXTRA               AS extra,
    c.CHARACTER_SET_NAME  AS character_set_name,
    c.COLLATION_NAME      AS collation_name,
    c.COLUMN_KEY          AS column_key,
    c.COLUMN_COMMENT      AS column_comment
FROM INFORMATION_SCHEMA.TABLES t
JOIN INFORMATION_SCHEMA.COLUMNS c
    ON c.TABLE_SCHEMA = t.TABLE_SCHEMA AND c.TABLE_NAME = t.TABLE_NAME
WHERE t.TABLE_TYPE = 'BASE TABLE'
    AND t.TABLE_SCHEMA NOT IN (?, ?, ?, ?, ?)
ORDER BY t.TABLE_SCHEMA, t.TABLE_NAME, c.ORDINAL_POSITION
"#;

pub const INDEX_STATISTICS: &str = r#"
SELECT
    s.TABLE_SCHEMA  AS table_schema,
    s.TABLE_NAME    AS table_name,
    s.INDEX_NAME    AS index_name,
    s.NON_UNIQUE    AS non_unique,
    s.INDEX_TYPE    AS index_type,
    s.COLUMN_NAME   AS column_name,
    s.SEQ_IN_INDEX  AS seq_in_index,
    s.SUB_PART      AS sub_part,
    s.INDEX_COMMENT AS index_comment
FROM INFORMATION_SCHEMA.STATISTICS s
WHERE s.TABLE_SCHEMA NOT IN (?, ?, ?, ?, ?)
    AND s.INDEX_NAME <> 'PRIMARY'
ORDER BY s.TABLE_SCHEMA, s.TABLE_NAME, s.INDEX_NAME, s.SEQ_IN_INDEX
"#;

pub const PRIMARY_KEY_CONSTRAINTS: &str = r#"
SELECT
    tc.TABLE_SCHEMA     AS table_schema,
    tc.TABLE_NAME       AS table_name,
    tc.CONSTRAINT_NAME  AS constraint_name,
    kcu.COLUMN_NAME     AS column_name,
    kcu.ORDINAL_POSITION AS ordinal_position
FROM INFORMATION_SCHEMA.TABLE_CONSTRAINTS tc
JOIN INFORMATION_SCHEMA.KEY_COLUMN_USAGE kcu
    ON kcu.CONSTRAINT_SCHEMA = tc.CONSTRAINT_SCHEMA
    AND kcu.CONSTRAINT_NAME = tc.CONSTRAINT_NAME
    AND kcu.TABLE_SCHEMA = tc.TABLE_SCHEMA
    AND kcu.TABLE_NAME = tc.TABLE_NAME
WHERE tc.CONSTRAINT_TYPE = 'PRIMARY KEY'
    AND tc.TABLE_SCHEMA NOT IN (?, ?, ?, ?, ?)
ORDER BY tc.TABLE_SCHEMA, tc.TABLE_NAME, kcu.ORDINAL_POSITION
"#;

pub const FOREIGN_KEY_CONSTRAINTS: &str = r#"
SELECT
    kcu.CONSTRAINT_SCHEMA  AS table_schema,
    kcu.TABLE_NAME         AS table_name,
    kcu.CONSTRAINT_NAME    AS constraint_name,
    kcu.COLUMN_NAME        AS column_name,
    kcu.ORDINAL_POSITION   AS ordinal_position,
    kcu.REFERENCED_TABLE_SCHEMA AS referenced_schema,
    kcu.REFERENCED_TABLE_NAME   AS referenced_table,
    kcu.REFERENCED_COLUMN_NAME  AS referenced_column,
    rc.UPDATE_RULE         AS update_rule,
    rc.DELETE_RULE          AS delete_rule
FROM INFORMATION_SCHEMA.KEY_COLUMN_USAGE kcu
JOIN INFORMATION_SCHEMA.REFERENTIAL_CONSTRAINTS rc
    ON rc.CONSTRAINT_SCHEMA = kcu.CONSTRAINT_SCHEMA
    AND rc.CONSTRAINT_NAME = kcu.CONSTRAINT_NAME
WHERE kcu.REFERENCED_TABLE_NAME IS NOT NULL
    AND kcu.TABLE_SCHEMA NOT IN (?, ?, ?, ?, ?)
ORDER BY kcu.CONSTRAINT_SCHEMA, kcu.TABLE_NAME, kcu.CONSTRAINT_NAME, kcu.ORDINAL_POSITION
"#;

/// `CHECK_CONSTRAINTS` is absent on MySQL < 8.0.16 and on some
/// MySQL-compatible servers; callers swallow the query error per §4.1.
pub const CHECK_CONSTRAINTS: &str = r#"
SELECT
    cc.CONSTRAINT_SCHEMA AS table_schema,
    tc.TABLE_NAME        AS table_name,
    cc.CONSTRAINT_NAME   AS constraint_name,
    cc.CHECK_CLAUSE       AS check_clause
FROM INFORMATION_SCHEMA.CHECK_CONSTRAINTS cc
JOIN INFORMATION_SCHEMA.TABLE_CONSTRAINTS tc
    ON tc.CONSTRAINT_SCHEMA = cc.CONSTRAINT_SCHEMA
    AND tc.CONSTRAINT_NAME = cc.CONSTRAINT_NAME
WHERE cc.CONSTRAINT_SCHEMA NOT IN (?, ?, ?, ?, ?)
ORDER BY cc.CONSTRAINT_SCHEMA, tc.TABLE_NAME, cc.CONSTRAINT_NAME
"#;

/// Binds the five system schemas, in the fixed order the queries above
/// expect, as the trailing `NOT IN (?, ?, ?, ?, ?)` parameters.
pub fn bind_system_schemas<'q>(
    mut query: sqlx::query::Query<'q, sqlx::MySql, sqlx::mysql::MySqlArguments>,
) -> sqlx::query::Query<'q, sqlx::MySql, sqlx::mysql::MySqlArguments> {
    for schema in SYSTEM_SCHEMAS {
        query = query.bind(*schema);
    }
    query
}
