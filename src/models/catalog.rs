//! Canonical object records — the normalized MySQL metadata for a
//! table/column/index/constraint, independent of the information_schema
//! row shape that produced it (§3).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A table and its ordered columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Table {
    pub schema: String,
    pub name: String,
    pub engine: Option<String>,
    pub collation: Option<String>,
    pub comment: Option<String>,
    pub create_options: Option<String>,
    /// ordinal order is the iteration order of `Column::ordinal_position`,
    /// not insertion order — callers needing column order must sort.
    pub columns: BTreeMap<String, Column>,
}

impl Table {
    pub fn key(&self, case_sensitive: bool) -> String {
        object_key(&self.schema, &self.name, case_sensitive)
    }

    /// Columns ordered by `ordinal_position`, which uniquely orders a
    /// table's columns.
    pub fn ordered_columns(&self) -> Vec<&Column> {
        let mut cols: Vec<&Column> = self.columns.values().collect();
        cols.sort_by_key(|c| c.ordinal_position);
        cols
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub ordinal_position: u32,
    /// Full textual type, e.g. `varchar(255)`.
    pub column_type: String,
    pub data_type: String,
    pub nullable: bool,
    pub default: Option<String>,
    /// AUTO_INCREMENT, "on update CURRENT_TIMESTAMP", etc.
    pub extra: String,
    pub charset: Option<String>,
    pub collation: Option<String>,
    /// PRI/MUL/UNI/empty.
    pub column_key: String,
    pub comment: String,
    /// Name of the preceding column in ordinal order, when known, used by
    /// the generator's `AFTER` clause.
    pub after_column: Option<String>,
}

impl Column {
    pub fn is_auto_increment(&self) -> bool {
        self.extra.to_ascii_lowercase().contains("auto_increment")
    }

    pub fn is_primary(&self) -> bool {
        self.column_key == "PRI"
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum IndexType {
    Btree,
    Hash,
    Fulltext,
    Spatial,
    Other,
}

impl IndexType {
    pub fn from_mysql(s: &str) -> Self {
        match s.to_ascii_uppercase().as_str() {
            "BTREE" => IndexType::Btree,
            "HASH" => IndexType::Hash,
            "FULLTEXT" => IndexType::Fulltext,
            "SPATIAL" => IndexType::Spatial,
            _ => IndexType::Other,
        }
    }

    pub fn as_mysql(&self) -> &'static str {
        match self {
            IndexType::Btree => "BTREE",
            IndexType::Hash => "HASH",
            IndexType::Fulltext => "FULLTEXT",
            IndexType::Spatial => "SPATIAL",
            IndexType::Other => "BTREE",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexColumnDetail {
    pub column_name: String,
    pub seq_in_index: u32,
    pub sub_part: Option<u32>,
}

/// A non-PRIMARY index. PRIMARY is excluded here and owned by constraints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Index {
    pub schema: String,
    pub table: String,
    pub name: String,
    pub is_unique: bool,
    pub index_type: IndexType,
    /// Comma-joined, in `seq_in_index` order.
    pub columns: String,
    pub column_details: Vec<IndexColumnDetail>,
    pub comment: String,
}

impl Index {
    pub fn key(&self, case_sensitive: bool) -> String {
        format!(
            "{}.{}",
            object_key(&self.schema, &self.table, case_sensitive),
            normalize_name(&self.name, case_sensitive)
        )
    }

    /// Fingerprint used for rename/duplicate detection (§4.2.1).
    pub fn fingerprint(&self) -> String {
        format!(
            "{}.{}|{}|{}|{}",
            self.schema,
            self.table,
            self.columns,
            self.is_unique,
            self.index_type.as_mysql()
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConstraintKind {
    PrimaryKey,
    ForeignKey,
    Check,
}

impl ConstraintKind {
    pub fn as_sql(&self) -> &'static str {
        match self {
            ConstraintKind::PrimaryKey => "PRIMARY KEY",
            ConstraintKind::ForeignKey => "FOREIGN KEY",
            ConstraintKind::Check => "CHECK",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Constraint {
    pub schema: String,
    pub table: String,
    pub name: String,
    pub kind: ConstraintKind,
    /// Comma-joined, ordinal-ordered.
    pub columns: String,
    pub referenced_schema: Option<String>,
    pub referenced_table: Option<String>,
    pub referenced_columns: Option<String>,
    pub update_rule: Option<String>,
    pub delete_rule: Option<String>,
    /// Raw CHECK expression, when the server reports one (§9 open question:
    /// no generator branch consumes this yet).
    pub check_clause: Option<String>,
}

impl Constraint {
    pub fn key(&self, case_sensitive: bool) -> String {
        format!(
            "{}.{}",
            object_key(&self.schema, &self.table, case_sensitive),
            normalize_name(&self.name, case_sensitive)
        )
    }

    /// Fingerprint used for rename/duplicate detection (§4.2.1). PRIMARY KEY
    /// constraints are never renamed — callers must check `kind` before
    /// using this for rename matching.
    pub fn fingerprint(&self) -> String {
        let base = format!(
            "{}.{}|{}|{}",
            self.schema,
            self.table,
            self.kind.as_sql(),
            self.columns
        );
        if self.kind == ConstraintKind::ForeignKey {
            format!(
                "{}|{}.{}|{}|{}|{}",
                base,
                self.referenced_schema.as_deref().unwrap_or(""),
                self.referenced_table.as_deref().unwrap_or(""),
                self.referenced_columns.as_deref().unwrap_or(""),
                self.update_rule.as_deref().unwrap_or(""),
                self.delete_rule.as_deref().unwrap_or(""),
            )
        } else {
            base
        }
    }
}

fn normalize_name(name: &str, case_sensitive: bool) -> String {
    if case_sensitive {
        name.to_string()
    } else {
        name.to_ascii_lowercase()
    }
}

/// Object key = `schema.table[.name]` per §4.2.2.
pub fn object_key(schema: &str, table_or_name: &str, case_sensitive: bool) -> String {
    format!(
        "{}.{}",
        normalize_name(schema, case_sensitive),
        normalize_name(table_or_name, case_sensitive)
    )
}
