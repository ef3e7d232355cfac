//! Fingerprint/key adapters (§4.2.1, §4.2.2) binding the canonical object
//! records to the generic matcher in `matcher.rs`.

use crate::models::catalog::{object_key, Constraint, ConstraintKind, Index};

pub fn index_key(index: &Index, case_sensitive: bool) -> String {
    index.key(case_sensitive)
}

pub fn index_fingerprint(index: &Index) -> String {
    index.fingerprint()
}

/// PRIMARY is never produced by the introspector (§4.1), so every `Index`
/// reaching the matcher is rename-eligible.
pub fn index_rename_eligible(_index: &Index) -> bool {
    true
}

pub fn constraint_key(constraint: &Constraint, case_sensitive: bool) -> String {
    constraint.key(case_sensitive)
}

pub fn constraint_fingerprint(constraint: &Constraint) -> String {
    constraint.fingerprint()
}

/// I4: PRIMARY KEY constraints are matched only by position, never by
/// rename detection, regardless of fingerprint match.
pub fn constraint_rename_eligible(constraint: &Constraint) -> bool {
    constraint.kind != ConstraintKind::PrimaryKey
}

pub fn table_key(schema: &str, name: &str, case_sensitive: bool) -> String {
    object_key(schema, name, case_sensitive)
}
