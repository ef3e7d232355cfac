//! Catalog Introspector (C1, §4.1). One canonical query per object kind
//! against `information_schema`, filtering out system schemas and the
//! options' include/exclude sets in-process, returning rows in a stable
//! order so downstream fingerprinting (C2) is deterministic.

mod constraints;
mod indexes;
mod queries;
mod tables;

pub use constraints::discover_constraints;
pub use indexes::discover_indexes;
pub use tables::discover_tables;
