//! Object Comparers (C2, §4.2). Each comparer for one object kind discovers
//! both sides in parallel, runs the common four-pass matcher, and emits
//! progress events plus a `Difference` list. Mirrors the `SyncTarget` trait
//! shape (`database/traits_sync.rs`): a small async trait so the
//! orchestrator (C3) holds `Vec<Box<dyn Comparer>>` instead of
//! hand-dispatching on an object-kind enum.

mod constraint;
mod fingerprint;
mod index;
mod matcher;
mod table;

pub use constraint::ConstraintComparer;
pub use index::IndexComparer;
pub use table::TableComparer;

use async_trait::async_trait;
use sqlx::MySqlPool;

use crate::error::CompareResult;
use crate::models::diff::{Difference, ObjectType};
use crate::models::endpoint::ComparisonOptions;
use crate::models::progress::ProgressSender;

#[async_trait]
pub trait Comparer: Send + Sync {
    fn object_type(&self) -> ObjectType;

    async fn compare(
        &self,
        source_pool: &MySqlPool,
        target_pool: &MySqlPool,
        options: &ComparisonOptions,
        comparison_id: &str,
        progress: &ProgressSender,
    ) -> CompareResult<Vec<Difference>>;
}
