//! Comparison Orchestrator (C3, §4.3). Owns the end-to-end flow: tunnel
//! setup, eager connectivity check, dispatch to each enabled `Comparer`,
//! aggregation, and summary. One orchestrating type holds the lower-layer
//! managers (`ConnectionManager`, `TunnelManager`) and delegates to them,
//! the same shape `services/tunnel.rs`'s `TunnelService` uses wrapping
//! `DatabaseService`, here exposed as a single `run_comparison` entry point.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use tokio_util::sync::CancellationToken;

use crate::compare::{Comparer, ConstraintComparer, IndexComparer, TableComparer};
use crate::connection::{ConnectionManager, ConnectionTag};
use crate::error::{ComparisonSide, CoreError, CoreResult};
use crate::models::comparison::{ComparisonResult, ComparisonSummary, EndpointSnapshot};
use crate::models::diff::{Difference, ObjectType};
use crate::models::endpoint::{ComparisonOptions, EndpointConfig};
use crate::models::progress::{Phase, ProgressEvent, ProgressSender};
use crate::tunnel::TunnelManager;

pub struct Orchestrator {
    connections: Arc<ConnectionManager>,
    tunnels: Arc<TunnelManager>,
}

impl Orchestrator {
    pub fn new(connections: Arc<ConnectionManager>, tunnels: Arc<TunnelManager>) -> Self {
        Self { connections, tunnels }
    }

    /// Runs one full comparison (§4.3). `cancel` lets a caller abort between
    /// comparer stages; comparers themselves do not poll it mid-query.
    pub async fn run_comparison(
        &self,
        source: EndpointConfig,
        target: EndpointConfig,
        options: ComparisonOptions,
        progress: ProgressSender,
        cancel: CancellationToken,
    ) -> CoreResult<ComparisonResult> {
        let comparison_id = uuid::Uuid::new_v4().to_string();
        let started_at = Utc::now();
        let start_instant = Instant::now();

        let validation_errors = source.validate().into_iter().chain(target.validate()).collect::<Vec<_>>();
        if !validation_errors.is_empty() {
            return Err(CoreError::ConfigValidation(validation_errors));
        }

        let source_snapshot = EndpointSnapshot::from(&source);
        let target_snapshot = EndpointSnapshot::from(&target);

        let resolved_source = self.resolve_endpoint(&comparison_id, source, &progress).await;
        let resolved_source = match resolved_source {
            Ok(endpoint) => endpoint,
            Err(error) => {
                return Ok(ComparisonResult::error_result(
                    comparison_id,
                    started_at,
                    source_snapshot,
                    target_snapshot,
                    options,
                    vec![error.to_string()],
                ))
            }
        };
        let resolved_target = self.resolve_endpoint(&comparison_id, target, &progress).await;
        let resolved_target = match resolved_target {
            Ok(endpoint) => endpoint,
            Err(error) => {
                return Ok(ComparisonResult::error_result(
                    comparison_id,
                    started_at,
                    source_snapshot,
                    target_snapshot,
                    options,
                    vec![error.to_string()],
                ))
            }
        };

        // Eager connectivity check (§4.3): fail fast rather than discover
        // an unreachable endpoint mid-comparer.
        if let Err(error) = self.connections.ping(&resolved_source).await {
            return Ok(ComparisonResult::error_result(
                comparison_id,
                started_at,
                source_snapshot,
                target_snapshot,
                options,
                vec![CoreError::ConnectionUnreachable { side: ComparisonSide::Source, source: error }.to_string()],
            ));
        }
        if let Err(error) = self.connections.ping(&resolved_target).await {
            return Ok(ComparisonResult::error_result(
                comparison_id,
                started_at,
                source_snapshot,
                target_snapshot,
                options,
                vec![CoreError::ConnectionUnreachable { side: ComparisonSide::Target, source: error }.to_string()],
            ));
        }

        let source_pool = self.connections.pool_for(&resolved_source).await.map_err(|e| CoreError::ConnectionUnreachable {
            side: ComparisonSide::Source,
            source: e,
        })?;
        let target_pool = self.connections.pool_for(&resolved_target).await.map_err(|e| CoreError::ConnectionUnreachable {
            side: ComparisonSide::Target,
            source: e,
        })?;

        let comparers = enabled_comparers(&options);
        let mut differences = Vec::new();
        let mut objects_compared = 0u32;
        let mut errors = Vec::new();

        for comparer in comparers {
            if cancel.is_cancelled() {
                errors.push("comparison cancelled".to_string());
                break;
            }
            let object_type = comparer.object_type();
            tracing::debug!(comparison_id = %comparison_id, ?object_type, "running comparer");
            match comparer.compare(&source_pool, &target_pool, &options, &comparison_id, &progress).await {
                Ok(mut found) => {
                    tracing::debug!(comparison_id = %comparison_id, ?object_type, differences = found.len(), "comparer finished");
                    objects_compared += found.len() as u32;
                    differences.append(&mut found);
                }
                Err(error) => {
                    tracing::warn!(comparison_id = %comparison_id, ?object_type, %error, "comparer failed");
                    errors.push(format!("{object_type:?} comparison failed: {error}"));
                }
            }
        }

        differences.sort_by(|a, b| a.sort_key_forward().cmp(&b.sort_key_forward()));

        let _ = progress.send(ProgressEvent::new(&comparison_id, Phase::Analysis, 1, 1).with_message("computing summary"));
        let summary = ComparisonSummary::from_differences(&differences, objects_compared);

        let completed_at = Utc::now();
        let _ = progress.send(
            ProgressEvent::new(&comparison_id, Phase::Report, 1, 1)
                .with_message(format!("{} differences found", differences.len())),
        );

        Ok(ComparisonResult {
            comparison_id,
            started_at,
            completed_at: Some(completed_at),
            source: source_snapshot,
            target: target_snapshot,
            options,
            differences,
            summary,
            duration_seconds: start_instant.elapsed().as_secs_f64(),
            objects_compared,
            errors,
            warnings: Vec::new(),
        })
    }

    /// Sets up the SSH tunnel (if any) and rewrites `host`/`port` to the
    /// local forwarder, per §4.3 "endpoint resolution".
    async fn resolve_endpoint(
        &self,
        comparison_id: &str,
        mut endpoint: EndpointConfig,
        progress: &ProgressSender,
    ) -> CoreResult<EndpointConfig> {
        let Some(mut tunnel_spec) = endpoint.ssh_tunnel.clone() else {
            return Ok(endpoint);
        };

        let _ = progress.send(
            ProgressEvent::new(comparison_id, Phase::Discovery, 0, 0)
                .with_message(format!("opening SSH tunnel to {}", tunnel_spec.ssh_host)),
        );

        tunnel_spec.remote_bind_host = endpoint.host.clone();
        tunnel_spec.remote_bind_port = endpoint.port;

        let tunnel_id = format!("{comparison_id}-{}", tunnel_spec.reuse_key());
        let info = self
            .tunnels
            .get_or_create_tunnel_for_schema_discovery(&tunnel_id, &tunnel_spec)
            .await
            .map_err(|source| CoreError::TunnelSetup { endpoint: endpoint.host.clone(), source })?;

        endpoint.host = "127.0.0.1".to_string();
        endpoint.port = info.local_port;
        endpoint.ssh_tunnel = Some(tunnel_spec);
        Ok(endpoint)
    }
}

fn enabled_comparers(options: &ComparisonOptions) -> Vec<Box<dyn Comparer>> {
    let mut comparers: Vec<Box<dyn Comparer>> = Vec::new();
    if options.compare_tables || options.compare_columns {
        comparers.push(Box::new(TableComparer));
    }
    if options.compare_indexes {
        comparers.push(Box::new(IndexComparer));
    }
    if options.compare_constraints {
        comparers.push(Box::new(ConstraintComparer));
    }
    comparers
}

/// A single non-tunneled `SELECT 1`/discovery query tagged for schema
/// discovery rather than general traffic (§4.5's `ConnectionTag`), used by
/// callers that need a one-off probe outside the comparer pipeline.
pub async fn probe_schema_discovery(connections: &ConnectionManager, endpoint: &EndpointConfig) -> CoreResult<()> {
    connections
        .execute_query(endpoint, ConnectionTag::SchemaDiscovery, |pool| async move {
            sqlx::query("SELECT 1").execute(&pool).await.map(|_| ())
        })
        .await
        .map_err(|source| CoreError::ConnectionUnreachable { side: ComparisonSide::Source, source })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enabled_comparers_respects_options() {
        let options = ComparisonOptions { compare_indexes: true, ..Default::default() };
        let comparers = enabled_comparers(&options);
        assert_eq!(comparers.len(), 1);
        assert_eq!(comparers[0].object_type(), ObjectType::Index);
    }

    #[test]
    fn enabled_comparers_merges_tables_and_columns_into_one_comparer() {
        let options = ComparisonOptions { compare_tables: true, compare_columns: true, ..Default::default() };
        let comparers = enabled_comparers(&options);
        assert_eq!(comparers.len(), 1);
    }
}
