//! ID resolver module
//!
//! Resolves UUID prefixes to full UUIDs by querying the API, so users can
//! type short, unambiguous prefixes instead of full UUIDs.

use anyhow::{Context, Result, anyhow};
use keel_client::OrchestratorClient;
use uuid::Uuid;

use crate::types::IdOrPrefix;

/// Resolve a pipeline ID or prefix to a full UUID
///
/// A full UUID is returned as is; a prefix is matched against every
/// pipeline the orchestrator knows.
pub async fn resolve_pipeline_id(
    client: &OrchestratorClient,
    id_or_prefix: &IdOrPrefix,
) -> Result<Uuid> {
    if let Some(uuid) = id_or_prefix.as_uuid() {
        return Ok(uuid);
    }

    let bundles = client
        .list_pipelines(None)
        .await
        .context("Failed to fetch pipelines for ID resolution")?;

    select_unique(
        bundles.iter().map(|b| b.pipeline.id),
        id_or_prefix,
        "pipeline",
    )
}

/// Pick the single ID matching a prefix
fn select_unique(
    ids: impl IntoIterator<Item = Uuid>,
    id_or_prefix: &IdOrPrefix,
    kind: &str,
) -> Result<Uuid> {
    let matches: Vec<Uuid> = ids
        .into_iter()
        .filter(|id| id_or_prefix.matches(id))
        .collect();

    match matches.as_slice() {
        [] => Err(anyhow!(
            "No {} found with ID starting with '{}'",
            kind,
            id_or_prefix
        )),
        [id] => Ok(*id),
        _ => {
            let ids: Vec<String> = matches.iter().map(|id| id.to_string()).collect();
            Err(anyhow!(
                "Ambiguous prefix '{}' matches multiple {}s: {}",
                id_or_prefix,
                kind,
                ids.join(", ")
            ))
        }
    }
}
