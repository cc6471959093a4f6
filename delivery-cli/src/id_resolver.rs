//! ID resolver module
//!
//! Resolves UUID prefixes to full UUIDs by querying the API, so users can
//! type short, unambiguous prefixes instead of full UUIDs.

use anyhow::{Context, Result, anyhow};
use delivery_client::OrchestratorClient;
use uuid::Uuid;

use crate::types::IdOrPrefix;

/// Resolve a pipeline ID or prefix to a full UUID
///
/// Full UUIDs are returned as-is; prefixes are matched against all pipelines.
pub async fn resolve_pipeline_id(
    client: &OrchestratorClient,
    id_or_prefix: &IdOrPrefix,
) -> Result<Uuid> {
    let prefix = match id_or_prefix {
        IdOrPrefix::Full(uuid) => return Ok(*uuid),
        IdOrPrefix::Prefix(prefix) => prefix,
    };

    let pipelines = client
        .list_pipelines()
        .await
        .context("Failed to fetch pipelines for ID resolution")?;

    match_prefix("pipeline", prefix, pipelines.iter().map(|p| p.id))
}

/// Resolve a run ID or prefix among the runs of one pipeline
///
/// Runs can only be listed per pipeline, so a prefix needs the pipeline too.
pub async fn resolve_run_id(
    client: &OrchestratorClient,
    id_or_prefix: &IdOrPrefix,
    pipeline: Option<&IdOrPrefix>,
) -> Result<Uuid> {
    let prefix = match id_or_prefix {
        IdOrPrefix::Full(uuid) => return Ok(*uuid),
        IdOrPrefix::Prefix(prefix) => prefix,
    };

    let pipeline = pipeline.ok_or_else(|| {
        anyhow!("Run ID prefix '{}' needs --pipeline to be resolved; pass the full run ID otherwise", prefix)
    })?;
    let pipeline_id = resolve_pipeline_id(client, pipeline).await?;

    let runs = client
        .list_runs_by_pipeline(pipeline_id)
        .await
        .context("Failed to fetch pipeline runs for ID resolution")?;

    match_prefix("run", prefix, runs.iter().map(|r| r.id))
}

/// Pick the single id starting with `prefix`
fn match_prefix(kind: &str, prefix: &str, ids: impl Iterator<Item = Uuid>) -> Result<Uuid> {
    let matches: Vec<Uuid> = ids
        .filter(|id| id.to_string().starts_with(prefix))
        .collect();

    match matches.as_slice() {
        [] => Err(anyhow!("No {} found with ID starting with '{}'", kind, prefix)),
        [id] => Ok(*id),
        _ => {
            let ids: Vec<String> = matches.iter().map(Uuid::to_string).collect();
            Err(anyhow!(
                "Ambiguous prefix '{}' matches multiple {}s: {}",
                prefix,
                kind,
                ids.join(", ")
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids() -> Vec<Uuid> {
        [
            "3f2a0000-0000-4000-8000-000000000001",
            "3f2b0000-0000-4000-8000-000000000002",
            "a1000000-0000-4000-8000-000000000003",
        ]
        .iter()
        .map(|s| Uuid::parse_str(s).unwrap())
        .collect()
    }

    #[test]
    fn test_unique_prefix() {
        let resolved = match_prefix("pipeline", "3f2a", ids().into_iter()).unwrap();
        assert_eq!(resolved, ids()[0]);
    }

    #[test]
    fn test_ambiguous_prefix() {
        let err = match_prefix("pipeline", "3f2", ids().into_iter()).unwrap_err();
        assert!(err.to_string().contains("Ambiguous prefix '3f2'"));
    }

    #[test]
    fn test_unknown_prefix() {
        let err = match_prefix("run", "ffff", ids().into_iter()).unwrap_err();
        assert_eq!(err.to_string(), "No run found with ID starting with 'ffff'");
    }

    #[tokio::test]
    async fn test_full_ids_need_no_lookup() {
        // Nothing listens here; a lookup would fail
        let client = OrchestratorClient::new("http://127.0.0.1:9");
        let id = Uuid::new_v4();

        assert_eq!(
            resolve_pipeline_id(&client, &IdOrPrefix::Full(id)).await.unwrap(),
            id
        );
        assert_eq!(
            resolve_run_id(&client, &IdOrPrefix::Full(id), None).await.unwrap(),
            id
        );
        assert!(
            resolve_run_id(&client, &IdOrPrefix::Prefix("ab".to_string()), None)
                .await
                .is_err()
        );
    }
}
