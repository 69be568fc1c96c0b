//! Hook that keeps the CLI's copy of a script current.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tracing::{debug, info};

use vdna_client::{ApiClient, ClientError, ClientResult};
use vdna_models::Script;
use vdna_preview::{merge_settled, MergeOutcome, SegmentGroup, SettleHook, Settlement};

/// Refreshes the local script from the backend once a task is accepted, and
/// again after it succeeds. A success is merged locally first so the video is
/// known even when the refresh fails.
#[derive(Clone)]
pub struct RefreshHook {
    client: ApiClient,
    analysis_id: String,
    group: SegmentGroup,
    script: Arc<Mutex<Script>>,
}

impl RefreshHook {
    pub fn new(client: ApiClient, analysis_id: &str, group: SegmentGroup, script: Script) -> Self {
        Self {
            client,
            analysis_id: analysis_id.to_string(),
            group,
            script: Arc::new(Mutex::new(script)),
        }
    }

    /// Latest known state of the script.
    pub fn script(&self) -> Script {
        self.script
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    fn merge_local(&self, settlement: &Settlement) -> MergeOutcome {
        let mut script = self.script.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let outcome = merge_settled(&mut script, &self.group, settlement);
        match outcome {
            MergeOutcome::Applied { updated } => {
                debug!(task_id = %settlement.task_id(), updated, "Merged settled video into local script")
            }
            MergeOutcome::StaleGroupIdentity => {
                debug!(task_id = %settlement.task_id(), "Local script does not carry this task yet")
            }
        }
        outcome
    }

    async fn refresh(&self, script_id: &str) -> ClientResult<()> {
        let analysis = self.client.get_analysis(&self.analysis_id).await?;
        let refreshed = analysis
            .scripts
            .into_iter()
            .find(|s| s.script_id == script_id)
            .ok_or_else(|| {
                ClientError::invalid_response(format!(
                    "script {} missing from analysis {}",
                    script_id, self.analysis_id
                ))
            })?;

        info!(script_id = %script_id, analysis_id = %self.analysis_id, "Refreshed script");
        *self.script.lock().unwrap_or_else(|poisoned| poisoned.into_inner()) = refreshed;
        Ok(())
    }
}

#[async_trait]
impl SettleHook for RefreshHook {
    async fn on_accepted(&self, script_id: &str, task_id: &str) -> ClientResult<()> {
        debug!(task_id = %task_id, "Picking up accepted task");
        self.refresh(script_id).await
    }

    async fn on_settled(&self, script_id: &str, settlement: &Settlement) -> ClientResult<()> {
        self.merge_local(settlement);
        self.refresh(script_id).await
    }
}
