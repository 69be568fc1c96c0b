//! Seams between the poller and the outside world.

use std::sync::Arc;

use async_trait::async_trait;
use vdna_client::{ApiClient, ClientResult, PreviewRequest};
use vdna_models::TaskStatusResponse;

use crate::reconcile::Settlement;

/// Submission and status endpoints of the generation service.
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    /// Submit a job and return the accepted task id.
    async fn submit(&self, script_id: &str, request: &PreviewRequest) -> ClientResult<String>;

    /// Fetch the current status of a task.
    async fn poll(&self, task_id: &str) -> ClientResult<TaskStatusResponse>;
}

#[async_trait]
impl GenerationBackend for ApiClient {
    async fn submit(&self, script_id: &str, request: &PreviewRequest) -> ClientResult<String> {
        self.submit_video_preview(script_id, request)
            .await
            .map(|submission| submission.task_id)
    }

    async fn poll(&self, task_id: &str) -> ClientResult<TaskStatusResponse> {
        self.video_task_status(task_id).await
    }
}

#[async_trait]
impl<T: GenerationBackend + ?Sized> GenerationBackend for Arc<T> {
    async fn submit(&self, script_id: &str, request: &PreviewRequest) -> ClientResult<String> {
        (**self).submit(script_id, request).await
    }

    async fn poll(&self, task_id: &str) -> ClientResult<TaskStatusResponse> {
        (**self).poll(task_id).await
    }
}

/// Lets the owner refresh canonical state around a task's lifecycle.
///
/// Failures are logged and never change the poller's state.
#[async_trait]
pub trait SettleHook: Send + Sync {
    /// Called once, shortly after the service accepted a submission, so the
    /// owner can pick up the stored task id.
    async fn on_accepted(&self, _script_id: &str, _task_id: &str) -> ClientResult<()> {
        Ok(())
    }

    /// Called after a task succeeds.
    async fn on_settled(&self, script_id: &str, settlement: &Settlement) -> ClientResult<()>;
}
