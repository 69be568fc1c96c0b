//! Video generation tasks.
//!
//! A [`GenerationTask`] is the client's view of one job accepted by the
//! external generation service. It is created on submit, mutated only by
//! polling responses, and discarded when its owner is cancelled or a newer
//! submission supersedes it.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Client-side state of a generation task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum TaskState {
    #[default]
    Queued,
    Running,
    Succeeded,
    Failed,
}

impl TaskState {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskState::Queued => "queued",
            TaskState::Running => "running",
            TaskState::Succeeded => "succeeded",
            TaskState::Failed => "failed",
        }
    }

    /// Check if this is a terminal state (no more updates expected).
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskState::Succeeded | TaskState::Failed)
    }
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Task state as reported by the status endpoint.
///
/// Unknown values are kept verbatim so newer service states are treated as
/// "still running" instead of failing to parse.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RemoteTaskState {
    Waiting,
    Queuing,
    Generating,
    Success,
    Fail,
    Other(String),
}

impl RemoteTaskState {
    pub fn as_str(&self) -> &str {
        match self {
            RemoteTaskState::Waiting => "waiting",
            RemoteTaskState::Queuing => "queuing",
            RemoteTaskState::Generating => "generating",
            RemoteTaskState::Success => "success",
            RemoteTaskState::Fail => "fail",
            RemoteTaskState::Other(s) => s,
        }
    }

    /// Client-side state this remote state maps to.
    pub fn task_state(&self) -> TaskState {
        match self {
            RemoteTaskState::Waiting | RemoteTaskState::Queuing => TaskState::Queued,
            RemoteTaskState::Generating | RemoteTaskState::Other(_) => TaskState::Running,
            RemoteTaskState::Success => TaskState::Succeeded,
            RemoteTaskState::Fail => TaskState::Failed,
        }
    }

    /// Label shown to the user while the task is not finished.
    pub fn status_label(&self) -> &'static str {
        match self {
            RemoteTaskState::Waiting => "Waiting in queue...",
            RemoteTaskState::Queuing => "Queued...",
            RemoteTaskState::Generating => "Generating video...",
            RemoteTaskState::Success => "Video generated",
            RemoteTaskState::Fail => "Video generation failed",
            RemoteTaskState::Other(_) => "Processing...",
        }
    }
}

impl From<String> for RemoteTaskState {
    fn from(s: String) -> Self {
        match s.as_str() {
            "waiting" => RemoteTaskState::Waiting,
            "queuing" => RemoteTaskState::Queuing,
            "generating" => RemoteTaskState::Generating,
            "success" => RemoteTaskState::Success,
            "fail" => RemoteTaskState::Fail,
            _ => RemoteTaskState::Other(s),
        }
    }
}

impl From<RemoteTaskState> for String {
    fn from(state: RemoteTaskState) -> Self {
        state.as_str().to_string()
    }
}

impl fmt::Display for RemoteTaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Response of the task status endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskStatusResponse {
    pub state: RemoteTaskState,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub result_urls: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fail_msg: Option<String>,
}

impl TaskStatusResponse {
    pub fn new(state: RemoteTaskState) -> Self {
        Self {
            state,
            result_urls: Vec::new(),
            fail_msg: None,
        }
    }

    pub fn success(urls: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            state: RemoteTaskState::Success,
            result_urls: urls.into_iter().map(Into::into).collect(),
            fail_msg: None,
        }
    }

    pub fn fail(reason: Option<String>) -> Self {
        Self {
            state: RemoteTaskState::Fail,
            result_urls: Vec::new(),
            fail_msg: reason,
        }
    }

    /// First result URL, which is the canonical one.
    pub fn first_url(&self) -> Option<&str> {
        self.result_urls.first().map(String::as_str)
    }
}

/// One external asynchronous video generation job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct GenerationTask {
    task_id: String,
    state: TaskState,
    #[serde(skip_serializing_if = "Option::is_none")]
    result_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    failure_reason: Option<String>,
    submitted_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl GenerationTask {
    /// Task just accepted by the service.
    pub fn accepted(task_id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            task_id: task_id.into(),
            state: TaskState::Queued,
            result_url: None,
            failure_reason: None,
            submitted_at: now,
            updated_at: now,
        }
    }

    pub fn task_id(&self) -> &str {
        &self.task_id
    }

    pub fn state(&self) -> TaskState {
        self.state
    }

    /// Present only when the task succeeded.
    pub fn result_url(&self) -> Option<&str> {
        self.result_url.as_deref()
    }

    /// Present only when the task failed.
    pub fn failure_reason(&self) -> Option<&str> {
        self.failure_reason.as_deref()
    }

    pub fn submitted_at(&self) -> DateTime<Utc> {
        self.submitted_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }

    /// Record a non-terminal observation. Ignored once the task is terminal.
    pub fn observe(&mut self, state: TaskState) {
        if self.is_terminal() || state.is_terminal() {
            return;
        }
        self.state = state;
        self.updated_at = Utc::now();
    }

    /// Mark the task succeeded with its canonical result URL.
    pub fn succeed(&mut self, result_url: impl Into<String>) {
        self.state = TaskState::Succeeded;
        self.result_url = Some(result_url.into());
        self.failure_reason = None;
        self.updated_at = Utc::now();
    }

    /// Mark the task failed.
    pub fn fail(&mut self, reason: impl Into<String>) {
        self.state = TaskState::Failed;
        self.failure_reason = Some(reason.into());
        self.result_url = None;
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remote_state_mapping() {
        let waiting: RemoteTaskState = "waiting".to_string().into();
        assert_eq!(waiting.task_state(), TaskState::Queued);
        assert_eq!(
            RemoteTaskState::from("queuing".to_string()).task_state(),
            TaskState::Queued
        );
        assert_eq!(RemoteTaskState::Generating.task_state(), TaskState::Running);
        assert_eq!(RemoteTaskState::Success.task_state(), TaskState::Succeeded);
        assert_eq!(RemoteTaskState::Fail.task_state(), TaskState::Failed);
    }

    #[test]
    fn test_unknown_remote_state_is_running() {
        let resp: TaskStatusResponse = serde_json::from_str(r#"{"state":"upscaling"}"#).unwrap();
        assert_eq!(resp.state, RemoteTaskState::Other("upscaling".into()));
        assert_eq!(resp.state.task_state(), TaskState::Running);
        assert_eq!(resp.state.status_label(), "Processing...");
    }

    #[test]
    fn test_status_response_wire_format() {
        let resp: TaskStatusResponse = serde_json::from_str(
            r#"{"state":"success","resultUrls":["https://cdn/1.mp4","https://cdn/2.mp4"]}"#,
        )
        .unwrap();
        assert_eq!(resp.first_url(), Some("https://cdn/1.mp4"));

        // taken as is, even when empty
        let blank: TaskStatusResponse =
            serde_json::from_str(r#"{"state":"success","resultUrls":["","https://cdn/1.mp4"]}"#)
                .unwrap();
        assert_eq!(blank.first_url(), Some(""));

        let failed: TaskStatusResponse =
            serde_json::from_str(r#"{"state":"fail","failMsg":"content policy"}"#).unwrap();
        assert_eq!(failed.fail_msg.as_deref(), Some("content policy"));
        assert!(failed.first_url().is_none());
    }

    #[test]
    fn test_task_lifecycle() {
        let mut task = GenerationTask::accepted("t-1");
        assert_eq!(task.state(), TaskState::Queued);

        task.observe(TaskState::Running);
        assert_eq!(task.state(), TaskState::Running);

        task.succeed("https://cdn/v.mp4");
        assert!(task.is_terminal());
        assert_eq!(task.result_url(), Some("https://cdn/v.mp4"));
        assert!(task.failure_reason().is_none());

        // terminal tasks ignore later observations
        task.observe(TaskState::Queued);
        assert_eq!(task.state(), TaskState::Succeeded);
    }

    #[test]
    fn test_failed_task_has_no_url() {
        let mut task = GenerationTask::accepted("t-2");
        task.fail("quota exceeded");
        assert_eq!(task.state(), TaskState::Failed);
        assert_eq!(task.failure_reason(), Some("quota exceeded"));
        assert!(task.result_url().is_none());
    }
}
