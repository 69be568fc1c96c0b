//! Video preview task poller.
//!
//! A [`TaskPoller`] drives one generation task at a time through
//! `idle -> submitting -> polling -> {succeeded, failed}`. Every submission,
//! resume and cancellation advances an epoch; a status response that comes
//! back under an older epoch, or for a task that is no longer being polled,
//! is discarded without touching state.
//!
//! The poller never writes to a [`Script`](vdna_models::Script). Owners learn
//! about a success through the [`SettleHook`] and refresh their own copy.

use std::sync::{Arc, Mutex, MutexGuard};

use serde::Serialize;
use tokio::sync::watch;
use tracing::{debug, warn, Instrument};

use vdna_client::PreviewRequest;
use vdna_models::{GenerationTask, RemoteTaskState, TaskStatusResponse, VideoModel};

use crate::backend::{GenerationBackend, SettleHook};
use crate::config::PollerConfig;
use crate::error::{PreviewError, PreviewResult};
use crate::group::SegmentGroup;
use crate::logging::TaskLogger;
use crate::metrics::record_poll_outcome;
use crate::reconcile::{ReconciledVideo, Settlement};

const DEFAULT_FAILURE_REASON: &str = "Video generation failed";
const OPERATION: &str = "video_preview";

/// Externally visible phase of the poller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PreviewPhase {
    Idle,
    Submitting,
    Polling,
    Succeeded,
    Failed,
}

impl PreviewPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            PreviewPhase::Idle => "idle",
            PreviewPhase::Submitting => "submitting",
            PreviewPhase::Polling => "polling",
            PreviewPhase::Succeeded => "succeeded",
            PreviewPhase::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, PreviewPhase::Succeeded | PreviewPhase::Failed)
    }
}

/// Result of one status check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    /// Still running; `label` is for display only.
    Pending {
        state: RemoteTaskState,
        label: &'static str,
    },
    Succeeded {
        video_url: String,
    },
    Failed(PreviewError),
    /// The poller moved on (cancelled, superseded or not polling this task).
    Discarded,
}

impl PollOutcome {
    pub fn is_pending(&self) -> bool {
        matches!(self, PollOutcome::Pending { .. })
    }
}

/// Live submission owned by a poller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskHandle {
    task_id: String,
    script_id: String,
    epoch: u64,
}

impl TaskHandle {
    pub fn task_id(&self) -> &str {
        &self.task_id
    }

    pub fn script_id(&self) -> &str {
        &self.script_id
    }

    pub(crate) fn epoch(&self) -> u64 {
        self.epoch
    }
}

/// Snapshot for rendering the preview UI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PreviewView {
    pub phase: PreviewPhase,
    pub status_label: String,
    pub video_url: Option<String>,
    pub error: Option<String>,
    pub task_id: Option<String>,
    pub attempts: u32,
}

#[derive(Debug, Clone)]
enum State {
    Idle,
    Submitting,
    Polling {
        task: GenerationTask,
        label: &'static str,
    },
    Succeeded {
        task: GenerationTask,
    },
    Failed {
        task: GenerationTask,
        error: PreviewError,
    },
}

impl State {
    fn phase(&self) -> PreviewPhase {
        match self {
            State::Idle => PreviewPhase::Idle,
            State::Submitting => PreviewPhase::Submitting,
            State::Polling { .. } => PreviewPhase::Polling,
            State::Succeeded { .. } => PreviewPhase::Succeeded,
            State::Failed { .. } => PreviewPhase::Failed,
        }
    }

    fn task(&self) -> Option<&GenerationTask> {
        match self {
            State::Polling { task, .. } | State::Succeeded { task } | State::Failed { task, .. } => {
                Some(task)
            }
            State::Idle | State::Submitting => None,
        }
    }

    fn polling_task_id(&self) -> Option<&str> {
        match self {
            State::Polling { task, .. } => Some(task.task_id()),
            _ => None,
        }
    }
}

struct Inner {
    state: State,
    script_id: Option<String>,
    epoch: u64,
    attempts: u32,
    last_error: Option<PreviewError>,
    /// Epoch of the status check currently awaiting a response.
    in_flight: Option<u64>,
}

/// State shared between a poller, its clones and its poll loops.
pub(crate) struct Shared {
    inner: Mutex<Inner>,
    epoch_tx: watch::Sender<u64>,
}

impl Shared {
    fn new() -> Self {
        let (epoch_tx, _) = watch::channel(0);
        Self {
            inner: Mutex::new(Inner {
                state: State::Idle,
                script_id: None,
                epoch: 0,
                attempts: 0,
                last_error: None,
                in_flight: None,
            }),
            epoch_tx,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Start a new epoch. Loops and responses tied to the old one are dropped.
    fn advance(&self, inner: &mut Inner) -> u64 {
        inner.epoch += 1;
        inner.attempts = 0;
        inner.in_flight = None;
        self.epoch_tx.send_replace(inner.epoch);
        inner.epoch
    }

    fn reset(&self, inner: &mut Inner) {
        inner.state = State::Idle;
        inner.last_error = None;
        self.advance(inner);
    }

    pub(crate) fn subscribe(&self) -> watch::Receiver<u64> {
        self.epoch_tx.subscribe()
    }

    /// Cancel only if `epoch` is still current.
    pub(crate) fn cancel_epoch(&self, epoch: u64) -> bool {
        let mut inner = self.lock();
        if inner.epoch != epoch {
            return false;
        }
        self.reset(&mut inner);
        true
    }
}

/// Drives one preview generation task at a time.
pub struct TaskPoller<B> {
    backend: Arc<B>,
    hook: Option<Arc<dyn SettleHook>>,
    config: PollerConfig,
    pub(crate) shared: Arc<Shared>,
}

impl<B> Clone for TaskPoller<B> {
    fn clone(&self) -> Self {
        Self {
            backend: Arc::clone(&self.backend),
            hook: self.hook.clone(),
            config: self.config.clone(),
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<B: GenerationBackend> TaskPoller<B> {
    pub fn new(backend: B, config: PollerConfig) -> Self {
        Self {
            backend: Arc::new(backend),
            hook: None,
            config,
            shared: Arc::new(Shared::new()),
        }
    }

    /// Register the hook invoked after a success.
    pub fn with_settle_hook(mut self, hook: impl SettleHook + 'static) -> Self {
        self.hook = Some(Arc::new(hook));
        self
    }

    pub fn config(&self) -> &PollerConfig {
        &self.config
    }

    pub fn phase(&self) -> PreviewPhase {
        self.shared.lock().state.phase()
    }

    /// Task of the current submission, if one was accepted.
    pub fn task(&self) -> Option<GenerationTask> {
        self.shared.lock().state.task().cloned()
    }

    /// Handle for the task currently being polled.
    pub fn current_handle(&self) -> Option<TaskHandle> {
        let inner = self.shared.lock();
        let task_id = inner.state.polling_task_id()?;
        Some(TaskHandle {
            task_id: task_id.to_string(),
            script_id: inner.script_id.clone().unwrap_or_default(),
            epoch: inner.epoch,
        })
    }

    pub fn view(&self) -> PreviewView {
        let inner = self.shared.lock();
        let (status_label, video_url, error) = match &inner.state {
            State::Idle => (
                "Ready to generate",
                None,
                inner.last_error.as_ref().map(ToString::to_string),
            ),
            State::Submitting => ("Starting video generation...", None, None),
            State::Polling { label, .. } => (*label, None, None),
            State::Succeeded { task } => ("Video generated", task.result_url().map(String::from), None),
            State::Failed { error, .. } => (DEFAULT_FAILURE_REASON, None, Some(error.to_string())),
        };

        PreviewView {
            phase: inner.state.phase(),
            status_label: status_label.to_string(),
            video_url,
            error,
            task_id: inner.state.task().map(|t| t.task_id().to_string()),
            attempts: inner.attempts,
        }
    }

    /// Submit a preview job for `group` and move to polling.
    ///
    /// Input is validated before any network call; a rejected call leaves the
    /// poller untouched. Otherwise any previous task is discarded, and the
    /// poller ends in `polling` on success or `idle` on failure.
    pub async fn start(
        &self,
        script_id: &str,
        group: &SegmentGroup,
        model_id: &str,
        notes: &str,
    ) -> PreviewResult<TaskHandle> {
        let leading = group
            .leading_segment_id()
            .ok_or_else(|| PreviewError::invalid_input("segment group is empty"))?;
        if group.script_id() != script_id {
            return Err(PreviewError::invalid_input(format!(
                "segment group belongs to script {}, not {}",
                group.script_id(),
                script_id
            )));
        }
        let model: VideoModel = model_id
            .parse()
            .map_err(|e: vdna_models::VideoModelParseError| PreviewError::invalid_input(e.to_string()))?;

        let logger = TaskLogger::new(script_id, OPERATION);
        let epoch = {
            let mut inner = self.shared.lock();
            let epoch = self.shared.advance(&mut inner);
            inner.state = State::Submitting;
            inner.script_id = Some(script_id.to_string());
            inner.last_error = None;
            epoch
        };
        logger.log_start(&format!(
            "{} segment(s) led by {} with {}",
            group.len(),
            leading,
            model
        ));

        let request = PreviewRequest::for_leading_segment(leading, model, notes);
        let submitted = self
            .backend
            .submit(script_id, &request)
            .instrument(logger.create_span())
            .await;

        let mut inner = self.shared.lock();
        if inner.epoch != epoch {
            logger.log_warning("submission superseded before it was accepted");
            return Err(PreviewError::submission_failed("submission was cancelled"));
        }

        match submitted {
            Ok(task_id) => {
                inner.state = State::Polling {
                    task: GenerationTask::accepted(task_id.as_str()),
                    label: RemoteTaskState::Waiting.status_label(),
                };
                drop(inner);
                logger.with_task(&task_id).log_progress("task accepted");
                self.refresh_after_accept(script_id, &task_id, epoch);
                Ok(TaskHandle {
                    task_id,
                    script_id: script_id.to_string(),
                    epoch,
                })
            }
            Err(e) => {
                let error = PreviewError::submission_failed(e.to_string());
                inner.state = State::Idle;
                inner.last_error = Some(error.clone());
                logger.log_error(&error.to_string());
                Err(error)
            }
        }
    }

    /// Check the status of `task_id` once and apply the result.
    ///
    /// At most one check is outstanding at a time; a call made while another
    /// is still waiting for its response is discarded without a request.
    pub async fn poll_once(&self, task_id: &str) -> PollOutcome {
        let ticket = {
            let mut inner = self.shared.lock();
            if inner.state.polling_task_id() == Some(task_id) && inner.in_flight.is_none() {
                let epoch = inner.epoch;
                inner.in_flight = Some(epoch);
                Some((epoch, inner.script_id.clone().unwrap_or_default()))
            } else {
                None
            }
        };
        let Some((epoch, script_id)) = ticket else {
            debug!(task_id = %task_id, "Skipping status check, task not polled or check outstanding");
            return PollOutcome::Discarded;
        };

        let logger = TaskLogger::new(&script_id, OPERATION).with_task(task_id);
        let response = self
            .backend
            .poll(task_id)
            .instrument(logger.create_span())
            .await;

        let outcome = {
            let mut inner = self.shared.lock();
            if inner.in_flight == Some(epoch) {
                inner.in_flight = None;
            }
            if inner.epoch != epoch {
                drop(inner);
                return self.discard(task_id);
            }
            let (mut task, previous_label) = match std::mem::replace(&mut inner.state, State::Idle) {
                State::Polling { task, label } if task.task_id() == task_id => (task, label),
                other => {
                    inner.state = other;
                    drop(inner);
                    return self.discard(task_id);
                }
            };

            inner.attempts += 1;
            let outcome = match response {
                Ok(status) => classify(status, inner.attempts, self.config.max_attempts),
                Err(e) => PollOutcome::Failed(PreviewError::poll_transport(e.to_string())),
            };

            let next = match &outcome {
                PollOutcome::Pending { state, label } => {
                    task.observe(state.task_state());
                    State::Polling {
                        task,
                        label: *label,
                    }
                }
                PollOutcome::Succeeded { video_url } => {
                    task.succeed(video_url.as_str());
                    State::Succeeded { task }
                }
                PollOutcome::Failed(error) => {
                    task.fail(error.to_string());
                    inner.last_error = Some(error.clone());
                    State::Failed {
                        task,
                        error: error.clone(),
                    }
                }
                PollOutcome::Discarded => State::Polling {
                    task,
                    label: previous_label,
                },
            };
            inner.state = next;
            outcome
        };

        match &outcome {
            PollOutcome::Pending { label, .. } => {
                record_poll_outcome("pending");
                logger.log_progress(label);
            }
            PollOutcome::Succeeded { video_url } => {
                record_poll_outcome("succeeded");
                logger.log_completion(video_url);
                let settlement = Settlement::new(task_id, video_url.as_str());
                self.settle(&script_id, epoch, &settlement).await;
            }
            PollOutcome::Failed(error) => {
                record_poll_outcome(error.outcome_label());
                logger.log_error(&error.to_string());
            }
            PollOutcome::Discarded => {}
        }

        outcome
    }

    /// Return to idle, discarding the current task. The service is not told.
    pub fn cancel(&self) {
        let mut inner = self.shared.lock();
        if let Some(task) = inner.state.task() {
            debug!(task_id = %task.task_id(), phase = %inner.state.phase().as_str(), "Cancelling preview task");
        }
        self.shared.reset(&mut inner);
    }

    /// Seed the poller from state recovered out of a script.
    ///
    /// A ready video is shown without a network call; an in-flight task is
    /// returned as a handle to poll; anything else leaves the poller idle.
    pub fn resume(&self, script_id: &str, reconciled: Option<ReconciledVideo>) -> Option<TaskHandle> {
        let mut inner = self.shared.lock();
        let epoch = self.shared.advance(&mut inner);
        inner.script_id = Some(script_id.to_string());
        inner.last_error = None;

        match reconciled {
            None => {
                inner.state = State::Idle;
                None
            }
            Some(ReconciledVideo::Ready { video_url, task_id }) => {
                let mut task = GenerationTask::accepted(task_id);
                task.succeed(video_url);
                inner.state = State::Succeeded { task };
                None
            }
            Some(ReconciledVideo::InFlight { task_id }) => {
                TaskLogger::new(script_id, OPERATION)
                    .with_task(&task_id)
                    .log_progress("resuming in-flight task");
                inner.state = State::Polling {
                    task: GenerationTask::accepted(task_id.as_str()),
                    label: RemoteTaskState::Generating.status_label(),
                };
                Some(TaskHandle {
                    task_id,
                    script_id: script_id.to_string(),
                    epoch,
                })
            }
        }
    }

    fn discard(&self, task_id: &str) -> PollOutcome {
        record_poll_outcome("discarded");
        debug!(task_id = %task_id, "Discarding late status response");
        PollOutcome::Discarded
    }

    /// Let the hook pick up the accepted task once the service has stored it.
    fn refresh_after_accept(&self, script_id: &str, task_id: &str, epoch: u64) {
        let Some(hook) = self.hook.clone() else {
            return;
        };
        let shared = Arc::clone(&self.shared);
        let delay = self.config.accept_refresh_delay;
        let script_id = script_id.to_string();
        let task_id = task_id.to_string();

        tokio::spawn(async move {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            if shared.lock().epoch != epoch {
                debug!(task_id = %task_id, "Skipping accept refresh, poller moved on");
                return;
            }
            if let Err(e) = hook.on_accepted(&script_id, &task_id).await {
                warn!(script_id = %script_id, task_id = %task_id, "Accept refresh failed: {}", e);
            }
        });
    }

    async fn settle(&self, script_id: &str, epoch: u64, settlement: &Settlement) {
        let Some(hook) = self.hook.clone() else {
            return;
        };

        if !self.config.settle_delay.is_zero() {
            tokio::time::sleep(self.config.settle_delay).await;
        }
        if self.shared.lock().epoch != epoch {
            debug!(task_id = %settlement.task_id(), "Skipping settle hook, poller moved on");
            return;
        }

        if let Err(e) = hook.on_settled(script_id, settlement).await {
            warn!(
                script_id = %script_id,
                task_id = %settlement.task_id(),
                "Settle hook failed: {}", e
            );
        }
    }
}

fn classify(status: TaskStatusResponse, attempts: u32, max_attempts: u32) -> PollOutcome {
    match &status.state {
        RemoteTaskState::Success => {
            if let Some(url) = status.first_url() {
                return PollOutcome::Succeeded {
                    video_url: url.to_string(),
                };
            }
        }
        RemoteTaskState::Fail => {
            let reason = status
                .fail_msg
                .filter(|msg| !msg.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_FAILURE_REASON.to_string());
            return PollOutcome::Failed(PreviewError::job_failed(reason));
        }
        _ => {}
    }

    if max_attempts > 0 && attempts >= max_attempts {
        return PollOutcome::Failed(PreviewError::PollTimeout { attempts });
    }

    // success without a URL keeps polling
    let label = match &status.state {
        RemoteTaskState::Success => RemoteTaskState::Other(String::new()).status_label(),
        state => state.status_label(),
    };
    PollOutcome::Pending {
        state: status.state,
        label,
    }
}
