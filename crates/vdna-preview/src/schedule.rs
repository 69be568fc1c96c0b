//! Scheduled polling with a cancel handle.
//!
//! The next status check is scheduled only after the previous response was
//! processed, so checks for one task never overlap. A loop stops on the
//! first terminal outcome, or as soon as the poller's epoch moves on.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::backend::GenerationBackend;
use crate::poller::{PollOutcome, Shared, TaskHandle, TaskPoller};

impl<B: GenerationBackend + 'static> TaskPoller<B> {
    /// Poll `handle` every `interval` until it settles or is cancelled.
    pub async fn run_until_settled(&self, handle: &TaskHandle) -> PollOutcome {
        let mut epochs = self.shared.subscribe();

        loop {
            if *epochs.borrow_and_update() != handle.epoch() {
                debug!(task_id = %handle.task_id(), "Poll loop stopped, task superseded");
                return PollOutcome::Discarded;
            }

            tokio::select! {
                _ = tokio::time::sleep(self.config().interval) => {}
                changed = epochs.changed() => {
                    if changed.is_err() {
                        return PollOutcome::Discarded;
                    }
                    continue;
                }
            }

            let outcome = self.poll_once(handle.task_id()).await;
            if !outcome.is_pending() {
                return outcome;
            }
        }
    }

    /// Run the poll loop for `handle` on the runtime.
    pub fn spawn_polling(&self, handle: TaskHandle) -> PollHandle {
        let poller = self.clone();
        let task_id = handle.task_id().to_string();
        let epoch = handle.epoch();
        let join = tokio::spawn(async move { poller.run_until_settled(&handle).await });

        PollHandle {
            task_id,
            epoch,
            shared: Arc::clone(&self.shared),
            join,
        }
    }
}

/// Running poll loop.
pub struct PollHandle {
    task_id: String,
    epoch: u64,
    shared: Arc<Shared>,
    join: JoinHandle<PollOutcome>,
}

impl PollHandle {
    pub fn task_id(&self) -> &str {
        &self.task_id
    }

    /// Stop the loop and return the poller to idle.
    ///
    /// Returns false when the poller already moved on to another task, in
    /// which case nothing is changed.
    pub fn cancel(&self) -> bool {
        self.shared.cancel_epoch(self.epoch)
    }

    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }

    /// Wait for the loop to end.
    pub async fn join(self) -> PollOutcome {
        match self.join.await {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(task_id = %self.task_id, "Poll loop aborted: {}", e);
                PollOutcome::Discarded
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    use async_trait::async_trait;
    use vdna_client::{ClientResult, PreviewRequest};
    use vdna_models::{RemoteTaskState, TaskStatusResponse};

    use crate::config::PollerConfig;
    use crate::group::SegmentGroup;
    use crate::poller::PreviewPhase;

    #[derive(Default)]
    struct ScriptedBackend {
        responses: Mutex<VecDeque<TaskStatusResponse>>,
        polls: AtomicUsize,
    }

    impl ScriptedBackend {
        fn new(responses: Vec<TaskStatusResponse>) -> Arc<Self> {
            Arc::new(Self {
                responses: Mutex::new(responses.into()),
                polls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl GenerationBackend for ScriptedBackend {
        async fn submit(&self, _script_id: &str, _request: &PreviewRequest) -> ClientResult<String> {
            Ok("task-1".to_string())
        }

        async fn poll(&self, _task_id: &str) -> ClientResult<TaskStatusResponse> {
            self.polls.fetch_add(1, Ordering::SeqCst);
            Ok(self
                .responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| TaskStatusResponse::new(RemoteTaskState::Generating)))
        }
    }

    fn config() -> PollerConfig {
        PollerConfig::default().with_settle_delay(Duration::ZERO)
    }

    #[tokio::test(start_paused = true)]
    async fn test_loop_stops_on_success() {
        let backend = ScriptedBackend::new(vec![
            TaskStatusResponse::new(RemoteTaskState::Generating),
            TaskStatusResponse::new(RemoteTaskState::Generating),
            TaskStatusResponse::success(["url1"]),
        ]);
        let poller = TaskPoller::new(backend.clone(), config());
        let group = SegmentGroup::new("sc-1", ["a"]);

        let started = tokio::time::Instant::now();
        let handle = poller
            .start("sc-1", &group, "sora-2-text-to-video", "")
            .await
            .unwrap();
        let outcome = poller.spawn_polling(handle).join().await;

        assert_eq!(outcome, PollOutcome::Succeeded { video_url: "url1".into() });
        assert_eq!(backend.polls.load(Ordering::SeqCst), 3);
        assert!(started.elapsed() >= Duration::from_secs(15));

        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(backend.polls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_stops_loop() {
        let backend = ScriptedBackend::new(vec![]);
        let poller = TaskPoller::new(backend.clone(), config().with_max_attempts(0));
        let group = SegmentGroup::new("sc-1", ["a"]);

        let handle = poller
            .start("sc-1", &group, "sora-2-text-to-video", "")
            .await
            .unwrap();
        let running = poller.spawn_polling(handle);

        tokio::time::sleep(Duration::from_secs(12)).await;
        assert_eq!(backend.polls.load(Ordering::SeqCst), 2);

        assert!(running.cancel());
        assert_eq!(running.join().await, PollOutcome::Discarded);
        assert_eq!(poller.phase(), PreviewPhase::Idle);

        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(backend.polls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_handle_cannot_cancel_new_task() {
        let backend = ScriptedBackend::new(vec![]);
        let poller = TaskPoller::new(backend, config());
        let group = SegmentGroup::new("sc-1", ["a"]);

        let first = poller.start("sc-1", &group, "sora-2-text-to-video", "").await.unwrap();
        let first_loop = poller.spawn_polling(first);

        let second = poller.start("sc-1", &group, "sora-2-text-to-video", "").await.unwrap();
        assert!(!first_loop.cancel());
        assert_eq!(first_loop.join().await, PollOutcome::Discarded);

        let second_loop = poller.spawn_polling(second);
        assert_eq!(poller.phase(), PreviewPhase::Polling);
        assert!(second_loop.cancel());
        assert_eq!(second_loop.join().await, PollOutcome::Discarded);
    }
}
