//! Structured logging for preview tasks.

use tracing::{error, info, warn, Span};

/// Logger carrying the script and task a preview run belongs to.
#[derive(Debug, Clone)]
pub struct TaskLogger {
    script_id: String,
    task_id: Option<String>,
    operation: String,
}

impl TaskLogger {
    /// Logger for a run that has not been accepted yet.
    pub fn new(script_id: &str, operation: &str) -> Self {
        Self {
            script_id: script_id.to_string(),
            task_id: None,
            operation: operation.to_string(),
        }
    }

    /// Same logger, tagged with an accepted task.
    pub fn with_task(&self, task_id: &str) -> Self {
        Self {
            task_id: Some(task_id.to_string()),
            ..self.clone()
        }
    }

    fn task_field(&self) -> &str {
        self.task_id.as_deref().unwrap_or("-")
    }

    pub fn log_start(&self, message: &str) {
        info!(
            script_id = %self.script_id,
            task_id = %self.task_field(),
            operation = %self.operation,
            "Preview started: {}", message
        );
    }

    pub fn log_progress(&self, message: &str) {
        info!(
            script_id = %self.script_id,
            task_id = %self.task_field(),
            operation = %self.operation,
            "Preview progress: {}", message
        );
    }

    pub fn log_warning(&self, message: &str) {
        warn!(
            script_id = %self.script_id,
            task_id = %self.task_field(),
            operation = %self.operation,
            "Preview warning: {}", message
        );
    }

    pub fn log_error(&self, message: &str) {
        error!(
            script_id = %self.script_id,
            task_id = %self.task_field(),
            operation = %self.operation,
            "Preview error: {}", message
        );
    }

    pub fn log_completion(&self, message: &str) {
        info!(
            script_id = %self.script_id,
            task_id = %self.task_field(),
            operation = %self.operation,
            "Preview completed: {}", message
        );
    }

    pub fn script_id(&self) -> &str {
        &self.script_id
    }

    pub fn task_id(&self) -> Option<&str> {
        self.task_id.as_deref()
    }

    /// Tracing span for this run.
    pub fn create_span(&self) -> Span {
        tracing::info_span!(
            "preview",
            script_id = %self.script_id,
            task_id = %self.task_field(),
            operation = %self.operation
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logger_tags_task() {
        let logger = TaskLogger::new("sc-1", "video_preview");
        assert_eq!(logger.script_id(), "sc-1");
        assert!(logger.task_id().is_none());

        let tagged = logger.with_task("t-1");
        assert_eq!(tagged.task_id(), Some("t-1"));
        assert_eq!(tagged.script_id(), "sc-1");
    }
}
