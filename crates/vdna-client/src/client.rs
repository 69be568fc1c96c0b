//! Backend REST client.

use std::time::Instant;

use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use tracing::{debug, info_span, warn, Instrument};

use vdna_models::{AnalysisResult, Script, ScriptSegment, SourceInput, TaskStatusResponse};

use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};
use crate::metrics::record_request;
use crate::types::{
    CreateAnalysisRequest, CreateScriptRequest, ErrorBody, GenerateMediaRequest, PreviewRequest,
    PreviewSubmission,
};

/// Client for the analysis backend.
#[derive(Clone)]
pub struct ApiClient {
    http: Client,
    config: ClientConfig,
}

impl ApiClient {
    /// Create a new client.
    pub fn new(config: ClientConfig) -> ClientResult<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .user_agent(concat!("vdna-client/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(ClientError::Network)?;

        Ok(Self { http, config })
    }

    /// Create from environment variables.
    pub fn from_env() -> ClientResult<Self> {
        Self::new(ClientConfig::from_env()?)
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    // =========================================================================
    // Analyses
    // =========================================================================

    /// Start an analysis over a batch of sources.
    pub async fn create_analysis(&self, sources: &[SourceInput]) -> ClientResult<AnalysisResult> {
        if sources.is_empty() {
            return Err(ClientError::invalid_input("at least one source is required"));
        }
        let body = CreateAnalysisRequest {
            sources: sources.to_vec(),
        };
        let request = self.http.post(self.config.endpoint("analyses/")).json(&body);
        self.send_json("create_analysis", request).await
    }

    /// Fetch the canonical state of an analysis, including its scripts.
    pub async fn get_analysis(&self, analysis_id: &str) -> ClientResult<AnalysisResult> {
        let url = self.config.endpoint(&format!("analyses/{}/", analysis_id));
        self.send_json("get_analysis", self.http.get(url)).await
    }

    /// List previous analyses, newest first.
    pub async fn history(&self) -> ClientResult<Vec<AnalysisResult>> {
        let url = self.config.endpoint("analyses/history/");
        self.send_json("history", self.http.get(url)).await
    }

    // =========================================================================
    // Scripts
    // =========================================================================

    /// Generate a new script for `topic` in the style of an analysis.
    pub async fn create_script(&self, analysis_id: &str, topic: &str) -> ClientResult<Script> {
        let body = CreateScriptRequest {
            analysis_id: analysis_id.to_string(),
            topic: topic.to_string(),
        };
        let request = self.http.post(self.config.endpoint("scripts/")).json(&body);
        self.send_json("create_script", request).await
    }

    /// Run the image/video/speech pipeline for one segment.
    pub async fn generate_media(
        &self,
        script_id: &str,
        segment_id: &str,
    ) -> ClientResult<ScriptSegment> {
        let body = GenerateMediaRequest {
            segment_id: segment_id.to_string(),
        };
        let url = self
            .config
            .endpoint(&format!("scripts/{}/generate_media/", script_id));
        self.send_json("generate_media", self.http.post(url).json(&body))
            .await
    }

    // =========================================================================
    // Video preview tasks
    // =========================================================================

    /// Submit a video preview job. Returns the accepted task id.
    pub async fn submit_video_preview(
        &self,
        script_id: &str,
        request: &PreviewRequest,
    ) -> ClientResult<PreviewSubmission> {
        let url = self
            .config
            .endpoint(&format!("scripts/{}/generate_video_preview/", script_id));
        let submission: PreviewSubmission = self
            .send_json("submit_video_preview", self.http.post(url).json(request))
            .await?;

        if submission.task_id.trim().is_empty() {
            return Err(ClientError::invalid_response("preview accepted without a task id"));
        }
        Ok(submission)
    }

    /// Current status of a video task.
    pub async fn video_task_status(&self, task_id: &str) -> ClientResult<TaskStatusResponse> {
        let url = self.config.endpoint("scripts/video_task_status/");
        let request = self.http.get(url).query(&[("task_id", task_id)]);
        self.send_json("video_task_status", request).await
    }

    // =========================================================================
    // Plumbing
    // =========================================================================

    async fn send_json<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        request: RequestBuilder,
    ) -> ClientResult<T> {
        let span = info_span!("vdna_api", operation);

        async move {
            let started = Instant::now();
            let response = match request.send().await {
                Ok(response) => response,
                Err(e) => {
                    record_request(operation, 0, started.elapsed().as_secs_f64() * 1000.0);
                    warn!("{} request failed: {}", operation, e);
                    return Err(ClientError::Network(e));
                }
            };

            let status = response.status();
            record_request(
                operation,
                status.as_u16(),
                started.elapsed().as_secs_f64() * 1000.0,
            );

            if !status.is_success() {
                let text = response.text().await.unwrap_or_default();
                let message = serde_json::from_str::<ErrorBody>(&text)
                    .ok()
                    .and_then(ErrorBody::into_message)
                    .unwrap_or_else(|| {
                        if text.trim().is_empty() {
                            status
                                .canonical_reason()
                                .unwrap_or("request failed")
                                .to_string()
                        } else {
                            text.chars().take(200).collect()
                        }
                    });
                warn!("{} returned {}: {}", operation, status, message);
                return Err(ClientError::api(status.as_u16(), message));
            }

            let bytes = response.bytes().await?;
            debug!("{} returned {} ({} bytes)", operation, status, bytes.len());
            Ok(serde_json::from_slice(&bytes)?)
        }
        .instrument(span)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use vdna_models::{AnalysisStatus, MediaStatus, RemoteTaskState, VideoModel};
    use wiremock::matchers::{body_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn client_for(server: &MockServer) -> ApiClient {
        let config = ClientConfig::with_base_url(format!("{}/api", server.uri())).unwrap();
        ApiClient::new(config).unwrap()
    }

    #[tokio::test]
    async fn test_submit_video_preview() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/scripts/sc-1/generate_video_preview/"))
            .and(body_json(json!({
                "segment_ids": ["seg-1"],
                "model": "grok-imagine/text-to-video",
                "additional_notes": "slow zoom"
            })))
            .respond_with(ResponseTemplate::new(202).set_body_json(json!({
                "task_id": "task-42",
                "status": "generating",
                "message": "created"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let request =
            PreviewRequest::for_leading_segment("seg-1", VideoModel::GrokImagine, "slow zoom");
        let submission = client.submit_video_preview("sc-1", &request).await.unwrap();
        assert_eq!(submission.task_id, "task-42");
    }

    #[tokio::test]
    async fn test_submit_without_task_id_is_invalid() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/scripts/sc-1/generate_video_preview/"))
            .respond_with(ResponseTemplate::new(202).set_body_json(json!({"task_id": ""})))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let request = PreviewRequest::for_leading_segment("seg-1", VideoModel::Sora2, "");
        let err = client.submit_video_preview("sc-1", &request).await.unwrap_err();
        assert!(matches!(err, ClientError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn test_api_error_message_is_surfaced() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/scripts/sc-1/generate_video_preview/"))
            .respond_with(
                ResponseTemplate::new(400).set_body_json(json!({"error": "Unsupported model"})),
            )
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let request = PreviewRequest::for_leading_segment("seg-1", VideoModel::Sora2, "");
        match client.submit_video_preview("sc-1", &request).await {
            Err(ClientError::Api { status, message }) => {
                assert_eq!(status, 400);
                assert_eq!(message, "Unsupported model");
            }
            other => panic!("unexpected result: {:?}", other.map(|s| s.task_id)),
        }
    }

    #[tokio::test]
    async fn test_video_task_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/scripts/video_task_status/"))
            .and(query_param("task_id", "task-42"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "state": "success",
                "resultUrls": ["https://cdn.example.com/v.mp4"]
            })))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let status = client.video_task_status("task-42").await.unwrap();
        assert_eq!(status.state, RemoteTaskState::Success);
        assert_eq!(status.first_url(), Some("https://cdn.example.com/v.mp4"));
    }

    #[tokio::test]
    async fn test_status_server_error_without_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/scripts/video_task_status/"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let err = client.video_task_status("task-42").await.unwrap_err();
        assert_eq!(err.http_status(), Some(503));
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn test_malformed_status_body_is_json_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/scripts/video_task_status/"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let err = client.video_task_status("task-42").await.unwrap_err();
        assert!(matches!(err, ClientError::Json(_)));
    }

    #[tokio::test]
    async fn test_get_analysis_and_create_script() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/analyses/a-1/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "a-1",
                "status": "ready",
                "scripts": [{
                    "id": "sc-1",
                    "topic": "Coffee",
                    "segments": [{
                        "id": "seg-1", "timeframe": "0:00-0:10", "visual": "v", "audio": "a",
                        "media": {"status": "generating_video", "kieTaskId": "task-1"}
                    }]
                }]
            })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/scripts/"))
            .and(body_json(json!({"analysis_id": "a-1", "topic": "Tea"})))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "id": "sc-2",
                "topic": "Tea",
                "segments": [{"id": "seg-9", "timeframe": "0s-15s", "visual": "", "audio": ""}]
            })))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let analysis = client.get_analysis("a-1").await.unwrap();
        assert_eq!(analysis.status, AnalysisStatus::Ready);
        let segment = &analysis.script("sc-1").unwrap().segments[0];
        assert_eq!(segment.media_status(), MediaStatus::GeneratingVideo);
        assert_eq!(segment.task_id(), Some("task-1"));

        let script = client.create_script("a-1", "Tea").await.unwrap();
        assert_eq!(script.script_id, "sc-2");
        assert_eq!(script.segments[0].media_status(), MediaStatus::Idle);
    }

    #[tokio::test]
    async fn test_create_analysis_requires_sources() {
        let client = ApiClient::new(ClientConfig::default()).unwrap();
        let err = client.create_analysis(&[]).await.unwrap_err();
        assert!(matches!(err, ClientError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_create_analysis_and_history() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/analyses/"))
            .and(body_json(json!({
                "sources": [{"type": "url", "value": "https://x/1", "label": "first"}]
            })))
            .respond_with(
                ResponseTemplate::new(201)
                    .set_body_json(json!({"id": "a-7", "status": "processing"})),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/analyses/history/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"id": "a-7", "status": "ready"},
                {"id": "a-6", "status": "error"}
            ])))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let created = client
            .create_analysis(&[SourceInput::url("https://x/1").with_label("first")])
            .await
            .unwrap();
        assert_eq!(created.status, AnalysisStatus::Processing);

        let history = client.history().await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[1].status, AnalysisStatus::Error);
    }
}
