//! Veo API client.
//!
//! Generation is a long-running operation: submit with
//! `models/{model}:predictLongRunning`, poll the returned operation until
//! `done`, then download the sample's video URI. Every HTTP call goes
//! through the fixed-count [`RetryPolicy`].

use std::path::Path;
use std::time::{Duration, Instant};

use reqwest::{Client, Response};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, info_span, warn, Instrument};

use crate::error::{VeoError, VeoResult};
use crate::retry::RetryPolicy;
use crate::types::{GeneratedVideo, Operation, VideoRequest};

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

const API_KEY_HEADER: &str = "x-goog-api-key";

#[derive(Debug, Clone)]
pub struct VeoConfig {
    pub api_key: String,
    pub base_url: String,
    pub poll_interval: Duration,
    /// Upper bound from submit to finished operation
    pub generation_timeout: Duration,
    pub request_timeout: Duration,
    pub download_timeout: Duration,
    pub retry: RetryPolicy,
}

impl VeoConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            poll_interval: Duration::from_secs(10),
            generation_timeout: Duration::from_secs(600),
            request_timeout: Duration::from_secs(60),
            download_timeout: Duration::from_secs(300),
            retry: RetryPolicy::default(),
        }
    }

    pub fn from_env() -> VeoResult<Self> {
        let api_key = std::env::var("GEMINI_API_KEY")
            .or_else(|_| std::env::var("GOOGLE_API_KEY"))
            .ok()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| VeoError::config("GEMINI_API_KEY must be set to generate videos"))?;

        let env_u64 = |key: &str| std::env::var(key).ok().and_then(|s| s.parse::<u64>().ok());
        let defaults = Self::new(api_key);

        Ok(Self {
            base_url: std::env::var("VEO_API_BASE_URL")
                .ok()
                .filter(|u| !u.is_empty())
                .unwrap_or_else(|| defaults.base_url.clone()),
            poll_interval: env_u64("VEO_POLL_INTERVAL_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.poll_interval),
            generation_timeout: env_u64("VEO_GENERATION_TIMEOUT_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.generation_timeout),
            retry: RetryPolicy {
                max_retries: env_u64("VEO_MAX_RETRIES")
                    .map(|n| n as u32)
                    .unwrap_or(defaults.retry.max_retries),
                delay: env_u64("VEO_RETRY_DELAY_MS")
                    .map(Duration::from_millis)
                    .unwrap_or(defaults.retry.delay),
            },
            ..defaults
        })
    }
}

#[derive(Debug, Clone)]
pub struct VeoClient {
    http: Client,
    config: VeoConfig,
}

impl VeoClient {
    pub fn new(config: VeoConfig) -> VeoResult<Self> {
        let http = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .user_agent(concat!("vgen-veo/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { http, config })
    }

    pub fn from_env() -> VeoResult<Self> {
        Self::new(VeoConfig::from_env()?)
    }

    pub fn config(&self) -> &VeoConfig {
        &self.config
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.config.base_url.trim_end_matches('/'), path.trim_start_matches('/'))
    }

    async fn check(response: Response) -> VeoResult<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(VeoError::Http {
            status: status.as_u16(),
            message: extract_error_message(&body),
        })
    }

    /// Start a generation. Returns the operation name to poll.
    pub async fn submit(&self, request: &VideoRequest) -> VeoResult<String> {
        let url = self.url(&format!("models/{}:predictLongRunning", request.model.api_model_id()));
        let url = url.as_str();
        let body = request.to_body();
        let body = &body;

        let operation: Operation = self
            .config
            .retry
            .run("submit", || async move {
                let response = self
                    .http
                    .post(url)
                    .header(API_KEY_HEADER, &self.config.api_key)
                    .timeout(self.config.request_timeout)
                    .json(body)
                    .send()
                    .await?;
                Ok(Self::check(response).await?.json::<Operation>().await?)
            })
            .await?;

        info!(operation = %operation.name, model = %request.model, "Submitted Veo generation");
        Ok(operation.name)
    }

    /// Fetch the current state of an operation.
    pub async fn poll(&self, operation_name: &str) -> VeoResult<Operation> {
        let url = self.url(operation_name);
        let url = url.as_str();

        self.config
            .retry
            .run("poll", || async move {
                let response = self
                    .http
                    .get(url)
                    .header(API_KEY_HEADER, &self.config.api_key)
                    .timeout(self.config.request_timeout)
                    .send()
                    .await?;
                Ok(Self::check(response).await?.json::<Operation>().await?)
            })
            .await
    }

    /// Poll until the operation finishes. Returns the sample's video URI.
    pub async fn wait_for_video(&self, operation_name: &str) -> VeoResult<String> {
        let started = Instant::now();
        loop {
            let operation = self.poll(operation_name).await?;
            if operation.done {
                return video_uri(operation);
            }

            if started.elapsed() + self.config.poll_interval > self.config.generation_timeout {
                warn!(operation = %operation_name, "Veo generation timed out");
                return Err(VeoError::Timeout(self.config.generation_timeout));
            }
            debug!(
                operation = %operation_name,
                elapsed_secs = started.elapsed().as_secs(),
                "Veo generation still running"
            );
            tokio::time::sleep(self.config.poll_interval).await;
        }
    }

    /// Download a generated clip to `dest`. Returns bytes written.
    pub async fn download(&self, uri: &str, dest: &Path) -> VeoResult<u64> {
        self.config
            .retry
            .run("download", || async move {
                let mut response = Self::check(
                    self.http
                        .get(uri)
                        .header(API_KEY_HEADER, &self.config.api_key)
                        .timeout(self.config.download_timeout)
                        .send()
                        .await?,
                )
                .await?;

                let mut file = tokio::fs::File::create(dest).await?;
                let mut written = 0u64;
                while let Some(chunk) = response.chunk().await? {
                    file.write_all(&chunk).await?;
                    written += chunk.len() as u64;
                }
                file.flush().await?;
                Ok(written)
            })
            .await
    }

    /// Submit, wait and download in one call.
    pub async fn generate(&self, request: &VideoRequest, dest: &Path) -> VeoResult<GeneratedVideo> {
        let span = info_span!("veo_generate", model = %request.model, duration_secs = request.duration_secs);
        async {
            let operation_name = self.submit(request).await?;
            let uri = self.wait_for_video(&operation_name).await?;
            let bytes_written = self.download(&uri, dest).await?;
            if bytes_written == 0 {
                return Err(VeoError::invalid_response("Downloaded video is empty"));
            }
            info!(operation = %operation_name, bytes = bytes_written, "Veo clip downloaded");
            Ok(GeneratedVideo {
                operation_name,
                uri,
                bytes_written,
            })
        }
        .instrument(span)
        .await
    }
}

/// Pull the sample URI out of a finished operation.
fn video_uri(operation: Operation) -> VeoResult<String> {
    if let Some(error) = operation.error {
        return Err(VeoError::provider(error.code, error.message));
    }

    let response = operation
        .response
        .and_then(|r| r.generate_video_response)
        .ok_or_else(|| VeoError::invalid_response("Finished operation has no video response"))?;

    match response.generated_samples.into_iter().next() {
        Some(sample) => Ok(sample.video.uri),
        None if !response.rai_media_filtered_reasons.is_empty() => Err(VeoError::provider(
            None,
            response.rai_media_filtered_reasons.join("; "),
        )),
        None => Err(VeoError::provider(
            None,
            "The model returned no video for this prompt",
        )),
    }
}

/// `error.message` from a Google API error body, or the raw body.
fn extract_error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v["error"]["message"].as_str().map(str::to_string))
        .unwrap_or_else(|| body.trim().to_string())
}
