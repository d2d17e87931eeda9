//! External sentence-model embedding provider (spec §4.2, §6.4).
//!
//! Delegates to a co-resident subordinate process speaking a minimal
//! HTTP protocol on a loopback port. The provider owns the
//! subordinate's lifecycle: locate its executable, verify
//! dependencies, launch it, poll `/health` until ready (or time out),
//! and terminate it on teardown.

use crate::domain::error::{Error, Result};
use crate::embedding::EmbeddingProvider;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::{Child, Command};
use tokio::sync::Mutex;
use tokio::time::Instant;

/// Dimensionality of the external sentence-model provider (spec
/// §4.2).
pub const EXTERNAL_MODEL_DIMENSIONS: usize = 384;

/// Interval between health-check polls during startup.
const HEALTH_POLL_INTERVAL: Duration = Duration::from_millis(500);
/// Startup budget before giving up (spec §4.2(d)).
const STARTUP_TIMEOUT: Duration = Duration::from_secs(30);
/// Per-request timeout cap (spec §4.2(g)).
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Fixed list of candidate paths searched for the subordinate
/// executable (spec §4.2(a)). Operators can also override via
/// [`ExternalModelProvider::with_executable_path`].
const CANDIDATE_EXECUTABLE_PATHS: &[&str] = &[
    "./bin/sentence-model-server",
    "/usr/local/bin/sentence-model-server",
    "/opt/code-search/sentence-model-server",
];

/// Names of dependencies the subordinate requires on `PATH`, checked
/// before launch (spec §4.2(b)).
const REQUIRED_RUNTIME_DEPENDENCIES: &[&str] = &["python3"];

#[derive(Serialize)]
struct EmbedRequest<'a> {
    texts: &'a [String],
}

#[derive(Deserialize)]
struct EmbedResponse {
    embeddings: Vec<Vec<f32>>,
    dimension: usize,
    count: usize,
}

/// Provider that delegates embedding to an out-of-process sentence
/// model reachable over HTTP on `127.0.0.1:{port}`.
pub struct ExternalModelProvider {
    base_url: String,
    client: reqwest::Client,
    executable_path: Option<String>,
    child: Mutex<Option<Child>>,
}

impl ExternalModelProvider {
    /// Build a provider targeting the given loopback port. The
    /// subordinate is not launched until [`Self::start`] is called.
    pub fn new(port: u16) -> Self {
        Self {
            base_url: format!("http://127.0.0.1:{port}"),
            client: reqwest::Client::builder()
                .timeout(REQUEST_TIMEOUT)
                .build()
                .expect("reqwest client builds with a static config"),
            executable_path: None,
            child: Mutex::new(None),
        }
    }

    /// Override the candidate-path search with an explicit
    /// executable path.
    pub fn with_executable_path(mut self, path: impl Into<String>) -> Self {
        self.executable_path = Some(path.into());
        self
    }

    /// Locate the subordinate executable (spec §4.2(a)).
    fn locate_executable(&self) -> Result<String> {
        if let Some(path) = &self.executable_path {
            if std::path::Path::new(path).exists() {
                return Ok(path.clone());
            }
            return Err(Error::model_unavailable(format!(
                "configured embedding server executable not found: {path}"
            )));
        }
        for candidate in CANDIDATE_EXECUTABLE_PATHS {
            if std::path::Path::new(candidate).exists() {
                return Ok((*candidate).to_string());
            }
        }
        Err(Error::model_unavailable(format!(
            "no embedding server executable found in candidate paths: {CANDIDATE_EXECUTABLE_PATHS:?}"
        )))
    }

    /// Verify runtime dependencies are present on `PATH` before
    /// launching the subordinate (spec §4.2(b)).
    fn verify_dependencies(&self) -> Result<()> {
        for dep in REQUIRED_RUNTIME_DEPENDENCIES {
            let found = std::env::var_os("PATH")
                .map(|paths| {
                    std::env::split_paths(&paths).any(|dir| dir.join(dep).exists())
                })
                .unwrap_or(false);
            if !found {
                return Err(Error::model_unavailable(format!(
                    "required dependency `{dep}` not found on PATH"
                )));
            }
        }
        Ok(())
    }

    /// Launch the subordinate process and block until it reports
    /// healthy, or the startup budget elapses (spec §4.2(c)-(d)).
    #[tracing::instrument(skip(self))]
    pub async fn start(&self) -> Result<()> {
        self.verify_dependencies()?;
        let exe = self.locate_executable()?;

        let child = Command::new(&exe)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| Error::model_unavailable(format!("failed to launch {exe}: {e}")))?;

        *self.child.lock().await = Some(child);

        let deadline = Instant::now() + STARTUP_TIMEOUT;
        loop {
            if self.poll_health().await {
                tracing::info!(base_url = %self.base_url, "embedding server healthy");
                return Ok(());
            }
            if Instant::now() >= deadline {
                return Err(Error::StartupTimeout {
                    elapsed_secs: STARTUP_TIMEOUT.as_secs(),
                });
            }
            tokio::time::sleep(HEALTH_POLL_INTERVAL).await;
        }
    }

    async fn poll_health(&self) -> bool {
        self.client
            .get(format!("{}/health", self.base_url))
            .send()
            .await
            .map(|r| r.status().is_success())
            .unwrap_or(false)
    }

    /// Terminate the subordinate child process, if running (spec
    /// §4.2(f)).
    pub async fn stop(&self) {
        if let Some(mut child) = self.child.lock().await.take() {
            let _ = child.kill().await;
        }
    }
}

#[async_trait]
impl EmbeddingProvider for ExternalModelProvider {
    fn dimensions(&self) -> usize {
        EXTERNAL_MODEL_DIMENSIONS
    }

    fn name(&self) -> &str {
        "external-sentence-model"
    }

    #[tracing::instrument(skip(self, texts), fields(count = texts.len()))]
    async fn embed_many(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.iter().any(|t| t.is_empty()) {
            return Err(Error::invalid_input(
                "embedding input text must not be empty",
            ));
        }
        if !self.poll_health().await {
            return Err(Error::ServerUnhealthy {
                message: "embedding server did not respond to health check".into(),
            });
        }

        let response = self
            .client
            .post(format!("{}/embed", self.base_url))
            .json(&EmbedRequest { texts })
            .send()
            .await?;

        if !response.status().is_success() {
            let code = response.status().as_u16();
            let message = response.text().await.unwrap_or_default();
            return Err(Error::ServerError { code, message });
        }

        let body: EmbedResponse = response
            .json()
            .await
            .map_err(|e| Error::InvalidResponse {
                message: e.to_string(),
            })?;

        if body.count != texts.len() || body.embeddings.len() != texts.len() {
            return Err(Error::InvalidResponse {
                message: format!(
                    "expected {} embeddings, server returned {} (count={})",
                    texts.len(),
                    body.embeddings.len(),
                    body.count
                ),
            });
        }
        if body.dimension != EXTERNAL_MODEL_DIMENSIONS {
            return Err(Error::InvalidResponse {
                message: format!(
                    "expected dimension {EXTERNAL_MODEL_DIMENSIONS}, server returned {}",
                    body.dimension
                ),
            });
        }

        Ok(body.embeddings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn locate_executable_fails_cleanly_when_nothing_matches() {
        let provider = ExternalModelProvider::new(0)
            .with_executable_path("/definitely/not/a/real/path/server");
        let err = provider.locate_executable().unwrap_err();
        assert_eq!(err.kind(), "model_unavailable");
    }

    #[tokio::test]
    async fn embed_many_rejects_empty_text() {
        let provider = ExternalModelProvider::new(0);
        let err = provider
            .embed_many(&["".to_string()])
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "invalid_input");
    }

    #[tokio::test]
    async fn embed_many_reports_unhealthy_when_unreachable() {
        // Port 0 never accepts connections; health poll fails fast.
        let provider = ExternalModelProvider::new(1);
        let err = provider
            .embed_many(&["hello world".to_string()])
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "server_unhealthy");
    }
}
