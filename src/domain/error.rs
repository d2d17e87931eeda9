//! Error taxonomy shared by every component (spec §7)

use thiserror::Error;

/// Result type alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Error kinds surfaced to tool handlers and to internal callers.
///
/// Tool handlers map these to a short message and an error *kind*
/// rather than leaking a stack trace (spec §7).
#[derive(Error, Debug)]
pub enum Error {
    /// I/O operation error.
    #[error("I/O error: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// JSON parsing or serialization error.
    #[error("JSON error: {source}")]
    Json {
        /// The underlying JSON error.
        #[from]
        source: serde_json::Error,
    },

    /// Caller violated a tool contract: missing query, wrong value
    /// type, unconfirmed destructive operation.
    #[error("invalid parameters: {message}")]
    InvalidParams {
        /// Description of what was wrong with the parameters.
        message: String,
    },

    /// Embedding requested for empty text.
    #[error("invalid input: {message}")]
    InvalidInput {
        /// Description of the invalid input.
        message: String,
    },

    /// Reindex/file-context/queue operation for an unknown project.
    #[error("project not found: {name}")]
    ProjectNotFound {
        /// The project name that was not found.
        name: String,
    },

    /// File-context line bounds out of the file's range.
    #[error("invalid range: {message}")]
    InvalidRange {
        /// Description of the out-of-range request.
        message: String,
    },

    /// Embedding provider failed to initialize (missing model,
    /// missing subordinate process, unmet dependencies).
    #[error("embedding model unavailable: {message}")]
    ModelUnavailable {
        /// Description of why the provider is unavailable.
        message: String,
    },

    /// Embedding provider raised mid-operation.
    #[error("embedding generation failed: {message}")]
    GenerationFailed {
        /// Description of the failure.
        message: String,
    },

    /// The external-model subordinate failed its health check.
    #[error("embedding server unhealthy: {message}")]
    ServerUnhealthy {
        /// Description of the health-check failure.
        message: String,
    },

    /// The external-model subordinate did not become healthy within
    /// the startup budget.
    #[error("embedding server startup timed out after {elapsed_secs}s")]
    StartupTimeout {
        /// Seconds waited before giving up.
        elapsed_secs: u64,
    },

    /// The external-model subordinate returned a non-2xx response.
    #[error("embedding server returned {code}: {message}")]
    ServerError {
        /// HTTP-like status code returned by the subordinate.
        code: u16,
        /// Body or reason phrase.
        message: String,
    },

    /// The external-model subordinate's response did not match the
    /// expected shape.
    #[error("invalid response from embedding server: {message}")]
    InvalidResponse {
        /// Description of the malformed response.
        message: String,
    },

    /// A file read during indexing or file-context could not be
    /// found.
    #[error("file not found: {path}")]
    FileNotFound {
        /// The path that could not be read.
        path: String,
    },

    /// The project root given to the indexer does not exist or is
    /// not a directory.
    #[error("project root not found or not a directory: {path}")]
    ProjectRootNotFound {
        /// The path that failed the existence/directory check.
        path: String,
    },

    /// Configuration-related error.
    #[error("configuration error: {message}")]
    Config {
        /// Description of the configuration error.
        message: String,
    },

    /// Cache operation error.
    #[error("cache error: {message}")]
    Cache {
        /// Description of the cache error.
        message: String,
    },

    /// Anything else surfaced to the tool layer.
    #[error("internal error: {message}")]
    Internal {
        /// Description of the internal error.
        message: String,
    },
}

impl Error {
    /// Construct an [`Error::InvalidParams`].
    pub fn invalid_params<S: Into<String>>(message: S) -> Self {
        Self::InvalidParams {
            message: message.into(),
        }
    }

    /// Construct an [`Error::InvalidInput`].
    pub fn invalid_input<S: Into<String>>(message: S) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    /// Construct an [`Error::ProjectNotFound`].
    pub fn project_not_found<S: Into<String>>(name: S) -> Self {
        Self::ProjectNotFound { name: name.into() }
    }

    /// Construct an [`Error::InvalidRange`].
    pub fn invalid_range<S: Into<String>>(message: S) -> Self {
        Self::InvalidRange {
            message: message.into(),
        }
    }

    /// Construct an [`Error::ModelUnavailable`].
    pub fn model_unavailable<S: Into<String>>(message: S) -> Self {
        Self::ModelUnavailable {
            message: message.into(),
        }
    }

    /// Construct an [`Error::GenerationFailed`].
    pub fn generation_failed<S: Into<String>>(message: S) -> Self {
        Self::GenerationFailed {
            message: message.into(),
        }
    }

    /// Construct a [`Error::Config`].
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Construct an [`Error::Cache`].
    pub fn cache<S: Into<String>>(message: S) -> Self {
        Self::Cache {
            message: message.into(),
        }
    }

    /// Construct an [`Error::Internal`].
    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// The error kind as a stable lower-snake-case tag, suitable for
    /// tool-layer error responses that must report "by error kind...
    /// rather than ad-hoc strings" (spec §6.1).
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Io { .. } => "io_error",
            Self::Json { .. } => "json_error",
            Self::InvalidParams { .. } => "invalid_params",
            Self::InvalidInput { .. } => "invalid_input",
            Self::ProjectNotFound { .. } => "project_not_found",
            Self::InvalidRange { .. } => "invalid_range",
            Self::ModelUnavailable { .. } => "model_unavailable",
            Self::GenerationFailed { .. } => "generation_failed",
            Self::ServerUnhealthy { .. } => "server_unhealthy",
            Self::StartupTimeout { .. } => "startup_timeout",
            Self::ServerError { .. } => "server_error",
            Self::InvalidResponse { .. } => "invalid_response",
            Self::FileNotFound { .. } => "file_not_found",
            Self::ProjectRootNotFound { .. } => "project_not_found",
            Self::Config { .. } => "config_error",
            Self::Cache { .. } => "cache_error",
            Self::Internal { .. } => "internal_error",
        }
    }
}

impl From<config::ConfigError> for Error {
    fn from(err: config::ConfigError) -> Self {
        Self::Config {
            message: err.to_string(),
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Self::GenerationFailed {
            message: err.to_string(),
        }
    }
}
