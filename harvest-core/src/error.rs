use thiserror::Error;

#[derive(Error, Debug)]
pub enum HarvestError {
    #[error("Reddit API error: {0}")]
    RedditApi(#[from] RedditApiError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Invalid argument: {message}")]
    InvalidArgument { message: String },

    #[error("Community r/{community} is unavailable: {reason}")]
    CommunityUnavailable { community: String, reason: String },

    #[error("Thread not found for '{reference}': {reason}")]
    ThreadNotFound { reference: String, reason: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl HarvestError {
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        HarvestError::InvalidArgument {
            message: message.into(),
        }
    }

    /// Failures of the transport rather than of the addressed resource.
    ///
    /// Discovery keeps these as-is instead of folding them into
    /// `CommunityUnavailable` / `ThreadNotFound`.
    pub fn is_transport_failure(&self) -> bool {
        match self {
            HarvestError::Network(_) => true,
            HarvestError::RedditApi(e) => matches!(
                e,
                RedditApiError::AuthenticationFailed { .. }
                    | RedditApiError::InvalidToken
                    | RedditApiError::RateLimitExceeded { .. }
                    | RedditApiError::RequestTimeout
                    | RedditApiError::ServerError { .. }
            ),
            _ => false,
        }
    }

    /// Process exit status for a run that ended with this error.
    pub fn exit_code(&self) -> u8 {
        match self {
            HarvestError::InvalidArgument { .. } => 2,
            HarvestError::Config(_) => 3,
            HarvestError::CommunityUnavailable { .. } | HarvestError::ThreadNotFound { .. } => 4,
            _ => 1,
        }
    }
}

#[derive(Error, Debug, Clone)]
pub enum RedditApiError {
    #[error("Authentication failed: {reason}")]
    AuthenticationFailed { reason: String },

    #[error("Rate limit exceeded. Retry after {retry_after} seconds")]
    RateLimitExceeded { retry_after: u64 },

    #[error("Forbidden access to resource: {resource}")]
    Forbidden { resource: String },

    #[error("Resource not found: {resource}")]
    NotFound { resource: String },

    #[error("Invalid OAuth token")]
    InvalidToken,

    #[error("Request timeout")]
    RequestTimeout,

    #[error("Invalid API response: {details}")]
    InvalidResponse { details: String },

    #[error("Server error: {status_code}")]
    ServerError { status_code: u16 },
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found: {path}")]
    FileNotFound { path: String },

    #[error("Configuration file unreadable: {path}: {reason}")]
    Unreadable { path: String, reason: String },

    #[error("Missing required field: {field}")]
    MissingField { field: String },

    #[error("Configuration parsing error: {0}")]
    Parse(#[from] toml::de::Error),
}

/// A thread whose comment tree could not be retrieved or traversed.
///
/// Per-thread and non-fatal: the orchestrator records it and moves on.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Failed to retrieve comments for thread {thread_id} ({title}): {reason}")]
pub struct CommentRetrievalFailure {
    pub thread_id: String,
    pub title: String,
    pub error_code: String,
    pub reason: String,
}
