use crate::error::*;
use crate::types::ThreadHandle;
use tracing::{error, info, warn};

pub trait ErrorExt {
    fn log_error(&self) -> &Self;
    fn log_warn(&self) -> &Self;
    fn user_friendly_message(&self) -> String;
    fn error_code(&self) -> String;
}

impl ErrorExt for HarvestError {
    fn log_error(&self) -> &Self {
        error!("HarvestError: {}", self);
        match self {
            HarvestError::RedditApi(e) => {
                error!("Reddit API error details: {:?}", e);
            }
            HarvestError::Config(e) => {
                error!("Configuration error details: {:?}", e);
            }
            _ => {}
        }
        self
    }

    fn log_warn(&self) -> &Self {
        warn!("HarvestError (warning): {}", self);
        self
    }

    fn user_friendly_message(&self) -> String {
        match self {
            HarvestError::RedditApi(e) => e.user_friendly_message(),
            HarvestError::Config(e) => e.user_friendly_message(),
            HarvestError::Network(_) => {
                "Network connection error. Please check your internet connection.".to_string()
            }
            HarvestError::Io(e) => format!("Could not write output: {}", e),
            HarvestError::Csv(e) => format!("Could not write CSV output: {}", e),
            HarvestError::InvalidArgument { message } => format!("Invalid argument: {}", message),
            HarvestError::CommunityUnavailable { community, .. } => format!(
                "Could not access subreddit '{}'. Make sure it exists and is public.",
                community
            ),
            HarvestError::ThreadNotFound { reference, reason } => format!(
                "Could not find a Reddit thread at '{}' ({}).",
                reference, reason
            ),
            _ => "An unexpected error occurred. Please try again later.".to_string(),
        }
    }

    fn error_code(&self) -> String {
        match self {
            HarvestError::RedditApi(e) => e.error_code(),
            HarvestError::Config(e) => e.error_code(),
            HarvestError::Io(_) => "IO".to_string(),
            HarvestError::Network(_) => "NETWORK".to_string(),
            HarvestError::Csv(_) => "CSV".to_string(),
            HarvestError::InvalidArgument { .. } => "INVALID_ARGUMENT".to_string(),
            HarvestError::CommunityUnavailable { .. } => "COMMUNITY_UNAVAILABLE".to_string(),
            HarvestError::ThreadNotFound { .. } => "THREAD_NOT_FOUND".to_string(),
            HarvestError::Internal { .. } => "INTERNAL".to_string(),
        }
    }
}

impl ErrorExt for RedditApiError {
    fn log_error(&self) -> &Self {
        error!("RedditApiError: {}", self);
        self
    }

    fn log_warn(&self) -> &Self {
        warn!("RedditApiError (warning): {}", self);
        self
    }

    fn user_friendly_message(&self) -> String {
        match self {
            RedditApiError::AuthenticationFailed { .. } => {
                "Reddit authentication failed. Please check your credentials.".to_string()
            }
            RedditApiError::RateLimitExceeded { retry_after } => format!(
                "Too many requests. Please wait {} seconds before trying again.",
                retry_after
            ),
            RedditApiError::Forbidden { resource } => format!(
                "Access denied to {}. You may not have permission to view this content.",
                resource
            ),
            RedditApiError::NotFound { resource } => format!("Could not find: {}", resource),
            RedditApiError::InvalidToken => {
                "Reddit authentication token is invalid. Please re-authenticate.".to_string()
            }
            RedditApiError::RequestTimeout => {
                "Request to Reddit timed out. Please try again.".to_string()
            }
            _ => "Reddit API error occurred. Please try again later.".to_string(),
        }
    }

    fn error_code(&self) -> String {
        match self {
            RedditApiError::AuthenticationFailed { .. } => "REDDIT_AUTH_FAILED".to_string(),
            RedditApiError::RateLimitExceeded { .. } => "REDDIT_RATE_LIMIT".to_string(),
            RedditApiError::Forbidden { .. } => "REDDIT_FORBIDDEN".to_string(),
            RedditApiError::NotFound { .. } => "REDDIT_NOT_FOUND".to_string(),
            RedditApiError::InvalidToken => "REDDIT_INVALID_TOKEN".to_string(),
            RedditApiError::RequestTimeout => "REDDIT_TIMEOUT".to_string(),
            RedditApiError::InvalidResponse { .. } => "REDDIT_INVALID_RESPONSE".to_string(),
            RedditApiError::ServerError { .. } => "REDDIT_SERVER_ERROR".to_string(),
        }
    }
}

impl ErrorExt for ConfigError {
    fn log_error(&self) -> &Self {
        error!("ConfigError: {}", self);
        self
    }

    fn log_warn(&self) -> &Self {
        warn!("ConfigError (warning): {}", self);
        self
    }

    fn user_friendly_message(&self) -> String {
        match self {
            ConfigError::FileNotFound { path } => {
                format!("Configuration file not found at {}.", path)
            }
            ConfigError::Unreadable { path, .. } => format!(
                "Configuration file {} could not be read. Please check file permissions.",
                path
            ),
            ConfigError::MissingField { field } => {
                format!("Required configuration field '{}' is missing.", field)
            }
            ConfigError::Parse(_) => {
                "Configuration file format is invalid. Please check the settings.".to_string()
            }
        }
    }

    fn error_code(&self) -> String {
        match self {
            ConfigError::FileNotFound { .. } => "CONFIG_FILE_NOT_FOUND".to_string(),
            ConfigError::Unreadable { .. } => "CONFIG_UNREADABLE".to_string(),
            ConfigError::MissingField { .. } => "CONFIG_MISSING_FIELD".to_string(),
            ConfigError::Parse(_) => "CONFIG_PARSE_ERROR".to_string(),
        }
    }
}

impl CommentRetrievalFailure {
    pub fn new(thread: &ThreadHandle, error: &HarvestError) -> Self {
        Self {
            thread_id: thread.id.clone(),
            title: thread.title.clone(),
            error_code: error.error_code(),
            reason: error.to_string(),
        }
    }
}

pub struct ErrorReporter {
    report_errors: bool,
    report_warnings: bool,
}

impl ErrorReporter {
    pub fn new() -> Self {
        Self {
            report_errors: true,
            report_warnings: true,
        }
    }

    pub fn with_error_reporting(mut self, enabled: bool) -> Self {
        self.report_errors = enabled;
        self
    }

    pub fn with_warning_reporting(mut self, enabled: bool) -> Self {
        self.report_warnings = enabled;
        self
    }

    pub fn report_error(&self, error: &HarvestError) {
        if self.report_errors {
            error.log_error();
            info!("Error code: {}", error.error_code());
            info!("User message: {}", error.user_friendly_message());
        }
    }

    pub fn report_warning(&self, error: &HarvestError) {
        if self.report_warnings {
            error.log_warn();
        }
    }

    pub fn report_thread_failure(&self, failure: &CommentRetrievalFailure) {
        if self.report_warnings {
            warn!(
                thread_id = %failure.thread_id,
                error_code = %failure.error_code,
                "Error processing submission {}: {}",
                failure.thread_id,
                failure.reason
            );
        }
    }
}

impl Default for ErrorReporter {
    fn default() -> Self {
        Self::new()
    }
}
