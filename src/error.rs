//! Error types for Prompt Studio
//!
//! Centralized error handling using thiserror.

use thiserror::Error;

use crate::llm::LlmError;

/// All error types that can occur while compiling and dispatching prompts
#[derive(Debug, Error)]
pub enum PromptError {
    /// No prompt registered under the requested identifier
    #[error("Prompt '{0}' not found")]
    PromptNotFound(String),

    /// The prompt exists but ships no test case with this name
    #[error("Test case '{name}' not found in prompt '{prompt_id}'")]
    TestCaseNotFound { prompt_id: String, name: String },

    /// Provider name did not match any registered provider
    #[error("Unsupported provider: {0}")]
    UnsupportedProvider(String),

    /// The selected backend failed to produce a completion
    #[error("Backend invocation failed: {0}")]
    BackendInvocationFailed(#[source] LlmError),

    /// The caller withdrew the request, or its deadline elapsed, before completion
    #[error("Request cancelled before the backend responded")]
    Cancelled,

    /// Template source could not be enumerated
    #[error("Source error: {0}")]
    Source(String),
}

impl PromptError {
    /// True for failures caused by the caller's input rather than an upstream service
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            PromptError::PromptNotFound(_) | PromptError::TestCaseNotFound { .. } | PromptError::UnsupportedProvider(_)
        )
    }
}

impl From<LlmError> for PromptError {
    fn from(err: LlmError) -> Self {
        PromptError::BackendInvocationFailed(err)
    }
}

/// Result type alias for Prompt Studio operations
pub type Result<T> = std::result::Result<T, PromptError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_not_found_error() {
        let err = PromptError::PromptNotFound("code-review".to_string());
        assert_eq!(err.to_string(), "Prompt 'code-review' not found");
    }

    #[test]
    fn test_test_case_not_found_error() {
        let err = PromptError::TestCaseNotFound {
            prompt_id: "code-review".to_string(),
            name: "edge".to_string(),
        };
        assert_eq!(err.to_string(), "Test case 'edge' not found in prompt 'code-review'");
        assert!(err.is_client_error());
    }

    #[test]
    fn test_unsupported_provider_error() {
        let err = PromptError::UnsupportedProvider("unknown-x".to_string());
        assert_eq!(err.to_string(), "Unsupported provider: unknown-x");
    }

    #[test]
    fn test_backend_error_keeps_cause() {
        let err: PromptError = LlmError::InvalidResponse("empty choices".to_string()).into();
        assert!(matches!(err, PromptError::BackendInvocationFailed(_)));
        assert!(err.to_string().contains("empty choices"));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_cancelled_error() {
        let err = PromptError::Cancelled;
        assert_eq!(err.to_string(), "Request cancelled before the backend responded");
    }

    #[test]
    fn test_client_error_classification() {
        assert!(PromptError::PromptNotFound("x".to_string()).is_client_error());
        assert!(PromptError::UnsupportedProvider("x".to_string()).is_client_error());
        assert!(!PromptError::Cancelled.is_client_error());
        assert!(!PromptError::BackendInvocationFailed(LlmError::InvalidResponse("bad".to_string())).is_client_error());
    }
}
