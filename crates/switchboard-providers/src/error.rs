//! Error taxonomy for providers and the registry.

use std::time::Duration;

use thiserror::Error;

/// Failure of one provider's `generate_response` call.
///
/// Backend-specific errors are classified into one of these at the provider
/// boundary, so the registry only ever deals with this type.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum ProviderError {
    /// Required configuration (usually the API key) is missing or malformed.
    #[error("provider '{provider}' is not available: {reason}")]
    Unavailable { provider: String, reason: String },

    /// The backend did not answer within the deadline.
    #[error("provider '{provider}' timed out after {after:?}")]
    Timeout { provider: String, after: Duration },

    /// Transport failure or a non-success HTTP status.
    #[error("request to provider '{provider}' failed: {message}")]
    RequestFailed {
        provider: String,
        message: String,
        retryable: bool,
    },

    /// The backend answered but the payload held no usable text.
    #[error("provider '{provider}' returned an invalid response: {message}")]
    InvalidResponse { provider: String, message: String },

    /// The caller's input was rejected before reaching the backend.
    #[error("invalid request for provider '{provider}': {message}")]
    InvalidRequest { provider: String, message: String },
}

impl ProviderError {
    /// Name of the provider that produced this error.
    pub fn provider(&self) -> &str {
        match self {
            ProviderError::Unavailable { provider, .. }
            | ProviderError::Timeout { provider, .. }
            | ProviderError::RequestFailed { provider, .. }
            | ProviderError::InvalidResponse { provider, .. }
            | ProviderError::InvalidRequest { provider, .. } => provider,
        }
    }

    /// Whether retrying the same provider may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            ProviderError::Timeout { .. } => true,
            ProviderError::RequestFailed { retryable, .. } => *retryable,
            _ => false,
        }
    }

    /// Short machine-readable kind, used in logs and status output.
    pub fn kind(&self) -> &'static str {
        match self {
            ProviderError::Unavailable { .. } => "unavailable",
            ProviderError::Timeout { .. } => "timeout",
            ProviderError::RequestFailed { .. } => "request_failed",
            ProviderError::InvalidResponse { .. } => "invalid_response",
            ProviderError::InvalidRequest { .. } => "invalid_request",
        }
    }
}

/// One failed attempt recorded during registry fallback.
#[derive(Clone, Debug, PartialEq)]
pub struct Attempt {
    pub provider: String,
    pub error: ProviderError,
}

/// Errors surfaced by the [`ProviderRegistry`](crate::registry::ProviderRegistry).
#[derive(Clone, Debug, Error, PartialEq)]
pub enum RegistryError {
    /// A different instance is already registered under this name.
    #[error("a different provider named '{0}' is already registered")]
    DuplicateProvider(String),

    /// No provider is registered under this name.
    #[error("no provider named '{0}' is registered")]
    UnknownProvider(String),

    /// An operation defaulted to the current provider but none is selected.
    #[error("no provider is currently selected")]
    NoCurrentProvider,

    /// A pinned provider failed; returned as-is without fallback.
    #[error(transparent)]
    Provider(#[from] ProviderError),

    /// Every candidate failed (or none was available).
    #[error("all providers exhausted: {}", summarize(.0))]
    AllProvidersExhausted(Vec<Attempt>),
}

fn summarize(attempts: &[Attempt]) -> String {
    if attempts.is_empty() {
        return "no provider available".to_string();
    }
    attempts
        .iter()
        .map(|a| format!("{} ({})", a.provider, a.error))
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        let timeout = ProviderError::Timeout {
            provider: "groq".into(),
            after: Duration::from_secs(1),
        };
        assert!(timeout.is_retryable());

        let unavailable = ProviderError::Unavailable {
            provider: "groq".into(),
            reason: "missing key".into(),
        };
        assert!(!unavailable.is_retryable());
        assert_eq!(unavailable.provider(), "groq");
        assert_eq!(unavailable.kind(), "unavailable");

        let bad_request = ProviderError::RequestFailed {
            provider: "hf".into(),
            message: "400".into(),
            retryable: false,
        };
        assert!(!bad_request.is_retryable());
    }

    #[test]
    fn test_exhausted_message_lists_attempts() {
        let err = RegistryError::AllProvidersExhausted(vec![
            Attempt {
                provider: "groq".into(),
                error: ProviderError::InvalidResponse {
                    provider: "groq".into(),
                    message: "no choices".into(),
                },
            },
            Attempt {
                provider: "huggingface".into(),
                error: ProviderError::Timeout {
                    provider: "huggingface".into(),
                    after: Duration::from_secs(30),
                },
            },
        ]);
        let msg = err.to_string();
        assert!(msg.contains("groq"));
        assert!(msg.contains("huggingface"));
        assert!(msg.contains("timed out"));
    }

    #[test]
    fn test_exhausted_empty() {
        let err = RegistryError::AllProvidersExhausted(Vec::new());
        assert!(err.to_string().contains("no provider available"));
    }

    #[test]
    fn test_provider_error_is_transparent() {
        let inner = ProviderError::Unavailable {
            provider: "groq".into(),
            reason: "missing key".into(),
        };
        let err: RegistryError = inner.clone().into();
        assert_eq!(err.to_string(), inner.to_string());
    }
}
