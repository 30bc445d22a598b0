// src/error.rs
// Standardized error types for Vega

use thiserror::Error;

/// Main error type for the Vega library
#[derive(Error, Debug)]
pub enum VegaError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Transient upstream condition. Retried by the invoker; surfaces only
    /// after retries are exhausted.
    #[error("rate limited by completion service")]
    RateLimited,

    #[error("completion service error: {0}")]
    Llm(String),

    #[error("structured output did not match schema: {0}")]
    Schema(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("configuration error: {0}")]
    Config(String),

    /// Wrapper for anything unexpected. The one error class the facade lets
    /// escape to callers; the original cause is retained in the message.
    #[error("agent execution failed: {0}")]
    Execution(String),
}

/// Convenience type alias for Result using VegaError
pub type Result<T> = std::result::Result<T, VegaError>;

impl VegaError {
    /// Wrap an arbitrary failure into the generic execution class
    pub fn execution(cause: impl std::fmt::Display) -> Self {
        VegaError::Execution(cause.to_string())
    }
}

impl From<String> for VegaError {
    fn from(s: String) -> Self {
        VegaError::Execution(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ============================================================================
    // VegaError construction tests
    // ============================================================================

    #[test]
    fn test_invalid_input_error() {
        let err = VegaError::InvalidInput("empty message".to_string());
        assert!(err.to_string().contains("invalid input"));
        assert!(err.to_string().contains("empty message"));
    }

    #[test]
    fn test_rate_limited_error() {
        let err = VegaError::RateLimited;
        assert!(err.to_string().contains("rate limited"));
    }

    #[test]
    fn test_llm_error() {
        let err = VegaError::Llm("upstream 500".to_string());
        assert!(err.to_string().contains("completion service error"));
        assert!(err.to_string().contains("upstream 500"));
    }

    #[test]
    fn test_schema_error() {
        let err = VegaError::Schema("missing field `language`".to_string());
        assert!(err.to_string().contains("schema"));
        assert!(err.to_string().contains("language"));
    }

    #[test]
    fn test_execution_wraps_cause() {
        let err = VegaError::execution("worker thread panicked");
        assert!(err.to_string().contains("agent execution failed"));
        assert!(err.to_string().contains("worker thread panicked"));
    }

    #[test]
    fn test_from_string() {
        let err: VegaError = "something unexpected".to_string().into();
        assert!(matches!(err, VegaError::Execution(_)));
    }

    #[test]
    fn test_from_json_error() {
        let json_err = serde_json::from_str::<i32>("not json").unwrap_err();
        let err: VegaError = json_err.into();
        assert!(matches!(err, VegaError::Json(_)));
        assert!(err.to_string().contains("JSON"));
    }

    #[test]
    fn test_result_alias() {
        let ok: Result<i32> = Ok(42);
        assert_eq!(ok.unwrap(), 42);
        let err: Result<i32> = Err(VegaError::RateLimited);
        assert!(err.is_err());
    }
}
