pub type PtoolResult<T> = Result<T, PtoolError>;

#[derive(Debug, thiserror::Error)]
pub enum PtoolError {
    #[error("[Profile Not Found] Stock analysis profile for '{0}' not found")]
    ProfileNotFound(String),

    #[error("[API Unavailable] {0}")]
    ApiUnavailable(String),

    #[error("[Provider Error] {0}")]
    ProviderError(String),

    #[error("[Rate Limited] API call frequency limit reached, please try again in a moment")]
    RateLimited(String),

    #[error("[Authentication Failed] {0}")]
    AuthenticationFailed(String),

    #[error("[Recommendation Unavailable] {0}")]
    RecommendationUnavailable(String),

    #[error("[Malformed Recommendation] {0}")]
    MalformedRecommendation(String),

    #[error("[Config Error] {0}")]
    ConfigError(#[from] confy::ConfyError),

    #[error("[Enum Error] {0}")]
    EnumError(#[from] strum::ParseError),

    #[error("[HTTP Error] {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("[HTTP Status Error] {0}")]
    HttpStatusError(String),

    #[error("[IO Error] {0}")]
    IoError(#[from] std::io::Error),

    #[error("[JSON Error] {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("[URL Error] {0}")]
    UrlError(#[from] url::ParseError),

    #[error("[Invalid] {1}")]
    Invalid(&'static str, String),

    #[error("[Not Exists] {1}")]
    NotExists(&'static str, String),

    #[error("[Required] {1}")]
    Required(&'static str, String),
}

impl PtoolError {
    /// Whether resubmitting the same request may succeed without changing configuration
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            PtoolError::ApiUnavailable(_)
                | PtoolError::ProviderError(_)
                | PtoolError::RateLimited(_)
                | PtoolError::RecommendationUnavailable(_)
                | PtoolError::MalformedRecommendation(_)
                | PtoolError::HttpError(_)
                | PtoolError::HttpStatusError(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_retryable() {
        assert!(!PtoolError::ProfileNotFound("FOO.NS".to_string()).is_retryable());
        assert!(!PtoolError::AuthenticationFailed("bad key".to_string()).is_retryable());
        assert!(PtoolError::RateLimited("note".to_string()).is_retryable());
        assert!(PtoolError::MalformedRecommendation("missing".to_string()).is_retryable());
    }

    #[test]
    fn test_error_display() {
        let err = PtoolError::ProfileNotFound("FOO.NS".to_string());
        assert_eq!(
            err.to_string(),
            "[Profile Not Found] Stock analysis profile for 'FOO.NS' not found"
        );
    }
}
