//! Error types for the Spotify client.

/// Errors from the token endpoint.
///
/// `Clone` so that every caller waiting on a shared refresh receives the
/// same outcome.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("token request failed: {status} - {body}")]
    TokenRefresh { status: u16, body: String },

    #[error("malformed token response: {0}")]
    MalformedResponse(String),

    #[error("HTTP error: {0}")]
    Http(String),
}

/// Errors from a player request (volume or playback).
#[derive(Debug, thiserror::Error)]
pub enum VolumeError {
    #[error("player request still rate limited after retry")]
    RateLimited,

    #[error("player request failed: {status} - {body}")]
    RequestFailed { status: u16, body: String },

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_error_display() {
        let err = AuthError::TokenRefresh {
            status: 400,
            body: "invalid_grant".into(),
        };
        assert_eq!(err.to_string(), "token request failed: 400 - invalid_grant");

        let err = AuthError::MalformedResponse("missing access_token".into());
        assert!(err.to_string().contains("missing access_token"));
    }

    #[test]
    fn volume_error_wraps_auth_error() {
        let err: VolumeError = AuthError::Http("refused".into()).into();
        assert_eq!(err.to_string(), "HTTP error: refused");
        assert!(matches!(err, VolumeError::Auth(_)));
    }

    #[test]
    fn volume_error_display() {
        let err = VolumeError::RequestFailed {
            status: 404,
            body: "NO_ACTIVE_DEVICE".into(),
        };
        assert!(err.to_string().contains("404"));
        assert!(err.to_string().contains("NO_ACTIVE_DEVICE"));
    }
}
