use thiserror::Error;

/// Errors that can occur when talking to the JD open platform.
#[derive(Debug, Error)]
pub enum JdError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Platform-level rejection (`error_response`): bad sign, expired token, etc.
    #[error("JD API error {code}: {message}")]
    Api { code: String, message: String },

    /// The method ran but reported `success=false`.
    #[error("JD business error {code}: {message}")]
    Business { code: String, message: String },

    #[error("No response envelope for method {method}")]
    MissingResponse { method: String },

    #[error("Account {account} has no usable access token")]
    Unauthorized { account: String },

    #[error("JD OAuth error {code}: {message}")]
    OAuth { code: String, message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = JdError::Api {
            code: "19".into(),
            message: "Invalid access_token".into(),
        };
        assert_eq!(err.to_string(), "JD API error 19: Invalid access_token");
    }

    #[test]
    fn test_unauthorized_display_names_account() {
        let err = JdError::Unauthorized {
            account: "acc-1".into(),
        };
        assert_eq!(err.to_string(), "Account acc-1 has no usable access token");
    }
}
