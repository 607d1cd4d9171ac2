use thiserror::Error;

/// Failure of a single gateway call against one context
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GatewayError {
    /// Kubeconfig unreadable, or no usable client for the context
    #[error("{0}")]
    Configuration(String),

    /// The cluster answered 403
    #[error("permission denied: {0}")]
    Permission(String),

    /// The cluster answered 404
    #[error("{0}")]
    NotFound(String),

    /// Any other API or network failure
    #[error("{0}")]
    Transport(String),
}

pub type Result<T, E = GatewayError> = std::result::Result<T, E>;

impl GatewayError {
    /// Classify a failure carrying an HTTP status code
    pub fn from_status(code: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        match code {
            403 => Self::Permission(message),
            404 => Self::NotFound(message),
            _ => Self::Transport(message),
        }
    }

    pub fn is_permission(&self) -> bool {
        matches!(self, Self::Permission(_))
    }
}

impl From<kube::Error> for GatewayError {
    fn from(err: kube::Error) -> Self {
        match err {
            kube::Error::Api(response) => Self::from_status(
                response.code,
                format!("({}) {}: {}", response.code, response.reason, response.message),
            ),
            other => Self::Transport(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kube::core::ErrorResponse;

    fn api_error(code: u16, reason: &str) -> kube::Error {
        kube::Error::Api(ErrorResponse {
            status: "Failure".to_string(),
            message: format!("pods \"web-0\" is {}", reason.to_lowercase()),
            reason: reason.to_string(),
            code,
        })
    }

    #[test]
    fn test_forbidden_maps_to_permission() {
        let err = GatewayError::from(api_error(403, "Forbidden"));
        assert!(err.is_permission());
    }

    #[test]
    fn test_not_found_is_distinct() {
        let err = GatewayError::from(api_error(404, "NotFound"));
        assert!(matches!(err, GatewayError::NotFound(_)));
        assert!(err.to_string().contains("(404) NotFound"));
    }

    #[test]
    fn test_other_codes_are_transport() {
        let err = GatewayError::from(api_error(500, "InternalError"));
        assert!(matches!(err, GatewayError::Transport(_)));
        assert!(!err.is_permission());

        let err = GatewayError::from_status(401, "Unauthorized");
        assert_eq!(err, GatewayError::Transport("Unauthorized".to_string()));
    }
}
