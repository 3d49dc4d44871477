//! Error type for page fetches

/// Error from fetching a single listing page.
///
/// Fetches are never retried inside the pipeline: the error surfaces to
/// the sync driver, which aborts the run.
#[derive(Debug)]
pub enum FetchError {
    /// Server answered with a non-success status
    Status { status: u16, message: String },
    /// Connection, TLS, redirect or body decoding failure
    Transport(String),
}

impl std::fmt::Display for FetchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Status { status, message } => write!(f, "HTTP {status}: {message}"),
            Self::Transport(message) => write!(f, "HTTP error: {message}"),
        }
    }
}

impl std::error::Error for FetchError {}

impl FetchError {
    /// Create fetch error from reqwest error
    pub fn from_reqwest(e: &reqwest::Error) -> Self {
        let message = e.to_string();
        match e.status() {
            Some(s) => Self::Status {
                status: s.as_u16(),
                message,
            },
            None => Self::Transport(message),
        }
    }

    /// HTTP status code, if the server answered at all
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Transport(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_with_status() {
        let err = FetchError::Status {
            status: 503,
            message: "unavailable".to_string(),
        };
        assert_eq!(format!("{err}"), "HTTP 503: unavailable");
    }

    #[test]
    fn display_transport() {
        let err = FetchError::Transport("connection refused".to_string());
        assert_eq!(format!("{err}"), "HTTP error: connection refused");
    }

    #[test]
    fn status_accessor() {
        let err = FetchError::Status {
            status: 404,
            message: "not found".to_string(),
        };
        assert_eq!(err.status(), Some(404));
        assert_eq!(FetchError::Transport("x".into()).status(), None);
    }

    #[test]
    fn boxes_as_std_error() {
        let err: Box<dyn std::error::Error> = Box::new(FetchError::Transport("reset".into()));
        assert!(err.to_string().contains("reset"));
    }
}
