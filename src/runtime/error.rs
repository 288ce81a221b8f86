use std::time::Duration;

use hyper::StatusCode;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to build request for `{path}`: {source}")]
    Request {
        path: String,
        #[source]
        source: hyper::http::Error,
    },
    #[error("request to `{path}` failed: {source}")]
    Transport {
        path: String,
        #[source]
        source: hyper_util::client::legacy::Error,
    },
    #[error("request to `{path}` timed out after {timeout:?}")]
    Timeout { path: String, timeout: Duration },
    #[error("failed to read response body of `{path}`: {source}")]
    Body {
        path: String,
        #[source]
        source: hyper::Error,
    },
    #[error("runtime answered `{path}` with status {status}: {message}")]
    Status {
        path: String,
        status: StatusCode,
        message: String,
    },
    #[error("failed to decode response of `{path}`: {source}")]
    Decode {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

impl Error {
    /// True when the runtime reports the container as gone or stopped, which
    /// is expected churn rather than a fault.
    pub fn is_not_running(&self) -> bool {
        match self {
            Error::Status {
                status, message, ..
            } => {
                *status == StatusCode::NOT_FOUND
                    || *status == StatusCode::CONFLICT
                    || message.contains("is not running")
                    || message.contains("No such container")
            }
            _ => false,
        }
    }

    /// The runtime's own explanation when it rejected the call, otherwise the
    /// full error text.
    pub fn upstream_message(&self) -> String {
        match self {
            Error::Status { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    fn status(status: StatusCode, message: &str) -> Error {
        Error::Status {
            path: "/containers/abc/stats".to_owned(),
            status,
            message: message.to_owned(),
        }
    }

    #[test]
    fn test_is_not_running() {
        assert!(status(StatusCode::NOT_FOUND, "No such container: abc").is_not_running());
        assert!(status(StatusCode::CONFLICT, "container abc is not running").is_not_running());
        assert!(
            status(StatusCode::INTERNAL_SERVER_ERROR, "container abc is not running")
                .is_not_running()
        );
        assert!(!status(StatusCode::INTERNAL_SERVER_ERROR, "boom").is_not_running());
        assert!(
            !Error::Timeout {
                path: "/x".to_owned(),
                timeout: Duration::from_secs(5)
            }
            .is_not_running()
        );
    }

    #[test]
    fn test_upstream_message() {
        assert_eq!(
            status(StatusCode::INTERNAL_SERVER_ERROR, "cannot restart").upstream_message(),
            "cannot restart"
        );
        let timeout = Error::Timeout {
            path: "/x".to_owned(),
            timeout: Duration::from_secs(10),
        };
        assert_eq!(timeout.upstream_message(), "request to `/x` timed out after 10s");
    }
}
