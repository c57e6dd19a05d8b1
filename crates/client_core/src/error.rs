use shared::error::BackendRejection;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("invalid server url '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error("server url must start with http:// or https://: {0}")]
    UnsupportedScheme(String),
    #[error("request to {endpoint} failed: {source}")]
    Transport {
        endpoint: &'static str,
        #[source]
        source: reqwest::Error,
    },
    #[error("request to {endpoint} timed out")]
    Timeout { endpoint: &'static str },
    #[error(transparent)]
    Rejected(#[from] BackendRejection),
}

impl ClientError {
    pub(crate) fn transport(endpoint: &'static str, source: reqwest::Error) -> Self {
        if source.is_timeout() {
            Self::Timeout { endpoint }
        } else {
            Self::Transport { endpoint, source }
        }
    }
}

/// Upload failures are shown to the operator instead of being retried.
#[derive(Debug, Error)]
pub enum UploadError {
    #[error("failed to read '{path}': {source}")]
    ReadFile {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("'{0}' has no usable file name")]
    MissingFileName(String),
    #[error("upload transport failed: {0}")]
    Transport(#[source] reqwest::Error),
    #[error("upload rejected ({status}): {message}")]
    Rejected { status: u16, message: String },
    #[error("upload response was not understood: {0}")]
    InvalidResponse(#[source] reqwest::Error),
}

impl From<BackendRejection> for UploadError {
    fn from(value: BackendRejection) -> Self {
        Self::Rejected {
            status: value.status,
            message: value.message,
        }
    }
}
