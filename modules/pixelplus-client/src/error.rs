use thiserror::Error;

pub type Result<T> = std::result::Result<T, PixelPlusError>;

#[derive(Debug, Error)]
pub enum PixelPlusError {
    /// The request never got an HTTP answer (connect, TLS, timeout).
    #[error("pixelplus request failed: {0}")]
    Request(String),

    /// The provider answered with a non-success status. `body` is the raw
    /// text, which usually carries the provider's own error message.
    #[error("pixelplus {endpoint} returned {status}: {body}")]
    Status {
        endpoint: &'static str,
        status: u16,
        body: String,
    },

    /// Success status, but the body is not the JSON this endpoint returns.
    #[error("pixelplus {endpoint} sent an unreadable body: {message}")]
    MalformedBody {
        endpoint: &'static str,
        message: String,
    },

    #[error("invalid pixelplus endpoint url: {0}")]
    InvalidEndpoint(String),
}

impl PixelPlusError {
    /// HTTP status of a rejected call, if the provider answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            PixelPlusError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for PixelPlusError {
    fn from(err: reqwest::Error) -> Self {
        PixelPlusError::Request(err.to_string())
    }
}

impl From<url::ParseError> for PixelPlusError {
    fn from(err: url::ParseError) -> Self {
        PixelPlusError::InvalidEndpoint(err.to_string())
    }
}
