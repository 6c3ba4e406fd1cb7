use thiserror::Error;

/// Errors talking to the relayer or the config service over HTTP.
#[derive(Debug, Error)]
pub enum RelayerError {
    /// Non-2xx HTTP status or a non-200 application status in the response envelope.
    ///
    /// `body` is the envelope message when present, otherwise the raw response text.
    #[error("relayer responded with status {status}: {body}")]
    Status {
        /// HTTP or envelope status code.
        status: u16,
        /// Raw response body or envelope message.
        body: String,
    },
    /// The envelope reported success without a `data` field.
    #[error("relayer response is missing data: {0}")]
    MissingData(String),
    /// The request could not be sent or the response could not be read.
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    /// The response body is not the expected JSON.
    #[error("invalid relayer response: {0}")]
    Decode(#[from] serde_json::Error),
    /// The endpoint URL could not be built.
    #[error(transparent)]
    Url(#[from] url::ParseError),
}

impl RelayerError {
    /// Returns the HTTP or application status carried by the error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Http(err) => err.status().map(|status| status.as_u16()),
            Self::MissingData(_) | Self::Decode(_) | Self::Url(_) => None,
        }
    }
}
