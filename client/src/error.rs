use reqwest::StatusCode;

/// An error talking to the game service.
#[derive(Debug, thiserror::Error)]
#[remain::sorted]
pub enum Error {
    /// The base URL cannot have paths appended.
    #[error("{0} cannot be used as a base URL")]
    BaseUrl(url::Url),
    /// A response body could not be decoded.
    #[error("failed to decode response from {endpoint}: {source}")]
    Decode {
        /// The endpoint path.
        endpoint: String,
        /// The decoding error.
        #[source]
        source: serde_json::Error,
    },
    /// A request failed in transport.
    #[error("request to {endpoint} failed: {source}")]
    Http {
        /// The endpoint path.
        endpoint: String,
        /// The transport error.
        #[source]
        source: reqwest::Error,
    },
    /// The service responded with a non-success status.
    #[error("{endpoint} responded with {status}: {body}")]
    Status {
        /// The endpoint path.
        endpoint: String,
        /// The response status.
        status: StatusCode,
        /// The response body, if readable.
        body: String,
    },
    /// The base URL could not be parsed.
    #[error("invalid base URL: {0}")]
    Url(#[from] url::ParseError),
}
