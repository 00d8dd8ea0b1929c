use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("Remote rejected request with status {status}: {body}")]
    Rejected { status: u16, body: String },
    #[error("Could not decode response: {0}")]
    Decode(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("Could not look up or create tournament {slug}: {source}")]
    Bootstrap {
        slug: String,
        #[source]
        source: ApiError,
    },
    #[error("Submission to {url} failed: {source}")]
    Submission {
        url: String,
        #[source]
        source: ApiError,
    },
    #[error("Response from {url} carries no identifier")]
    MissingIdentifier { url: String },
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("URL {0} has no host to derive the API root from")]
    UnsupportedUrl(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Csv(#[from] csv::Error),
}
