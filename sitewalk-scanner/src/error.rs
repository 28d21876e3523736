use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("{url} returned HTTP {status}")]
    HttpStatus { url: String, status: u16 },

    #[error("{url} is not an HTML page (content-type: {content_type})")]
    NotHtml { url: String, content_type: String },

    #[error("Page load timed out after {0}s")]
    Timeout(u64),
}

pub type Result<T> = std::result::Result<T, ScanError>;
