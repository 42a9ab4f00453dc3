use thiserror::Error;

#[derive(Error, Debug)]
pub enum VapixError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Camera returned HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    #[error("Authentication error: {0}")]
    AuthenticationError(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Not connected")]
    NotConnected(),
}

pub type Result<T> = std::result::Result<T, VapixError>;
