//! error handling for the scraper
use reqwest::StatusCode;
use thiserror::Error;

/// Everything that can go wrong while scraping or batching posts.
#[derive(Debug, Error)]
pub enum Error {
    /// a transport-level http error
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// a non-success http status
    #[error("http status {status} for {url}")]
    Status {
        /// the status the server answered with
        status: StatusCode,
        /// the request url
        url: String,
    },

    /// an i/o error
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// a json error
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// a malformed date in the stats block
    #[error("date parse error: {0}")]
    DateParse(#[from] chrono::ParseError),

    /// a malformed number in the stats block
    #[error("int parse error: {0}")]
    ParseInt(#[from] std::num::ParseIntError),

    /// a config error
    #[error("config error: {0}")]
    Config(#[from] config::ConfigError),

    /// a toml serialization error
    #[error("toml serialization error: {0}")]
    TomlSer(#[from] toml::ser::Error),
}

/// A result using [`Error`] as the `Err` variant
pub type Result<T, E = Error> = std::result::Result<T, E>;

impl Error {
    /// Whether this is a transient transport failure worth retrying.
    ///
    /// HTTP status errors and parse errors are terminal and must surface to
    /// the caller on the first attempt.
    pub fn is_transient(&self) -> bool {
        match self {
            Error::Http(e) => e.is_timeout() || e.is_connect(),
            Error::Io(e) => matches!(
                e.kind(),
                std::io::ErrorKind::TimedOut
                    | std::io::ErrorKind::ConnectionRefused
                    | std::io::ErrorKind::ConnectionReset
                    | std::io::ErrorKind::ConnectionAborted
                    | std::io::ErrorKind::BrokenPipe
                    | std::io::ErrorKind::Interrupted
            ),
            _ => false,
        }
    }
}
