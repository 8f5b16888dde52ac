//! One error type for the whole binary. Remote failures inside a running
//! task are reported and swallowed by the caller; only configuration
//! problems abort before the task starts.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("{0}")]
    Config(String),

    #[error("config file is not valid TOML: {0}")]
    ConfigSyntax(#[from] toml::de::Error),

    #[error("channel #{0} not found")]
    ChannelNotFound(String),

    /// The service answered but refused the call (e.g. Slack `ok: false`).
    #[error("{service} error: {message}")]
    Api { service: &'static str, message: String },

    #[error("request failed: {0}")]
    Unavailable(#[from] reqwest::Error),

    #[error("malformed response: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
