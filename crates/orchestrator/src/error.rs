#![forbid(unsafe_code)]

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid resource #{index}: {url:?}")]
    InvalidResource { index: usize, url: String },

    #[error("failed to build http client: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid path: {0}")]
    InvalidPath(PathBuf),
}
