use std::io;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Path does not exist: {}", path.display())]
    PathNotFound { path: PathBuf },

    #[error("Could not read {}: {source}", path.display())]
    Read { path: PathBuf, source: io::Error },

    #[error("Could not write output: {0}")]
    Output(#[from] io::Error),

    #[error("Invalid filespec pattern '{spec}': {source}")]
    InvalidFilespec {
        spec: String,
        source: glob::PatternError,
    },

    #[error("Too many entries in directory tree (limit {limit})")]
    TooManyEntries { limit: usize },

    #[error("Could not start logger: {0}")]
    Logger(#[from] flexi_logger::FlexiLoggerError),
}

pub type Result<T> = std::result::Result<T, Error>;
