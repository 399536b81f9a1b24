use std::path::PathBuf;

/// Errors that can occur in sjscan.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid parameter: {0}")]
    Parameter(String),

    #[error("I/O error: {source} ({path})")]
    Io {
        source: std::io::Error,
        path: PathBuf,
    },

    #[error("FASTA parsing error: {0}")]
    Fasta(String),

    #[error("alignment error: {0}")]
    Alignment(String),

    #[error("depth error: {0}")]
    Depth(String),

    #[error("junction table error at line {line}: {message}")]
    Table { line: usize, message: String },
}

impl Error {
    /// Convenience for wrapping an `io::Error` with a path context.
    pub fn io(source: std::io::Error, path: impl Into<PathBuf>) -> Self {
        Self::Io {
            source,
            path: path.into(),
        }
    }

    /// Malformed row in a junction table.
    pub fn table(line: usize, message: impl Into<String>) -> Self {
        Self::Table {
            line,
            message: message.into(),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            source: err,
            path: PathBuf::from("<unknown>"),
        }
    }
}
