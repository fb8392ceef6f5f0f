use std::fmt;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Io,
    Parse,
    NotFound,
    InvalidArgument,
    Internal,
    InvalidInput,
    InvalidState,
    Corrupt,
    Indexing,
}

#[derive(Debug)]
pub struct Error {
    pub kind: ErrorKind,
    pub context: String,
}

impl Error {
    pub fn new(kind: ErrorKind, context: String) -> Self {
        Error { kind, context }
    }

    /// I/O failure on a named index structure, e.g. ("lexicon", "idx/data.lex")
    pub fn io_context(structure: &str, path: &Path, err: std::io::Error) -> Self {
        Error {
            kind: ErrorKind::Io,
            context: format!("{} at {}: {}", structure, path.display(), err),
        }
    }

    /// Prefix the context with where the error surfaced, keeping the kind.
    pub fn within(self, context: &str) -> Self {
        Error {
            kind: self.kind,
            context: format!("{}: {}", context, self.context),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.context)
    }
}

impl std::error::Error for Error {}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error {
            kind: ErrorKind::Io,
            context: err.to_string(),
        }
    }
}

impl From<bincode::Error> for Error {
    fn from(err: bincode::Error) -> Self {
        Error {
            kind: ErrorKind::Parse,
            context: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error {
            kind: ErrorKind::Parse,
            context: format!("JSON error: {}", err),
        }
    }
}

impl From<fst::Error> for Error {
    fn from(err: fst::Error) -> Self {
        Error {
            kind: ErrorKind::Internal,
            context: format!("FST error: {}", err),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
