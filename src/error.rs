use std::path::PathBuf;

use crate::types::ObjectKind;
use crate::Id;

/// error type for revgraph operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("object not found: {0}")]
    NotFound(Id),

    #[error("wrong object kind for {id}: expected {expected}, found {actual}")]
    WrongKind {
        id: Id,
        expected: ObjectKind,
        actual: ObjectKind,
    },

    #[error("{0} does not resolve to a commit")]
    NonCommitObject(Id),

    #[error("no common ancestor between {a} and {b}")]
    NoCommonAncestor { a: Id, b: Id },

    #[error("branch has no commits yet")]
    UnbornBranch,

    #[error("head is detached or missing")]
    DetachedOrMissing,

    #[error("path not found in tree: {0}")]
    PathNotFound(String),

    #[error("ambiguous path: {0} traverses a non-directory entry")]
    AmbiguousPath(String),

    #[error("invalid pathspec: {0}")]
    InvalidPathspec(String),

    #[error("invalid tree entry name: {0}")]
    InvalidEntryName(String),

    #[error("duplicate tree entry name: {0}")]
    DuplicateEntryName(String),

    #[error("duplicate index path: {0}")]
    DuplicateIndexPath(String),

    #[error("invalid hash hex: {0}")]
    InvalidHashHex(String),

    #[error("cbor serialization error: {0}")]
    CborEncode(#[from] ciborium::ser::Error<std::io::Error>),

    #[error("io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, Error>;

/// helper to wrap io errors with path context
pub trait IoResultExt<T> {
    fn with_path(self, path: impl Into<PathBuf>) -> Result<T>;
}

impl<T> IoResultExt<T> for std::io::Result<T> {
    fn with_path(self, path: impl Into<PathBuf>) -> Result<T> {
        self.map_err(|source| Error::Io {
            path: path.into(),
            source,
        })
    }
}
