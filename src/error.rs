// src/error.rs

//! Error types for vendpack
//!
//! Every engine operation returns [`Result`]. Callers are expected to branch
//! on exactly one condition, "not found" (see [`Error::is_not_found`]); every
//! other variant aborts the current pack or unpack.

use std::io;
use thiserror::Error;

/// Result alias used throughout the library
pub type Result<T> = std::result::Result<T, Error>;

/// Library error taxonomy
#[derive(Error, Debug)]
pub enum Error {
    /// A path does not exist in the filesystem or archive being queried
    #[error("not found: {0}")]
    NotFound(String),

    /// Path is malformed or escapes its root
    #[error("invalid path: {0}")]
    InvalidPath(String),

    /// Missing parameter, unknown whitelisted module, absent ledger file
    #[error("{0}")]
    Precondition(String),

    /// An external toolchain command failed
    #[error("{command} failed: {stderr}")]
    Collaborator { command: String, stderr: String },

    /// Archive or ledger content cannot be interpreted
    #[error("corrupt data: {0}")]
    Corrupt(String),

    /// Inputs disagree with each other (unattributed package, missing checksum)
    #[error("{0}")]
    Consistency(String),

    #[error(transparent)]
    Io(#[from] io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// Annotation layer around an underlying error; the cause is reachable
    /// through `source()` and is not repeated in the message
    #[error("{context}")]
    Context {
        context: String,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// Wrap this error with an annotation, keeping it as the source
    pub fn context(self, context: impl Into<String>) -> Self {
        Error::Context {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// True if this error, or the error it annotates, reports a missing path
    pub fn is_not_found(&self) -> bool {
        match self {
            Error::NotFound(_) => true,
            Error::Io(e) => e.kind() == io::ErrorKind::NotFound,
            Error::Context { source, .. } => source.is_not_found(),
            _ => false,
        }
    }
}

/// Context helpers for `Result`, in the spirit of `anyhow::Context`
pub trait ResultExt<T> {
    fn context(self, context: impl Into<String>) -> Result<T>;

    fn with_context<C, F>(self, f: F) -> Result<T>
    where
        C: Into<String>,
        F: FnOnce() -> C;
}

impl<T, E> ResultExt<T> for std::result::Result<T, E>
where
    E: Into<Error>,
{
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| Into::<Error>::into(e).context(context))
    }

    fn with_context<C, F>(self, f: F) -> Result<T>
    where
        C: Into<String>,
        F: FnOnce() -> C,
    {
        self.map_err(|e| Into::<Error>::into(e).context(f()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_through_context() {
        let err = Error::NotFound("vendor/x".into())
            .context("reading module")
            .context("unpacking x");
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "unpacking x");
    }

    #[test]
    fn test_context_chain_prints_each_cause_once() {
        use std::error::Error as _;

        let err = Error::NotFound("vendor/x".into())
            .context("reading module")
            .context("unpacking x");
        let mut chain = vec![err.to_string()];
        let mut cause = err.source();
        while let Some(e) = cause {
            chain.push(e.to_string());
            cause = e.source();
        }
        assert_eq!(chain, vec!["unpacking x", "reading module", "not found: vendor/x"]);

        let report = format!("{:#}", anyhow::Error::new(err));
        assert_eq!(report.matches("vendor/x").count(), 1);
    }

    #[test]
    fn test_io_not_found_is_not_found() {
        let err: Error = io::Error::new(io::ErrorKind::NotFound, "gone").into();
        assert!(err.is_not_found());

        let err: Error = io::Error::new(io::ErrorKind::PermissionDenied, "nope").into();
        assert!(!err.is_not_found());
    }

    #[test]
    fn test_result_ext_context() {
        let res: std::result::Result<(), io::Error> =
            Err(io::Error::new(io::ErrorKind::NotFound, "gone"));
        let err = res.with_context(|| format!("stat {}", "go.sum")).unwrap_err();
        assert!(err.is_not_found());
        assert!(err.to_string().starts_with("stat go.sum"));
    }

    #[test]
    fn test_other_kinds_are_not_not_found() {
        assert!(!Error::Corrupt("bad".into()).is_not_found());
        assert!(!Error::Precondition("x".into()).context("y").is_not_found());
    }
}
