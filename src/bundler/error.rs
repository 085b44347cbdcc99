//! Error types for bundling operations.
//!
//! Mirrors the context-chaining style used across the bundler: low-level
//! failures are wrapped with a short description of what was being done,
//! and filesystem failures additionally carry the offending path.

use std::{
    fmt::Display,
    io,
    path::{Path, PathBuf},
};

use crate::bundler::icon::IconError;

/// Result type alias for bundler operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while bundling
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Error with additional context
    #[error("{context}: {source}")]
    Context {
        /// What was being done
        context: String,
        /// Underlying failure
        source: Box<Error>,
    },

    /// Filesystem failure tied to a path
    #[error("{context} {path}: {error}")]
    Fs {
        /// What was being done
        context: &'static str,
        /// Path involved
        path: PathBuf,
        /// Underlying IO error
        error: io::Error,
    },

    /// External command exited unsuccessfully
    #[error("{command} failed: {reason}")]
    CommandFailed {
        /// Command line that was run
        command: String,
        /// Captured stderr or exit description
        reason: String,
    },

    /// Icon composition failure
    #[error(transparent)]
    Icon(#[from] IconError),

    /// Directory traversal failure
    #[error("Walkdir error: {0}")]
    Walkdir(#[from] walkdir::Error),

    /// Path prefix stripping failure
    #[error("Path prefix error: {0}")]
    StripPrefix(#[from] std::path::StripPrefixError),

    /// IO errors
    #[error("{0}")]
    IoError(#[from] io::Error),

    /// Free-form error
    #[error("{0}")]
    GenericError(String),
}

/// Attach context to a fallible value.
pub trait Context<T> {
    /// Wrap the error with a fixed context message.
    fn context<C>(self, context: C) -> Result<T>
    where
        C: Display + Send + Sync + 'static;

    /// Wrap the error with a lazily computed context message.
    fn with_context<C, F>(self, f: F) -> Result<T>
    where
        C: Display + Send + Sync + 'static,
        F: FnOnce() -> C;
}

impl<T> Context<T> for Result<T> {
    fn context<C>(self, context: C) -> Result<T>
    where
        C: Display + Send + Sync + 'static,
    {
        self.map_err(|e| Error::Context {
            context: context.to_string(),
            source: Box::new(e),
        })
    }

    fn with_context<C, F>(self, f: F) -> Result<T>
    where
        C: Display + Send + Sync + 'static,
        F: FnOnce() -> C,
    {
        self.map_err(|e| Error::Context {
            context: f().to_string(),
            source: Box::new(e),
        })
    }
}

impl<T> Context<T> for Option<T> {
    fn context<C>(self, context: C) -> Result<T>
    where
        C: Display + Send + Sync + 'static,
    {
        self.ok_or_else(|| Error::GenericError(context.to_string()))
    }

    fn with_context<C, F>(self, f: F) -> Result<T>
    where
        C: Display + Send + Sync + 'static,
        F: FnOnce() -> C,
    {
        self.ok_or_else(|| Error::GenericError(f().to_string()))
    }
}

/// Attach a filesystem path to IO failures.
pub trait ErrorExt<T> {
    /// Convert an IO error into [`Error::Fs`] naming the path.
    fn fs_context(self, context: &'static str, path: impl AsRef<Path>) -> Result<T>;
}

impl<T> ErrorExt<T> for std::result::Result<T, io::Error> {
    fn fs_context(self, context: &'static str, path: impl AsRef<Path>) -> Result<T> {
        self.map_err(|error| Error::Fs {
            context,
            path: path.as_ref().to_path_buf(),
            error,
        })
    }
}

/// Return early with a [`Error::GenericError`] built from a format string.
#[macro_export]
macro_rules! bail {
    ($msg:literal $(,)?) => {
        return Err($crate::bundler::Error::GenericError(format!($msg)))
    };
    ($fmt:expr, $($arg:tt)*) => {
        return Err($crate::bundler::Error::GenericError(format!($fmt, $($arg)*)))
    };
}
