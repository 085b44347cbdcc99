//! Error taxonomy for the volume icon pipeline.

use std::path::PathBuf;

use super::container::VariantTag;

/// Failures raised while composing a volume icon.
///
/// Only [`IconError::ToolchainUnavailable`] is recoverable: the caller falls
/// back to copying the template icon. Everything else aborts the run before
/// anything is written to the destination.
#[derive(Debug, thiserror::Error)]
pub enum IconError {
    /// Image engine missing even after an installation attempt
    #[error("{engine} is unavailable; falling back to the unmodified template icon")]
    ToolchainUnavailable {
        /// Engine display name
        engine: String,
    },

    /// Input bytes are not a valid icon container
    #[error("malformed icon container: {reason}")]
    MalformedContainer {
        /// What was wrong with the framing
        reason: String,
    },

    /// A variant's image could not be decoded or has no usable size
    #[error("cannot decode image for variant {tag}: {reason}")]
    ImageDecode {
        /// Variant being composed
        tag: VariantTag,
        /// Decoder or probe message
        reason: String,
    },

    /// Template icon lacks the variant every composed icon must carry
    #[error("template icon has no {tag} variant; the composed icon requires it")]
    MissingMaximumVariant {
        /// The maximum variant tag
        tag: VariantTag,
    },

    /// An image engine invocation failed or timed out
    #[error("image engine command `{command}` failed: {reason}")]
    EngineFailed {
        /// Command line that was run
        command: String,
        /// Captured stderr, exit status or timeout notice
        reason: String,
    },

    /// A composition task panicked or was cancelled
    #[error("composition task did not complete: {reason}")]
    TaskFailed {
        /// Join error message
        reason: String,
    },

    /// Reading inputs or writing scratch files failed
    #[error("{context} {path}: {source}")]
    Io {
        /// What was being done
        context: &'static str,
        /// Path involved
        path: PathBuf,
        /// Underlying IO error
        source: std::io::Error,
    },
}

impl IconError {
    pub(crate) fn io(context: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        IconError::Io {
            context,
            path: path.into(),
            source,
        }
    }
}
