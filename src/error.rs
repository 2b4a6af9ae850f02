//! Application-wide error types.
//!
//! Library modules return [`Error`] via `thiserror`, while the command layer
//! uses `anyhow` for convenient error propagation.
//!
//! # Design
//!
//! - [`Error`]: Top-level application error enum
//! - [`crate::config::ConfigError`] for configuration file problems
//! - Per-track failures ([`Error::TagUnreadable`], [`Error::TagUnwritable`])
//!   are logged by the caller and never abort a loop over the library

use std::path::PathBuf;

use crate::config::ConfigError;

/// Application-wide result type.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level application error.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// File I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A required directory could not be read
    #[error("cannot read {path}: {source}")]
    Filesystem {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The embedded tag could not be parsed
    #[error("tags for {path} could not be read: {message}")]
    TagUnreadable { path: PathBuf, message: String },

    /// The embedded tag could not be rewritten
    #[error("tags for {path} could not be written: {message}")]
    TagUnwritable { path: PathBuf, message: String },

    /// The tag already carries the requested values
    #[error("no edit required for {0}")]
    NoEditRequired(PathBuf),

    /// Reconciliation was requested before the tags were read
    #[error("tags for {0} have not been read")]
    NotReady(PathBuf),

    /// A flag value is unusable
    #[error("invalid value {value:?} for flag -{flag}: {reason}")]
    UserInput {
        flag: String,
        value: String,
        reason: String,
    },

    /// Configuration file error
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Every optional activity of a command was disabled
    #[error("{0}")]
    NoWork(String),

    /// The media indexing service could not be managed
    #[error("service error: {0}")]
    Service(String),

    /// Generic error with context
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// Create a tag read error.
    pub fn tag_unreadable(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::TagUnreadable {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a tag write error.
    pub fn tag_unwritable(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::TagUnwritable {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a user input error.
    pub fn user_input(
        flag: impl Into<String>,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::UserInput {
            flag: flag.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// Create a directory read error.
    pub fn filesystem(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Filesystem {
            path: path.into(),
            source,
        }
    }

    /// Add context to an error.
    pub fn context(self, ctx: impl Into<String>) -> Self {
        Self::WithContext {
            context: ctx.into(),
            source: Box::new(self),
        }
    }
}

/// Extension trait for adding context to Results.
pub trait ResultExt<T> {
    /// Add context to an error result.
    fn with_context(self, ctx: impl Into<String>) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn with_context(self, ctx: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.context(ctx))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, std::io::Error> {
    fn with_context(self, ctx: impl Into<String>) -> Result<T> {
        self.map_err(|e| Error::Io(e).context(ctx))
    }
}
