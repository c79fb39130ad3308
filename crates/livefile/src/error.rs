//! Error type for live file operations.
//!
//! Every failure the crate can report is a variant of [`Error`], which
//! integrates with [`miette`] for rich terminal diagnostics.
//!
//! # Where Errors Surface
//!
//! | Variant | Delivered |
//! |---------|-----------|
//! | [`Error::UnsupportedEvent`] | synchronously from [`LiveFile::handle`](crate::LiveFile::handle) |
//! | [`Error::HandlerMismatch`] | synchronously from [`LiveFile::handle`](crate::LiveFile::handle) |
//! | [`Error::NoRenderer`] | synchronously from [`LiveFile::render`](crate::LiveFile::render) |
//! | [`Error::Render`] | synchronously from [`LiveFile::render`](crate::LiveFile::render) |
//! | [`Error::Destroyed`] | synchronously from [`LiveFile::reload`](crate::LiveFile::reload) |
//! | [`Error::Watch`] | through the `error` handler |
//! | [`Error::WatchPath`] | through the `error` handler |
//! | [`Error::Read`] | through the `error` handler |
//! | [`Error::Spawn`] | through the `error` handler, or from `reload` |

use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error as ThisError;

/// Boxed error returned by renderers.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors produced while watching, reading, or rendering a live file.
#[derive(Debug, ThisError, Diagnostic)]
#[non_exhaustive]
pub enum Error {
    /// An event kind other than `reload` or `error` was requested.
    #[error("unsupported event kind '{name}'")]
    #[diagnostic(
        code(livefile::unsupported_event),
        help("supported event kinds are 'reload' and 'error'")
    )]
    UnsupportedEvent {
        /// The rejected event name.
        name: String,
    },

    /// A handler was registered under an event kind it cannot serve.
    #[error("a {handler} handler cannot be registered for '{event}' events")]
    #[diagnostic(
        code(livefile::handler_mismatch),
        help("use Handler::reload for 'reload' and Handler::error for 'error'")
    )]
    HandlerMismatch {
        /// The event kind requested.
        event: &'static str,
        /// The kind of handler supplied.
        handler: &'static str,
    },

    /// `render` was called with no renderer configured.
    #[error("no renderer configured")]
    #[diagnostic(
        code(livefile::no_renderer),
        help("supply a renderer on the builder or call set_renderer first")
    )]
    NoRenderer,

    /// The renderer itself failed.
    #[error("renderer failed: {source}")]
    #[diagnostic(code(livefile::render_failed))]
    Render {
        /// The renderer's error.
        #[source]
        source: BoxError,
    },

    /// The watch subscription reported a failure.
    #[error("failed to watch '{path}': {source}")]
    #[diagnostic(
        code(livefile::watch_failed),
        help("ensure the file's directory exists and is readable")
    )]
    Watch {
        /// The watched file.
        path: PathBuf,
        /// The underlying notify error.
        #[source]
        source: notify::Error,
    },

    /// The path cannot be watched at all.
    #[error("cannot watch '{path}': {message}")]
    #[diagnostic(
        code(livefile::watch_path),
        help("pass a path that names a file, not a directory or root")
    )]
    WatchPath {
        /// The offending path.
        path: PathBuf,
        /// Human-readable reason.
        message: String,
    },

    /// Reading the file failed. The previous content is retained.
    #[error("failed to read '{path}': {source}")]
    #[diagnostic(
        code(livefile::read_failed),
        help("the previous content remains active; save the file again to retry")
    )]
    Read {
        /// The file that could not be read.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A background thread could not be spawned.
    #[error("failed to spawn {what} thread: {source}")]
    #[diagnostic(code(livefile::spawn_failed))]
    Spawn {
        /// Which thread.
        what: &'static str,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The live file has been destroyed.
    #[error("live file has been destroyed")]
    #[diagnostic(
        code(livefile::destroyed),
        help("create a new LiveFile to continue watching")
    )]
    Destroyed,
}

impl Error {
    /// Create a new `UnsupportedEvent` error.
    pub fn unsupported_event(name: impl Into<String>) -> Self {
        Self::UnsupportedEvent { name: name.into() }
    }

    /// Create a new `Render` error.
    pub fn render(source: impl Into<BoxError>) -> Self {
        Self::Render {
            source: source.into(),
        }
    }

    /// Create a new `Watch` error.
    pub fn watch(path: impl Into<PathBuf>, source: notify::Error) -> Self {
        Self::Watch {
            path: path.into(),
            source,
        }
    }

    /// Create a new `WatchPath` error.
    pub fn watch_path(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::WatchPath {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a new `Read` error.
    pub fn read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Read {
            path: path.into(),
            source,
        }
    }

    /// Create a new `Spawn` error.
    pub fn spawn(what: &'static str, source: std::io::Error) -> Self {
        Self::Spawn { what, source }
    }

    /// Returns `true` for failures that arrive through the `error` handler.
    #[must_use]
    pub const fn is_async(&self) -> bool {
        matches!(
            self,
            Self::Watch { .. } | Self::WatchPath { .. } | Self::Read { .. } | Self::Spawn { .. }
        )
    }
}
