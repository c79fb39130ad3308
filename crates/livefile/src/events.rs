//! Event kinds, payloads and the handler table.
//!
//! A [`LiveFile`](crate::LiveFile) emits exactly two kinds of events:
//! - `reload` with a [`Reload`] payload after each successful read
//! - `error` with an [`Error`] after each watch or read failure
//!
//! At most one handler is bound per kind. Registering again replaces the
//! previous handler.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Instant;

use crate::Error;

/// Callback invoked after a successful reload.
pub type ReloadCallback = Arc<dyn Fn(Reload) + Send + Sync + 'static>;

/// Callback invoked on an asynchronous failure.
pub type ErrorCallback = Arc<dyn Fn(Error) + Send + Sync + 'static>;

/// The closed set of event kinds a live file emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// Content was replaced by a successful read.
    Reload,
    /// A watch or read operation failed.
    Error,
}

impl EventKind {
    /// The event's registration name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Reload => "reload",
            Self::Error => "error",
        }
    }
}

impl FromStr for EventKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "reload" => Ok(Self::Reload),
            "error" => Ok(Self::Error),
            other => Err(Error::unsupported_event(other)),
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What caused a read to be issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum Trigger {
    /// The unconditional read issued at construction.
    Initial,
    /// The file was modified.
    Modified,
    /// The file was created, typically by an editor's save-by-rename.
    Created,
    /// The file was removed. The read that follows usually fails.
    Removed,
    /// The caller requested a reload via [`LiveFile::reload`](crate::LiveFile::reload).
    Manual,
}

impl fmt::Display for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Initial => write!(f, "initial load"),

            Self::Modified => write!(f, "file modified"),

            Self::Created => write!(f, "file created"),

            Self::Removed => write!(f, "file removed"),

            Self::Manual => write!(f, "manual reload"),
        }
    }
}

/// Payload of a `reload` event.
#[derive(Debug, Clone)]
pub struct Reload {
    /// The newly read content.
    pub content: Arc<String>,

    /// What caused the read.
    pub trigger: Trigger,

    /// Epoch after this reload was applied.
    pub epoch: u64,

    /// When the read completed.
    pub timestamp: Instant,
}

impl Reload {
    pub(crate) fn new(content: Arc<String>, trigger: Trigger, epoch: u64) -> Self {
        Self {
            content,
            trigger,
            epoch,
            timestamp: Instant::now(),
        }
    }

    /// Returns `true` if this is the construction-time read.
    #[must_use]
    pub const fn is_initial(&self) -> bool {
        matches!(self.trigger, Trigger::Initial)
    }
}

/// A handler ready to be bound to an event kind.
#[derive(Clone)]
pub enum Handler {
    /// Handles `reload` events.
    Reload(ReloadCallback),
    /// Handles `error` events.
    Error(ErrorCallback),
}

impl Handler {
    /// Wrap a reload callback.
    pub fn reload<F>(f: F) -> Self
    where
        F: Fn(Reload) + Send + Sync + 'static,
    {
        Self::Reload(Arc::new(f))
    }

    /// Wrap an error callback.
    pub fn error<F>(f: F) -> Self
    where
        F: Fn(Error) + Send + Sync + 'static,
    {
        Self::Error(Arc::new(f))
    }

    /// The event kind this handler serves.
    #[must_use]
    pub const fn kind(&self) -> EventKind {
        match self {
            Self::Reload(_) => EventKind::Reload,
            Self::Error(_) => EventKind::Error,
        }
    }
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Handler").field(&self.kind()).finish()
    }
}

/// Fixed two-slot dispatch table.
#[derive(Clone, Default)]
pub(crate) struct Handlers {
    reload: Option<ReloadCallback>,
    error: Option<ErrorCallback>,
}

impl Handlers {
    /// Bind `handler` under `kind`, replacing any previous binding.
    pub fn bind(&mut self, kind: EventKind, handler: Handler) -> Result<(), Error> {
        match (kind, handler) {
            (EventKind::Reload, Handler::Reload(cb)) => self.reload = Some(cb),
            (EventKind::Error, Handler::Error(cb)) => self.error = Some(cb),
            (kind, handler) => {
                return Err(Error::HandlerMismatch {
                    event: kind.as_str(),
                    handler: handler.kind().as_str(),
                });
            }
        }
        Ok(())
    }

    pub fn set_reload(&mut self, cb: ReloadCallback) {
        self.reload = Some(cb);
    }

    pub fn set_error(&mut self, cb: ErrorCallback) {
        self.error = Some(cb);
    }

    pub fn reload(&self) -> Option<ReloadCallback> {
        self.reload.clone()
    }

    pub fn error(&self) -> Option<ErrorCallback> {
        self.error.clone()
    }
}

impl fmt::Debug for Handlers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handlers")
            .field("reload", &self.reload.is_some())
            .field("error", &self.error.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn test_event_kind_parse() {
        assert_eq!("reload".parse::<EventKind>().unwrap(), EventKind::Reload);
        assert_eq!("error".parse::<EventKind>().unwrap(), EventKind::Error);

        let err = "bogus".parse::<EventKind>().unwrap_err();
        assert!(matches!(err, Error::UnsupportedEvent { ref name } if name == "bogus"));
    }

    #[test]
    fn test_event_kind_names_roundtrip() {
        for kind in [EventKind::Reload, EventKind::Error] {
            assert_eq!(kind.to_string().parse::<EventKind>().unwrap(), kind);
        }
    }

    #[test]
    fn test_trigger_display() {
        assert!(Trigger::Initial.to_string().contains("initial"));
        assert!(Trigger::Manual.to_string().contains("manual"));
        assert!(Trigger::Removed.to_string().contains("removed"));
    }

    #[test]
    fn test_last_binding_wins() {
        let first = Arc::new(AtomicU32::new(0));
        let second = Arc::new(AtomicU32::new(0));

        let mut handlers = Handlers::default();
        let c = first.clone();
        handlers
            .bind(
                EventKind::Reload,
                Handler::reload(move |_| {
                    c.fetch_add(1, Ordering::SeqCst);
                }),
            )
            .unwrap();
        let c = second.clone();
        handlers
            .bind(
                EventKind::Reload,
                Handler::reload(move |_| {
                    c.fetch_add(1, Ordering::SeqCst);
                }),
            )
            .unwrap();

        let cb = handlers.reload().unwrap();
        cb(Reload::new(Arc::new(String::new()), Trigger::Manual, 1));

        assert_eq!(first.load(Ordering::SeqCst), 0);
        assert_eq!(second.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_mismatched_binding_is_rejected() {
        let mut handlers = Handlers::default();
        let err = handlers
            .bind(EventKind::Reload, Handler::error(|_| {}))
            .unwrap_err();

        assert!(matches!(
            err,
            Error::HandlerMismatch {
                event: "reload",
                handler: "error"
            }
        ));
        assert!(handlers.reload().is_none());
        assert!(handlers.error().is_none());
    }
}
