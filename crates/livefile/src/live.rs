//! The user-facing live file handle.

use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::info;

use crate::builder::LiveFileBuilder;
use crate::error::BoxError;
use crate::events::{EventKind, Handler, Reload, Trigger};
use crate::options::ReloadPolicy;
use crate::render::{Renderer, RendererSlot};
use crate::state::LiveState;
use crate::watch::WatchSubscription;
use crate::Error;

/// An in-memory view of one file, refreshed whenever the file changes.
///
/// `LiveFile` provides:
/// - The latest successfully read content
/// - On-demand rendering of that content through a replaceable renderer
/// - `reload` and `error` callbacks for background activity
/// - Explicit teardown via [`destroy`](Self::destroy), also run on drop
///
/// `O` is the renderer's options type and `R` its output.
///
/// # Example
///
/// ```ignore
/// let page: LiveFile<(), usize> = LiveFile::new(
///     "notes.txt",
///     Duration::from_millis(200),
///     |text: &str, _: &()| Ok(text.lines().count()),
/// );
///
/// page.on_reload(|reload| println!("now {} bytes", reload.content.len()));
/// println!("{} lines", page.render(&())?);
///
/// page.destroy();
/// ```
pub struct LiveFile<O = (), R = String> {
    state: Arc<LiveState>,
    renderer: RendererSlot<O, R>,
    subscription: Option<WatchSubscription>,
}

impl<O, R> LiveFile<O, R> {
    /// Create a builder for `path`.
    #[must_use]
    pub fn builder(path: impl AsRef<Path>) -> LiveFileBuilder<O, R> {
        LiveFileBuilder::new(path)
    }

    /// Start watching `path` with the given delay and renderer.
    ///
    /// Shorthand for the builder without handlers; failures during startup
    /// go unobserved unless a handler is registered on the builder instead.
    pub fn new<F>(path: impl AsRef<Path>, watcher_delay: Duration, renderer: F) -> Self
    where
        F: Fn(&str, &O) -> Result<R, BoxError> + Send + Sync + 'static,
    {
        LiveFileBuilder::new(path)
            .watcher_delay(watcher_delay)
            .renderer(renderer)
            .start()
    }

    pub(crate) fn from_parts(
        state: Arc<LiveState>,
        renderer: Option<Renderer<O, R>>,
        subscription: Option<WatchSubscription>,
    ) -> Self {
        Self {
            state,
            renderer: RendererSlot::new(renderer),
            subscription,
        }
    }

    /// The watched file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.state.path
    }

    /// The current content; empty before the first successful read and
    /// after [`destroy`](Self::destroy).
    #[must_use]
    pub fn content(&self) -> Arc<String> {
        self.state.content.get()
    }

    /// Read the current content via a closure, without cloning the `Arc`.
    pub fn read_content<T, F>(&self, f: F) -> T
    where
        F: FnOnce(&str) -> T,
    {
        self.state.content.read(f)
    }

    /// Timestamp of the most recently accepted trigger.
    ///
    /// Right after construction this is `now - watcher_delay`. It is `None`
    /// only when that instant cannot be represented.
    #[must_use]
    pub fn last_update(&self) -> Option<Instant> {
        self.state.gate().last_update()
    }

    /// The configured minimum interval between accepted reloads.
    #[must_use]
    pub fn watcher_delay(&self) -> Duration {
        self.state.gate().delay()
    }

    /// The read overlap policy.
    #[must_use]
    pub fn policy(&self) -> ReloadPolicy {
        self.state.policy
    }

    /// Number of read-driven content replacements so far.
    #[must_use]
    pub fn epoch(&self) -> u64 {
        self.state.content.epoch()
    }

    /// Check whether a reload has been applied since `epoch`.
    #[must_use]
    pub fn has_changed_since(&self, epoch: u64) -> bool {
        self.epoch() != epoch
    }

    /// Whether the watch subscription is active.
    ///
    /// `false` after [`destroy`](Self::destroy), and from the start if the
    /// watch could not be established.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.subscription
            .as_ref()
            .is_some_and(WatchSubscription::is_running)
    }

    /// Evaluate the debounce gate now.
    ///
    /// Returns `true` if more than `watcher_delay` has passed since the last
    /// accepted trigger. With `touch`, an open gate is closed at this
    /// instant, exactly as an accepted change notification would.
    pub fn should_accept_trigger(&self, touch: bool) -> bool {
        self.state.should_accept_trigger(touch)
    }

    /// Replace the cached content directly.
    ///
    /// No read, no debounce and no event. Useful for post-processing the
    /// content from inside a `reload` handler.
    pub fn set_content(&self, content: impl Into<String>) {
        self.state.content.set(content.into());
    }

    /// Replace the renderer. Takes effect for subsequent [`render`](Self::render) calls.
    pub fn set_renderer<F>(&self, renderer: F)
    where
        F: Fn(&str, &O) -> Result<R, BoxError> + Send + Sync + 'static,
    {
        self.renderer.replace(Some(Arc::new(renderer)));
    }

    /// Remove the renderer; [`render`](Self::render) then fails with
    /// [`Error::NoRenderer`].
    pub fn clear_renderer(&self) {
        self.renderer.replace(None);
    }

    /// Whether a renderer is configured.
    #[must_use]
    pub fn has_renderer(&self) -> bool {
        self.renderer.is_set()
    }

    /// Run the renderer over the current content.
    ///
    /// Every call invokes the renderer; nothing is cached.
    ///
    /// # Errors
    ///
    /// [`Error::NoRenderer`] if none is configured, or [`Error::Render`]
    /// wrapping the renderer's own error. Render failures are not sent to
    /// the `error` handler.
    pub fn render(&self, options: &O) -> Result<R, Error> {
        let content = self.content();
        self.renderer.render(&content, options)
    }

    /// Register a handler for the event named `event`.
    ///
    /// Replaces any handler previously bound to that event.
    ///
    /// # Errors
    ///
    /// [`Error::UnsupportedEvent`] for names other than `reload` and
    /// `error`, and [`Error::HandlerMismatch`] if the handler does not fit
    /// the event. Existing bindings are untouched on error.
    ///
    /// # Example
    ///
    /// ```ignore
    /// live.handle("reload", Handler::reload(|r| println!("{}", r.trigger)))?;
    /// assert!(live.handle("change", Handler::error(|_| {})).is_err());
    /// ```
    pub fn handle(&self, event: &str, handler: Handler) -> Result<(), Error> {
        let kind: EventKind = event.parse()?;
        self.state.handlers.write().bind(kind, handler)
    }

    /// Register the `reload` handler.
    pub fn on_reload<F>(&self, callback: F)
    where
        F: Fn(Reload) + Send + Sync + 'static,
    {
        self.state.handlers.write().set_reload(Arc::new(callback));
    }

    /// Register the `error` handler.
    pub fn on_error<F>(&self, callback: F)
    where
        F: Fn(Error) + Send + Sync + 'static,
    {
        self.state.handlers.write().set_error(Arc::new(callback));
    }

    /// Re-read the file now, bypassing the debounce gate.
    ///
    /// The outcome arrives through the handlers like any other reload.
    /// `last_update` is not moved.
    ///
    /// # Errors
    ///
    /// [`Error::Destroyed`] after teardown, or [`Error::Spawn`] if the read
    /// thread could not be started.
    pub fn reload(&self) -> Result<(), Error> {
        if self.state.content.is_closed() {
            return Err(Error::Destroyed);
        }
        self.state.dispatch(Trigger::Manual)
    }

    /// Close the watch subscription and clear the content.
    ///
    /// After this returns no further `reload` or `error` events fire, even
    /// for reads that were already in flight. Calling it again is a no-op.
    pub fn destroy(&self) {
        let released = self
            .subscription
            .as_ref()
            .is_some_and(WatchSubscription::close);

        if self.state.content.close() {
            info!(path = %self.state.path.display(), released, "live file destroyed");
        }
    }

    /// Subscribe to reload epochs.
    ///
    /// The receiver's value is the epoch of the latest applied reload.
    #[cfg(feature = "async")]
    #[must_use]
    pub fn subscribe(&self) -> tokio::sync::watch::Receiver<u64> {
        self.state.epoch_tx.subscribe()
    }
}

impl<O, R> Drop for LiveFile<O, R> {
    fn drop(&mut self) {
        self.destroy();
    }
}

// Manual Debug impl to avoid O: Debug and R: Debug bounds
impl<O, R> std::fmt::Debug for LiveFile<O, R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LiveFile")
            .field("path", &self.state.path)
            .field("epoch", &self.epoch())
            .field("running", &self.is_running())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::io;

    use tempfile::tempdir;

    #[test]
    fn test_live_file_debug() {
        let _: fn(&LiveFile) -> String = |l| format!("{l:?}");
    }

    #[test]
    fn test_accessors_after_start() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("page.md");
        fs::write(&path, "body").unwrap();

        let live: LiveFile = LiveFile::builder(&path)
            .watcher_delay(Duration::from_millis(300))
            .reader(|_: &std::path::Path| -> io::Result<String> { Ok(String::new()) })
            .start();

        assert_eq!(live.path(), path.as_path());
        assert_eq!(live.watcher_delay(), Duration::from_millis(300));
        assert_eq!(live.policy(), ReloadPolicy::Overlapping);
        assert!(live.is_running());
        assert!(!live.has_renderer());

        live.destroy();
        assert!(!live.is_running());
    }

    #[test]
    fn test_missing_directory_reports_watch_error() {
        let (tx, rx) = crossbeam_channel::unbounded();
        let live: LiveFile = LiveFile::builder("/definitely/not/here/page.md")
            .on_error(move |e| {
                let _ = tx.send(e);
            })
            .start();

        let first = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert!(matches!(first, Error::Watch { .. }));
        let second = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert!(matches!(second, Error::Read { .. }));

        assert!(!live.is_running());
        assert_eq!(live.content().as_str(), "");
    }
}
