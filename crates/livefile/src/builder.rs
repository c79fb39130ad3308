//! Builder for configuring and starting a [`LiveFile`].

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{info, warn};

use crate::error::BoxError;
use crate::events::{Handlers, Reload};
use crate::live::LiveFile;
use crate::options::{Options, ReloadPolicy};
use crate::reader::{FileReader, FsReader};
use crate::render::Renderer;
use crate::state::LiveState;
use crate::watch::WatchSubscription;
use crate::Error;

/// Builder for a [`LiveFile`].
///
/// Handlers registered here are bound before the watch starts and before
/// the initial read is issued, so failures during startup reach them.
///
/// # Example
///
/// ```ignore
/// let page = LiveFile::builder("content/index.md")
///     .watcher_delay(Duration::from_millis(250))
///     .renderer(|text: &str, opts: &Theme| Ok(markdown_to_html(text, opts)))
///     .on_reload(|reload| println!("reloaded ({})", reload.trigger))
///     .on_error(|err| eprintln!("{err}"))
///     .start();
///
/// let html = page.render(&Theme::default())?;
/// ```
pub struct LiveFileBuilder<O = (), R = String> {
    path: PathBuf,
    options: Options,
    renderer: Option<Renderer<O, R>>,
    reader: Arc<dyn FileReader>,
    handlers: Handlers,
}

impl<O, R> LiveFileBuilder<O, R> {
    /// Create a builder for `path` with default [`Options`].
    #[must_use]
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            options: Options::default(),
            renderer: None,
            reader: Arc::new(FsReader),
            handlers: Handlers::default(),
        }
    }

    /// Set the minimum interval between accepted reloads (default: 100ms).
    #[must_use]
    pub const fn watcher_delay(mut self, delay: Duration) -> Self {
        self.options.watcher_delay = delay;
        self
    }

    /// Set the read overlap policy (default: [`ReloadPolicy::Overlapping`]).
    #[must_use]
    pub const fn policy(mut self, policy: ReloadPolicy) -> Self {
        self.options.policy = policy;
        self
    }

    /// Replace all options at once.
    #[must_use]
    pub const fn options(mut self, options: Options) -> Self {
        self.options = options;
        self
    }

    /// Set the renderer used by [`LiveFile::render`].
    #[must_use]
    pub fn renderer<F>(mut self, renderer: F) -> Self
    where
        F: Fn(&str, &O) -> Result<R, BoxError> + Send + Sync + 'static,
    {
        self.renderer = Some(Arc::new(renderer));
        self
    }

    /// Replace the read primitive (default: [`FsReader`]).
    #[must_use]
    pub fn reader(mut self, reader: impl FileReader) -> Self {
        self.reader = Arc::new(reader);
        self
    }

    /// Register the `reload` handler.
    #[must_use]
    pub fn on_reload<F>(mut self, callback: F) -> Self
    where
        F: Fn(Reload) + Send + Sync + 'static,
    {
        self.handlers.set_reload(Arc::new(callback));
        self
    }

    /// Register the `error` handler.
    #[must_use]
    pub fn on_error<F>(mut self, callback: F) -> Self
    where
        F: Fn(Error) + Send + Sync + 'static,
    {
        self.handlers.set_error(Arc::new(callback));
        self
    }

    /// Start watching and issue the initial read.
    ///
    /// Never fails: a watch that cannot be established and an initial read
    /// that fails are both reported through the `error` handler. In the
    /// former case the live file still serves whatever the initial read
    /// produced, but will not refresh on its own.
    pub fn start(self) -> LiveFile<O, R> {
        let state = Arc::new(LiveState::new(
            self.path,
            self.options,
            self.reader,
            self.handlers,
            Instant::now(),
        ));

        info!(
            path = %state.path.display(),
            delay_ms = self.options.watcher_delay.as_millis(),
            policy = ?self.options.policy,
            "starting live file"
        );

        let subscription = match WatchSubscription::start(&state) {
            Ok(subscription) => Some(subscription),
            Err(e) => {
                warn!(path = %state.path.display(), error = %e, "watch unavailable");
                state.emit_error(e);
                None
            }
        };

        if let Err(e) = state.dispatch(crate::Trigger::Initial) {
            state.emit_error(e);
        }

        LiveFile::from_parts(state, self.renderer, subscription)
    }
}

impl<O, R> std::fmt::Debug for LiveFileBuilder<O, R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LiveFileBuilder")
            .field("path", &self.path)
            .field("options", &self.options)
            .field("renderer", &self.renderer.is_some())
            .field("handlers", &self.handlers)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let builder: LiveFileBuilder = LiveFileBuilder::new("page.md");
        assert_eq!(builder.path, PathBuf::from("page.md"));
        assert_eq!(builder.options, Options::default());
        assert!(builder.renderer.is_none());
        assert!(builder.handlers.reload().is_none());
        assert!(builder.handlers.error().is_none());
    }

    #[test]
    fn test_builder_fluent_api() {
        let builder: LiveFileBuilder<(), usize> = LiveFileBuilder::new("page.md")
            .watcher_delay(Duration::from_millis(250))
            .policy(ReloadPolicy::Serialized)
            .renderer(|text: &str, _: &()| Ok(text.len()))
            .on_reload(|_| {})
            .on_error(|_| {});

        assert_eq!(builder.options.watcher_delay, Duration::from_millis(250));
        assert_eq!(builder.options.policy, ReloadPolicy::Serialized);
        assert!(builder.renderer.is_some());
        assert!(builder.handlers.reload().is_some());
        assert!(builder.handlers.error().is_some());
    }

    #[test]
    fn test_options_replace_individual_settings() {
        let builder: LiveFileBuilder = LiveFileBuilder::new("page.md")
            .watcher_delay(Duration::from_secs(9))
            .options(Options {
                watcher_delay: Duration::from_millis(5),
                policy: ReloadPolicy::Overlapping,
            });

        assert_eq!(builder.options.watcher_delay, Duration::from_millis(5));
    }
}
