//! # livefile
//!
//! A continuously refreshed, in-memory view of a single file.
//!
//! A [`LiveFile`] reads its file once at construction and again whenever the
//! file changes, keeping the latest successfully read content in memory.
//! Bursts of change notifications are collapsed by a debounce gate, so an
//! editor that touches a file three times in one save causes one re-read.
//!
//! ## Features
//!
//! - **File watching** - Change notifications via the [`notify`] crate
//! - **Debouncing** - Minimum interval between accepted reloads
//! - **Error resilience** - A failed read keeps the last good content
//! - **Callbacks** - `reload` and `error` handlers for background activity
//! - **Rendering** - A replaceable renderer turns content into output on demand
//! - **Thread-safe** - Every method takes `&self`
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::time::Duration;
//! use livefile::LiveFile;
//!
//! let readme: LiveFile<(), usize> = LiveFile::builder("README.md")
//!     .watcher_delay(Duration::from_millis(200))
//!     .renderer(|text: &str, _: &()| Ok(text.lines().count()))
//!     .on_reload(|reload| println!("reloaded: {}", reload.trigger))
//!     .on_error(|err| eprintln!("{err}"))
//!     .start();
//!
//! println!("{} lines", readme.render(&())?);
//! readme.destroy();
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌──────────────────┐     ┌──────────────┐
//! │   notify    │────▶│ livefile-watcher │────▶│ DebounceGate │
//! │  (events)   │     │  (select! loop)  │     │  (accept?)   │
//! └─────────────┘     └──────────────────┘     └──────────────┘
//!                                                      │ accepted
//!                                                      ▼
//! ┌─────────────┐     ┌──────────────────┐     ┌──────────────┐
//! │  Handlers   │◀────│   ContentCell    │◀────│ livefile-read│
//! │(reload/err) │     │ (RwLock<Arc<_>>) │     │ (FileReader) │
//! └─────────────┘     └──────────────────┘     └──────────────┘
//! ```
//!
//! ## Debouncing
//!
//! A change notification is accepted only if more than `watcher_delay`
//! has passed since the previously accepted one. The gate closes when a
//! trigger is accepted, not when its read completes. Construction counts as
//! an accepted trigger dated `watcher_delay` in the past, so the first real
//! change is picked up immediately.
//!
//! ## Overlapping Reads
//!
//! Under the default [`ReloadPolicy::Overlapping`], a read that outlasts the
//! debounce window can overlap with the next one, and the two may complete
//! in either order. When an earlier read lands last it still wins, and a
//! warning is logged. [`ReloadPolicy::Serialized`] runs one read at a time
//! instead and folds triggers that arrive meanwhile into a single follow-up
//! read.
//!
//! ## Feature Flags
//!
//! | Feature | Description | Default |
//! |---------|-------------|---------|
//! | `serde` | `Serialize`/`Deserialize` for [`Options`] | No |
//! | `async` | [`LiveFile::subscribe`] reload epochs via `tokio::sync::watch` | No |

mod builder;
mod content;
mod error;
mod events;
mod gate;
mod live;
mod options;
mod reader;
mod render;
mod state;
mod watch;

pub use builder::LiveFileBuilder;
pub use error::{BoxError, Error};
pub use events::{ErrorCallback, EventKind, Handler, Reload, ReloadCallback, Trigger};
pub use gate::DebounceGate;
pub use live::LiveFile;
pub use options::{DEFAULT_WATCHER_DELAY, Options, ReloadPolicy};
pub use reader::{FileReader, FsReader};
pub use render::Renderer;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_module_exports() {
        let _: fn(String) -> LiveFileBuilder = LiveFileBuilder::new;
        let _ = Options::default();
        let _ = FsReader;
    }
}
