//! Watch subscription backed by the `notify` crate.
//!
//! The subscription watches the file's parent directory non-recursively
//! and keeps only events naming the file. Watching the directory rather
//! than the file keeps the subscription alive across editors that save by
//! writing a temporary file and renaming it over the original.
//!
//! Events travel from notify's own thread over a bounded channel to the
//! `livefile-watcher` thread, which runs the debounce gate.

use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam_channel::{Receiver, Sender, bounded, select};
use notify::event::{AccessKind, AccessMode, MetadataKind, ModifyKind};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use parking_lot::Mutex;
use tracing::{debug, info, trace, warn};

use crate::Error;
use crate::events::Trigger;
use crate::state::LiveState;

/// Commands sent to the watcher thread.
#[derive(Debug, Clone, Copy)]
pub(crate) enum WatchCommand {
    /// Stop the watcher loop.
    Stop,
}

/// An active watch on one file.
///
/// Released exactly once, by [`close`](Self::close) or on drop.
pub(crate) struct WatchSubscription {
    path: PathBuf,
    watcher: Mutex<Option<RecommendedWatcher>>,
    command_tx: Sender<WatchCommand>,
    thread_handle: Mutex<Option<JoinHandle<()>>>,
}

impl WatchSubscription {
    /// Start watching `state.path`, feeding triggers into `state`.
    pub fn start(state: &Arc<LiveState>) -> Result<Self, Error> {
        let path = state.path.clone();
        let (dir, file_name) = split_watch_target(&path)?;

        let (command_tx, command_rx) = bounded::<WatchCommand>(16);
        let (notify_tx, notify_rx) = bounded::<notify::Result<Event>>(100);

        let mut watcher = notify::recommended_watcher(move |res| {
            let _ = notify_tx.send(res);
        })
        .map_err(|e| Error::watch(&path, e))?;

        watcher
            .watch(&dir, RecursiveMode::NonRecursive)
            .map_err(|e| Error::watch(&path, e))?;

        let thread_state = Arc::clone(state);
        let thread_handle = thread::Builder::new()
            .name("livefile-watcher".to_string())
            .spawn(move || watch_loop(&thread_state, &command_rx, &notify_rx, &file_name))
            .map_err(|e| Error::spawn("watcher", e))?;

        info!(path = %path.display(), dir = %dir.display(), "watch started");

        Ok(Self {
            path,
            watcher: Mutex::new(Some(watcher)),
            command_tx,
            thread_handle: Mutex::new(Some(thread_handle)),
        })
    }

    pub fn is_running(&self) -> bool {
        self.watcher.lock().is_some()
    }

    /// Release the OS watch and stop the watcher thread.
    ///
    /// Returns `false` if the subscription was already closed.
    pub fn close(&self) -> bool {
        let Some(watcher) = self.watcher.lock().take() else {
            return false;
        };
        drop(watcher);

        let _ = self.command_tx.send(WatchCommand::Stop);

        if let Some(handle) = self.thread_handle.lock().take() {
            // A handler running on the watcher thread may be the caller.
            if handle.thread().id() != thread::current().id() {
                let _ = handle.join();
            }
        }

        info!(path = %self.path.display(), "watch stopped");
        true
    }
}

impl Drop for WatchSubscription {
    fn drop(&mut self) {
        self.close();
    }
}

impl std::fmt::Debug for WatchSubscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatchSubscription")
            .field("path", &self.path)
            .field("running", &self.is_running())
            .finish()
    }
}

/// Split a file path into the directory to watch and the file name to
/// filter on.
fn split_watch_target(path: &Path) -> Result<(PathBuf, OsString), Error> {
    let file_name = path
        .file_name()
        .ok_or_else(|| Error::watch_path(path, "path has no file name"))?;

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };

    Ok((dir, file_name.to_os_string()))
}

/// Main watcher loop running in its own thread.
fn watch_loop(
    state: &Arc<LiveState>,
    command_rx: &Receiver<WatchCommand>,
    notify_rx: &Receiver<notify::Result<Event>>,
    file_name: &OsStr,
) {
    loop {
        select! {
            recv(command_rx) -> cmd => {
                match cmd {
                    Ok(WatchCommand::Stop) | Err(_) => break,
                }
            }

            recv(notify_rx) -> event_result => {
                match event_result {
                    Ok(Ok(event)) => match classify(&event, file_name) {
                        Some(trigger) => state.on_trigger(trigger),
                        None => trace!(kind = ?event.kind, paths = ?event.paths, "ignored event"),
                    },
                    Ok(Err(e)) => {
                        warn!(path = %state.path.display(), error = %e, "watch error");
                        state.emit_error(Error::watch(&state.path, e));
                    }
                    // Sender lives in the notify watcher; gone means closed.
                    Err(_) => break,
                }
            }
        }
    }

    debug!(path = %state.path.display(), "watcher loop exited");
}

/// Map a notify event to a trigger if it concerns the watched file.
fn classify(event: &Event, file_name: &OsStr) -> Option<Trigger> {
    if event.need_rescan() {
        return Some(Trigger::Modified);
    }

    if !event
        .paths
        .iter()
        .any(|p| p.file_name() == Some(file_name))
    {
        return None;
    }

    match event.kind {
        EventKind::Create(_) => Some(Trigger::Created),
        EventKind::Remove(_) => Some(Trigger::Removed),
        EventKind::Modify(ModifyKind::Metadata(MetadataKind::AccessTime)) => None,
        EventKind::Modify(_)
        | EventKind::Access(AccessKind::Close(AccessMode::Write))
        | EventKind::Any => Some(Trigger::Modified),
        EventKind::Access(_) | EventKind::Other => None,
    }
}
