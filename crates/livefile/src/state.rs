//! Reload state shared between the owner, the watcher thread and read threads.
//!
//! [`LiveState`] owns everything a trigger needs to turn into a reload:
//! the debounce gate, the read primitive, the content cell and the handler
//! table. Read completions are applied from the read thread that produced
//! them, and handlers run on that same thread.

use std::mem;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread;
use std::time::Instant;

use parking_lot::{Mutex, RwLock};
use tracing::{debug, warn};

use crate::content::{Applied, ContentCell};
use crate::events::{Handlers, Reload, Trigger};
use crate::gate::DebounceGate;
use crate::options::{Options, ReloadPolicy};
use crate::reader::FileReader;
use crate::Error;

/// Read bookkeeping for [`ReloadPolicy::Serialized`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ReadSlot {
    Idle,
    Busy,
    /// Busy, and at least one more trigger arrived meanwhile.
    BusyPending(Trigger),
}

pub(crate) struct LiveState {
    pub path: PathBuf,
    pub policy: ReloadPolicy,
    pub content: ContentCell,
    pub handlers: RwLock<Handlers>,
    gate: Mutex<DebounceGate>,
    reader: Arc<dyn FileReader>,
    read_slot: Mutex<ReadSlot>,
    /// Sequence number of the most recently issued read.
    issued: AtomicU64,
    #[cfg(feature = "async")]
    pub epoch_tx: tokio::sync::watch::Sender<u64>,
}

impl LiveState {
    pub fn new(
        path: PathBuf,
        options: Options,
        reader: Arc<dyn FileReader>,
        handlers: Handlers,
        created: Instant,
    ) -> Self {
        Self {
            path,
            policy: options.policy,
            content: ContentCell::new(),
            handlers: RwLock::new(handlers),
            gate: Mutex::new(DebounceGate::new(options.watcher_delay, created)),
            reader,
            read_slot: Mutex::new(ReadSlot::Idle),
            issued: AtomicU64::new(0),
            #[cfg(feature = "async")]
            epoch_tx: tokio::sync::watch::Sender::new(0),
        }
    }

    pub fn gate(&self) -> DebounceGate {
        *self.gate.lock()
    }

    pub fn should_accept_trigger(&self, touch: bool) -> bool {
        self.gate.lock().should_accept(touch)
    }

    /// Entry point for change notifications from the watch subscription.
    pub fn on_trigger(self: &Arc<Self>, trigger: Trigger) {
        let accepted = {
            let mut gate = self.gate.lock();
            let now = Instant::now();
            let elapsed_ms = gate.elapsed_at(now).map(|e| e.as_millis());
            let accepted = gate.should_accept_at(now, true);
            debug!(
                path = %self.path.display(),
                %trigger,
                ?elapsed_ms,
                accepted,
                "change notification"
            );
            accepted
        };

        if accepted && let Err(e) = self.dispatch(trigger) {
            self.emit_error(e);
        }
    }

    /// Issue a read for `trigger` without consulting the gate.
    pub fn dispatch(self: &Arc<Self>, trigger: Trigger) -> Result<(), Error> {
        if self.policy == ReloadPolicy::Serialized {
            let mut slot = self.read_slot.lock();
            if *slot != ReadSlot::Idle {
                debug!(path = %self.path.display(), %trigger, "read in flight, coalescing");
                *slot = ReadSlot::BusyPending(trigger);
                return Ok(());
            }
            *slot = ReadSlot::Busy;
        }

        self.spawn_read(trigger).inspect_err(|_| {
            if self.policy == ReloadPolicy::Serialized {
                *self.read_slot.lock() = ReadSlot::Idle;
            }
        })
    }

    fn spawn_read(self: &Arc<Self>, trigger: Trigger) -> Result<(), Error> {
        let seq = self.issued.fetch_add(1, Ordering::AcqRel) + 1;
        let state = Arc::clone(self);

        thread::Builder::new()
            .name("livefile-read".to_string())
            .spawn(move || state.complete_read(seq, trigger))
            .map(drop)
            .map_err(|e| Error::spawn("read", e))
    }

    fn complete_read(self: Arc<Self>, seq: u64, trigger: Trigger) {
        match self.reader.read(&self.path) {
            Ok(content) => self.apply(seq, trigger, content),
            Err(source) => {
                if !self.content.is_closed() {
                    warn!(
                        path = %self.path.display(),
                        seq,
                        error = %source,
                        "read failed, keeping previous content"
                    );
                    self.emit_error(Error::read(&self.path, source));
                }
            }
        }

        if self.policy == ReloadPolicy::Serialized {
            self.finish_serialized();
        }
    }

    fn apply(&self, seq: u64, trigger: Trigger, content: String) {
        let content = Arc::new(content);
        let epoch = match self.content.apply_read(seq, content.clone()) {
            Applied::Closed => return,
            Applied::Replaced { epoch, stale } => {
                if stale {
                    warn!(
                        path = %self.path.display(),
                        seq,
                        issued = self.issued.load(Ordering::Acquire),
                        "earlier read completed last, content regressed"
                    );
                }
                epoch
            }
        };

        debug!(path = %self.path.display(), seq, epoch, %trigger, len = content.len(), "reloaded");

        #[cfg(feature = "async")]
        self.epoch_tx.send_replace(epoch);

        self.emit_reload(Reload::new(content, trigger, epoch));
    }

    /// Release the serialized read slot, issuing the coalesced follow-up
    /// read if one was requested.
    fn finish_serialized(self: &Arc<Self>) {
        let next = {
            let mut slot = self.read_slot.lock();
            match mem::replace(&mut *slot, ReadSlot::Idle) {
                ReadSlot::BusyPending(trigger) if !self.content.is_closed() => {
                    *slot = ReadSlot::Busy;
                    Some(trigger)
                }
                _ => None,
            }
        };

        if let Some(trigger) = next
            && let Err(e) = self.spawn_read(trigger)
        {
            *self.read_slot.lock() = ReadSlot::Idle;
            self.emit_error(e);
        }
    }

    fn emit_reload(&self, reload: Reload) {
        if self.content.is_closed() {
            return;
        }
        let handler = self.handlers.read().reload();
        if let Some(cb) = handler {
            cb(reload);
        }
    }

    pub fn emit_error(&self, error: Error) {
        if self.content.is_closed() {
            return;
        }
        let handler = self.handlers.read().error();
        if let Some(cb) = handler {
            cb(error);
        }
    }
}

impl std::fmt::Debug for LiveState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LiveState")
            .field("path", &self.path)
            .field("policy", &self.policy)
            .field("content", &self.content)
            .field("gate", &self.gate())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::path::Path;
    use std::time::Duration;

    use crossbeam_channel::{Receiver, bounded};

    fn state_with(
        reader: impl FileReader,
        policy: ReloadPolicy,
    ) -> (Arc<LiveState>, Receiver<Reload>, Receiver<Error>) {
        let (reload_tx, reload_rx) = bounded(16);
        let (error_tx, error_rx) = bounded(16);

        let mut handlers = Handlers::default();
        handlers.set_reload(Arc::new(move |r: Reload| {
            let _ = reload_tx.send(r);
        }));
        handlers.set_error(Arc::new(move |e: Error| {
            let _ = error_tx.send(e);
        }));

        let options = Options {
            watcher_delay: Duration::from_millis(100),
            policy,
        };
        let state = LiveState::new(
            PathBuf::from("notes.md"),
            options,
            Arc::new(reader),
            handlers,
            Instant::now(),
        );
        (Arc::new(state), reload_rx, error_rx)
    }

    const WAIT: Duration = Duration::from_secs(5);

    #[test]
    fn test_dispatch_applies_content() {
        let (state, reloads, errors) = state_with(
            |_: &Path| -> io::Result<String> { Ok("fresh".to_string()) },
            ReloadPolicy::Overlapping,
        );

        state.dispatch(Trigger::Manual).unwrap();
        let reload = reloads.recv_timeout(WAIT).unwrap();

        assert_eq!(reload.content.as_str(), "fresh");
        assert_eq!(reload.trigger, Trigger::Manual);
        assert_eq!(reload.epoch, 1);
        assert_eq!(state.content.get().as_str(), "fresh");
        assert!(errors.try_recv().is_err());
    }

    #[test]
    fn test_failed_read_keeps_content() {
        let (state, reloads, errors) = state_with(
            |_: &Path| -> io::Result<String> { Err(io::Error::other("disk gone")) },
            ReloadPolicy::Overlapping,
        );
        state.content.set("known good".to_string());

        state.dispatch(Trigger::Modified).unwrap();
        let err = errors.recv_timeout(WAIT).unwrap();

        assert!(matches!(err, Error::Read { .. }));
        assert_eq!(state.content.get().as_str(), "known good");
        assert_eq!(state.content.epoch(), 0);
        assert!(reloads.try_recv().is_err());
    }

    #[test]
    fn test_rejected_trigger_issues_no_read() {
        let (state, reloads, _errors) = state_with(
            |_: &Path| -> io::Result<String> { Ok("x".to_string()) },
            ReloadPolicy::Overlapping,
        );

        state.on_trigger(Trigger::Modified);
        state.on_trigger(Trigger::Modified);
        state.on_trigger(Trigger::Modified);

        reloads.recv_timeout(WAIT).unwrap();
        assert!(reloads.recv_timeout(Duration::from_millis(200)).is_err());
        assert_eq!(state.issued.load(Ordering::Acquire), 1);
    }

    #[test]
    fn test_closed_state_is_silent() {
        let (state, reloads, errors) = state_with(
            |_: &Path| -> io::Result<String> { Err(io::Error::other("late")) },
            ReloadPolicy::Overlapping,
        );
        state.content.close();

        state.dispatch(Trigger::Manual).unwrap();
        state.emit_error(Error::Destroyed);

        assert!(errors.recv_timeout(Duration::from_millis(200)).is_err());
        assert!(reloads.try_recv().is_err());
    }
}
