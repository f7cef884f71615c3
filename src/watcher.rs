//! Source file watching for `convert --watch`.
//!
//! The parent directory is watched rather than the file itself, so editors
//! that save by writing a new file and renaming it over the old one keep
//! triggering reconversions.

use notify::{
    Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher,
    event::{AccessKind, AccessMode, ModifyKind},
};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::time::{Duration, Instant};

const DEBOUNCE: Duration = Duration::from_millis(100);

/// Reports content changes of a single file.
pub struct FileWatcher {
    watcher: RecommendedWatcher,
    receiver: Receiver<notify::Result<Event>>,
    target: Option<PathBuf>,
    last_change: Option<Instant>,
}

impl FileWatcher {
    pub fn new() -> notify::Result<Self> {
        let (tx, rx) = mpsc::channel();
        let watcher = notify::recommended_watcher(tx)?;

        Ok(Self {
            watcher,
            receiver: rx,
            target: None,
            last_change: None,
        })
    }

    /// Start watching `path`, replacing any previous target.
    pub fn watch(&mut self, path: &Path) -> notify::Result<()> {
        let path = path.canonicalize()?;
        let dir = path.parent().unwrap_or(Path::new("/")).to_path_buf();

        if let Some(old) = self.target.take() {
            if let Some(old_dir) = old.parent() {
                let _ = self.watcher.unwatch(old_dir);
            }
        }

        self.watcher.watch(&dir, RecursiveMode::NonRecursive)?;
        log::debug!("Watching {} for changes", path.display());
        self.target = Some(path);
        Ok(())
    }

    /// Block until the watched file changes or `timeout` elapses.
    ///
    /// Events arriving within 100 ms of the first one are folded into a
    /// single reported change.
    pub fn wait_for_change(&mut self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;

        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match self.receiver.recv_timeout(remaining) {
                Ok(event) => {
                    if self.concerns_target(event) {
                        // Let the writer finish before reporting
                        std::thread::sleep(DEBOUNCE);
                        self.drain_pending();
                        if self.debounce() {
                            return true;
                        }
                    }
                }
                Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => {
                    return false;
                }
            }
        }
    }

    fn drain_pending(&self) {
        for event in self.receiver.try_iter() {
            if let Err(e) = event {
                log::warn!("File watch error: {}", e);
            }
        }
    }

    fn concerns_target(&self, event: notify::Result<Event>) -> bool {
        let event = match event {
            Ok(event) => event,
            Err(e) => {
                log::warn!("File watch error: {}", e);
                return false;
            }
        };

        let Some(target) = &self.target else {
            return false;
        };
        event.paths.iter().any(|p| p == target) && is_content_change(&event.kind)
    }

    fn debounce(&mut self) -> bool {
        let now = Instant::now();
        match self.last_change {
            Some(last) if now.duration_since(last) < DEBOUNCE => false,
            _ => {
                self.last_change = Some(now);
                true
            }
        }
    }
}

/// Event kinds that can change a file's contents.
fn is_content_change(kind: &EventKind) -> bool {
    matches!(
        kind,
        EventKind::Modify(ModifyKind::Data(_))
            | EventKind::Modify(ModifyKind::Any)
            | EventKind::Modify(ModifyKind::Name(_))
            | EventKind::Access(AccessKind::Close(AccessMode::Write))
            | EventKind::Create(_)
    )
}
