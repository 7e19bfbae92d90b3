//! Filesystem watch under the scan root
//!
//! Raw `notify` events are forwarded into a tokio channel, translated into
//! typed [`WatchEvent`]s and published on a broadcast channel. Subscribers
//! either hold a receiver (`subscribe`) or register a callback (`on_event`);
//! a panicking callback is logged and never stops the loop.

use std::collections::HashMap;
use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use chrono::{DateTime, Utc};
use notify::event::{CreateKind, ModifyKind, RemoveKind};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::WatchConfig;
use crate::types::{DashError, Result};

/// Kind of change reported to subscribers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WatchEventKind {
    Create,
    Modify,
    Delete,
    Rename,
}

impl fmt::Display for WatchEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(match self {
            Self::Create => "create",
            Self::Modify => "modify",
            Self::Delete => "delete",
            Self::Rename => "rename",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WatchEvent {
    pub kind: WatchEventKind,
    pub path: PathBuf,
    pub is_directory: bool,
    pub timestamp: DateTime<Utc>,
}

/// Handle returned by [`ProjectWatcher::on_event`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

impl fmt::Display for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "listener-{}", self.0)
    }
}

struct ActiveWatch {
    // Dropping the OS watcher closes the raw event channel
    watcher: RecommendedWatcher,
    task: JoinHandle<()>,
}

pub struct ProjectWatcher {
    root: PathBuf,
    poll_interval: Duration,
    events: broadcast::Sender<WatchEvent>,
    running: Arc<AtomicBool>,
    active: Mutex<Option<ActiveWatch>>,
    listeners: Mutex<HashMap<ListenerId, JoinHandle<()>>>,
    next_listener: AtomicU64,
}

impl ProjectWatcher {
    pub fn new(root: impl Into<PathBuf>, config: &WatchConfig) -> Self {
        let (events, _) = broadcast::channel(config.channel_capacity.max(1));
        Self {
            root: root.into(),
            poll_interval: Duration::from_millis(config.poll_interval_ms.max(1)),
            events,
            running: Arc::new(AtomicBool::new(false)),
            active: Mutex::new(None),
            listeners: Mutex::new(HashMap::new()),
            next_listener: AtomicU64::new(1),
        }
    }

    pub fn is_watching(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// New receiver for all events published from now on. Drop to unsubscribe.
    pub fn subscribe(&self) -> broadcast::Receiver<WatchEvent> {
        self.events.subscribe()
    }

    /// Run `callback` for every event on a dedicated task.
    ///
    /// Must be called from within a tokio runtime.
    pub fn on_event<F>(&self, callback: F) -> ListenerId
    where
        F: Fn(&WatchEvent) + Send + Sync + 'static,
    {
        let id = ListenerId(self.next_listener.fetch_add(1, Ordering::Relaxed));
        let mut rx = self.events.subscribe();

        let handle = tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(event) => {
                        if catch_unwind(AssertUnwindSafe(|| callback(&event))).is_err() {
                            warn!("{} panicked on {} {}", id, event.kind, event.path.display());
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!("{} lagged, {} events dropped", id, skipped);
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        });

        lock(&self.listeners).insert(id, handle);
        id
    }

    /// Detach a callback. Returns false if the id is unknown.
    pub fn remove_event_callback(&self, id: ListenerId) -> bool {
        match lock(&self.listeners).remove(&id) {
            Some(handle) => {
                handle.abort();
                true
            }
            None => false,
        }
    }

    /// Begin watching the root recursively. A second call while active is a
    /// no-op.
    pub fn start_watching(&self) -> Result<()> {
        if self
            .running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            warn!("Watch already active on {}", self.root.display());
            return Ok(());
        }

        match self.spawn_watch() {
            Ok(active) => {
                *lock(&self.active) = Some(active);
                info!("Watching {}", self.root.display());
                Ok(())
            }
            Err(e) => {
                self.running.store(false, Ordering::SeqCst);
                Err(e)
            }
        }
    }

    fn spawn_watch(&self) -> Result<ActiveWatch> {
        let (tx, mut rx) = mpsc::unbounded_channel();

        let mut watcher = RecommendedWatcher::new(
            move |res: std::result::Result<Event, notify::Error>| {
                let _ = tx.send(res);
            },
            notify::Config::default(),
        )?;
        watcher
            .watch(&self.root, RecursiveMode::Recursive)
            .map_err(|e| DashError::Watch(format!("{}: {}", self.root.display(), e)))?;

        let running = Arc::clone(&self.running);
        let events = self.events.clone();
        let poll = self.poll_interval;

        let task = tokio::spawn(async move {
            while running.load(Ordering::SeqCst) {
                match tokio::time::timeout(poll, rx.recv()).await {
                    Ok(Some(Ok(raw))) => {
                        for event in translate(raw).await {
                            // No subscribers is not an error
                            let _ = events.send(event);
                        }
                    }
                    Ok(Some(Err(e))) => warn!("Watch error: {}", e),
                    Ok(None) => break,
                    Err(_) => continue,
                }
            }
            debug!("Watch loop stopped");
        });

        Ok(ActiveWatch { watcher, task })
    }

    /// Stop the loop and release the OS watcher. No-op if not watching.
    pub async fn stop_watching(&self) {
        self.running.store(false, Ordering::SeqCst);

        let active = lock(&self.active).take();
        let Some(active) = active else {
            debug!("Watch not active");
            return;
        };

        let ActiveWatch { watcher, task } = active;
        drop(watcher);
        if let Err(e) = task.await {
            warn!("Watch loop ended abnormally: {}", e);
        }
        info!("Stopped watching {}", self.root.display());
    }

    #[cfg(test)]
    pub(crate) fn publish(&self, event: WatchEvent) {
        let _ = self.events.send(event);
    }
}

impl Drop for ProjectWatcher {
    fn drop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        for (_, handle) in lock(&self.listeners).drain() {
            handle.abort();
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn map_kind(kind: &EventKind) -> Option<WatchEventKind> {
    match kind {
        EventKind::Create(_) => Some(WatchEventKind::Create),
        EventKind::Modify(ModifyKind::Name(_)) => Some(WatchEventKind::Rename),
        EventKind::Modify(_) => Some(WatchEventKind::Modify),
        EventKind::Remove(_) => Some(WatchEventKind::Delete),
        _ => None,
    }
}

/// Directory hint carried by the raw event, if any
fn kind_says_directory(kind: &EventKind) -> Option<bool> {
    match kind {
        EventKind::Create(CreateKind::Folder) | EventKind::Remove(RemoveKind::Folder) => Some(true),
        EventKind::Create(CreateKind::File) | EventKind::Remove(RemoveKind::File) => Some(false),
        _ => None,
    }
}

async fn resolve_is_directory(kind: &EventKind, path: &Path) -> bool {
    if let Some(hint) = kind_says_directory(kind) {
        return hint;
    }
    tokio::fs::metadata(path)
        .await
        .map(|m| m.is_dir())
        .unwrap_or(false)
}

async fn translate(raw: Event) -> Vec<WatchEvent> {
    let Some(kind) = map_kind(&raw.kind) else {
        return Vec::new();
    };

    let mut out = Vec::with_capacity(raw.paths.len());
    for path in raw.paths {
        let is_directory = resolve_is_directory(&raw.kind, &path).await;
        out.push(WatchEvent {
            kind,
            path,
            is_directory,
            timestamp: Utc::now(),
        });
    }
    out
}
