mod project_scanner;
pub mod watcher;

pub use project_scanner::ProjectScanner;
pub use watcher::{ListenerId, ProjectWatcher, WatchEvent, WatchEventKind};
