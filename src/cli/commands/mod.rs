pub mod backup;
pub mod config;
pub mod detect;
pub mod list;
pub mod remove;
pub mod scan;
pub mod show;
pub mod stats;
pub mod watch;
