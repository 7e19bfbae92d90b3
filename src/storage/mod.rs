//! Project metadata persistence

pub mod project_store;

pub use project_store::{JsonProjectStore, ProjectRepository, StoreStats, UpsertOutcome};
