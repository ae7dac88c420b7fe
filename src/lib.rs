pub mod app;
pub mod cli;
pub mod config;
pub mod export;
pub mod journal;
pub mod notify;
pub mod storage;
pub mod ui;

pub use config::{AppConfig, ConfigLoader, ConfigPaths};
pub use journal::{JournalDocument, JournalStateStore};
