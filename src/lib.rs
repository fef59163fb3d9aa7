//! mailstash: pull a Gmail mailbox page by page into a directory of JSON records.

pub mod config;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod loader;
pub mod mail;
pub mod progress;
pub mod record;
pub mod store;

pub use error::{Error, Result};
pub use fetch::{FailurePolicy, FetchLoop, FetchOptions, RunReport, run};
pub use loader::load_all;
pub use record::MessageRecord;
