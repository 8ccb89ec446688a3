pub mod async_runtime;
pub mod http;
pub mod paths;
pub mod redaction;

pub use async_runtime::{block_on_future, sleep_unless_cancelled};
pub use paths::{config_file_path, expand_tilde};
pub use redaction::redact_sensitive;
