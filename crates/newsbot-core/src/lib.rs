pub mod ai;
pub mod config;
pub mod content;
pub mod error;
pub mod feed;
pub mod http;
pub mod publish;
pub mod scheduler;
pub mod shutdown;
pub mod storage;

pub use config::AppConfig;
pub use error::{Error, Result};
