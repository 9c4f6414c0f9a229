pub mod providers;
mod summarizer;

pub use summarizer::{normalize_summary, Summarizer};
