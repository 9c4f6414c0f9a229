mod fetcher;
mod notifier;

pub use fetcher::{FetchStats, Fetcher};
pub use notifier::Notifier;
