pub mod cli;
pub mod config;
pub mod detector;
pub mod error;
pub mod extract;
pub mod fetcher;
pub mod models;
pub mod monitor;
pub mod notifier;
pub mod repository;
pub mod scheduler;

// Re-export commonly used types
pub use config::AppConfig;
pub use error::TrackerError;

pub type Result<T> = std::result::Result<T, TrackerError>;
