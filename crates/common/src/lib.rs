pub mod config;
pub mod error;
pub mod logger;

// Re-export commonly used types
pub use config::{AppConfig, ProviderEnv};
pub use error::BlufError;
pub type Result<T> = std::result::Result<T, BlufError>;
