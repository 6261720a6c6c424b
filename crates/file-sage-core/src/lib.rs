pub mod analysis;
pub mod category;
pub mod config;
pub mod engine;
pub mod error;
pub mod organize;
pub mod progress;
pub mod scanner;
pub mod search;

pub use category::Category;
pub use config::AppConfig;
pub use engine::{FileSageEngine, OrganizeOutcome, SearchOutcome};
pub use error::Error;
pub use progress::{ProgressReporter, SilentReporter};
