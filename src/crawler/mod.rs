pub mod controller;
pub mod extract;
pub mod scheduler;
pub mod task;

// Re-export common types
pub use controller::CrawlerController;
pub use task::{ImageTask, PageReport};
pub use scheduler::Scheduler;
