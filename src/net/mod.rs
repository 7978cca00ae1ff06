pub mod session;

// Re-export common types
pub use session::{HttpSession, FetchedPage};
