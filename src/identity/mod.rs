pub mod pool;

// Re-export common types
pub use pool::{IdentityPool, DEFAULT_USER_AGENTS};
