pub mod images;

// Re-export common functions
pub use images::download_image;
