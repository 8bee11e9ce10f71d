pub mod config;
pub mod error;
pub mod geo;
pub mod kernel;
pub mod services;
pub mod solar;
pub mod stream;
pub mod zone;

// Re-export specific items for convenient access
pub use kernel::reactor::SiteReactor;
