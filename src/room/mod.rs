// Public API - what other modules can use
pub use cleanup_task::{start_cleanup_task, CleanupConfig};
pub use handlers::{create_room, get_room};

// Internal modules
mod cleanup_task;
mod handlers;
pub mod models;
pub mod repository;
mod service;
pub mod types;
