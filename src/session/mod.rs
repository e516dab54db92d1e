// Public API - what other modules can use
pub use coordinator::{SessionCoordinator, SpinTiming};
pub use sync::{spin_progress, SpinProgress, SYNC_THRESHOLD_MS};

// Internal modules
mod coordinator;
mod elimination;
mod sync;
