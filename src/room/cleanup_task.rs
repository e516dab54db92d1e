use std::sync::Arc;
use std::time::Duration;
use tokio::time::interval;
use tracing::{info, instrument, warn};

use super::repository::RoomRepository;

/// Configuration for the unjoined room sweep
#[derive(Debug, Clone)]
pub struct CleanupConfig {
    /// How often to sweep
    pub cleanup_interval: Duration,
    /// How long a room may sit without anyone joining before it is deleted
    pub unjoined_grace: Duration,
}

impl Default for CleanupConfig {
    fn default() -> Self {
        Self {
            cleanup_interval: Duration::from_secs(60),
            unjoined_grace: Duration::from_secs(10 * 60),
        }
    }
}

/// Periodically deletes rooms created over HTTP that nobody ever joined.
///
/// Rooms that had participants are deleted when the last one leaves, so they
/// never reach this sweep.
#[instrument(skip(room_repository))]
pub async fn start_cleanup_task(room_repository: Arc<dyn RoomRepository>, config: CleanupConfig) {
    info!(
        cleanup_interval_secs = config.cleanup_interval.as_secs(),
        unjoined_grace_secs = config.unjoined_grace.as_secs(),
        "Starting room cleanup background task"
    );

    let mut cleanup_interval = interval(config.cleanup_interval);

    loop {
        cleanup_interval.tick().await;

        let deleted_count = cleanup_unjoined_rooms(&room_repository, config.unjoined_grace);
        if deleted_count > 0 {
            info!(deleted_count = deleted_count, "Room cleanup completed");
        }
    }
}

/// Deletes rooms still empty `grace` after creation, returning how many went
fn cleanup_unjoined_rooms(room_repository: &Arc<dyn RoomRepository>, grace: Duration) -> usize {
    let mut deleted_count = 0;

    for code in room_repository.get_unjoined_rooms(grace) {
        match room_repository.delete_room_if_empty(&code) {
            Ok(true) => {
                deleted_count += 1;
                info!(room_code = %code, "Deleted unjoined room");
            }
            Ok(false) => {}
            Err(e) => warn!(room_code = %code, error = %e, "Failed to delete unjoined room"),
        }
    }

    deleted_count
}
