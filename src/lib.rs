// Library crate for the movie wheel server
// This file exposes the public API for integration tests

pub mod config;
pub mod room;
pub mod router;
pub mod search;
pub mod session;
pub mod shared;
pub mod websockets;
pub mod wheel;

// Re-export commonly used types for easier access in tests
pub use room::{models::RoomModel, repository::RoomRepository};
pub use session::{SessionCoordinator, SpinTiming};
pub use shared::{AppError, AppState};
pub use websockets::{
    ConnectionManager, MessageHandler, MessageType, WebSocketMessage, WebsocketReceiveHandler,
};
