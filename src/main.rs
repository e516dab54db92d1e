use axum::http::{HeaderValue, Method};
use clap::Parser;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use movie_wheel::{
    config::Args,
    room::{repository::InMemoryRoomRepository, start_cleanup_task},
    router::app_router,
    search::TmdbLookup,
    session::SessionCoordinator,
    websockets::InMemoryConnectionManager,
    AppState,
};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "movie_wheel=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();
    info!("Starting movie wheel server");

    let room_repository = Arc::new(InMemoryRoomRepository::new());
    let connection_manager = Arc::new(InMemoryConnectionManager::new());
    let coordinator = Arc::new(SessionCoordinator::new(
        room_repository.clone(),
        connection_manager.clone(),
        args.spin_timing(),
    ));
    tokio::spawn(start_cleanup_task(
        room_repository.clone(),
        args.cleanup_config(),
    ));

    let movie_lookup = TmdbLookup::new(args.tmdb_api_key.clone());
    if !movie_lookup.is_configured() {
        warn!("TMDB_API_KEY not set, movie search will return placeholder results");
    }

    let app_state = AppState::new(
        room_repository,
        connection_manager,
        coordinator,
        Arc::new(movie_lookup),
    );

    let cors = CorsLayer::new()
        .allow_origin(args.client_url.parse::<HeaderValue>()?)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any);

    let app = app_router(app_state, cors);

    let addr = args.bind_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(client_url = %args.client_url, "Server running on http://{}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}
