use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;
use tracing::{info, instrument};

use super::service::MovieSuggestion;
use crate::shared::AppState;

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
}

/// HTTP handler for movie title search
///
/// GET /api/movies/search?q=
#[instrument(name = "search_movies", skip(state))]
pub async fn search_movies(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Json<Vec<MovieSuggestion>> {
    let movies = state.movie_lookup.search(&query.q).await;
    info!(results = movies.len(), "Movie search served");
    Json(movies)
}
