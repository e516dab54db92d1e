// Public API - what other modules can use
pub use handlers::search_movies;
pub use service::{placeholder_suggestions, MovieLookup, MovieSuggestion, TmdbLookup};

// Internal modules
mod handlers;
mod service;
