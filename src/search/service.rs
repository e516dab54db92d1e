use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, instrument, warn};

/// Queries shorter than this get no suggestions
pub const MIN_QUERY_LEN: usize = 2;
pub const MAX_RESULTS: usize = 10;

const TMDB_BASE_URL: &str = "https://api.themoviedb.org/3";
const POSTER_BASE_URL: &str = "https://image.tmdb.org/t/p/w200";
/// Value shipped in sample env files, treated as no key at all
const PLACEHOLDER_API_KEY: &str = "your_tmdb_api_key_here";

/// A search hit, shaped so it can be added to a wheel as-is
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovieSuggestion {
    pub id: i64,
    pub title: String,
    pub year: Option<i32>,
    pub poster: Option<String>,
}

/// Title search used to help people add movies
#[async_trait]
pub trait MovieLookup: Send + Sync {
    /// Never fails; a broken upstream degrades to placeholder suggestions
    async fn search(&self, query: &str) -> Vec<MovieSuggestion>;
}

#[derive(Error, Debug)]
enum LookupError {
    #[error("upstream request failed: {0}")]
    Request(#[from] reqwest::Error),
}

#[derive(Debug, Deserialize)]
struct TmdbSearchResponse {
    #[serde(default)]
    results: Vec<TmdbMovie>,
}

#[derive(Debug, Deserialize)]
struct TmdbMovie {
    id: i64,
    title: String,
    #[serde(default)]
    release_date: Option<String>,
    #[serde(default)]
    poster_path: Option<String>,
}

impl From<TmdbMovie> for MovieSuggestion {
    fn from(movie: TmdbMovie) -> Self {
        Self {
            id: movie.id,
            title: movie.title,
            year: movie.release_date.as_deref().and_then(release_year),
            poster: movie
                .poster_path
                .map(|path| format!("{}{}", POSTER_BASE_URL, path)),
        }
    }
}

fn release_year(release_date: &str) -> Option<i32> {
    release_date.get(..4)?.parse().ok()
}

/// Stand-in results for when no catalog is reachable
pub fn placeholder_suggestions(query: &str) -> Vec<MovieSuggestion> {
    let titles = [
        (format!("{} (Mock Movie)", query), 2023),
        (format!("{} 2: The Sequel", query), 2024),
        (format!("The {} Chronicles", query), 2022),
    ];

    titles
        .into_iter()
        .zip(1..)
        .map(|((title, year), id)| MovieSuggestion {
            id,
            title,
            year: Some(year),
            poster: None,
        })
        .collect()
}

/// Searches The Movie Database
pub struct TmdbLookup {
    client: reqwest::Client,
    api_key: Option<String>,
    base_url: String,
}

impl TmdbLookup {
    pub fn new(api_key: Option<String>) -> Self {
        Self::with_base_url(api_key, TMDB_BASE_URL.to_string())
    }

    pub fn with_base_url(api_key: Option<String>, base_url: String) -> Self {
        let api_key = api_key
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty() && key != PLACEHOLDER_API_KEY);

        Self {
            client: reqwest::Client::new(),
            api_key,
            base_url,
        }
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    async fn fetch(&self, api_key: &str, query: &str) -> Result<Vec<MovieSuggestion>, LookupError> {
        let response: TmdbSearchResponse = self
            .client
            .get(format!("{}/search/movie", self.base_url))
            .query(&[("api_key", api_key), ("query", query), ("page", "1")])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(response
            .results
            .into_iter()
            .take(MAX_RESULTS)
            .map(MovieSuggestion::from)
            .collect())
    }
}

#[async_trait]
impl MovieLookup for TmdbLookup {
    #[instrument(skip(self))]
    async fn search(&self, query: &str) -> Vec<MovieSuggestion> {
        let query = query.trim();
        if query.chars().count() < MIN_QUERY_LEN {
            return Vec::new();
        }

        let Some(api_key) = self.api_key.as_deref() else {
            debug!("No catalog key configured, returning placeholders");
            return placeholder_suggestions(query);
        };

        match self.fetch(api_key, query).await {
            Ok(movies) => {
                debug!(results = movies.len(), "Catalog search finished");
                movies
            }
            Err(e) => {
                warn!(error = %e, "Catalog search failed, returning placeholders");
                placeholder_suggestions(query)
            }
        }
    }
}
