/**
 * Artist Routes
 * Registration, public artist directory and platform statistics
 */
use axum::{
    extract::State,
    http::StatusCode,
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::error::{ApiError, ApiJson, ApiQuery};
use crate::db::models::{Artist, Location, MediaItem, NewArtist};
use crate::directory::{ArtistDirectoryParams, ArtistDirectoryQuery, DirectoryArtist, PlatformStats};
use crate::state::AppState;

const DEFAULT_EXPERIENCE: &str = "beginner";

/// Request body for POST /api/artists
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateArtistRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub category: Option<String>,
    pub experience: Option<String>,
    pub bio: Option<String>,
    #[serde(default)]
    pub location: Location,
    #[serde(default)]
    pub genres: Vec<String>,
    #[serde(default)]
    pub social_links: BTreeMap<String, String>,
    #[serde(default)]
    pub media: Vec<MediaItem>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateArtistResponse {
    pub message: String,
    pub artist: Artist,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DirectoryResponse {
    pub artists: Vec<DirectoryArtist>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StatsResponse {
    pub stats: PlatformStats,
}

fn trimmed(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl CreateArtistRequest {
    fn validate(self) -> Result<NewArtist, ApiError> {
        let mut errors = Vec::new();

        let name = trimmed(self.name);
        if name.is_none() {
            errors.push("name is required".to_string());
        }
        let email = trimmed(self.email).map(|e| e.to_lowercase());
        match email.as_deref() {
            None => errors.push("email is required".to_string()),
            Some(e) if !e.contains('@') => errors.push("email must be a valid address".to_string()),
            Some(_) => {}
        }
        let category = trimmed(self.category);
        if category.is_none() {
            errors.push("category is required".to_string());
        }

        let (Some(name), Some(email), Some(category)) = (name, email, category) else {
            return Err(ApiError::Validation(errors));
        };
        if !errors.is_empty() {
            return Err(ApiError::Validation(errors));
        }

        Ok(NewArtist {
            name,
            email,
            category,
            experience: trimmed(self.experience).unwrap_or_else(|| DEFAULT_EXPERIENCE.to_string()),
            bio: trimmed(self.bio),
            location: self.location,
            genres: self
                .genres
                .into_iter()
                .map(|g| g.trim().to_string())
                .filter(|g| !g.is_empty())
                .collect(),
            social_links: self.social_links,
            media: self.media,
            is_verified: false,
        })
    }
}

/// POST /api/artists
pub async fn create_artist(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<CreateArtistRequest>,
) -> Result<(StatusCode, Json<CreateArtistResponse>), ApiError> {
    let new = payload.validate()?;

    let artist = state
        .store
        .insert_artist(new)
        .await
        .map_err(|e| state.store_error("Failed to create artist", e))?;

    tracing::info!(artist_id = %artist.id, category = %artist.category, "Artist created");

    Ok((
        StatusCode::CREATED,
        Json(CreateArtistResponse {
            message: "Artist created successfully".to_string(),
            artist,
        }),
    ))
}

/// GET /api/artists/directory?category=&location=&featured=&limit=
pub async fn directory(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<ArtistDirectoryParams>,
) -> Result<Json<DirectoryResponse>, ApiError> {
    let query = ArtistDirectoryQuery::from(params);

    let artists = state
        .store
        .artist_directory(&query)
        .await
        .map_err(|e| state.store_error("Failed to load artist directory", e))?;

    Ok(Json(DirectoryResponse { artists }))
}

/// GET /api/artists/stats
pub async fn stats(State(state): State<AppState>) -> Result<Json<StatsResponse>, ApiError> {
    let stats = state
        .store
        .platform_stats(Utc::now())
        .await
        .map_err(|e| state.store_error("Failed to load platform stats", e))?;

    Ok(Json(StatsResponse { stats }))
}
