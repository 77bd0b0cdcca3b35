/**
 * Portfolio Routes
 * Creation, public listing, analytics and document generation (PDF + web)
 */
use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path as FsPath;
use uuid::Uuid;

use super::error::{ApiError, ApiJson, ApiQuery};
use super::uploads::is_safe_file_component;
use crate::customization::{resolve_template, CustomizationsInput};
use crate::db::models::{
    Artist, ArtistProfile, FileFormat, GeneratedFile, NewPortfolio, Portfolio, Section,
};
use crate::directory::{DirectoryQuery, Pagination, PublicDirectoryParams, PublicPortfolio};
use crate::render::{html, pdf, PortfolioBundle, RenderError};
use crate::state::AppState;

lazy_static::lazy_static! {
    static ref WHITESPACE: Regex = Regex::new(r"\s+").expect("valid whitespace regex");
}

const RECENT_ACTIVITY: usize = 5;

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request body for POST /api/portfolios
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePortfolioRequest {
    pub artist_id: Option<String>,
    pub template: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub sections: Option<Vec<Section>>,
    pub customizations: Option<CustomizationsInput>,
    pub is_public: Option<bool>,
}

/// Artist fields populated into a freshly created portfolio.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtistContact {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub category: String,
    pub experience: String,
}

impl From<&Artist> for ArtistContact {
    fn from(artist: &Artist) -> Self {
        Self {
            id: artist.id,
            name: artist.name.clone(),
            email: artist.email.clone(),
            category: artist.category.clone(),
            experience: artist.experience.clone(),
        }
    }
}

/// A portfolio with its artist joined in.
#[derive(Debug, Serialize, Deserialize)]
pub struct PortfolioWithArtist<A> {
    #[serde(flatten)]
    pub portfolio: Portfolio,
    pub artist: A,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreatePortfolioResponse {
    pub message: String,
    pub portfolio: PortfolioWithArtist<ArtistContact>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PortfolioResponse {
    pub portfolio: PortfolioWithArtist<Option<ArtistProfile>>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PublicPortfoliosResponse {
    pub portfolios: Vec<PublicPortfolio>,
    pub pagination: Pagination,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratePdfResponse {
    pub message: String,
    pub download_url: String,
    pub filename: String,
    pub file_size: u64,
}

/// Optional body for POST /api/portfolios/{id}/generate-web
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateWebRequest {
    pub custom_domain: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateWebResponse {
    pub message: String,
    pub live_url: String,
    pub preview_url: String,
    pub filename: String,
    pub domain: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct FilesGenerated {
    pub pdf: usize,
    pub html: usize,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Analytics {
    pub views: i64,
    pub generated_files: usize,
    pub last_updated: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub sections_count: usize,
    pub is_public: bool,
    pub template: String,
    pub files_generated: FilesGenerated,
    pub recent_activity: Vec<GeneratedFile>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AnalyticsResponse {
    pub analytics: Analytics,
}

// ============================================================================
// Helpers
// ============================================================================

/// Malformed ids cannot name an existing record.
fn parse_id(raw: &str, not_found: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw.trim()).map_err(|_| ApiError::not_found(not_found))
}

/// Lower-case, collapse whitespace runs to '-', and refuse anything that
/// could escape the web-portfolios directory.
pub fn domain_slug(raw: &str) -> Result<String, ApiError> {
    let slug = WHITESPACE
        .replace_all(raw.trim(), "-")
        .to_lowercase();
    if slug.is_empty() {
        return Err(ApiError::validation("domain must not be empty"));
    }
    if !is_safe_file_component(&slug) {
        return Err(ApiError::validation("domain contains invalid characters"));
    }
    Ok(slug)
}

impl Analytics {
    pub fn from_portfolio(portfolio: &Portfolio) -> Self {
        let count = |format: FileFormat| {
            portfolio
                .generated_files
                .iter()
                .filter(|f| f.format == format)
                .count()
        };

        // Sort a copy; the stored list keeps its append order.
        let mut recent = portfolio.generated_files.clone();
        recent.sort_by(|a, b| b.generated_at.cmp(&a.generated_at));
        recent.truncate(RECENT_ACTIVITY);

        Self {
            views: portfolio.views,
            generated_files: portfolio.generated_files.len(),
            last_updated: portfolio.updated_at,
            created_at: portfolio.created_at,
            sections_count: portfolio.sections.len(),
            is_public: portfolio.is_public,
            template: portfolio.template.clone(),
            files_generated: FilesGenerated {
                pdf: count(FileFormat::Pdf),
                html: count(FileFormat::Html),
            },
            recent_activity: recent,
        }
    }
}

async fn load_bundle(state: &AppState, id: Uuid) -> Result<PortfolioBundle, ApiError> {
    let portfolio = state
        .store
        .find_portfolio(id)
        .await
        .map_err(|e| state.store_error("Failed to load portfolio", e))?
        .ok_or_else(|| ApiError::not_found("Portfolio not found"))?;

    let artist = state
        .store
        .find_artist(portfolio.artist_id)
        .await
        .map_err(|e| state.store_error("Failed to load artist", e))?;

    PortfolioBundle::resolve(portfolio, artist).map_err(|e| match e {
        RenderError::ArtistNotFound => ApiError::not_found("Artist not found"),
        other => state.internal_error("Failed to prepare portfolio", other),
    })
}

/// Record a written file on its portfolio. If the record cannot be saved the
/// file is deleted again so no artifact exists without a record.
async fn record_or_discard(
    state: &AppState,
    id: Uuid,
    file: &GeneratedFile,
    path: &FsPath,
) -> Result<(), ApiError> {
    let failure = match state.store.append_generated_file(id, file).await {
        Ok(true) => return Ok(()),
        Ok(false) => None,
        Err(e) => Some(e),
    };

    tracing::error!(
        portfolio_id = %id,
        filename = %file.filename,
        error = ?failure,
        "Failed to record generated file; removing it"
    );
    if let Err(e) = tokio::fs::remove_file(path).await {
        tracing::warn!(path = %path.display(), error = %e, "Failed to remove unrecorded file");
    }

    Err(state.internal_error("Failed to save portfolio file info", failure))
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /api/portfolios
pub async fn create_portfolio(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<CreatePortfolioRequest>,
) -> Result<(StatusCode, Json<CreatePortfolioResponse>), ApiError> {
    let mut errors = Vec::new();
    let artist_id = match payload.artist_id.as_deref().map(str::trim) {
        Some(raw) if !raw.is_empty() => match Uuid::parse_str(raw) {
            Ok(id) => Some(id),
            Err(_) => {
                errors.push("artistId must be a valid id".to_string());
                None
            }
        },
        _ => {
            errors.push("artistId is required".to_string());
            None
        }
    };
    let title = payload
        .title
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string);
    if title.is_none() {
        errors.push("title is required".to_string());
    }
    let (Some(artist_id), Some(title)) = (artist_id, title) else {
        return Err(ApiError::Validation(errors));
    };

    let artist = state
        .store
        .find_artist(artist_id)
        .await
        .map_err(|e| state.store_error("Failed to load artist", e))?
        .ok_or_else(|| ApiError::not_found("Artist not found"))?;

    let new = NewPortfolio {
        artist_id,
        template: resolve_template(payload.template.as_deref()),
        title,
        description: payload.description.filter(|d| !d.trim().is_empty()),
        customizations: payload.customizations.unwrap_or_default().resolve(),
        sections: payload.sections.unwrap_or_default(),
        is_public: payload.is_public.unwrap_or(true),
    };

    let portfolio = state
        .store
        .insert_portfolio(new)
        .await
        .map_err(|e| state.store_error("Failed to create portfolio", e))?;

    tracing::info!(portfolio_id = %portfolio.id, artist_id = %artist.id, "Portfolio created");

    Ok((
        StatusCode::CREATED,
        Json(CreatePortfolioResponse {
            message: "Portfolio created successfully".to_string(),
            portfolio: PortfolioWithArtist {
                portfolio,
                artist: ArtistContact::from(&artist),
            },
        }),
    ))
}

/// GET /api/portfolios/{id}
/// Counts a view and returns the portfolio with its public artist profile.
pub async fn get_portfolio(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<PortfolioResponse>, ApiError> {
    let id = parse_id(&id, "Portfolio not found")?;

    let portfolio = state
        .store
        .record_view(id)
        .await
        .map_err(|e| state.store_error("Failed to load portfolio", e))?
        .ok_or_else(|| ApiError::not_found("Portfolio not found"))?;

    let artist = state
        .store
        .find_artist(portfolio.artist_id)
        .await
        .map_err(|e| state.store_error("Failed to load artist", e))?;

    Ok(Json(PortfolioResponse {
        portfolio: PortfolioWithArtist {
            portfolio,
            artist: artist.as_ref().map(Artist::profile),
        },
    }))
}

/// GET /api/portfolios/public?page=&limit=&category=&search=
pub async fn list_public(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<PublicDirectoryParams>,
) -> Result<Json<PublicPortfoliosResponse>, ApiError> {
    let query = DirectoryQuery::from(params);

    let page = state
        .store
        .public_directory(&query)
        .await
        .map_err(|e| state.store_error("Failed to load public portfolios", e))?;

    Ok(Json(PublicPortfoliosResponse {
        pagination: Pagination::new(query.page, query.limit, page.total),
        portfolios: page.portfolios,
    }))
}

/// GET /api/portfolios/{id}/analytics
pub async fn analytics(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<AnalyticsResponse>, ApiError> {
    let id = parse_id(&id, "Portfolio not found")?;

    let portfolio = state
        .store
        .find_portfolio(id)
        .await
        .map_err(|e| state.store_error("Failed to load portfolio", e))?
        .ok_or_else(|| ApiError::not_found("Portfolio not found"))?;

    Ok(Json(AnalyticsResponse {
        analytics: Analytics::from_portfolio(&portfolio),
    }))
}

/// POST /api/portfolios/{id}/generate-pdf
/// Renders the PDF, writes it under the portfolios upload directory, and only
/// then records it on the portfolio.
pub async fn generate_pdf(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<GeneratePdfResponse>, ApiError> {
    let id = parse_id(&id, "Portfolio not found")?;
    let bundle = load_bundle(&state, id).await?;

    let now = Utc::now();
    let filename = format!("portfolio-{}-{}.pdf", id, now.timestamp_millis());
    let dir = state.config.pdf_dir();
    let path = dir.join(&filename);

    let branding = state.config.branding.clone();
    let bytes = tokio::task::spawn_blocking(move || pdf::render(&bundle, &branding, now))
        .await
        .map_err(|e| state.internal_error("PDF rendering task failed", e))?
        .map_err(|e| state.internal_error("Failed to render PDF", e))?;

    tokio::fs::create_dir_all(&dir)
        .await
        .map_err(|e| state.internal_error("Failed to prepare upload directory", e))?;
    tokio::fs::write(&path, &bytes)
        .await
        .map_err(|e| state.internal_error("Failed to write PDF", e))?;

    let url = format!("/uploads/portfolios/{}", filename);
    let file = GeneratedFile {
        format: FileFormat::Pdf,
        filename: filename.clone(),
        url: url.clone(),
        generated_at: now,
    };
    record_or_discard(&state, id, &file, &path).await?;

    tracing::info!(portfolio_id = %id, filename = %filename, bytes = bytes.len(), "PDF generated");

    Ok(Json(GeneratePdfResponse {
        message: "Enhanced portfolio PDF generated successfully".to_string(),
        download_url: url,
        filename,
        file_size: bytes.len() as u64,
    }))
}

/// POST /api/portfolios/{id}/generate-web
/// Body is optional: `{ "customDomain": "..." }`.
pub async fn generate_web(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<Json<GenerateWebResponse>, ApiError> {
    let request: GenerateWebRequest = if body.iter().all(u8::is_ascii_whitespace) {
        GenerateWebRequest::default()
    } else {
        serde_json::from_slice(&body).map_err(|e| ApiError::validation(e.to_string()))?
    };

    let id = parse_id(&id, "Portfolio not found")?;
    let bundle = load_bundle(&state, id).await?.withhold_email();

    let domain = match request
        .custom_domain
        .as_deref()
        .filter(|d| !d.trim().is_empty())
    {
        Some(custom) => domain_slug(custom)?,
        None => domain_slug(&bundle.artist.name)?,
    };

    let now = Utc::now();
    let document = html::render(&bundle, &state.config.branding, now);

    let filename = format!("{}-{}.html", domain, now.timestamp_millis());
    let dir = state.config.web_dir();
    let path = dir.join(&filename);

    tokio::fs::create_dir_all(&dir)
        .await
        .map_err(|e| state.internal_error("Failed to prepare upload directory", e))?;
    tokio::fs::write(&path, document.as_bytes())
        .await
        .map_err(|e| state.internal_error("Failed to write web portfolio", e))?;

    let url = format!("/uploads/web-portfolios/{}", filename);
    let file = GeneratedFile {
        format: FileFormat::Html,
        filename: filename.clone(),
        url: url.clone(),
        generated_at: now,
    };
    record_or_discard(&state, id, &file, &path).await?;

    tracing::info!(portfolio_id = %id, domain = %domain, filename = %filename, "Web portfolio generated");

    Ok(Json(GenerateWebResponse {
        message: "Web portfolio generated successfully".to_string(),
        live_url: state.config.branding.live_url(&domain),
        preview_url: url,
        filename,
        domain,
    }))
}
