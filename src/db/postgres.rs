//! Postgres-backed store.

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use sqlx::types::Json;
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};
use std::time::{Duration, Instant};
use uuid::Uuid;

use super::models::{
    Artist, ArtistRow, GeneratedFile, Location, MediaItem, NewArtist, NewPortfolio, Portfolio,
    PortfolioRow,
};
use super::{StoreCounts, StoreError};
use crate::directory::{
    verification_rate, ArtistDirectoryQuery, CategoryCount, DirectoryArtist,
    DirectoryArtistSummary, DirectoryPage, DirectoryQuery, LocationCount, PlatformStats,
    PortfolioSummary, PublicPortfolio, RECENT_JOIN_DAYS, TOP_LOCATIONS,
};

const ARTIST_COLUMNS: &str = "id, name, email, category, experience, bio, city, country, genres, \
     social_links, media, is_verified, is_active, rating_average, rating_count, portfolio_id, \
     created_at, updated_at";

const PORTFOLIO_COLUMNS: &str = "id, artist_id, template, title, description, customizations, \
     sections, views, is_public, generated_files, created_at, updated_at";

/// Escape LIKE metacharacters so user input matches literally.
fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

fn like_pattern(term: &str) -> String {
    format!("%{}%", escape_like(term))
}

/// Map unique violations onto the field clients know them by.
fn map_write_error(err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() {
            let field = match db_err.constraint() {
                Some("portfolios_artist_id_key") => "artist",
                _ => "email",
            };
            return StoreError::duplicate(field);
        }
    }
    StoreError::Database(err)
}

#[derive(Debug, FromRow)]
struct PublicPortfolioRow {
    id: Uuid,
    title: String,
    description: Option<String>,
    template: String,
    views: i64,
    created_at: DateTime<Utc>,
    artist_name: String,
    artist_category: String,
    artist_genres: Vec<String>,
    artist_city: Option<String>,
    artist_country: Option<String>,
    artist_media: Json<Vec<MediaItem>>,
}

impl From<PublicPortfolioRow> for PublicPortfolio {
    fn from(row: PublicPortfolioRow) -> Self {
        PublicPortfolio {
            id: row.id,
            title: row.title,
            description: row.description,
            template: row.template,
            views: row.views,
            created_at: row.created_at,
            artist: DirectoryArtistSummary {
                name: row.artist_name,
                category: row.artist_category,
                genres: row.artist_genres,
                location: Location {
                    city: row.artist_city,
                    country: row.artist_country,
                },
                media: row.artist_media.0.into_iter().take(1).collect(),
            },
        }
    }
}

#[derive(Debug, FromRow)]
struct DirectoryArtistRow {
    #[sqlx(flatten)]
    artist: ArtistRow,
    linked_portfolio_id: Option<Uuid>,
    linked_portfolio_title: Option<String>,
    linked_portfolio_views: Option<i64>,
    linked_portfolio_template: Option<String>,
}

impl From<DirectoryArtistRow> for DirectoryArtist {
    fn from(row: DirectoryArtistRow) -> Self {
        let artist = Artist::from(row.artist);
        let mut listed = DirectoryArtist::project(&artist, None);
        listed.portfolio = row.linked_portfolio_id.map(|id| PortfolioSummary {
            id,
            title: row.linked_portfolio_title.unwrap_or_default(),
            views: row.linked_portfolio_views.unwrap_or(0),
            template: row.linked_portfolio_template.unwrap_or_default(),
        });
        listed
    }
}

#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn ping(&self) -> Result<Duration, StoreError> {
        let start = Instant::now();
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(start.elapsed())
    }

    pub async fn counts(&self) -> Result<StoreCounts, StoreError> {
        let (active_artists,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM artists WHERE is_active")
                .fetch_one(&self.pool)
                .await?;
        let (portfolios,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM portfolios")
            .fetch_one(&self.pool)
            .await?;

        Ok(StoreCounts {
            active_artists,
            portfolios,
        })
    }

    // ========================================================================
    // Artists
    // ========================================================================

    pub async fn insert_artist(&self, new: NewArtist) -> Result<Artist, StoreError> {
        let sql = format!(
            "INSERT INTO artists (name, email, category, experience, bio, city, country, genres, \
             social_links, media, is_verified) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11) \
             RETURNING {}",
            ARTIST_COLUMNS
        );

        let row = sqlx::query_as::<_, ArtistRow>(&sql)
            .bind(&new.name)
            .bind(&new.email)
            .bind(&new.category)
            .bind(&new.experience)
            .bind(&new.bio)
            .bind(&new.location.city)
            .bind(&new.location.country)
            .bind(&new.genres)
            .bind(Json(&new.social_links))
            .bind(Json(&new.media))
            .bind(new.is_verified)
            .fetch_one(&self.pool)
            .await
            .map_err(map_write_error)?;

        Ok(row.into())
    }

    pub async fn find_artist(&self, id: Uuid) -> Result<Option<Artist>, StoreError> {
        let sql = format!("SELECT {} FROM artists WHERE id = $1", ARTIST_COLUMNS);
        let row = sqlx::query_as::<_, ArtistRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Artist::from))
    }

    // ========================================================================
    // Portfolios
    // ========================================================================

    pub async fn insert_portfolio(&self, new: NewPortfolio) -> Result<Portfolio, StoreError> {
        let mut tx = self.pool.begin().await?;

        let sql = format!(
            "INSERT INTO portfolios (artist_id, template, title, description, customizations, \
             sections, is_public) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             RETURNING {}",
            PORTFOLIO_COLUMNS
        );
        let row = sqlx::query_as::<_, PortfolioRow>(&sql)
            .bind(new.artist_id)
            .bind(&new.template)
            .bind(&new.title)
            .bind(&new.description)
            .bind(Json(&new.customizations))
            .bind(Json(&new.sections))
            .bind(new.is_public)
            .fetch_one(&mut *tx)
            .await
            .map_err(map_write_error)?;

        sqlx::query("UPDATE artists SET portfolio_id = $1, updated_at = now() WHERE id = $2")
            .bind(row.id)
            .bind(new.artist_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(row.into())
    }

    pub async fn find_portfolio(&self, id: Uuid) -> Result<Option<Portfolio>, StoreError> {
        let sql = format!("SELECT {} FROM portfolios WHERE id = $1", PORTFOLIO_COLUMNS);
        let row = sqlx::query_as::<_, PortfolioRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Portfolio::from))
    }

    pub async fn record_view(&self, id: Uuid) -> Result<Option<Portfolio>, StoreError> {
        let sql = format!(
            "UPDATE portfolios SET views = views + 1 WHERE id = $1 RETURNING {}",
            PORTFOLIO_COLUMNS
        );
        let row = sqlx::query_as::<_, PortfolioRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Portfolio::from))
    }

    /// Single-statement append; concurrent callers never overwrite each other.
    pub async fn append_generated_file(
        &self,
        id: Uuid,
        file: &GeneratedFile,
    ) -> Result<bool, StoreError> {
        let result = sqlx::query(
            "UPDATE portfolios \
             SET generated_files = generated_files || jsonb_build_array($2::jsonb), \
                 updated_at = now() \
             WHERE id = $1",
        )
        .bind(id)
        .bind(Json(file))
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    // ========================================================================
    // Directory
    // ========================================================================

    fn push_public_filter(builder: &mut QueryBuilder<'_, Postgres>, query: &DirectoryQuery) {
        builder.push(" WHERE p.is_public AND a.is_active");

        if let Some(category) = query.category() {
            builder.push(" AND a.category = ");
            builder.push_bind(category.to_string());
        }

        if let Some(term) = query.search_term() {
            let pattern = like_pattern(term);
            builder.push(" AND (a.name ILIKE ");
            builder.push_bind(pattern.clone());
            builder.push(" OR p.title ILIKE ");
            builder.push_bind(pattern.clone());
            builder.push(" OR p.description ILIKE ");
            builder.push_bind(pattern.clone());
            builder.push(" OR EXISTS (SELECT 1 FROM unnest(a.genres) AS g WHERE g ILIKE ");
            builder.push_bind(pattern);
            builder.push("))");
        }
    }

    pub async fn public_directory(&self, query: &DirectoryQuery) -> Result<DirectoryPage, StoreError> {
        let mut count = QueryBuilder::<Postgres>::new(
            "SELECT COUNT(*) FROM portfolios p JOIN artists a ON a.id = p.artist_id",
        );
        Self::push_public_filter(&mut count, query);
        let (total,): (i64,) = count.build_query_as().fetch_one(&self.pool).await?;

        let mut list = QueryBuilder::<Postgres>::new(
            "SELECT p.id, p.title, p.description, p.template, p.views, p.created_at, \
             a.name AS artist_name, a.category AS artist_category, a.genres AS artist_genres, \
             a.city AS artist_city, a.country AS artist_country, \
             CASE WHEN jsonb_array_length(a.media) > 0 \
                  THEN jsonb_build_array(a.media -> 0) \
                  ELSE '[]'::jsonb END AS artist_media \
             FROM portfolios p JOIN artists a ON a.id = p.artist_id",
        );
        Self::push_public_filter(&mut list, query);
        list.push(" ORDER BY p.views DESC, p.created_at DESC, p.id ASC LIMIT ");
        list.push_bind(query.limit);
        list.push(" OFFSET ");
        list.push_bind(query.offset());

        let rows: Vec<PublicPortfolioRow> = list.build_query_as().fetch_all(&self.pool).await?;

        Ok(DirectoryPage {
            portfolios: rows.into_iter().map(PublicPortfolio::from).collect(),
            total,
        })
    }

    pub async fn artist_directory(
        &self,
        query: &ArtistDirectoryQuery,
    ) -> Result<Vec<DirectoryArtist>, StoreError> {
        let columns = ARTIST_COLUMNS
            .split(", ")
            .map(|c| format!("a.{}", c.trim()))
            .collect::<Vec<_>>()
            .join(", ");

        let mut builder = QueryBuilder::<Postgres>::new(format!(
            "SELECT {}, p.id AS linked_portfolio_id, p.title AS linked_portfolio_title, \
             p.views AS linked_portfolio_views, p.template AS linked_portfolio_template \
             FROM artists a LEFT JOIN portfolios p ON p.id = a.portfolio_id \
             WHERE a.is_active AND a.is_verified",
            columns
        ));

        if let Some(category) = query.category.as_deref() {
            builder.push(" AND a.category = ");
            builder.push_bind(category.to_string());
        }
        if let Some(location) = query.location.as_deref() {
            let pattern = like_pattern(location);
            builder.push(" AND (a.city ILIKE ");
            builder.push_bind(pattern.clone());
            builder.push(" OR a.country ILIKE ");
            builder.push_bind(pattern);
            builder.push(")");
        }

        if query.featured {
            builder.push(" ORDER BY COALESCE(p.views, 0) DESC, a.rating_average DESC");
        } else {
            builder.push(" ORDER BY a.rating_average DESC, a.created_at DESC");
        }
        builder.push(" LIMIT ");
        builder.push_bind(query.limit);

        let rows: Vec<DirectoryArtistRow> = builder.build_query_as().fetch_all(&self.pool).await?;
        Ok(rows.into_iter().map(DirectoryArtist::from).collect())
    }

    pub async fn platform_stats(&self, now: DateTime<Utc>) -> Result<PlatformStats, StoreError> {
        let since = now - ChronoDuration::days(RECENT_JOIN_DAYS);

        let total = sqlx::query_as::<_, (i64,)>("SELECT COUNT(*) FROM artists WHERE is_active")
            .fetch_one(&self.pool);
        let verified = sqlx::query_as::<_, (i64,)>(
            "SELECT COUNT(*) FROM artists WHERE is_active AND is_verified",
        )
        .fetch_one(&self.pool);
        let recent = sqlx::query_as::<_, (i64,)>(
            "SELECT COUNT(*) FROM artists WHERE is_active AND created_at >= $1",
        )
        .bind(since)
        .fetch_one(&self.pool);
        let categories = sqlx::query_as::<_, (String, i64)>(
            "SELECT category, COUNT(*) FROM artists WHERE is_active \
             GROUP BY category ORDER BY COUNT(*) DESC, category",
        )
        .fetch_all(&self.pool);
        let locations = sqlx::query_as::<_, (String, i64)>(
            "SELECT btrim(country) AS country, COUNT(*) FROM artists \
             WHERE is_active AND country IS NOT NULL AND btrim(country) <> '' \
             GROUP BY btrim(country) ORDER BY COUNT(*) DESC, country LIMIT $1",
        )
        .bind(TOP_LOCATIONS as i64)
        .fetch_all(&self.pool);

        let ((total_artists,), (verified_artists,), (recent_joins,), categories, locations) =
            tokio::try_join!(total, verified, recent, categories, locations)?;

        Ok(PlatformStats {
            total_artists,
            verified_artists,
            recent_joins,
            verification_rate: verification_rate(verified_artists, total_artists),
            category_counts: categories
                .into_iter()
                .map(|(category, count)| CategoryCount { category, count })
                .collect(),
            top_locations: locations
                .into_iter()
                .map(|(country, count)| LocationCount { country, count })
                .collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_like_escapes_metacharacters() {
        assert_eq!(escape_like("100%_done\\"), "100\\%\\_done\\\\");
        assert_eq!(like_pattern("jazz"), "%jazz%");
    }

    #[test]
    fn test_public_filter_binds_search_once_per_column() {
        let mut builder = QueryBuilder::<Postgres>::new("SELECT 1 FROM portfolios p");
        let query = DirectoryQuery {
            category: Some("musician".into()),
            search: Some("jazz".into()),
            ..Default::default()
        };
        PgStore::push_public_filter(&mut builder, &query);
        let sql = builder.sql();
        assert!(sql.contains("a.category = $1"));
        assert!(sql.contains("unnest(a.genres)"));
        assert!(sql.contains("$5"));
        assert!(!sql.contains("$6"));
    }

    #[test]
    fn test_public_filter_without_terms_only_checks_visibility() {
        let mut builder = QueryBuilder::<Postgres>::new("SELECT 1 FROM portfolios p");
        PgStore::push_public_filter(&mut builder, &DirectoryQuery::default());
        assert!(builder.sql().ends_with("WHERE p.is_public AND a.is_active"));
    }
}
