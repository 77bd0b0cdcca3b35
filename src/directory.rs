/**
 * Directory Queries
 * Public portfolio listing, artist directory and platform statistics:
 * query parameters, the shared filter predicate and the response projections.
 */
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use uuid::Uuid;

use crate::db::models::{Artist, Location, MediaItem, Portfolio, Rating};

pub const DEFAULT_PAGE_LIMIT: i64 = 12;
pub const DEFAULT_ARTIST_LIMIT: i64 = 20;
pub const MAX_LIMIT: i64 = 100;
/// Window for "recent joins" in platform stats.
pub const RECENT_JOIN_DAYS: i64 = 30;
pub const TOP_LOCATIONS: usize = 10;

/// Case-insensitive substring match.
pub fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}

// ============================================================================
// Public portfolio directory
// ============================================================================

/// Raw query string for GET /api/portfolios/public
#[derive(Debug, Default, Deserialize)]
pub struct PublicDirectoryParams {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub category: Option<String>,
    pub search: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryQuery {
    pub page: i64,
    pub limit: i64,
    pub category: Option<String>,
    pub search: Option<String>,
}

impl Default for DirectoryQuery {
    fn default() -> Self {
        Self {
            page: 1,
            limit: DEFAULT_PAGE_LIMIT,
            category: None,
            search: None,
        }
    }
}

impl From<PublicDirectoryParams> for DirectoryQuery {
    fn from(params: PublicDirectoryParams) -> Self {
        Self {
            page: params.page.unwrap_or(1).max(1),
            limit: params.limit.unwrap_or(DEFAULT_PAGE_LIMIT).clamp(1, MAX_LIMIT),
            category: non_blank(params.category.as_deref()).map(str::to_string),
            search: non_blank(params.search.as_deref()).map(str::to_string),
        }
    }
}

impl DirectoryQuery {
    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.limit)
    }

    pub fn category(&self) -> Option<&str> {
        non_blank(self.category.as_deref())
    }

    pub fn search_term(&self) -> Option<&str> {
        non_blank(self.search.as_deref())
    }

    /// Filter stage shared by the listing and its total count.
    pub fn matches(&self, portfolio: &Portfolio, artist: &Artist) -> bool {
        if !portfolio.is_public || !artist.is_active {
            return false;
        }
        if let Some(category) = self.category() {
            if artist.category != category {
                return false;
            }
        }
        match self.search_term() {
            None => true,
            Some(term) => {
                contains_ci(&artist.name, term)
                    || contains_ci(&portfolio.title, term)
                    || portfolio
                        .description
                        .as_deref()
                        .is_some_and(|d| contains_ci(d, term))
                    || artist.genres.iter().any(|g| contains_ci(g, term))
            }
        }
    }
}

/// Directory ordering: views desc, then newest first (id breaks exact ties).
pub fn directory_order(a: &Portfolio, b: &Portfolio) -> Ordering {
    b.views
        .cmp(&a.views)
        .then_with(|| b.created_at.cmp(&a.created_at))
        .then_with(|| a.id.cmp(&b.id))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub current: i64,
    pub pages: i64,
    pub total: i64,
    pub has_next: bool,
    pub has_prev: bool,
}

impl Pagination {
    pub fn new(page: i64, limit: i64, total: i64) -> Self {
        let limit = limit.max(1);
        Self {
            current: page,
            pages: (total + limit - 1) / limit,
            total,
            has_next: page.saturating_mul(limit) < total,
            has_prev: page > 1,
        }
    }
}

/// Artist fields exposed in the public portfolio directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectoryArtistSummary {
    pub name: String,
    pub category: String,
    pub genres: Vec<String>,
    pub location: Location,
    /// At most the first media item.
    pub media: Vec<MediaItem>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicPortfolio {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub template: String,
    pub views: i64,
    pub created_at: DateTime<Utc>,
    pub artist: DirectoryArtistSummary,
}

impl PublicPortfolio {
    pub fn project(portfolio: &Portfolio, artist: &Artist) -> Self {
        Self {
            id: portfolio.id,
            title: portfolio.title.clone(),
            description: portfolio.description.clone(),
            template: portfolio.template.clone(),
            views: portfolio.views,
            created_at: portfolio.created_at,
            artist: DirectoryArtistSummary {
                name: artist.name.clone(),
                category: artist.category.clone(),
                genres: artist.genres.clone(),
                location: artist.location.clone(),
                media: artist.media.iter().take(1).cloned().collect(),
            },
        }
    }
}

/// One page of the directory plus the size of the whole filtered set.
#[derive(Debug, Clone)]
pub struct DirectoryPage {
    pub portfolios: Vec<PublicPortfolio>,
    pub total: i64,
}

// ============================================================================
// Artist directory
// ============================================================================

#[derive(Debug, Default, Deserialize)]
pub struct ArtistDirectoryParams {
    pub category: Option<String>,
    pub location: Option<String>,
    /// Only the literal "true" turns featured ordering on.
    pub featured: Option<String>,
    pub limit: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtistDirectoryQuery {
    pub category: Option<String>,
    pub location: Option<String>,
    pub featured: bool,
    pub limit: i64,
}

impl From<ArtistDirectoryParams> for ArtistDirectoryQuery {
    fn from(params: ArtistDirectoryParams) -> Self {
        Self {
            category: non_blank(params.category.as_deref()).map(str::to_string),
            location: non_blank(params.location.as_deref()).map(str::to_string),
            featured: params.featured.as_deref() == Some("true"),
            limit: params
                .limit
                .unwrap_or(DEFAULT_ARTIST_LIMIT)
                .clamp(1, MAX_LIMIT),
        }
    }
}

impl ArtistDirectoryQuery {
    pub fn matches(&self, artist: &Artist) -> bool {
        if !artist.is_active || !artist.is_verified {
            return false;
        }
        if let Some(category) = non_blank(self.category.as_deref()) {
            if artist.category != category {
                return false;
            }
        }
        match non_blank(self.location.as_deref()) {
            None => true,
            Some(term) => {
                artist
                    .location
                    .city
                    .as_deref()
                    .is_some_and(|c| contains_ci(c, term))
                    || artist
                        .location
                        .country
                        .as_deref()
                        .is_some_and(|c| contains_ci(c, term))
            }
        }
    }

    /// Featured: portfolio views, then rating. Otherwise rating, then newest.
    pub fn order(&self, a: &DirectoryArtist, b: &DirectoryArtist) -> Ordering {
        let by_rating = b
            .rating
            .average
            .partial_cmp(&a.rating.average)
            .unwrap_or(Ordering::Equal);
        if self.featured {
            let views = |artist: &DirectoryArtist| artist.portfolio.as_ref().map_or(0, |p| p.views);
            views(b).cmp(&views(a)).then(by_rating)
        } else {
            by_rating.then_with(|| b.created_at.cmp(&a.created_at))
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioSummary {
    pub id: Uuid,
    pub title: String,
    pub views: i64,
    pub template: String,
}

/// Artist as listed in the public directory (never carries email).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectoryArtist {
    pub id: Uuid,
    pub name: String,
    pub category: String,
    pub experience: String,
    pub location: Location,
    pub genres: Vec<String>,
    pub media: Vec<MediaItem>,
    pub rating: Rating,
    pub portfolio: Option<PortfolioSummary>,
    pub created_at: DateTime<Utc>,
}

impl DirectoryArtist {
    pub fn project(artist: &Artist, portfolio: Option<&Portfolio>) -> Self {
        Self {
            id: artist.id,
            name: artist.name.clone(),
            category: artist.category.clone(),
            experience: artist.experience.clone(),
            location: artist.location.clone(),
            genres: artist.genres.clone(),
            media: artist.media.clone(),
            rating: artist.rating,
            portfolio: portfolio.map(|p| PortfolioSummary {
                id: p.id,
                title: p.title.clone(),
                views: p.views,
                template: p.template.clone(),
            }),
            created_at: artist.created_at,
        }
    }
}

// ============================================================================
// Platform stats
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryCount {
    pub category: String,
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationCount {
    pub country: String,
    pub count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlatformStats {
    pub total_artists: i64,
    pub verified_artists: i64,
    pub recent_joins: i64,
    pub verification_rate: i64,
    pub category_counts: Vec<CategoryCount>,
    pub top_locations: Vec<LocationCount>,
}

/// Rounded percentage of verified artists; 0 when there are none.
pub fn verification_rate(verified: i64, total: i64) -> i64 {
    if total <= 0 {
        0
    } else {
        ((verified as f64 / total as f64) * 100.0).round() as i64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::customization::Customizations;
    use std::collections::BTreeMap;

    fn artist(name: &str, genres: &[&str]) -> Artist {
        Artist {
            id: Uuid::new_v4(),
            name: name.to_string(),
            email: format!("{}@example.com", name.to_lowercase()),
            category: "musician".to_string(),
            experience: "professional".to_string(),
            bio: None,
            location: Location::default(),
            genres: genres.iter().map(|g| g.to_string()).collect(),
            social_links: BTreeMap::new(),
            media: vec![],
            is_verified: true,
            is_active: true,
            rating: Rating::default(),
            portfolio_id: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn portfolio(artist: &Artist, title: &str) -> Portfolio {
        Portfolio {
            id: Uuid::new_v4(),
            artist_id: artist.id,
            template: "modern".to_string(),
            title: title.to_string(),
            description: None,
            customizations: Customizations::default(),
            sections: vec![],
            views: 0,
            is_public: true,
            generated_files: vec![],
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_pagination_first_and_last_page() {
        let first = Pagination::new(1, 12, 25);
        assert_eq!(first.pages, 3);
        assert!(first.has_next);
        assert!(!first.has_prev);

        let last = Pagination::new(3, 12, 25);
        assert_eq!(last.pages, 3);
        assert!(!last.has_next);
        assert!(last.has_prev);
    }

    #[test]
    fn test_pagination_empty_set() {
        let empty = Pagination::new(1, 12, 0);
        assert_eq!(empty.pages, 0);
        assert!(!empty.has_next);
        assert!(!empty.has_prev);
    }

    #[test]
    fn test_search_matches_genre_only() {
        let a = artist("Amani", &["Afrobeat", "Jazz Fusion"]);
        let p = portfolio(&a, "Live Sessions");
        let query = DirectoryQuery {
            search: Some("fusion".to_string()),
            ..Default::default()
        };
        assert!(query.matches(&p, &a));

        let miss = DirectoryQuery {
            search: Some("baroque".to_string()),
            ..Default::default()
        };
        assert!(!miss.matches(&p, &a));
    }

    #[test]
    fn test_private_portfolio_and_inactive_artist_are_excluded() {
        let mut a = artist("Wanjiru", &[]);
        let mut p = portfolio(&a, "Sculpture");
        let query = DirectoryQuery::default();
        assert!(query.matches(&p, &a));

        p.is_public = false;
        assert!(!query.matches(&p, &a));

        p.is_public = true;
        a.is_active = false;
        assert!(!query.matches(&p, &a));
    }

    #[test]
    fn test_category_filter_is_exact() {
        let a = artist("Baraka", &[]);
        let p = portfolio(&a, "Tour");
        let query = DirectoryQuery {
            category: Some("musician".to_string()),
            ..Default::default()
        };
        assert!(query.matches(&p, &a));
        let other = DirectoryQuery {
            category: Some("music".to_string()),
            ..Default::default()
        };
        assert!(!other.matches(&p, &a));
    }

    #[test]
    fn test_params_are_clamped() {
        let query = DirectoryQuery::from(PublicDirectoryParams {
            page: Some(0),
            limit: Some(1000),
            category: Some("  ".to_string()),
            search: None,
        });
        assert_eq!(query.page, 1);
        assert_eq!(query.limit, MAX_LIMIT);
        assert_eq!(query.category, None);
        assert_eq!(query.offset(), 0);
    }

    #[test]
    fn test_huge_page_saturates_instead_of_overflowing() {
        let query = DirectoryQuery::from(PublicDirectoryParams {
            page: Some(i64::MAX),
            limit: Some(MAX_LIMIT),
            category: None,
            search: None,
        });
        assert_eq!(query.offset(), i64::MAX);

        let pagination = Pagination::new(i64::MAX, MAX_LIMIT, 25);
        assert_eq!(pagination.current, i64::MAX);
        assert!(!pagination.has_next);
        assert!(pagination.has_prev);
    }

    #[test]
    fn test_featured_flag_requires_literal_true() {
        let featured = |value: Option<&str>| {
            ArtistDirectoryQuery::from(ArtistDirectoryParams {
                featured: value.map(str::to_string),
                ..Default::default()
            })
            .featured
        };
        assert!(featured(Some("true")));
        assert!(!featured(Some("yes")));
        assert!(!featured(Some("TRUE")));
        assert!(!featured(None));
    }

    #[test]
    fn test_directory_order_views_then_newest() {
        let a = artist("A", &[]);
        let mut older = portfolio(&a, "older");
        older.created_at = Utc::now() - chrono::Duration::days(1);
        let newer = portfolio(&a, "newer");
        let mut popular = portfolio(&a, "popular");
        popular.views = 10;

        let mut list = vec![older.clone(), newer.clone(), popular.clone()];
        list.sort_by(directory_order);
        let titles: Vec<&str> = list.iter().map(|p| p.title.as_str()).collect();
        assert_eq!(titles, ["popular", "newer", "older"]);
    }

    #[test]
    fn test_projection_keeps_first_media_only() {
        let mut a = artist("Zawadi", &[]);
        a.media = vec![
            MediaItem {
                url: "/a.jpg".into(),
                kind: None,
                caption: None,
            },
            MediaItem {
                url: "/b.jpg".into(),
                kind: None,
                caption: None,
            },
        ];
        let p = portfolio(&a, "Photos");
        let projected = PublicPortfolio::project(&p, &a);
        assert_eq!(projected.artist.media.len(), 1);
        assert_eq!(projected.artist.media[0].url, "/a.jpg");
    }

    #[test]
    fn test_artist_directory_location_matches_city_or_country() {
        let mut a = artist("Kito", &[]);
        a.location = Location {
            city: Some("Mombasa".into()),
            country: Some("Kenya".into()),
        };
        let by_city = ArtistDirectoryQuery::from(ArtistDirectoryParams {
            location: Some("momb".into()),
            ..Default::default()
        });
        assert!(by_city.matches(&a));
        let by_country = ArtistDirectoryQuery::from(ArtistDirectoryParams {
            location: Some("KENYA".into()),
            ..Default::default()
        });
        assert!(by_country.matches(&a));

        a.is_verified = false;
        assert!(!by_city.matches(&a));
    }

    #[test]
    fn test_verification_rate_rounds_and_handles_zero() {
        assert_eq!(verification_rate(1, 3), 33);
        assert_eq!(verification_rate(2, 3), 67);
        assert_eq!(verification_rate(0, 0), 0);
    }
}
