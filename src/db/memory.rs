//! In-memory store used when no database is configured, and by the test suite.

use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::models::{Artist, GeneratedFile, NewArtist, NewPortfolio, Portfolio, Rating};
use super::{StoreCounts, StoreError};
use crate::directory::{
    directory_order, verification_rate, ArtistDirectoryQuery, CategoryCount, DirectoryArtist,
    DirectoryPage, DirectoryQuery, LocationCount, PlatformStats, PublicPortfolio,
    RECENT_JOIN_DAYS, TOP_LOCATIONS,
};

#[derive(Debug, Default)]
struct Inner {
    artists: HashMap<Uuid, Artist>,
    portfolios: HashMap<Uuid, Portfolio>,
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<Inner>>,
}

impl MemoryStore {
    pub async fn counts(&self) -> StoreCounts {
        let inner = self.inner.read().await;
        StoreCounts {
            active_artists: inner.artists.values().filter(|a| a.is_active).count() as i64,
            portfolios: inner.portfolios.len() as i64,
        }
    }

    pub async fn insert_artist(&self, new: NewArtist) -> Result<Artist, StoreError> {
        let mut inner = self.inner.write().await;
        if inner.artists.values().any(|a| a.email == new.email) {
            return Err(StoreError::duplicate("email"));
        }

        let now = Utc::now();
        let artist = Artist {
            id: Uuid::new_v4(),
            name: new.name,
            email: new.email,
            category: new.category,
            experience: new.experience,
            bio: new.bio,
            location: new.location,
            genres: new.genres,
            social_links: new.social_links,
            media: new.media,
            is_verified: new.is_verified,
            is_active: true,
            rating: Rating::default(),
            portfolio_id: None,
            created_at: now,
            updated_at: now,
        };
        inner.artists.insert(artist.id, artist.clone());
        Ok(artist)
    }

    pub async fn find_artist(&self, id: Uuid) -> Option<Artist> {
        self.inner.read().await.artists.get(&id).cloned()
    }

    #[cfg(test)]
    /// Flip an artist's active flag; returns false for an unknown id.
    pub async fn set_artist_active(&self, id: Uuid, active: bool) -> bool {
        match self.inner.write().await.artists.get_mut(&id) {
            Some(artist) => {
                artist.is_active = active;
                true
            }
            None => false,
        }
    }

    pub async fn insert_portfolio(&self, new: NewPortfolio) -> Result<Portfolio, StoreError> {
        let mut inner = self.inner.write().await;
        if inner.portfolios.values().any(|p| p.artist_id == new.artist_id) {
            return Err(StoreError::duplicate("artist"));
        }

        let now = Utc::now();
        let portfolio = Portfolio {
            id: Uuid::new_v4(),
            artist_id: new.artist_id,
            template: new.template,
            title: new.title,
            description: new.description,
            customizations: new.customizations,
            sections: new.sections,
            views: 0,
            is_public: new.is_public,
            generated_files: Vec::new(),
            created_at: now,
            updated_at: now,
        };

        if let Some(artist) = inner.artists.get_mut(&new.artist_id) {
            artist.portfolio_id = Some(portfolio.id);
            artist.updated_at = now;
        }
        inner.portfolios.insert(portfolio.id, portfolio.clone());
        Ok(portfolio)
    }

    pub async fn find_portfolio(&self, id: Uuid) -> Option<Portfolio> {
        self.inner.read().await.portfolios.get(&id).cloned()
    }

    pub async fn record_view(&self, id: Uuid) -> Option<Portfolio> {
        let mut inner = self.inner.write().await;
        let portfolio = inner.portfolios.get_mut(&id)?;
        portfolio.views += 1;
        Some(portfolio.clone())
    }

    pub async fn append_generated_file(&self, id: Uuid, file: &GeneratedFile) -> bool {
        let mut inner = self.inner.write().await;
        match inner.portfolios.get_mut(&id) {
            Some(portfolio) => {
                portfolio.generated_files.push(file.clone());
                portfolio.updated_at = Utc::now();
                true
            }
            None => false,
        }
    }

    pub async fn public_directory(&self, query: &DirectoryQuery) -> DirectoryPage {
        let inner = self.inner.read().await;

        let mut matched: Vec<(&Portfolio, &Artist)> = inner
            .portfolios
            .values()
            .filter_map(|p| inner.artists.get(&p.artist_id).map(|a| (p, a)))
            .filter(|(p, a)| query.matches(p, a))
            .collect();
        let total = matched.len() as i64;

        matched.sort_by(|(a, _), (b, _)| directory_order(a, b));
        let portfolios = matched
            .into_iter()
            .skip(usize::try_from(query.offset()).unwrap_or(usize::MAX))
            .take(query.limit as usize)
            .map(|(p, a)| PublicPortfolio::project(p, a))
            .collect();

        DirectoryPage { portfolios, total }
    }

    pub async fn artist_directory(&self, query: &ArtistDirectoryQuery) -> Vec<DirectoryArtist> {
        let inner = self.inner.read().await;

        let mut artists: Vec<DirectoryArtist> = inner
            .artists
            .values()
            .filter(|a| query.matches(a))
            .map(|a| {
                let portfolio = a.portfolio_id.and_then(|id| inner.portfolios.get(&id));
                DirectoryArtist::project(a, portfolio)
            })
            .collect();

        artists.sort_by(|a, b| query.order(a, b));
        artists.truncate(query.limit as usize);
        artists
    }

    pub async fn platform_stats(&self, now: DateTime<Utc>) -> PlatformStats {
        let inner = self.inner.read().await;
        let active: Vec<&Artist> = inner.artists.values().filter(|a| a.is_active).collect();

        let total_artists = active.len() as i64;
        let verified_artists = active.iter().filter(|a| a.is_verified).count() as i64;
        let since = now - Duration::days(RECENT_JOIN_DAYS);
        let recent_joins = active.iter().filter(|a| a.created_at >= since).count() as i64;

        let mut by_category: HashMap<&str, i64> = HashMap::new();
        let mut by_country: HashMap<&str, i64> = HashMap::new();
        for artist in &active {
            *by_category.entry(artist.category.as_str()).or_default() += 1;
            if let Some(country) = artist
                .location
                .country
                .as_deref()
                .map(str::trim)
                .filter(|c| !c.is_empty())
            {
                *by_country.entry(country).or_default() += 1;
            }
        }

        let mut category_counts: Vec<CategoryCount> = by_category
            .into_iter()
            .map(|(category, count)| CategoryCount {
                category: category.to_string(),
                count,
            })
            .collect();
        category_counts.sort_by(|a, b| b.count.cmp(&a.count).then(a.category.cmp(&b.category)));

        let mut top_locations: Vec<LocationCount> = by_country
            .into_iter()
            .map(|(country, count)| LocationCount {
                country: country.to_string(),
                count,
            })
            .collect();
        top_locations.sort_by(|a, b| b.count.cmp(&a.count).then(a.country.cmp(&b.country)));
        top_locations.truncate(TOP_LOCATIONS);

        PlatformStats {
            total_artists,
            verified_artists,
            recent_joins,
            verification_rate: verification_rate(verified_artists, total_artists),
            category_counts,
            top_locations,
        }
    }
}
