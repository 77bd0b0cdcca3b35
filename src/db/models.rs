//! Database Models - domain records and the sqlx rows they are loaded from.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::customization::Customizations;

/// Free-text artist location.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub city: Option<String>,
    pub country: Option<String>,
}

impl Location {
    /// "City, Country" from whichever parts are present.
    pub fn display(&self) -> Option<String> {
        let parts: Vec<&str> = [self.city.as_deref(), self.country.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect();
        if parts.is_empty() {
            None
        } else {
            Some(parts.join(", "))
        }
    }
}

/// Media reference attached to an artist profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaItem {
    pub url: String,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Rating {
    pub average: f64,
    pub count: i32,
}

/// Artist record. `email` is private; public views use [`ArtistProfile`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Artist {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub category: String,
    pub experience: String,
    pub bio: Option<String>,
    pub location: Location,
    pub genres: Vec<String>,
    pub social_links: BTreeMap<String, String>,
    pub media: Vec<MediaItem>,
    pub is_verified: bool,
    pub is_active: bool,
    pub rating: Rating,
    pub portfolio_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Artist {
    /// Social links that actually carry a URL, in platform order.
    pub fn populated_social_links(&self) -> impl Iterator<Item = (&str, &str)> {
        self.social_links
            .iter()
            .map(|(platform, url)| (platform.as_str(), url.trim()))
            .filter(|(_, url)| !url.is_empty())
    }

    pub fn profile(&self) -> ArtistProfile {
        ArtistProfile {
            id: self.id,
            name: self.name.clone(),
            category: self.category.clone(),
            experience: self.experience.clone(),
            bio: self.bio.clone(),
            location: self.location.clone(),
            genres: self.genres.clone(),
            social_links: self.social_links.clone(),
            media: self.media.clone(),
            is_verified: self.is_verified,
            rating: self.rating,
        }
    }
}

/// Artist as shown publicly (no email).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtistProfile {
    pub id: Uuid,
    pub name: String,
    pub category: String,
    pub experience: String,
    pub bio: Option<String>,
    pub location: Location,
    pub genres: Vec<String>,
    pub social_links: BTreeMap<String, String>,
    pub media: Vec<MediaItem>,
    pub is_verified: bool,
    pub rating: Rating,
}

/// New artist for insertion
#[derive(Debug, Clone)]
pub struct NewArtist {
    pub name: String,
    pub email: String,
    pub category: String,
    pub experience: String,
    pub bio: Option<String>,
    pub location: Location,
    pub genres: Vec<String>,
    pub social_links: BTreeMap<String, String>,
    pub media: Vec<MediaItem>,
    pub is_verified: bool,
}

/// A customizable portfolio section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub media: Vec<String>,
}

impl Section {
    /// Explicit title, else the type with its first letter capitalized.
    pub fn display_title(&self) -> String {
        match self.title.as_deref().map(str::trim) {
            Some(title) if !title.is_empty() => title.to_string(),
            _ => capitalize(&self.kind),
        }
    }
}

pub fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileFormat {
    Pdf,
    Html,
}

impl FileFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            FileFormat::Pdf => "pdf",
            FileFormat::Html => "html",
        }
    }
}

/// Record of one rendered artifact. Never mutated once appended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedFile {
    pub format: FileFormat,
    pub filename: String,
    pub url: String,
    pub generated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Portfolio {
    pub id: Uuid,
    pub artist_id: Uuid,
    pub template: String,
    pub title: String,
    pub description: Option<String>,
    pub customizations: Customizations,
    pub sections: Vec<Section>,
    pub views: i64,
    pub is_public: bool,
    pub generated_files: Vec<GeneratedFile>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// New portfolio for insertion (customizations already resolved)
#[derive(Debug, Clone)]
pub struct NewPortfolio {
    pub artist_id: Uuid,
    pub template: String,
    pub title: String,
    pub description: Option<String>,
    pub customizations: Customizations,
    pub sections: Vec<Section>,
    pub is_public: bool,
}

// ============================================================================
// Rows
// ============================================================================

#[derive(Debug, Clone, FromRow)]
pub struct ArtistRow {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub category: String,
    pub experience: String,
    pub bio: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
    pub genres: Vec<String>,
    pub social_links: Json<BTreeMap<String, String>>,
    pub media: Json<Vec<MediaItem>>,
    pub is_verified: bool,
    pub is_active: bool,
    pub rating_average: f64,
    pub rating_count: i32,
    pub portfolio_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<ArtistRow> for Artist {
    fn from(row: ArtistRow) -> Self {
        Artist {
            id: row.id,
            name: row.name,
            email: row.email,
            category: row.category,
            experience: row.experience,
            bio: row.bio,
            location: Location {
                city: row.city,
                country: row.country,
            },
            genres: row.genres,
            social_links: row.social_links.0,
            media: row.media.0,
            is_verified: row.is_verified,
            is_active: row.is_active,
            rating: Rating {
                average: row.rating_average,
                count: row.rating_count,
            },
            portfolio_id: row.portfolio_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct PortfolioRow {
    pub id: Uuid,
    pub artist_id: Uuid,
    pub template: String,
    pub title: String,
    pub description: Option<String>,
    pub customizations: Json<Customizations>,
    pub sections: Json<Vec<Section>>,
    pub views: i64,
    pub is_public: bool,
    pub generated_files: Json<Vec<GeneratedFile>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<PortfolioRow> for Portfolio {
    fn from(row: PortfolioRow) -> Self {
        Portfolio {
            id: row.id,
            artist_id: row.artist_id,
            template: row.template,
            title: row.title,
            description: row.description,
            customizations: row.customizations.0,
            sections: row.sections.0,
            views: row.views,
            is_public: row.is_public,
            generated_files: row.generated_files.0,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_location_display_joins_present_parts() {
        let both = Location {
            city: Some("Nairobi".into()),
            country: Some("Kenya".into()),
        };
        assert_eq!(both.display().as_deref(), Some("Nairobi, Kenya"));

        let country_only = Location {
            city: Some("  ".into()),
            country: Some("Kenya".into()),
        };
        assert_eq!(country_only.display().as_deref(), Some("Kenya"));
        assert_eq!(Location::default().display(), None);
    }

    #[test]
    fn test_section_title_falls_back_to_capitalized_type() {
        let section = Section {
            kind: "gallery".into(),
            title: None,
            content: String::new(),
            media: vec![],
        };
        assert_eq!(section.display_title(), "Gallery");

        let titled = Section {
            title: Some("Selected Work".into()),
            ..section
        };
        assert_eq!(titled.display_title(), "Selected Work");
    }

    #[test]
    fn test_section_deserializes_type_field() {
        let section: Section =
            serde_json::from_value(serde_json::json!({ "type": "experience" })).unwrap();
        assert_eq!(section.kind, "experience");
        assert!(section.content.is_empty());
        assert!(section.media.is_empty());
    }

    #[test]
    fn test_file_format_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&FileFormat::Pdf).unwrap(), "\"pdf\"");
        assert_eq!(FileFormat::Html.as_str(), "html");
    }
}
