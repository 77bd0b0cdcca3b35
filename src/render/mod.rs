//! Document rendering: the PDF pipeline and the HTML microsite.

pub mod canvas;
pub mod color;
pub mod encode;
pub mod html;
pub mod metrics;
pub mod pdf;

use crate::customization::Customizations;
use crate::db::models::{Artist, Portfolio};

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("artist not found for portfolio")]
    ArtistNotFound,

    #[error("pdf encoding failed: {0}")]
    Pdf(#[from] lopdf::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// A portfolio joined with its artist, ready to render.
#[derive(Debug, Clone)]
pub struct PortfolioBundle {
    pub portfolio: Portfolio,
    pub artist: Artist,
    /// Stored customizations with blank fields re-resolved to defaults.
    pub customizations: Customizations,
    /// Whether the artist's email may appear in the output.
    pub show_email: bool,
}

impl PortfolioBundle {
    /// Join a portfolio with its artist. A missing artist rejects the render
    /// before anything is drawn.
    pub fn resolve(portfolio: Portfolio, artist: Option<Artist>) -> Result<Self, RenderError> {
        let artist = artist.ok_or(RenderError::ArtistNotFound)?;
        let customizations = portfolio.customizations.resolved();
        Ok(Self {
            portfolio,
            artist,
            customizations,
            show_email: true,
        })
    }

    /// Keep the artist's email out of the rendered document.
    pub fn withhold_email(mut self) -> Self {
        self.show_email = false;
        self
    }

    pub fn contact_email(&self) -> Option<&str> {
        self.show_email.then_some(self.artist.email.as_str())
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_artist_is_rejected() {
        let artist = fixtures::artist();
        let portfolio = fixtures::portfolio(&artist);
        let err = PortfolioBundle::resolve(portfolio, None).unwrap_err();
        assert!(matches!(err, RenderError::ArtistNotFound));
    }

    #[test]
    fn test_withheld_email_is_hidden() {
        let artist = fixtures::artist();
        let portfolio = fixtures::portfolio(&artist);
        let bundle = PortfolioBundle::resolve(portfolio, Some(artist)).unwrap();
        assert_eq!(bundle.contact_email(), Some("amani@example.com"));
        assert_eq!(bundle.withhold_email().contact_email(), None);
    }
}
