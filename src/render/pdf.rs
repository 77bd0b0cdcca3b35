/**
 * PDF Portfolio Layout
 * Single forward pass over a portfolio: cover, optional bio, one page per
 * section, optional skills, contact, then a footer stamped on the last page.
 */
use chrono::{DateTime, Datelike, Utc};

use super::canvas::{Align, Canvas, Page, TextStyle};
use super::color::{hex_to_rgb, Rgb};
use super::metrics::{line_height, width_of};
use super::{encode, PortfolioBundle, RenderError};
use crate::config::Branding;
use crate::db::models::capitalize;

const BODY_GRAY: Rgb = Rgb(0x33, 0x33, 0x33);
const LINK_BLUE: Rgb = Rgb(0x00, 0x66, 0xcc);
const FOOTER_GRAY: Rgb = Rgb(0x66, 0x66, 0x66);

const COVER_BANNER_HEIGHT: f32 = 200.0;
const HEADER_BAND_Y: f32 = 50.0;
const HEADER_BAND_HEIGHT: f32 = 40.0;
const PAGE_CONTENT_Y: f32 = 110.0;

const MEDIA_BOX_WIDTH: f32 = 150.0;
const MEDIA_BOX_HEIGHT: f32 = 100.0;
const MEDIA_BOX_STEP: f32 = 120.0;

const TAG_FONT_SIZE: f32 = 10.0;
const TAG_PADDING: f32 = 20.0;
const TAG_HEIGHT: f32 = 25.0;
const TAG_ROW_STEP: f32 = 35.0;
const TAG_GAP: f32 = 10.0;

/// Metadata written to the PDF Info dictionary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentInfo {
    pub title: String,
    pub author: String,
    pub subject: String,
    pub creator: String,
    pub created: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct PdfDocument {
    pub width: f32,
    pub height: f32,
    pub info: DocumentInfo,
    pub pages: Vec<Page>,
}

/// "visual_artist" -> "VISUAL ARTIST". Only the first underscore is replaced.
fn category_label(category: &str) -> String {
    let trimmed = category.trim();
    if trimmed.is_empty() {
        "CREATIVE PROFESSIONAL".to_string()
    } else {
        trimmed.replacen('_', " ", 1).to_uppercase()
    }
}

fn footer_date(now: DateTime<Utc>) -> String {
    format!("{}/{}/{}", now.month(), now.day(), now.year())
}

struct Layout<'a> {
    canvas: Canvas,
    bundle: &'a PortfolioBundle,
    primary: Rgb,
    accent: Rgb,
}

impl<'a> Layout<'a> {
    fn new(bundle: &'a PortfolioBundle) -> Self {
        let colors = &bundle.customizations.colors;
        Self {
            canvas: Canvas::a4(),
            bundle,
            primary: hex_to_rgb(&colors.primary),
            accent: hex_to_rgb(&colors.accent),
        }
    }

    fn full_width(&self) -> f32 {
        self.canvas.content_width()
    }

    /// Accent band with a white heading at the top of a fresh page.
    fn page_header(&mut self, heading: &str) {
        self.canvas.add_page();
        let width = self.full_width();
        let margin = self.canvas.margin;
        self.canvas
            .fill_rect(margin, HEADER_BAND_Y, width, HEADER_BAND_HEIGHT, self.accent);
        self.canvas.stamp(
            heading,
            margin + 10.0,
            65.0,
            width - 10.0,
            TextStyle::new(18.0, Rgb::WHITE),
        );
    }

    fn cover(&mut self) {
        let bundle = self.bundle;
        let artist = &bundle.artist;
        let portfolio = &bundle.portfolio;
        let page_width = self.canvas.width;
        let margin = self.canvas.margin;
        let width = self.full_width();

        self.canvas
            .fill_rect(0.0, 0.0, page_width, COVER_BANNER_HEIGHT, self.primary);

        let centered = |size| TextStyle::new(size, Rgb::WHITE).align(Align::Center);
        self.canvas.stamp(&artist.name, margin, 80.0, width, centered(32.0));
        self.canvas.stamp(
            &category_label(&artist.category),
            margin,
            120.0,
            width,
            centered(18.0),
        );
        self.canvas.stamp(
            &format!("{} LEVEL", artist.experience.to_uppercase()),
            margin,
            145.0,
            width,
            centered(14.0),
        );

        self.canvas.fill_rect(margin, 180.0, width, 3.0, self.accent);

        self.canvas.text(
            &portfolio.title,
            margin,
            220.0,
            width,
            TextStyle::new(24.0, self.primary),
        );
        self.canvas.move_down(1.0, 24.0);

        if let Some(description) = portfolio.description.as_deref().filter(|d| !d.trim().is_empty()) {
            let y = self.canvas.y;
            self.canvas.text(
                description,
                margin,
                y,
                width,
                TextStyle::new(12.0, BODY_GRAY).align(Align::Justify),
            );
            self.canvas.move_down(2.0, 12.0);
        }
    }

    fn bio(&mut self) {
        let bundle = self.bundle;
        let Some(bio) = bundle.artist.bio.as_deref().filter(|b| !b.trim().is_empty()) else {
            return;
        };
        self.page_header("ABOUT THE ARTIST");
        let margin = self.canvas.margin;
        let width = self.full_width();
        self.canvas.text(
            bio,
            margin,
            PAGE_CONTENT_Y,
            width,
            TextStyle::new(12.0, BODY_GRAY).align(Align::Justify),
        );
        self.canvas.move_down(2.0, 12.0);
    }

    fn sections(&mut self) {
        let margin = self.canvas.margin;
        let width = self.full_width();

        let bundle = self.bundle;
        for section in &bundle.portfolio.sections {
            let heading = match section.title.as_deref().map(str::trim) {
                Some(title) if !title.is_empty() => title.to_uppercase(),
                _ => section.kind.to_uppercase(),
            };
            self.page_header(&heading);

            let mut y = PAGE_CONTENT_Y;
            if !section.content.trim().is_empty() {
                self.canvas.text(
                    &section.content,
                    margin,
                    y,
                    width,
                    TextStyle::new(12.0, BODY_GRAY).align(Align::Justify),
                );
                y = self.canvas.y + 20.0;
            }

            for _ in &section.media {
                if y + MEDIA_BOX_HEIGHT > self.canvas.bottom() {
                    self.canvas.add_page();
                    y = self.canvas.margin;
                }
                self.canvas
                    .stroke_rect(margin, y, MEDIA_BOX_WIDTH, MEDIA_BOX_HEIGHT, self.primary);
                self.canvas.stamp(
                    "Media Content",
                    margin + 10.0,
                    y + 45.0,
                    MEDIA_BOX_WIDTH - 20.0,
                    TextStyle::new(10.0, self.primary).align(Align::Center),
                );
                y += MEDIA_BOX_STEP;
            }
        }
    }

    fn skills(&mut self) {
        let bundle = self.bundle;
        let genres: Vec<&str> = bundle
            .artist
            .genres
            .iter()
            .map(|g| g.trim())
            .filter(|g| !g.is_empty())
            .collect();
        if genres.is_empty() {
            return;
        }

        self.page_header("SKILLS & SPECIALTIES");
        let margin = self.canvas.margin;
        let right = self.canvas.width - margin;
        let mut x = margin;
        let mut y = 120.0;

        for genre in genres {
            let tag_width = width_of(genre, TAG_FONT_SIZE) + TAG_PADDING;
            if x + tag_width > right && x > margin {
                x = margin;
                y += TAG_ROW_STEP;
            }
            if y + TAG_HEIGHT > self.canvas.bottom() {
                self.canvas.add_page();
                x = margin;
                y = self.canvas.margin;
            }

            self.canvas.fill_rect(x, y, tag_width, TAG_HEIGHT, self.primary);
            self.canvas.stamp(
                genre,
                x + 10.0,
                y + 8.0,
                tag_width,
                TextStyle::new(TAG_FONT_SIZE, Rgb::WHITE),
            );
            x += tag_width + TAG_GAP;
        }
    }

    fn contact(&mut self) {
        self.page_header("CONTACT INFORMATION");
        let bundle = self.bundle;
        let artist = &bundle.artist;
        let margin = self.canvas.margin;
        let width = self.full_width();
        let label = TextStyle::new(14.0, self.primary);
        let value = TextStyle::new(12.0, BODY_GRAY);
        let mut y = 120.0;

        self.canvas.stamp("Email:", margin, y, width, label);
        self.canvas.stamp(
            bundle.contact_email().unwrap_or_default(),
            margin,
            y + 20.0,
            width,
            value,
        );
        y += 50.0;

        if let Some(location) = artist.location.display() {
            self.canvas.stamp("Location:", margin, y, width, label);
            self.canvas.stamp(&location, margin, y + 20.0, width, value);
            y += 50.0;
        }

        let links: Vec<(&str, &str)> = artist.populated_social_links().collect();
        if !links.is_empty() {
            self.canvas.stamp("Connect Online:", margin, y, width, label);
            y += 25.0;

            let style = TextStyle::new(12.0, LINK_BLUE).underline();
            for (platform, url) in links {
                let line = format!("{}: {}", capitalize(platform), url);
                let lines = self.canvas.link(&line, url, margin, y, width, style);
                y += 20.0 + lines.saturating_sub(1) as f32 * line_height(style.size);
            }
        }
    }

    fn footer(&mut self, branding: &Branding, now: DateTime<Utc>) {
        let text = format!(
            "Generated by {} Platform \u{2022} {} \u{2022} www.{}",
            branding.platform_name,
            footer_date(now),
            branding.platform_domain
        );
        let margin = self.canvas.margin;
        let width = self.full_width();
        let y = self.canvas.height - 30.0;
        self.canvas.stamp(
            &text,
            margin,
            y,
            width,
            TextStyle::new(8.0, FOOTER_GRAY).align(Align::Center),
        );
    }
}

/// Lay out every page of the portfolio PDF.
pub fn layout(bundle: &PortfolioBundle, branding: &Branding, now: DateTime<Utc>) -> PdfDocument {
    let mut layout = Layout::new(bundle);
    layout.cover();
    layout.bio();
    layout.sections();
    layout.skills();
    layout.contact();
    layout.footer(branding, now);

    let canvas = layout.canvas;
    PdfDocument {
        width: canvas.width,
        height: canvas.height,
        info: DocumentInfo {
            title: bundle.portfolio.title.clone(),
            author: bundle.artist.name.clone(),
            subject: "Professional Portfolio".to_string(),
            creator: format!("{} Platform", branding.platform_name),
            created: now,
        },
        pages: canvas.into_pages(),
    }
}

/// Render the portfolio to PDF bytes.
pub fn render(
    bundle: &PortfolioBundle,
    branding: &Branding,
    now: DateTime<Utc>,
) -> Result<Vec<u8>, RenderError> {
    let document = layout(bundle, branding, now);
    encode::encode(&document)
}
