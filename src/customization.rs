//! Customization resolution.
//!
//! Every customizable field is resolved from an ordered list of candidate
//! sources; the first non-blank candidate wins and the platform default closes
//! the list, so a resolved value is always concrete.

use serde::{Deserialize, Serialize};

pub const DEFAULT_PRIMARY: &str = "#B026FF";
pub const DEFAULT_SECONDARY: &str = "#ffffff";
pub const DEFAULT_ACCENT: &str = "#FFD23F";
pub const DEFAULT_HEADING_FONT: &str = "Montserrat";
pub const DEFAULT_BODY_FONT: &str = "Poppins";
pub const DEFAULT_LAYOUT: &str = "grid";
pub const DEFAULT_TEMPLATE: &str = "modern";

/// Pick the first candidate that is present and not blank, else `default`.
pub fn first_present<'a, I>(candidates: I, default: &str) -> String
where
    I: IntoIterator<Item = Option<&'a str>>,
{
    candidates
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|value| !value.is_empty())
        .unwrap_or(default)
        .to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Colors {
    pub primary: String,
    pub secondary: String,
    pub accent: String,
}

impl Default for Colors {
    fn default() -> Self {
        Self {
            primary: DEFAULT_PRIMARY.to_string(),
            secondary: DEFAULT_SECONDARY.to_string(),
            accent: DEFAULT_ACCENT.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Fonts {
    pub heading: String,
    pub body: String,
}

impl Default for Fonts {
    fn default() -> Self {
        Self {
            heading: DEFAULT_HEADING_FONT.to_string(),
            body: DEFAULT_BODY_FONT.to_string(),
        }
    }
}

/// Concrete customization bundle stored on a portfolio.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Customizations {
    pub colors: Colors,
    pub fonts: Fonts,
    pub layout: String,
}

impl Default for Customizations {
    fn default() -> Self {
        Self {
            colors: Colors::default(),
            fonts: Fonts::default(),
            layout: DEFAULT_LAYOUT.to_string(),
        }
    }
}

impl Customizations {
    /// Re-resolve a stored bundle, replacing blank fields with defaults.
    pub fn resolved(&self) -> Customizations {
        Customizations {
            colors: Colors {
                primary: first_present([Some(self.colors.primary.as_str())], DEFAULT_PRIMARY),
                secondary: first_present(
                    [Some(self.colors.secondary.as_str())],
                    DEFAULT_SECONDARY,
                ),
                accent: first_present([Some(self.colors.accent.as_str())], DEFAULT_ACCENT),
            },
            fonts: Fonts {
                heading: first_present([Some(self.fonts.heading.as_str())], DEFAULT_HEADING_FONT),
                body: first_present([Some(self.fonts.body.as_str())], DEFAULT_BODY_FONT),
            },
            layout: first_present([Some(self.layout.as_str())], DEFAULT_LAYOUT),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ColorsInput {
    pub primary: Option<String>,
    pub secondary: Option<String>,
    pub accent: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FontsInput {
    pub heading: Option<String>,
    pub body: Option<String>,
}

/// Partial customizations as sent by a client.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CustomizationsInput {
    pub colors: Option<ColorsInput>,
    pub fonts: Option<FontsInput>,
    pub layout: Option<String>,
}

impl CustomizationsInput {
    pub fn resolve(&self) -> Customizations {
        let colors = self.colors.clone().unwrap_or_default();
        let fonts = self.fonts.clone().unwrap_or_default();

        Customizations {
            colors: Colors {
                primary: first_present([colors.primary.as_deref()], DEFAULT_PRIMARY),
                secondary: first_present([colors.secondary.as_deref()], DEFAULT_SECONDARY),
                accent: first_present([colors.accent.as_deref()], DEFAULT_ACCENT),
            },
            fonts: Fonts {
                heading: first_present([fonts.heading.as_deref()], DEFAULT_HEADING_FONT),
                body: first_present([fonts.body.as_deref()], DEFAULT_BODY_FONT),
            },
            layout: first_present([self.layout.as_deref()], DEFAULT_LAYOUT),
        }
    }
}

/// Resolve a portfolio template identifier.
pub fn resolve_template(requested: Option<&str>) -> String {
    first_present([requested], DEFAULT_TEMPLATE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_input_resolves_to_defaults() {
        let resolved = CustomizationsInput::default().resolve();
        assert_eq!(resolved, Customizations::default());
        assert_eq!(resolved.colors.primary, DEFAULT_PRIMARY);
        assert_eq!(resolved.fonts.body, DEFAULT_BODY_FONT);
        assert_eq!(resolved.layout, DEFAULT_LAYOUT);
    }

    #[test]
    fn test_partial_colors_fall_back_per_field() {
        let input = CustomizationsInput {
            colors: Some(ColorsInput {
                primary: Some("#112233".to_string()),
                secondary: None,
                accent: Some("   ".to_string()),
            }),
            ..Default::default()
        };
        let resolved = input.resolve();
        assert_eq!(resolved.colors.primary, "#112233");
        assert_eq!(resolved.colors.secondary, DEFAULT_SECONDARY);
        assert_eq!(resolved.colors.accent, DEFAULT_ACCENT);
    }

    #[test]
    fn test_stored_blank_fields_are_re_resolved() {
        let stored: Customizations =
            serde_json::from_value(serde_json::json!({ "colors": { "primary": "" } })).unwrap();
        let resolved = stored.resolved();
        assert_eq!(resolved.colors.primary, DEFAULT_PRIMARY);
        assert_eq!(resolved.fonts.heading, DEFAULT_HEADING_FONT);
    }

    #[test]
    fn test_first_present_takes_earliest_non_blank() {
        assert_eq!(first_present([None, Some(""), Some("b"), Some("c")], "d"), "b");
        assert_eq!(first_present([None, None], "d"), "d");
        assert_eq!(resolve_template(Some("minimal")), "minimal");
        assert_eq!(resolve_template(None), DEFAULT_TEMPLATE);
    }
}
