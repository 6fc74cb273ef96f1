//! Visual theme: colors, sizes and spacing shared by every host.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Names accepted by [`Theme::preset`].
pub const PRESETS: &[&str] = &["light", "dark"];

/// Theme values consumed by the style resolver and the hosts.
///
/// Sizes are in logical points (CSS pixels for the HTML host). Colors are
/// strings in any form the host understands, typically `#rrggbb`.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default, deny_unknown_fields))]
pub struct Theme {
    pub font_size: f32,
    pub code_font_size: f32,
    pub text_color: String,
    pub background_color: String,
    pub link_color: String,
    pub code_background_color: String,
    pub code_text_color: String,
    /// Per-level heading colors, index 0 for level 1. Missing levels use
    /// `text_color`.
    pub heading_colors: Vec<String>,
    /// Level 1 heading size.
    pub heading_base_size: f32,
    /// Size decrease per heading level.
    pub heading_size_step: f32,
    /// Lower bound for computed text sizes.
    pub min_font_size: f32,
    pub paragraph_spacing: f32,
    pub list_item_spacing: f32,
    pub code_block_padding: f32,
    pub code_block_border_radius: f32,
    pub table_cell_padding: f32,
    pub table_border_color: String,
    pub table_header_background: String,
    pub blockquote_border_width: f32,
    pub blockquote_border_color: String,
    pub blockquote_text_color: String,
    pub image_border_radius: f32,
    pub image_margin: f32,
    pub mention_background: String,
    pub mention_text_color: String,
    pub card_background: String,
    pub card_border_color: String,
    pub card_padding: f32,
    pub card_border_radius: f32,
    pub hr_color: String,
    pub line_height: f32,
    /// Zero disables the limit.
    pub max_content_width: f32,
    pub content_padding: f32,
}

impl Theme {
    /// Light theme (the default).
    #[must_use]
    pub fn light() -> Self {
        Self {
            font_size: 16.0,
            code_font_size: 14.0,
            text_color: "#333333".to_owned(),
            background_color: "#ffffff".to_owned(),
            link_color: "#007AFF".to_owned(),
            code_background_color: "#f4f4f4".to_owned(),
            code_text_color: "#333333".to_owned(),
            heading_colors: vec!["#333333".to_owned(); 6],
            heading_base_size: 24.0,
            heading_size_step: 2.0,
            min_font_size: 10.0,
            paragraph_spacing: 16.0,
            list_item_spacing: 8.0,
            code_block_padding: 16.0,
            code_block_border_radius: 8.0,
            table_cell_padding: 8.0,
            table_border_color: "#dddddd".to_owned(),
            table_header_background: "#f4f4f4".to_owned(),
            blockquote_border_width: 4.0,
            blockquote_border_color: "#dddddd".to_owned(),
            blockquote_text_color: "#666666".to_owned(),
            image_border_radius: 8.0,
            image_margin: 16.0,
            mention_background: "#E3F2FD".to_owned(),
            mention_text_color: "#1976D2".to_owned(),
            card_background: "#f9f9f9".to_owned(),
            card_border_color: "#dddddd".to_owned(),
            card_padding: 16.0,
            card_border_radius: 8.0,
            hr_color: "#dddddd".to_owned(),
            line_height: 1.6,
            max_content_width: 800.0,
            content_padding: 20.0,
        }
    }

    /// Dark theme. Sizes match the light theme.
    #[must_use]
    pub fn dark() -> Self {
        Self {
            text_color: "#f2f2f7".to_owned(),
            background_color: "#1c1c1e".to_owned(),
            code_background_color: "#2c2c2e".to_owned(),
            code_text_color: "#f2f2f7".to_owned(),
            heading_colors: vec!["#f2f2f7".to_owned(); 6],
            table_border_color: "#3a3a3c".to_owned(),
            table_header_background: "#2c2c2e".to_owned(),
            blockquote_border_color: "#3a3a3c".to_owned(),
            blockquote_text_color: "#a1a1a6".to_owned(),
            mention_background: "#1e3a5f".to_owned(),
            mention_text_color: "#64b5f6".to_owned(),
            card_background: "#2c2c2e".to_owned(),
            card_border_color: "#3a3a3c".to_owned(),
            hr_color: "#3a3a3c".to_owned(),
            ..Self::light()
        }
    }

    /// Look up a built-in theme by name (see [`PRESETS`]).
    #[must_use]
    pub fn preset(name: &str) -> Option<Self> {
        match name {
            "light" => Some(Self::light()),
            "dark" => Some(Self::dark()),
            _ => None,
        }
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::light()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_light() {
        assert_eq!(Theme::default(), Theme::light());
    }

    #[test]
    fn test_dark_keeps_light_sizes() {
        let dark = Theme::dark();
        let light = Theme::light();
        assert_eq!(dark.text_color, "#f2f2f7");
        assert!((dark.font_size - light.font_size).abs() < f32::EPSILON);
        assert_eq!(dark.link_color, light.link_color);
    }

    #[test]
    fn test_preset_lookup() {
        for name in PRESETS {
            assert!(Theme::preset(name).is_some(), "missing preset {name}");
        }
        assert!(Theme::preset("solarized").is_none());
    }
}
