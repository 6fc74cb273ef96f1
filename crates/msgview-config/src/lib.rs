//! Configuration management for msgview.
//!
//! Parses `msgview.toml` with serde and discovers it in the working directory
//! or its parents. CLI settings are applied during load via [`CliSettings`].
//!
//! ```toml
//! [theme]
//! preset = "dark"
//! link_color = "${BRAND_LINK:-#0a84ff}"
//!
//! [render]
//! viewport_width = 375
//! max_depth = 64
//!
//! [input]
//! format = "markdown"
//! ```
//!
//! Keys under `[theme]` other than `preset` overlay the preset theme; unknown
//! keys are rejected. String values there support `${VAR}` and
//! `${VAR:-default}` expansion.

mod expand;

use std::path::{Path, PathBuf};

use msgview_parser::InputFormat;
use msgview_renderer::{DEFAULT_MAX_DEPTH, PRESETS, RenderConfig, Theme, is_color};
use serde::Deserialize;

/// Configuration filename to search for.
const CONFIG_FILENAME: &str = "msgview.toml";

/// Upper bound accepted for `render.max_depth`.
const MAX_DEPTH_LIMIT: usize = 1024;

/// CLI settings that override configuration file values.
///
/// Only non-None values override the loaded config.
#[derive(Debug, Default)]
pub struct CliSettings {
    /// Theme preset name.
    pub theme: Option<String>,
    pub viewport_width: Option<f32>,
    pub max_depth: Option<usize>,
    pub input_format: Option<InputFormat>,
}

/// Application configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    theme: ThemeSection,
    pub render: RenderSection,
    pub input: InputSection,

    /// Theme after preset selection and overrides (set after loading).
    #[serde(skip)]
    pub theme_resolved: Theme,
    /// Path to the config file (set after loading).
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

/// Raw `[theme]` table: a preset name plus field overrides.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ThemeSection {
    preset: Option<String>,
    #[serde(flatten)]
    overrides: toml::Table,
}

/// `[render]` section.
#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RenderSection {
    /// Viewport width in logical points; 0 means unconstrained.
    pub viewport_width: f32,
    pub max_depth: usize,
}

impl Default for RenderSection {
    fn default() -> Self {
        Self {
            viewport_width: 0.0,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

/// `[input]` section.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct InputSection {
    pub format: InputFormat,
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Configuration error: {0}")]
    Validation(String),
    #[error("Environment variable error in {field}: {message}")]
    EnvVar {
        /// Config field path (e.g., "`theme.link_color`").
        field: String,
        message: String,
    },
    #[error("Unknown theme preset '{0}' (available: {list})", list = PRESETS.join(", "))]
    UnknownPreset(String),
}

impl Config {
    /// Load configuration with CLI settings applied on top.
    ///
    /// If `config_path` is provided, loads from that file. Otherwise searches
    /// for `msgview.toml` in the current directory and its parents, falling
    /// back to defaults when none exists.
    ///
    /// # Errors
    ///
    /// Returns error if an explicit `config_path` doesn't exist, or if parsing,
    /// expansion, theme resolution or validation fails.
    pub fn load(config_path: Option<&Path>, cli_settings: &CliSettings) -> Result<Self, ConfigError> {
        let discovered = match config_path {
            Some(path) if !path.exists() => return Err(ConfigError::NotFound(path.to_path_buf())),
            Some(path) => Some(path.to_path_buf()),
            None => std::env::current_dir()
                .ok()
                .and_then(|cwd| discover_config(&cwd)),
        };

        let mut config = match discovered {
            Some(path) => Self::load_from_file(&path)?,
            None => Self::default(),
        };
        config.apply_cli_settings(cli_settings);
        config.resolve_theme()?;
        config.validate()?;
        Ok(config)
    }

    /// Parse configuration text without touching the filesystem.
    ///
    /// Expands environment references and resolves the theme, but applies no
    /// CLI settings.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let mut config: Self = toml::from_str(content)?;
        expand::expand_table(&mut config.theme.overrides, "theme")?;
        config.resolve_theme()?;
        config.validate()?;
        Ok(config)
    }

    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        tracing::debug!(path = %path.display(), "Loading configuration");
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content)?;
        expand::expand_table(&mut config.theme.overrides, "theme")?;
        config.config_path = Some(path.to_path_buf());
        Ok(config)
    }

    fn apply_cli_settings(&mut self, settings: &CliSettings) {
        if let Some(theme) = &settings.theme {
            self.theme.preset = Some(theme.clone());
        }
        if let Some(width) = settings.viewport_width {
            self.render.viewport_width = width;
        }
        if let Some(max_depth) = settings.max_depth {
            self.render.max_depth = max_depth;
        }
        if let Some(format) = settings.input_format {
            self.input.format = format;
        }
    }

    /// Pick the preset and lay the `[theme]` overrides over it.
    fn resolve_theme(&mut self) -> Result<(), ConfigError> {
        let name = self.theme.preset.as_deref().unwrap_or("light");
        let preset =
            Theme::preset(name).ok_or_else(|| ConfigError::UnknownPreset(name.to_owned()))?;
        if self.theme.overrides.is_empty() {
            self.theme_resolved = preset;
            return Ok(());
        }

        let toml::Value::Table(mut table) = toml::Value::try_from(&preset)
            .map_err(|e| ConfigError::Validation(format!("theme: {e}")))?
        else {
            return Err(ConfigError::Validation(
                "theme did not serialize to a table".to_owned(),
            ));
        };
        for (key, value) in &self.theme.overrides {
            table.insert(key.clone(), value.clone());
        }
        self.theme_resolved = toml::Value::Table(table).try_into()?;
        Ok(())
    }

    /// Validate configuration values.
    ///
    /// Called automatically by [`Config::load`] after the theme is resolved.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` naming the first invalid field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_render()?;
        validate_theme(&self.theme_resolved)
    }

    fn validate_render(&self) -> Result<(), ConfigError> {
        let width = self.render.viewport_width;
        if width.is_nan() || width < 0.0 {
            return Err(ConfigError::Validation(
                "render.viewport_width must be >= 0".to_owned(),
            ));
        }
        if !(1..=MAX_DEPTH_LIMIT).contains(&self.render.max_depth) {
            return Err(ConfigError::Validation(format!(
                "render.max_depth must be between 1 and {MAX_DEPTH_LIMIT}"
            )));
        }
        Ok(())
    }

    /// Render configuration for the engine.
    #[must_use]
    pub fn render_config(&self) -> RenderConfig {
        RenderConfig::new(self.theme_resolved.clone())
            .with_viewport_width(self.render.viewport_width)
            .with_max_depth(self.render.max_depth)
    }

    /// Preset name in effect.
    #[must_use]
    pub fn preset(&self) -> &str {
        self.theme.preset.as_deref().unwrap_or("light")
    }
}

/// Search for the config file in `start` and its parents.
fn discover_config(start: &Path) -> Option<PathBuf> {
    let mut current = start.to_path_buf();
    loop {
        let candidate = current.join(CONFIG_FILENAME);
        if candidate.exists() {
            return Some(candidate);
        }
        if !current.pop() {
            return None;
        }
    }
}

fn require_color(value: &str, field: &str) -> Result<(), ConfigError> {
    if is_color(value) {
        Ok(())
    } else {
        Err(ConfigError::Validation(format!(
            "{field} must be a color (#rgb, #rrggbb, #rrggbbaa, rgb() or rgba()), got '{value}'"
        )))
    }
}

fn require_positive(value: f32, field: &str) -> Result<(), ConfigError> {
    if value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Validation(format!("{field} must be positive")))
    }
}

fn require_non_negative(value: f32, field: &str) -> Result<(), ConfigError> {
    if value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Validation(format!("{field} must be >= 0")))
    }
}

fn validate_theme(theme: &Theme) -> Result<(), ConfigError> {
    for (value, field) in [
        (&theme.text_color, "theme.text_color"),
        (&theme.background_color, "theme.background_color"),
        (&theme.link_color, "theme.link_color"),
        (&theme.code_background_color, "theme.code_background_color"),
        (&theme.code_text_color, "theme.code_text_color"),
        (&theme.table_border_color, "theme.table_border_color"),
        (&theme.table_header_background, "theme.table_header_background"),
        (&theme.blockquote_border_color, "theme.blockquote_border_color"),
        (&theme.blockquote_text_color, "theme.blockquote_text_color"),
        (&theme.mention_background, "theme.mention_background"),
        (&theme.mention_text_color, "theme.mention_text_color"),
        (&theme.card_background, "theme.card_background"),
        (&theme.card_border_color, "theme.card_border_color"),
        (&theme.hr_color, "theme.hr_color"),
    ] {
        require_color(value, field)?;
    }
    for (index, color) in theme.heading_colors.iter().enumerate() {
        require_color(color, &format!("theme.heading_colors[{index}]"))?;
    }

    for (value, field) in [
        (theme.font_size, "theme.font_size"),
        (theme.code_font_size, "theme.code_font_size"),
        (theme.heading_base_size, "theme.heading_base_size"),
        (theme.min_font_size, "theme.min_font_size"),
        (theme.line_height, "theme.line_height"),
    ] {
        require_positive(value, field)?;
    }
    for (value, field) in [
        (theme.heading_size_step, "theme.heading_size_step"),
        (theme.paragraph_spacing, "theme.paragraph_spacing"),
        (theme.list_item_spacing, "theme.list_item_spacing"),
        (theme.code_block_padding, "theme.code_block_padding"),
        (theme.code_block_border_radius, "theme.code_block_border_radius"),
        (theme.table_cell_padding, "theme.table_cell_padding"),
        (theme.blockquote_border_width, "theme.blockquote_border_width"),
        (theme.image_border_radius, "theme.image_border_radius"),
        (theme.image_margin, "theme.image_margin"),
        (theme.card_padding, "theme.card_padding"),
        (theme.card_border_radius, "theme.card_border_radius"),
        (theme.max_content_width, "theme.max_content_width"),
        (theme.content_padding, "theme.content_padding"),
    ] {
        require_non_negative(value, field)?;
    }
    Ok(())
}
