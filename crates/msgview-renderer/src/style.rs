//! Style resolution: (node kind, context, theme) to concrete style values.
//!
//! Nothing here is stored on the document. Every value is derived on demand
//! from the [`Theme`], so the same inputs always resolve to the same style.

use std::sync::LazyLock;

use msgview_ast::{ImageNode, TextAlign};
use regex::Regex;
#[cfg(feature = "serde")]
use serde::Serialize;

use crate::theme::Theme;

static COLOR_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(#([0-9a-fA-F]{3}|[0-9a-fA-F]{6}|[0-9a-fA-F]{8})|rgba?\(\s*[0-9.%]+(\s*,\s*[0-9.%]+){2,3}\s*\))$",
    )
    .expect("invalid color regex")
});

/// Whether `value` is a color literal: `#rgb`, `#rrggbb`, `#rrggbbaa`,
/// `rgb()` or `rgba()`. Surrounding whitespace is ignored.
pub fn is_color(value: &str) -> bool {
    COLOR_PATTERN.is_match(value.trim())
}

/// Concrete text style handed to a host.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct ResolvedStyle {
    pub font_size: f32,
    pub color: String,
    pub background: Option<String>,
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    pub strikethrough: bool,
    pub monospace: bool,
}

impl ResolvedStyle {
    fn plain(font_size: f32, color: &str) -> Self {
        Self {
            font_size,
            color: color.to_owned(),
            background: None,
            bold: false,
            italic: false,
            underline: false,
            strikethrough: false,
            monospace: false,
        }
    }

    /// Whether any emphasis attribute is set.
    pub fn is_emphasized(&self) -> bool {
        self.bold || self.italic || self.underline || self.strikethrough
    }
}

/// Box decoration for framed blocks (code, tables, cards).
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct BoxStyle {
    pub background: Option<String>,
    pub border_color: Option<String>,
    pub padding: f32,
    pub border_radius: f32,
}

/// Leading bar drawn beside blockquote content.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct BarStyle {
    pub width: f32,
    pub color: String,
}

/// Horizontal placement of cell content.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Anchor {
    #[default]
    Start,
    Center,
    End,
}

impl From<Option<TextAlign>> for Anchor {
    fn from(align: Option<TextAlign>) -> Self {
        match align {
            Some(TextAlign::Left) | None => Self::Start,
            Some(TextAlign::Center) => Self::Center,
            Some(TextAlign::Right) => Self::End,
        }
    }
}

/// Per-row table decoration.
#[derive(Clone, Debug, PartialEq)]
pub struct RowStyle {
    pub header: bool,
    pub background: Option<String>,
}

/// Display box for an image.
///
/// `width`/`height` are the size to draw at when known. `max_width` bounds
/// images whose intrinsic size is only known after loading.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct ImageBox {
    pub width: Option<f32>,
    pub height: Option<f32>,
    pub max_width: Option<f32>,
}

/// Style lookup targets for [`resolve`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StyleTarget {
    Body,
    /// Heading of the given 1-based level.
    Heading(u8),
    /// Inline code and code blocks.
    Code,
    BlockquoteText,
    Mention,
    Card,
    /// Cell text in the given 0-based table row.
    TableCell(usize),
}

/// Resolve the base style for `target` under `theme`.
pub fn resolve(target: StyleTarget, theme: &Theme) -> ResolvedStyle {
    match target {
        StyleTarget::Body | StyleTarget::Card => {
            ResolvedStyle::plain(theme.font_size, &theme.text_color)
        }
        StyleTarget::Heading(level) => ResolvedStyle {
            bold: true,
            ..ResolvedStyle::plain(heading_size(level, theme), heading_color(level, theme))
        },
        StyleTarget::Code => ResolvedStyle {
            background: Some(theme.code_background_color.clone()),
            monospace: true,
            ..ResolvedStyle::plain(theme.code_font_size, &theme.code_text_color)
        },
        StyleTarget::BlockquoteText => {
            ResolvedStyle::plain(theme.font_size, &theme.blockquote_text_color)
        }
        StyleTarget::Mention => ResolvedStyle {
            background: Some(theme.mention_background.clone()),
            ..ResolvedStyle::plain(theme.font_size, &theme.mention_text_color)
        },
        StyleTarget::TableCell(row) => ResolvedStyle {
            bold: row == 0,
            ..ResolvedStyle::plain(theme.font_size, &theme.text_color)
        },
    }
}

/// Heading color for `level`, falling back to the body text color when the
/// theme has no entry for it (including level 0).
pub fn heading_color(level: u8, theme: &Theme) -> &str {
    usize::from(level)
        .checked_sub(1)
        .and_then(|index| theme.heading_colors.get(index))
        .unwrap_or(&theme.text_color)
}

/// Heading size for `level`: the base size shrinking by one step per level,
/// never below `min_font_size`.
pub fn heading_size(level: u8, theme: &Theme) -> f32 {
    let steps = f32::from(level.max(1) - 1);
    (theme.heading_base_size - steps * theme.heading_size_step).max(theme.min_font_size)
}

/// Row decoration. Row 0 is the header row.
pub fn row_style(index: usize, theme: &Theme) -> RowStyle {
    if index == 0 {
        RowStyle {
            header: true,
            background: Some(theme.table_header_background.clone()),
        }
    } else {
        RowStyle {
            header: false,
            background: None,
        }
    }
}

/// Display box for `image` in a viewport of `viewport_width` (0 means
/// unconstrained).
///
/// Explicit sizes are kept when they fit. An image wider than the viewport is
/// scaled down to it, keeping the aspect ratio when the height is known.
pub fn image_box(image: &ImageNode, viewport_width: f32) -> ImageBox {
    let max_width = (viewport_width > 0.0).then_some(viewport_width);
    let Some(width) = image.width.filter(|w| *w > 0.0) else {
        return ImageBox {
            width: None,
            height: image.height.filter(|h| *h > 0.0),
            max_width,
        };
    };
    let height = image.height.filter(|h| *h > 0.0);

    match max_width {
        Some(limit) if width > limit => ImageBox {
            width: Some(limit),
            height: height.map(|h| h * limit / width),
            max_width,
        },
        _ => ImageBox {
            width: Some(width),
            height,
            max_width,
        },
    }
}

/// Theme-bound resolver used by the composer and dispatcher.
#[derive(Clone, Copy, Debug)]
pub struct StyleResolver<'a> {
    theme: &'a Theme,
}

impl<'a> StyleResolver<'a> {
    pub fn new(theme: &'a Theme) -> Self {
        Self { theme }
    }

    pub fn theme(&self) -> &'a Theme {
        self.theme
    }

    pub fn resolve(&self, target: StyleTarget) -> ResolvedStyle {
        resolve(target, self.theme)
    }

    pub fn body(&self) -> ResolvedStyle {
        self.resolve(StyleTarget::Body)
    }

    pub fn heading(&self, level: u8) -> ResolvedStyle {
        self.resolve(StyleTarget::Heading(level))
    }

    pub fn code(&self) -> ResolvedStyle {
        self.resolve(StyleTarget::Code)
    }

    /// Mention style keeping the surrounding font size.
    pub fn mention(&self, around: &ResolvedStyle) -> ResolvedStyle {
        ResolvedStyle {
            font_size: around.font_size,
            ..self.resolve(StyleTarget::Mention)
        }
    }

    pub fn row(&self, index: usize) -> RowStyle {
        row_style(index, self.theme)
    }

    pub fn code_frame(&self) -> BoxStyle {
        BoxStyle {
            background: Some(self.theme.code_background_color.clone()),
            border_color: None,
            padding: self.theme.code_block_padding,
            border_radius: self.theme.code_block_border_radius,
        }
    }

    pub fn table_frame(&self) -> BoxStyle {
        BoxStyle {
            background: None,
            border_color: Some(self.theme.table_border_color.clone()),
            padding: self.theme.table_cell_padding,
            border_radius: 0.0,
        }
    }

    pub fn card_frame(&self) -> BoxStyle {
        BoxStyle {
            background: Some(self.theme.card_background.clone()),
            border_color: Some(self.theme.card_border_color.clone()),
            padding: self.theme.card_padding,
            border_radius: self.theme.card_border_radius,
        }
    }

    pub fn blockquote_bar(&self) -> BarStyle {
        BarStyle {
            width: self.theme.blockquote_border_width,
            color: self.theme.blockquote_border_color.clone(),
        }
    }

    pub fn rule_color(&self) -> &'a str {
        &self.theme.hr_color
    }
}
