//! FILENAME: src/style.rs
//! PURPOSE: Typography, alignment, border, and number-format data structures
//! shared by cell-level formats, conditional-format overlays, and the
//! format painter.
//! CONTEXT: `CellFormat` is the full per-cell format bundle; it is
//! deep-cloned liberally (fill generation, format-painter apply) so every
//! piece here is plain data with no shared/interior-mutable state.

use serde::{Deserialize, Serialize};

/// Horizontal text alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum TextAlign {
    #[default]
    General, // Auto: numbers right, text left
    Left,
    Center,
    Right,
}

/// Vertical text alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum VerticalAlign {
    Top,
    #[default]
    Middle,
    Bottom,
}

/// Underline presentation for a run of text or a whole cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum UnderlineStyle {
    #[default]
    None,
    Single,
    Double,
}

/// RGB(A) color representation. The core never validates color strings at
/// the format-set boundary — malformed hex passes through unchanged to the
/// render frame for the view to handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Color { r, g, b, a: 255 }
    }

    pub const fn with_alpha(r: u8, g: u8, b: u8, a: u8) -> Self {
        Color { r, g, b, a }
    }

    pub const fn black() -> Self {
        Color::new(0, 0, 0)
    }

    pub const fn white() -> Self {
        Color::new(255, 255, 255)
    }

    pub const fn transparent() -> Self {
        Color::with_alpha(0, 0, 0, 0)
    }

    /// Convert to a CSS color string (`#rrggbb` or `rgba(...)`).
    pub fn to_css(&self) -> String {
        if self.a == 255 {
            format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            format!(
                "rgba({}, {}, {}, {:.2})",
                self.r,
                self.g,
                self.b,
                self.a as f32 / 255.0
            )
        }
    }

    /// Parse from a hex string (e.g., "#FF0000" or "FF0000"). Returns `None`
    /// on malformed input rather than erroring — callers treat absent color
    /// as "fall back to default", consistent with the no-validation policy.
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.trim_start_matches('#');
        if hex.len() == 6 {
            let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
            let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
            let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
            Some(Color::new(r, g, b))
        } else if hex.len() == 8 {
            let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
            let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
            let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
            let a = u8::from_str_radix(&hex[6..8], 16).ok()?;
            Some(Color::with_alpha(r, g, b, a))
        } else {
            None
        }
    }

    /// Linear RGB interpolation used by the conditional-formatting color
    /// scale.
    pub fn lerp(a: Color, b: Color, t: f64) -> Color {
        let t = t.clamp(0.0, 1.0);
        let lerp_channel = |x: u8, y: u8| -> u8 {
            (x as f64 + (y as f64 - x as f64) * t).round().clamp(0.0, 255.0) as u8
        };
        Color::new(
            lerp_channel(a.r, b.r),
            lerp_channel(a.g, b.g),
            lerp_channel(a.b, b.b),
        )
    }
}

impl Default for Color {
    fn default() -> Self {
        Color::black()
    }
}

/// Line style for a single border edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum BorderLineStyle {
    #[default]
    None,
    Solid,
    Dashed,
    Dotted,
    Double,
}

/// Border style for a single edge.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct BorderStyle {
    pub width: u8, // 0 = no border, 1 = thin, 2 = medium, 3 = thick
    pub color: Color,
    pub style: BorderLineStyle,
}

/// Complete border configuration for a cell.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct CellBorders {
    pub top: BorderStyle,
    pub right: BorderStyle,
    pub bottom: BorderStyle,
    pub left: BorderStyle,
}

/// Position of the currency symbol relative to the number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum CurrencyPosition {
    #[default]
    Before, // $100
    After,  // 100$
}

/// Number format types for displaying numeric values. Combines the
/// structured variants the render frame needs for display with the
/// flattened `{format string, isPercentage, isCurrency, currencySymbol}`
/// metadata `CellFormat` bundles — `NumberFormat` is the richer,
/// idiomatic-Rust representation; `NumberFormatMeta` (below) derives that
/// flat shape from it for callers that want that literal surface.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum NumberFormat {
    #[default]
    General,
    Number {
        decimal_places: u8,
        use_thousands_separator: bool,
    },
    Currency {
        decimal_places: u8,
        symbol: String,
        symbol_position: CurrencyPosition,
    },
    Percentage {
        decimal_places: u8,
    },
    Scientific {
        decimal_places: u8,
    },
    Date {
        format: String,
    },
    Time {
        format: String,
    },
    Custom {
        format: String,
    },
}

/// The flat `{format string, isPercentage, isCurrency, currencySymbol}`
/// metadata `CellFormat.number_format` bundles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumberFormatMeta {
    pub format_string: String,
    pub is_percentage: bool,
    pub is_currency: bool,
    pub currency_symbol: Option<String>,
}

impl NumberFormat {
    pub fn to_meta(&self) -> NumberFormatMeta {
        match self {
            NumberFormat::General => NumberFormatMeta {
                format_string: "General".to_string(),
                is_percentage: false,
                is_currency: false,
                currency_symbol: None,
            },
            NumberFormat::Percentage { decimal_places } => NumberFormatMeta {
                format_string: format!("0.{}%", "0".repeat(*decimal_places as usize)),
                is_percentage: true,
                is_currency: false,
                currency_symbol: None,
            },
            NumberFormat::Currency { symbol, .. } => NumberFormatMeta {
                format_string: format!("{}#,##0.00", symbol),
                is_percentage: false,
                is_currency: true,
                currency_symbol: Some(symbol.clone()),
            },
            NumberFormat::Custom { format } => NumberFormatMeta {
                format_string: format.clone(),
                is_percentage: format.contains('%'),
                is_currency: false,
                currency_symbol: None,
            },
            other => NumberFormatMeta {
                format_string: other.format_code().to_string(),
                is_percentage: false,
                is_currency: false,
                currency_symbol: None,
            },
        }
    }

    /// A stable string identifying the format, used as the `format string`
    /// half of a format's number-format metadata for non-custom variants.
    fn format_code(&self) -> &'static str {
        match self {
            NumberFormat::General => "General",
            NumberFormat::Number { .. } => "0.00",
            NumberFormat::Currency { .. } => "$#,##0.00",
            NumberFormat::Percentage { .. } => "0%",
            NumberFormat::Scientific { .. } => "0.00E+00",
            NumberFormat::Date { .. } => "YYYY-MM-DD",
            NumberFormat::Time { .. } => "HH:MM:SS",
            NumberFormat::Custom { .. } => "",
        }
    }
}

/// Font configuration: family/size/color/bold/italic/underline/strike.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FontStyle {
    pub family: String,
    pub size: u8,
    pub bold: bool,
    pub italic: bool,
    pub underline: UnderlineStyle,
    pub strikethrough: bool,
    pub color: Color,
}

impl Default for FontStyle {
    fn default() -> Self {
        FontStyle {
            family: "system-ui".to_string(),
            size: 11,
            bold: false,
            italic: false,
            underline: UnderlineStyle::None,
            strikethrough: false,
            color: Color::black(),
        }
    }
}

/// Per-run character format override used by `FormatRun`.
pub type CharFormat = FontStyle;

/// The complete cell-level format bundle: typography, alignment,
/// background, borders, and number-format metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CellFormat {
    pub font: FontStyle,
    pub background: Color,
    pub text_align: TextAlign,
    pub vertical_align: VerticalAlign,
    pub number_format: NumberFormat,
    pub borders: CellBorders,
    pub wrap_text: bool,
    /// Rotation in degrees, constrained to [0, 360).
    pub rotation: u16,
    pub indent: u8,
}

impl CellFormat {
    pub fn new() -> Self {
        CellFormat {
            font: FontStyle::default(),
            background: Color::white(),
            text_align: TextAlign::General,
            vertical_align: VerticalAlign::Middle,
            number_format: NumberFormat::General,
            borders: CellBorders::default(),
            wrap_text: false,
            rotation: 0,
            indent: 0,
        }
    }

    /// Clamp a caller-supplied rotation into [0, 360) degrees.
    pub fn set_rotation(&mut self, degrees: i32) {
        self.rotation = degrees.rem_euclid(360) as u16;
    }

    pub fn with_bold(mut self, bold: bool) -> Self {
        self.font.bold = bold;
        self
    }

    pub fn with_background(mut self, color: Color) -> Self {
        self.background = color;
        self
    }

    /// Overlay `other` on top of `self`, field by field, `other` winning —
    /// this is the merge operator conditional-formatting uses to combine
    /// multiple matched rules in priority order, later rules winning.
    ///
    /// A partial overlay (from a conditional-format rule) is expressed as
    /// `Option<CellFormat>` fields via `FormatOverrides` rather than here;
    /// this method is for two complete formats (format painter, base style).
    pub fn overlay(&self, other: &CellFormat) -> CellFormat {
        other.clone()
    }
}

impl Default for CellFormat {
    fn default() -> Self {
        CellFormat::new()
    }
}

/// A partial set of format properties a conditional-formatting rule can
/// override, merged field-by-field onto the base `CellFormat`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FormatOverrides {
    pub bold: Option<bool>,
    pub italic: Option<bool>,
    pub underline: Option<UnderlineStyle>,
    pub strikethrough: Option<bool>,
    pub font_color: Option<Color>,
    pub background: Option<Color>,
}

impl FormatOverrides {
    pub fn is_empty(&self) -> bool {
        self == &FormatOverrides::default()
    }

    /// Field-by-field merge, `other` winning on every field it sets —
    /// later rules win.
    pub fn merge(&self, other: &FormatOverrides) -> FormatOverrides {
        FormatOverrides {
            bold: other.bold.or(self.bold),
            italic: other.italic.or(self.italic),
            underline: other.underline.or(self.underline),
            strikethrough: other.strikethrough.or(self.strikethrough),
            font_color: other.font_color.or(self.font_color),
            background: other.background.or(self.background),
        }
    }

    /// Apply these overrides onto a concrete `CellFormat`, producing the
    /// fully merged format the render frame hands to the view with zero
    /// format computation left to do.
    pub fn apply_to(&self, base: &CellFormat) -> CellFormat {
        let mut result = base.clone();
        if let Some(bold) = self.bold {
            result.font.bold = bold;
        }
        if let Some(italic) = self.italic {
            result.font.italic = italic;
        }
        if let Some(underline) = self.underline {
            result.font.underline = underline;
        }
        if let Some(strike) = self.strikethrough {
            result.font.strikethrough = strike;
        }
        if let Some(color) = self.font_color {
            result.font.color = color;
        }
        if let Some(bg) = self.background {
            result.background = bg;
        }
        result
    }
}

/// Property-selective filter used by the format painter's pick step to
/// include or exclude entire property groups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaintPropertyFilter {
    pub font: bool,
    pub fill: bool,
    pub borders: bool,
    pub alignment: bool,
    pub number_format: bool,
}

impl Default for PaintPropertyFilter {
    fn default() -> Self {
        PaintPropertyFilter {
            font: true,
            fill: true,
            borders: true,
            alignment: true,
            number_format: true,
        }
    }
}

impl PaintPropertyFilter {
    /// Apply the filter: properties not selected fall back to `base`'s
    /// values instead of the picked source's, so re-picking isn't needed
    /// if the filter changes — filtering applies at pick time so the
    /// pattern can be re-applied many times.
    pub fn filtered(&self, source: &CellFormat, base: &CellFormat) -> CellFormat {
        let mut result = base.clone();
        if self.font {
            result.font = source.font.clone();
        }
        if self.fill {
            result.background = source.background;
        }
        if self.borders {
            result.borders = source.borders.clone();
        }
        if self.alignment {
            result.text_align = source.text_align;
            result.vertical_align = source.vertical_align;
            result.wrap_text = source.wrap_text;
            result.rotation = source.rotation;
            result.indent = source.indent;
        }
        if self.number_format {
            result.number_format = source.number_format.clone();
        }
        result
    }
}
