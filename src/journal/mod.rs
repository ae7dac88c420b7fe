use std::fmt;
use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoEnumIterator};
use thiserror::Error;

pub mod stickers;
pub mod store;

pub use stickers::{Sticker, StickerTray};
pub use store::JournalStateStore;

pub const DEFAULT_BACKGROUND: Color = Color::rgb(0xff, 0xff, 0xff);
pub const DEFAULT_TEXT_COLOR: Color = Color::rgb(0x00, 0x00, 0x00);

static HEX_COLOR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^#(?:[0-9a-fA-F]{3}|[0-9a-fA-F]{6})$").expect("hex color pattern is valid")
});

/// An sRGB color, persisted as `#rrggbb`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Channels scaled to `0.0..=1.0`.
    pub fn to_unit_rgb(self) -> (f32, f32, f32) {
        (
            f32::from(self.r) / 255.0,
            f32::from(self.g) / 255.0,
            f32::from(self.b) / 255.0,
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("'{0}' is not a #rgb or #rrggbb color")]
pub struct ParseColorError(String);

impl FromStr for Color {
    type Err = ParseColorError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let trimmed = raw.trim();
        if !HEX_COLOR.is_match(trimmed) {
            return Err(ParseColorError(raw.to_string()));
        }
        let digits = &trimmed[1..];
        let channel =
            |hex: &str| u8::from_str_radix(hex, 16).map_err(|_| ParseColorError(raw.to_string()));
        if digits.len() == 3 {
            let expand = |idx: usize| channel(digits[idx..idx + 1].repeat(2).as_str());
            Ok(Self::rgb(expand(0)?, expand(1)?, expand(2)?))
        } else {
            Ok(Self::rgb(
                channel(&digits[0..2])?,
                channel(&digits[2..4])?,
                channel(&digits[4..6])?,
            ))
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, EnumString, EnumIter,
)]
pub enum FontFamily {
    #[default]
    #[strum(serialize = "sans-serif")]
    SansSerif,
    #[strum(serialize = "serif")]
    Serif,
    #[strum(serialize = "cursive")]
    Cursive,
    #[strum(serialize = "monospace")]
    Monospace,
}

impl FontFamily {
    pub fn label(self) -> &'static str {
        match self {
            FontFamily::SansSerif => "Sans",
            FontFamily::Serif => "Serif",
            FontFamily::Cursive => "Cursive",
            FontFamily::Monospace => "Mono",
        }
    }

    /// The next family in selector order, wrapping around.
    pub fn next(self) -> Self {
        let all: Vec<_> = FontFamily::iter().collect();
        let idx = all.iter().position(|f| *f == self).unwrap_or(0);
        all[(idx + 1) % all.len()]
    }
}

/// A decorative symbol placed on the journal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Glyph(String);

impl Glyph {
    pub fn new(symbol: impl Into<String>) -> Self {
        Self(symbol.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Glyph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Glyph {
    fn from(symbol: &str) -> Self {
        Self::new(symbol)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JournalDocument {
    pub body_text: String,
    pub lyrics_text: String,
    pub background_color: Color,
    pub text_color: Color,
    pub font_family: FontFamily,
    pub stickers: Vec<Glyph>,
}

impl Default for JournalDocument {
    fn default() -> Self {
        Self {
            body_text: String::new(),
            lyrics_text: String::new(),
            background_color: DEFAULT_BACKGROUND,
            text_color: DEFAULT_TEXT_COLOR,
            font_family: FontFamily::default(),
            stickers: Vec::new(),
        }
    }
}

/// Fields of the journal document, in mirror write order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter)]
#[strum(serialize_all = "kebab-case")]
pub enum JournalField {
    Body,
    Lyrics,
    Background,
    TextColor,
    Font,
    Stickers,
}

impl JournalField {
    /// Durable key holding this field.
    pub fn storage_key(self) -> &'static str {
        match self {
            JournalField::Body => "solace_entry",
            JournalField::Lyrics => "solace_lyrics",
            JournalField::Background => "solace_bgColor",
            JournalField::TextColor => "solace_textColor",
            JournalField::Font => "solace_fontFamily",
            JournalField::Stickers => "solace_stickers",
        }
    }
}

/// A single-field write. The variant carries a value of the field's type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldUpdate {
    Body(String),
    Lyrics(String),
    Background(Color),
    TextColor(Color),
    Font(FontFamily),
    Stickers(Vec<Glyph>),
}

impl FieldUpdate {
    pub fn field(&self) -> JournalField {
        match self {
            FieldUpdate::Body(_) => JournalField::Body,
            FieldUpdate::Lyrics(_) => JournalField::Lyrics,
            FieldUpdate::Background(_) => JournalField::Background,
            FieldUpdate::TextColor(_) => JournalField::TextColor,
            FieldUpdate::Font(_) => JournalField::Font,
            FieldUpdate::Stickers(_) => JournalField::Stickers,
        }
    }

    /// Parses a textual value for a scalar field.
    pub fn parse(field: JournalField, raw: &str) -> Result<Self, FieldParseError> {
        match field {
            JournalField::Body => Ok(FieldUpdate::Body(raw.to_string())),
            JournalField::Lyrics => Ok(FieldUpdate::Lyrics(raw.to_string())),
            JournalField::Background => Ok(FieldUpdate::Background(raw.parse()?)),
            JournalField::TextColor => Ok(FieldUpdate::TextColor(raw.parse()?)),
            JournalField::Font => raw
                .trim()
                .parse()
                .map(FieldUpdate::Font)
                .map_err(|_| FieldParseError::UnknownFont(raw.to_string())),
            JournalField::Stickers => Err(FieldParseError::NotScalar(field)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FieldParseError {
    #[error(transparent)]
    Color(#[from] ParseColorError),
    #[error("unknown font family '{0}' (expected sans-serif, serif, cursive or monospace)")]
    UnknownFont(String),
    #[error("field '{0}' cannot be set from a single value")]
    NotScalar(JournalField),
}
