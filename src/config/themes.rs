use indexmap::IndexMap;

use crate::journal::Color;

/// A named background/text pairing that is always applied as a unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThemePreset {
    pub name: &'static str,
    pub background: Color,
    pub text: Color,
}

/// Ordered, read-only set of color presets.
#[derive(Debug, Clone)]
pub struct ThemeCatalog {
    presets: IndexMap<String, ThemePreset>,
}

impl ThemeCatalog {
    /// Case-insensitive lookup.
    pub fn get(&self, name: &str) -> Option<&ThemePreset> {
        self.presets.get(&name.trim().to_lowercase())
    }

    pub fn get_index(&self, index: usize) -> Option<&ThemePreset> {
        self.presets.get_index(index).map(|(_, preset)| preset)
    }

    pub fn all(&self) -> impl Iterator<Item = &ThemePreset> {
        self.presets.values()
    }

    pub fn len(&self) -> usize {
        self.presets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.presets.is_empty()
    }
}

impl Default for ThemeCatalog {
    fn default() -> Self {
        let presets = [
            ("Lavender", Color::rgb(0xEB, 0xDF, 0xFC), Color::rgb(0x4B, 0x38, 0x69)),
            ("Peach", Color::rgb(0xFF, 0xE5, 0xB4), Color::rgb(0x6B, 0x3E, 0x26)),
            ("Mint", Color::rgb(0xD0, 0xF0, 0xC0), Color::rgb(0x35, 0x5E, 0x3B)),
            ("Sky", Color::rgb(0xD6, 0xF0, 0xFF), Color::rgb(0x3A, 0x3A, 0x8C)),
            ("Rose", Color::rgb(0xFF, 0xE4, 0xE1), Color::rgb(0x6D, 0x3F, 0x3F)),
        ]
        .into_iter()
        .map(|(name, background, text)| {
            (
                name.to_lowercase(),
                ThemePreset {
                    name,
                    background,
                    text,
                },
            )
        })
        .collect();
        Self { presets }
    }
}
