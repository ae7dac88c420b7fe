use super::Glyph;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sticker {
    pub symbol: &'static str,
    pub name: &'static str,
}

impl Sticker {
    pub fn glyph(&self) -> Glyph {
        Glyph::new(self.symbol)
    }
}

const TRAY: [Sticker; 8] = [
    Sticker { symbol: "🌸", name: "blossom" },
    Sticker { symbol: "✨", name: "sparkles" },
    Sticker { symbol: "💖", name: "heart" },
    Sticker { symbol: "🌿", name: "herb" },
    Sticker { symbol: "🐧", name: "penguin" },
    Sticker { symbol: "🌈", name: "rainbow" },
    Sticker { symbol: "🦋", name: "butterfly" },
    Sticker { symbol: "☁️", name: "cloud" },
];

/// The fixed set of stickers offered to the user, in tray order.
#[derive(Debug, Clone, Copy, Default)]
pub struct StickerTray;

impl StickerTray {
    pub fn all(&self) -> &'static [Sticker] {
        &TRAY
    }

    pub fn get(&self, index: usize) -> Option<&'static Sticker> {
        TRAY.get(index)
    }

    /// Looks a sticker up by symbol or by (case-insensitive) name.
    pub fn find(&self, needle: &str) -> Option<&'static Sticker> {
        let needle = needle.trim();
        TRAY.iter()
            .find(|s| s.symbol == needle || s.name.eq_ignore_ascii_case(needle))
    }

    /// Name of a placed glyph, if it came from the tray.
    pub fn name_of(&self, glyph: &Glyph) -> Option<&'static str> {
        TRAY.iter()
            .find(|s| s.symbol == glyph.as_str())
            .map(|s| s.name)
    }
}
