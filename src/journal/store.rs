use strum::IntoEnumIterator;

use crate::config::themes::ThemePreset;
use crate::notify::ToastNotifier;
use crate::storage::PersistenceAdapter;

use super::{Color, FieldUpdate, FontFamily, Glyph, JournalDocument, JournalField};

pub const RESTORED_MESSAGE: &str = "🔁 Journal restored from last saved version.";
pub const CLEARED_MESSAGE: &str = "🗑️ Journal cleared.";

/// Owns the in-memory journal and mirrors each field write to the adapter.
///
/// Writes are per field and not transactional. Multi-key operations (theme
/// application, clear) issue their writes in [`JournalField`] order; if one
/// write fails the mirror can hold a mix of old and new values until the next
/// write of that field.
pub struct JournalStateStore<P> {
    adapter: P,
    document: JournalDocument,
}

impl<P: PersistenceAdapter> JournalStateStore<P> {
    /// Builds the store from whatever the mirror currently holds.
    pub fn open(adapter: P) -> Self {
        let document = load_document(&adapter);
        Self { adapter, document }
    }

    pub fn document(&self) -> &JournalDocument {
        &self.document
    }

    /// Reads the mirror without touching the in-memory document.
    pub fn load(&self) -> JournalDocument {
        load_document(&self.adapter)
    }

    pub fn set_field(&mut self, update: FieldUpdate) {
        let field = update.field();
        match update {
            FieldUpdate::Body(text) => self.document.body_text = text,
            FieldUpdate::Lyrics(text) => self.document.lyrics_text = text,
            FieldUpdate::Background(color) => self.document.background_color = color,
            FieldUpdate::TextColor(color) => self.document.text_color = color,
            FieldUpdate::Font(font) => self.document.font_family = font,
            FieldUpdate::Stickers(stickers) => self.document.stickers = stickers,
        }
        self.write_through(field);
    }

    /// Sets both colors in memory, then persists background and text color.
    pub fn apply_theme(&mut self, preset: &ThemePreset) {
        self.document.background_color = preset.background;
        self.document.text_color = preset.text;
        self.write_through(JournalField::Background);
        self.write_through(JournalField::TextColor);
        tracing::debug!(theme = preset.name, "applied preset theme");
    }

    pub fn add_sticker(&mut self, glyph: Glyph) {
        self.document.stickers.push(glyph);
        self.write_through(JournalField::Stickers);
    }

    /// Replaces the in-memory document with the persisted mirror.
    pub fn restore(&mut self, toast: &mut ToastNotifier) {
        self.document = self.load();
        tracing::info!("journal restored from persisted mirror");
        toast.show(RESTORED_MESSAGE);
    }

    /// Deletes every persisted field and resets the document to defaults.
    pub fn clear(&mut self, toast: &mut ToastNotifier) {
        for field in JournalField::iter() {
            let key = field.storage_key();
            if let Err(err) = self.adapter.remove(key) {
                tracing::warn!(?err, key, "failed to remove persisted journal field");
            }
        }
        self.document = JournalDocument::default();
        tracing::info!("journal cleared");
        toast.show(CLEARED_MESSAGE);
    }

    fn write_through(&self, field: JournalField) {
        let key = field.storage_key();
        let Some(value) = encode_field(&self.document, field) else {
            return;
        };
        match self.adapter.set(key, &value) {
            Ok(()) => tracing::debug!(key, "persisted journal field"),
            Err(err) => tracing::warn!(?err, key, "failed to persist journal field"),
        }
    }
}

/// Assembles a document from the mirror. Absent, unreadable or malformed
/// entries fall back to that field's default.
pub fn load_document<P: PersistenceAdapter + ?Sized>(adapter: &P) -> JournalDocument {
    let defaults = JournalDocument::default();
    JournalDocument {
        body_text: read_field(adapter, JournalField::Body).unwrap_or(defaults.body_text),
        lyrics_text: read_field(adapter, JournalField::Lyrics).unwrap_or(defaults.lyrics_text),
        background_color: read_field(adapter, JournalField::Background)
            .and_then(|raw| parse_or_warn::<Color>(JournalField::Background, &raw))
            .unwrap_or(defaults.background_color),
        text_color: read_field(adapter, JournalField::TextColor)
            .and_then(|raw| parse_or_warn::<Color>(JournalField::TextColor, &raw))
            .unwrap_or(defaults.text_color),
        font_family: read_field(adapter, JournalField::Font)
            .and_then(|raw| parse_or_warn::<FontFamily>(JournalField::Font, &raw))
            .unwrap_or(defaults.font_family),
        stickers: read_field(adapter, JournalField::Stickers)
            .map(|raw| decode_stickers(&raw))
            .unwrap_or(defaults.stickers),
    }
}

fn read_field<P: PersistenceAdapter + ?Sized>(adapter: &P, field: JournalField) -> Option<String> {
    let key = field.storage_key();
    match adapter.get(key) {
        Ok(value) => value,
        Err(err) => {
            tracing::warn!(?err, key, "failed to read persisted journal field, using default");
            None
        }
    }
}

fn parse_or_warn<T: std::str::FromStr>(field: JournalField, raw: &str) -> Option<T> {
    match raw.parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!(%field, raw, "malformed persisted value, using default");
            None
        }
    }
}

fn decode_stickers(raw: &str) -> Vec<Glyph> {
    serde_json::from_str(raw).unwrap_or_else(|err| {
        tracing::warn!(?err, "malformed persisted sticker list, using empty list");
        Vec::new()
    })
}

fn encode_field(document: &JournalDocument, field: JournalField) -> Option<String> {
    match field {
        JournalField::Body => Some(document.body_text.clone()),
        JournalField::Lyrics => Some(document.lyrics_text.clone()),
        JournalField::Background => Some(document.background_color.to_string()),
        JournalField::TextColor => Some(document.text_color.to_string()),
        JournalField::Font => Some(document.font_family.to_string()),
        JournalField::Stickers => match serde_json::to_string(&document.stickers) {
            Ok(json) => Some(json),
            Err(err) => {
                tracing::warn!(?err, "failed to serialise sticker list");
                None
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::themes::ThemeCatalog;
    use crate::config::{ConfigPaths, StorageOptions};
    use crate::storage::{self, MemoryStore};
    use anyhow::bail;

    fn store() -> (MemoryStore, JournalStateStore<MemoryStore>) {
        let mirror = MemoryStore::new();
        let store = JournalStateStore::open(mirror.clone());
        (mirror, store)
    }

    #[test]
    fn empty_mirror_loads_defaults() {
        let (_, store) = store();
        assert_eq!(store.document(), &JournalDocument::default());
        assert_eq!(store.document().background_color.to_string(), "#ffffff");
        assert_eq!(store.document().text_color.to_string(), "#000000");
        assert_eq!(store.document().font_family, FontFamily::SansSerif);
    }

    #[test]
    fn every_field_survives_a_reload() {
        let (mirror, mut store) = store();
        let updates = [
            FieldUpdate::Body("Dear diary".into()),
            FieldUpdate::Lyrics("let it be".into()),
            FieldUpdate::Background(Color::rgb(0x12, 0x34, 0x56)),
            FieldUpdate::TextColor(Color::rgb(0xfe, 0xdc, 0xba)),
            FieldUpdate::Font(FontFamily::Cursive),
            FieldUpdate::Stickers(vec!["🌸".into(), "🌸".into()]),
        ];
        for update in updates {
            store.set_field(update);
        }

        let reloaded = JournalStateStore::open(mirror).document().clone();
        assert_eq!(&reloaded, store.document());
        assert_eq!(reloaded.font_family, FontFamily::Cursive);
        assert_eq!(reloaded.stickers.len(), 2);
    }

    #[test]
    fn set_field_writes_only_that_key() {
        let (mirror, mut store) = store();
        store.set_field(FieldUpdate::Lyrics("la la".into()));
        assert_eq!(mirror.len(), 1);
        assert_eq!(
            mirror.get("solace_lyrics").unwrap().as_deref(),
            Some("la la")
        );
    }

    #[test]
    fn malformed_entries_fall_back_per_field() -> anyhow::Result<()> {
        let mirror = MemoryStore::new();
        mirror.set("solace_entry", "kept")?;
        mirror.set("solace_stickers", "{not json")?;
        mirror.set("solace_bgColor", "chartreuse")?;
        mirror.set("solace_fontFamily", "fantasy")?;

        let doc = load_document(&mirror);
        assert_eq!(doc.body_text, "kept");
        assert!(doc.stickers.is_empty());
        assert_eq!(doc.background_color, Color::rgb(0xff, 0xff, 0xff));
        assert_eq!(doc.font_family, FontFamily::SansSerif);

        mirror.set("solace_stickers", r#"{"0":"🌸"}"#)?;
        assert!(load_document(&mirror).stickers.is_empty());
        Ok(())
    }

    #[test]
    fn clear_removes_every_key_and_resets() {
        let (mirror, mut store) = store();
        let mut toast = ToastNotifier::new();
        store.set_field(FieldUpdate::Body("secret".into()));
        store.set_field(FieldUpdate::Font(FontFamily::Monospace));
        store.apply_theme(ThemeCatalog::default().get("rose").unwrap());
        store.add_sticker("🐧".into());

        store.clear(&mut toast);

        for field in JournalField::iter() {
            assert!(!mirror.contains(field.storage_key()), "{field} still persisted");
        }
        assert!(mirror.is_empty());
        assert_eq!(store.document(), &JournalDocument::default());
        assert_eq!(toast.current(), CLEARED_MESSAGE);
    }

    #[test]
    fn restore_discards_unpersisted_edits() {
        let (_, mut store) = store();
        let mut toast = ToastNotifier::new();
        store.set_field(FieldUpdate::Body("x".into()));
        store.document.body_text = "y".into();

        store.restore(&mut toast);

        assert_eq!(store.document().body_text, "x");
        assert_eq!(toast.current(), RESTORED_MESSAGE);
    }

    #[test]
    fn restore_picks_up_out_of_band_clear() {
        let (mirror, mut store) = store();
        store.set_field(FieldUpdate::Body("before".into()));
        store.add_sticker("✨".into());

        let mut other = JournalStateStore::open(mirror);
        other.clear(&mut ToastNotifier::new());

        assert_eq!(store.document().body_text, "before");
        store.restore(&mut ToastNotifier::new());
        assert_eq!(store.document(), &JournalDocument::default());
    }

    #[test]
    fn theme_sets_both_colors_together() {
        let (mirror, mut store) = store();
        let catalog = ThemeCatalog::default();
        let peach = catalog.get("Peach").unwrap();

        store.apply_theme(peach);

        assert_eq!(store.document().background_color, peach.background);
        assert_eq!(store.document().text_color, peach.text);
        assert_eq!(
            mirror.get("solace_bgColor").unwrap().as_deref(),
            Some("#ffe5b4")
        );
        assert_eq!(
            mirror.get("solace_textColor").unwrap().as_deref(),
            Some("#6b3e26")
        );
    }

    #[test]
    fn stickers_append_in_order_without_dedup() {
        let (mirror, mut store) = store();
        store.add_sticker("🌸".into());
        store.add_sticker("✨".into());
        store.add_sticker("🌸".into());

        let symbols: Vec<_> = store.document().stickers.iter().map(Glyph::as_str).collect();
        assert_eq!(symbols, ["🌸", "✨", "🌸"]);
        assert_eq!(
            mirror.get("solace_stickers").unwrap().as_deref(),
            Some(r#"["🌸","✨","🌸"]"#)
        );
    }

    #[test]
    fn diary_entry_round_trips_through_sqlite() -> anyhow::Result<()> {
        let temp = tempfile::TempDir::new()?;
        let base = temp.path();
        let paths = ConfigPaths {
            config_dir: base.join("config"),
            config_file: base.join("config/config.toml"),
            data_dir: base.join("data"),
            database_path: base.join("data/journal.db"),
            export_dir: base.join("data/exports"),
            log_dir: base.join("state/logs"),
            state_dir: base.join("state"),
        };
        paths.ensure_directories()?;
        let handle = storage::init(&paths, &StorageOptions::default())?;

        let mut store = JournalStateStore::open(handle.clone());
        store.set_field(FieldUpdate::Body("Dear diary".into()));
        store.add_sticker("🌿".into());
        drop(store);

        let reloaded = JournalStateStore::open(storage::init(&paths, &StorageOptions::default())?);
        let expected = JournalDocument {
            body_text: "Dear diary".into(),
            stickers: vec!["🌿".into()],
            ..JournalDocument::default()
        };
        assert_eq!(reloaded.document(), &expected);
        Ok(())
    }

    struct BrokenStore;

    impl PersistenceAdapter for BrokenStore {
        fn get(&self, key: &str) -> anyhow::Result<Option<String>> {
            bail!("disk unavailable reading {key}")
        }

        fn set(&self, key: &str, _value: &str) -> anyhow::Result<()> {
            bail!("disk unavailable writing {key}")
        }

        fn remove(&self, key: &str) -> anyhow::Result<()> {
            bail!("disk unavailable removing {key}")
        }
    }

    #[test]
    fn adapter_failures_are_silent() {
        let mut store = JournalStateStore::open(BrokenStore);
        assert_eq!(store.document(), &JournalDocument::default());

        store.set_field(FieldUpdate::Body("still editable".into()));
        assert_eq!(store.document().body_text, "still editable");

        let mut toast = ToastNotifier::new();
        store.clear(&mut toast);
        assert_eq!(store.document(), &JournalDocument::default());
        assert_eq!(toast.current(), CLEARED_MESSAGE);
    }
}
