use crate::config::themes::ThemePreset;
use crate::journal::{Color, FieldUpdate, Glyph, JournalStateStore};
use crate::notify::ToastNotifier;
use crate::storage::PersistenceAdapter;

use super::state::{pop_grapheme, ColorTarget, FocusPane};

/// Applies one user action to the store: in-memory update and write-through
/// happen in the same call.
pub struct ActionDispatcher<'a, P> {
    store: &'a mut JournalStateStore<P>,
    toast: &'a mut ToastNotifier,
}

impl<'a, P: PersistenceAdapter> ActionDispatcher<'a, P> {
    pub fn new(store: &'a mut JournalStateStore<P>, toast: &'a mut ToastNotifier) -> Self {
        Self { store, toast }
    }

    pub fn edit_text<F>(&mut self, pane: FocusPane, edit: F)
    where
        F: FnOnce(&mut String),
    {
        let document = self.store.document();
        let update = match pane {
            FocusPane::Body => {
                let mut text = document.body_text.clone();
                edit(&mut text);
                FieldUpdate::Body(text)
            }
            FocusPane::Lyrics => {
                let mut text = document.lyrics_text.clone();
                edit(&mut text);
                FieldUpdate::Lyrics(text)
            }
            FocusPane::Stickers => return,
        };
        self.store.set_field(update);
    }

    pub fn type_char(&mut self, pane: FocusPane, ch: char) {
        self.edit_text(pane, |text| text.push(ch));
    }

    pub fn backspace(&mut self, pane: FocusPane) {
        self.edit_text(pane, pop_grapheme);
    }

    pub fn apply_theme(&mut self, preset: &ThemePreset) {
        self.store.apply_theme(preset);
    }

    pub fn cycle_font(&mut self) {
        let next = self.store.document().font_family.next();
        self.store.set_field(FieldUpdate::Font(next));
    }

    pub fn set_color(&mut self, target: ColorTarget, color: Color) {
        let update = match target {
            ColorTarget::Background => FieldUpdate::Background(color),
            ColorTarget::Text => FieldUpdate::TextColor(color),
        };
        self.store.set_field(update);
    }

    pub fn add_sticker(&mut self, glyph: Glyph) {
        self.store.add_sticker(glyph);
    }

    pub fn restore(&mut self) {
        self.store.restore(self.toast);
    }

    pub fn clear(&mut self) {
        self.store.clear(self.toast);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::journal::FontFamily;
    use crate::storage::MemoryStore;

    #[test]
    fn typing_writes_through_each_keystroke() {
        let mirror = MemoryStore::new();
        let mut store = JournalStateStore::open(mirror.clone());
        let mut toast = ToastNotifier::new();
        let mut dispatcher = ActionDispatcher::new(&mut store, &mut toast);

        dispatcher.type_char(FocusPane::Body, 'h');
        dispatcher.type_char(FocusPane::Body, 'i');
        assert_eq!(mirror.get("solace_entry").unwrap().as_deref(), Some("hi"));

        dispatcher.backspace(FocusPane::Body);
        dispatcher.type_char(FocusPane::Lyrics, '♪');
        dispatcher.type_char(FocusPane::Stickers, 'x');
        assert_eq!(store.document().body_text, "h");
        assert_eq!(store.document().lyrics_text, "♪");
        assert!(!mirror.contains("solace_stickers"));
    }

    #[test]
    fn font_cycle_persists() {
        let mirror = MemoryStore::new();
        let mut store = JournalStateStore::open(mirror.clone());
        let mut toast = ToastNotifier::new();
        ActionDispatcher::new(&mut store, &mut toast).cycle_font();
        assert_eq!(store.document().font_family, FontFamily::Serif);
        assert_eq!(
            mirror.get("solace_fontFamily").unwrap().as_deref(),
            Some("serif")
        );
    }
}
