use unicode_segmentation::UnicodeSegmentation;

use crate::export::JournalSnapshot;
use crate::notify::ToastNotifier;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusPane {
    Body,
    Lyrics,
    Stickers,
}

impl FocusPane {
    pub fn next(self) -> Self {
        match self {
            FocusPane::Body => FocusPane::Lyrics,
            FocusPane::Lyrics => FocusPane::Stickers,
            FocusPane::Stickers => FocusPane::Body,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            FocusPane::Body => "Entry",
            FocusPane::Lyrics => "Lyrics",
            FocusPane::Stickers => "Stickers",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorTarget {
    Background,
    Text,
}

impl ColorTarget {
    pub fn label(self) -> &'static str {
        match self {
            ColorTarget::Background => "Background color",
            ColorTarget::Text => "Text color",
        }
    }
}

#[derive(Debug, Clone)]
pub struct ColorPrompt {
    pub target: ColorTarget,
    pub input: String,
    pub error: Option<String>,
}

#[derive(Debug, Clone)]
pub enum OverlayState {
    ColorPrompt(ColorPrompt),
    /// Blocking message; dismissed with Enter or Esc.
    Alert(String),
}

#[derive(Debug)]
pub struct AppState {
    pub focus: FocusPane,
    pub tray_selected: usize,
    overlay: Option<OverlayState>,
    toast: ToastNotifier,
    mounted: Option<JournalSnapshot>,
    exports_in_flight: usize,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            focus: FocusPane::Body,
            tray_selected: 0,
            overlay: None,
            toast: ToastNotifier::new(),
            mounted: None,
            exports_in_flight: 0,
        }
    }
}

impl AppState {
    pub fn toggle_focus(&mut self) {
        self.focus = self.focus.next();
    }

    pub fn move_tray_selection(&mut self, delta: isize, tray_len: usize) {
        if tray_len == 0 {
            return;
        }
        let len = tray_len as isize;
        let next = (self.tray_selected as isize + delta).rem_euclid(len);
        self.tray_selected = next as usize;
    }

    pub fn toast(&self) -> &ToastNotifier {
        &self.toast
    }

    pub fn toast_mut(&mut self) -> &mut ToastNotifier {
        &mut self.toast
    }

    pub fn overlay(&self) -> Option<&OverlayState> {
        self.overlay.as_ref()
    }

    pub fn open_color_prompt(&mut self, target: ColorTarget, current: String) {
        self.overlay = Some(OverlayState::ColorPrompt(ColorPrompt {
            target,
            input: current,
            error: None,
        }));
    }

    pub fn color_prompt_mut(&mut self) -> Option<&mut ColorPrompt> {
        match self.overlay.as_mut() {
            Some(OverlayState::ColorPrompt(prompt)) => Some(prompt),
            _ => None,
        }
    }

    pub fn alert<S: Into<String>>(&mut self, message: S) {
        self.overlay = Some(OverlayState::Alert(message.into()));
    }

    pub fn close_overlay(&mut self) {
        self.overlay = None;
    }

    /// Records what the journal panel showed on the last draw, or `None` if
    /// the panel had no room to be drawn.
    pub fn set_mounted(&mut self, snapshot: Option<JournalSnapshot>) {
        self.mounted = snapshot;
    }

    pub fn mounted(&self) -> Option<&JournalSnapshot> {
        self.mounted.as_ref()
    }

    pub fn export_started(&mut self) {
        self.exports_in_flight += 1;
    }

    pub fn export_finished(&mut self) {
        self.exports_in_flight = self.exports_in_flight.saturating_sub(1);
    }

    pub fn exports_in_flight(&self) -> usize {
        self.exports_in_flight
    }
}

/// Removes the last grapheme cluster, so an emoji sequence goes in one step.
pub fn pop_grapheme(text: &mut String) {
    if let Some((idx, _)) = text.grapheme_indices(true).next_back() {
        text.truncate(idx);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pop_grapheme_removes_whole_emoji() {
        let mut text = String::from("hi ☁️");
        pop_grapheme(&mut text);
        assert_eq!(text, "hi ");
        let mut empty = String::new();
        pop_grapheme(&mut empty);
        assert!(empty.is_empty());
    }

    #[test]
    fn tray_selection_wraps_both_ways() {
        let mut state = AppState::default();
        state.move_tray_selection(-1, 8);
        assert_eq!(state.tray_selected, 7);
        state.move_tray_selection(2, 8);
        assert_eq!(state.tray_selected, 1);
    }

    #[test]
    fn focus_cycles_through_panes() {
        let mut state = AppState::default();
        state.toggle_focus();
        state.toggle_focus();
        assert_eq!(state.focus, FocusPane::Stickers);
        state.toggle_focus();
        assert_eq!(state.focus, FocusPane::Body);
    }
}
