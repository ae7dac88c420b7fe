use std::any::Any;
use std::io::Stdout;
use std::panic::{self, Location};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use crossbeam_channel::{Receiver, Sender};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;

use crate::config::themes::ThemeCatalog;
use crate::config::AppConfig;
use crate::export::{ExportOutcome, ExportPipeline, JournalSnapshot};
use crate::journal::{Color, JournalStateStore, StickerTray};
use crate::storage::PersistenceAdapter;
use crate::ui;

mod actions;
pub mod state;

pub use actions::ActionDispatcher;
pub use state::{AppState, ColorPrompt, ColorTarget, FocusPane, OverlayState};

enum Action {
    Quit,
    ToggleFocus,
    ApplyTheme(usize),
    CycleFont,
    EditColor(ColorTarget),
    Restore,
    Clear,
    Export,
}

pub struct App<P> {
    pub config: Arc<AppConfig>,
    store: JournalStateStore<P>,
    state: AppState,
    themes: ThemeCatalog,
    tray: StickerTray,
    exports: ExportPipeline,
    export_tx: Sender<ExportOutcome>,
    export_rx: Receiver<ExportOutcome>,
    should_quit: bool,
    tick_rate: Duration,
}

impl<P: PersistenceAdapter> App<P> {
    pub fn new(config: Arc<AppConfig>, adapter: P, exports: ExportPipeline) -> Self {
        let store = JournalStateStore::open(adapter);
        let (export_tx, export_rx) = crossbeam_channel::unbounded();
        let tick_rate = config.ui.tick_rate();
        Self {
            config,
            store,
            state: AppState::default(),
            themes: ThemeCatalog::default(),
            tray: StickerTray,
            exports,
            export_tx,
            export_rx,
            should_quit: false,
            tick_rate,
        }
    }

    pub fn run(&mut self) -> Result<()> {
        let mut terminal = setup_terminal()?;
        let _panics = PanicLogGuard::install();
        let result = self.event_loop(&mut terminal);
        restore_terminal(&mut terminal)?;
        result
    }

    pub fn store(&self) -> &JournalStateStore<P> {
        &self.store
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    fn event_loop(&mut self, terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
        let mut last_tick = Instant::now();
        loop {
            let mut mounted = false;
            terminal
                .draw(|frame| {
                    mounted = ui::draw_app(
                        frame,
                        self.store.document(),
                        &self.state,
                        &self.themes,
                        &self.tray,
                    );
                })
                .context("rendering frame")?;
            self.state
                .set_mounted(mounted.then(|| JournalSnapshot::capture(self.store.document())));

            if self.should_quit {
                break;
            }

            let timeout = self
                .tick_rate
                .checked_sub(last_tick.elapsed())
                .unwrap_or_else(|| Duration::from_millis(0));

            if event::poll(timeout).context("polling for terminal events")? {
                match event::read().context("reading terminal event")? {
                    Event::Key(key) => self.handle_key(key),
                    Event::Resize(_, _) => {
                        // next draw re-evaluates whether the journal panel fits
                    }
                    _ => {}
                }
            }

            if last_tick.elapsed() >= self.tick_rate {
                self.on_tick(Instant::now());
                last_tick = Instant::now();
            }
        }
        Ok(())
    }

    fn handle_key(&mut self, key: KeyEvent) {
        if key.kind != KeyEventKind::Press {
            return;
        }

        if self.handle_overlay_key(key) {
            return;
        }

        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        let alt = key.modifiers.contains(KeyModifiers::ALT);
        let action = match key.code {
            KeyCode::Char('q') | KeyCode::Char('c') if ctrl => Some(Action::Quit),
            KeyCode::Char('r') if ctrl => Some(Action::Restore),
            KeyCode::Char('l') if ctrl => Some(Action::Clear),
            KeyCode::Char('e') if ctrl => Some(Action::Export),
            KeyCode::Char('b') if ctrl => Some(Action::EditColor(ColorTarget::Background)),
            KeyCode::Char('g') if ctrl => Some(Action::EditColor(ColorTarget::Text)),
            KeyCode::Char(ch @ '1'..='9') if alt => {
                Some(Action::ApplyTheme(ch as usize - '1' as usize))
            }
            KeyCode::F(2) => Some(Action::CycleFont),
            KeyCode::Tab => Some(Action::ToggleFocus),
            _ => None,
        };

        if let Some(action) = action {
            self.handle_action(action);
            return;
        }

        if ctrl || alt {
            return;
        }
        let focus = self.state.focus;
        match focus {
            FocusPane::Stickers => self.handle_tray_key(key),
            pane => {
                let mut dispatcher = ActionDispatcher::new(&mut self.store, self.state.toast_mut());
                match key.code {
                    KeyCode::Char(ch) => dispatcher.type_char(pane, ch),
                    KeyCode::Enter => dispatcher.type_char(pane, '\n'),
                    KeyCode::Backspace => dispatcher.backspace(pane),
                    _ => {}
                }
            }
        }
    }

    fn handle_tray_key(&mut self, key: KeyEvent) {
        let tray_len = self.tray.all().len();
        let pick = match key.code {
            KeyCode::Left | KeyCode::Char('h') => {
                self.state.move_tray_selection(-1, tray_len);
                None
            }
            KeyCode::Right | KeyCode::Char('l') => {
                self.state.move_tray_selection(1, tray_len);
                None
            }
            KeyCode::Enter | KeyCode::Char(' ') => Some(self.state.tray_selected),
            KeyCode::Char(ch @ '1'..='9') => Some(ch as usize - '1' as usize),
            _ => None,
        };
        if let Some(sticker) = pick.and_then(|idx| self.tray.get(idx)) {
            ActionDispatcher::new(&mut self.store, self.state.toast_mut())
                .add_sticker(sticker.glyph());
        }
    }

    fn handle_action(&mut self, action: Action) {
        match action {
            Action::Quit => self.should_quit = true,
            Action::ToggleFocus => self.state.toggle_focus(),
            Action::ApplyTheme(index) => {
                if let Some(preset) = self.themes.get_index(index).copied() {
                    ActionDispatcher::new(&mut self.store, self.state.toast_mut())
                        .apply_theme(&preset);
                }
            }
            Action::CycleFont => {
                ActionDispatcher::new(&mut self.store, self.state.toast_mut()).cycle_font();
            }
            Action::EditColor(target) => {
                let document = self.store.document();
                let current = match target {
                    ColorTarget::Background => document.background_color,
                    ColorTarget::Text => document.text_color,
                };
                self.state.open_color_prompt(target, current.to_string());
            }
            Action::Restore => {
                ActionDispatcher::new(&mut self.store, self.state.toast_mut()).restore();
            }
            Action::Clear => {
                ActionDispatcher::new(&mut self.store, self.state.toast_mut()).clear();
            }
            Action::Export => self.handle_export(),
        }
    }

    fn handle_export(&mut self) {
        match self
            .exports
            .spawn(self.state.mounted().cloned(), self.export_tx.clone())
        {
            Ok(id) => {
                tracing::debug!(%id, "export started");
                self.state.export_started();
            }
            Err(err) => self.state.alert(err.user_message()),
        }
    }

    fn handle_overlay_key(&mut self, key: KeyEvent) -> bool {
        match self.state.overlay() {
            Some(OverlayState::Alert(_)) => {
                if matches!(key.code, KeyCode::Enter | KeyCode::Esc) {
                    self.state.close_overlay();
                }
                true
            }
            Some(OverlayState::ColorPrompt(_)) => {
                match key.code {
                    KeyCode::Esc => self.state.close_overlay(),
                    KeyCode::Enter => self.submit_color_prompt(),
                    KeyCode::Backspace => {
                        if let Some(prompt) = self.state.color_prompt_mut() {
                            prompt.input.pop();
                            prompt.error = None;
                        }
                    }
                    KeyCode::Char(ch) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                        if let Some(prompt) = self.state.color_prompt_mut() {
                            if prompt.input.len() < 7 {
                                prompt.input.push(ch);
                            }
                            prompt.error = None;
                        }
                    }
                    _ => {}
                }
                true
            }
            None => false,
        }
    }

    fn submit_color_prompt(&mut self) {
        let Some(prompt) = self.state.color_prompt_mut() else {
            return;
        };
        match prompt.input.parse::<Color>() {
            Ok(color) => {
                let target = prompt.target;
                self.state.close_overlay();
                ActionDispatcher::new(&mut self.store, self.state.toast_mut())
                    .set_color(target, color);
            }
            Err(err) => prompt.error = Some(err.to_string()),
        }
    }

    fn on_tick(&mut self, now: Instant) {
        self.state.toast_mut().tick(now);
        while let Ok(outcome) = self.export_rx.try_recv() {
            self.state.export_finished();
            match outcome {
                Ok(receipt) => {
                    let name = receipt
                        .path
                        .file_name()
                        .map(|n| n.to_string_lossy().into_owned())
                        .unwrap_or_default();
                    self.state
                        .toast_mut()
                        .show(format!("📄 Saved {name}"));
                }
                Err(err) => self.state.alert(err.user_message()),
            }
        }
    }
}

/// Sends panic reports to the log while the alternate screen is active.
/// Dropping it puts the default hook back.
struct PanicLogGuard;

impl PanicLogGuard {
    fn install() -> Self {
        panic::set_hook(Box::new(|info| {
            tracing::error!(
                panic = %panic_summary(info.payload(), info.location()),
                "panic captured"
            );
        }));
        PanicLogGuard
    }
}

impl Drop for PanicLogGuard {
    fn drop(&mut self) {
        drop(panic::take_hook());
    }
}

fn panic_summary(payload: &(dyn Any + Send), location: Option<&Location<'_>>) -> String {
    let message = payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "non-string panic payload".to_string());
    match location {
        Some(loc) => format!("{message} at {}:{}", loc.file(), loc.line()),
        None => format!("{message} at unknown location"),
    }
}

fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
    enable_raw_mode().context("enabling raw mode")?;
    let mut stdout = std::io::stdout();
    execute!(stdout, EnterAlternateScreen).context("entering alternate screen")?;
    let backend = CrosstermBackend::new(stdout);
    Terminal::new(backend).context("creating terminal")
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
    disable_raw_mode().context("disabling raw mode")?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)
        .context("leaving alternate screen")?;
    terminal.show_cursor().context("showing cursor")?;
    Ok(())
}
