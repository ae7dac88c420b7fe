use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};
use ratatui::Frame;

use crate::app::state::{AppState, FocusPane, OverlayState};
use crate::config::themes::ThemeCatalog;
use crate::journal::{self, JournalDocument, StickerTray};

const MIN_JOURNAL_WIDTH: u16 = 20;
const MIN_JOURNAL_HEIGHT: u16 = 6;

/// Draws the whole screen. Returns whether the journal panel was drawn.
pub fn draw_app(
    frame: &mut Frame,
    document: &JournalDocument,
    state: &AppState,
    themes: &ThemeCatalog,
    tray: &StickerTray,
) -> bool {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Length(3),
        ])
        .split(frame.size());

    frame.render_widget(theme_bar(document, themes), vertical[0]);
    frame.render_widget(sticker_tray(state, tray), vertical[1]);

    let journal_area = vertical[2];
    let mounted =
        journal_area.width >= MIN_JOURNAL_WIDTH && journal_area.height >= MIN_JOURNAL_HEIGHT;
    if mounted {
        draw_journal(frame, document, state, journal_area);
    }

    frame.render_widget(status_line(state), vertical[3]);

    render_overlay(frame, state);
    mounted
}

fn term_color(color: journal::Color) -> Color {
    Color::Rgb(color.r, color.g, color.b)
}

fn theme_bar(document: &JournalDocument, themes: &ThemeCatalog) -> Paragraph<'static> {
    let mut spans = Vec::new();
    for (idx, preset) in themes.all().enumerate() {
        let mut style = Style::default()
            .bg(term_color(preset.background))
            .fg(term_color(preset.text));
        if document.background_color == preset.background && document.text_color == preset.text {
            style = style.add_modifier(Modifier::BOLD | Modifier::UNDERLINED);
        }
        spans.push(Span::styled(format!(" {} {} ", idx + 1, preset.name), style));
        spans.push(Span::raw(" "));
    }
    spans.push(Span::styled(
        format!(
            "bg {} • text {} • font {}",
            document.background_color,
            document.text_color,
            document.font_family.label()
        ),
        Style::default().fg(Color::Gray),
    ));
    Paragraph::new(Line::from(spans)).block(
        Block::default()
            .title("Themes (Alt-1..5) • Colors (Ctrl-b / Ctrl-g) • Font (F2)")
            .borders(Borders::ALL),
    )
}

fn sticker_tray(state: &AppState, tray: &StickerTray) -> Paragraph<'static> {
    let focused = matches!(state.focus, FocusPane::Stickers);
    let mut spans = Vec::new();
    for (idx, sticker) in tray.all().iter().enumerate() {
        let style = if focused && idx == state.tray_selected {
            Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD)
        } else {
            Style::default()
        };
        spans.push(Span::styled(format!(" {} {} ", idx + 1, sticker.symbol), style));
    }
    let border = if focused {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default()
    };
    Paragraph::new(Line::from(spans)).block(
        Block::default()
            .title("Add a sticker to your journal ✨")
            .borders(Borders::ALL)
            .border_style(border),
    )
}

fn draw_journal(frame: &mut Frame, document: &JournalDocument, state: &AppState, area: Rect) {
    let base = Style::default()
        .bg(term_color(document.background_color))
        .fg(term_color(document.text_color));
    let outer = Block::default()
        .title(format!(" 📝 Journal with Solace · {} ", document.font_family.label()))
        .borders(Borders::ALL)
        .style(base);
    let inner = outer.inner(area);
    frame.render_widget(Clear, area);
    frame.render_widget(outer, area);

    let sections = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(3),
            Constraint::Length(5),
        ])
        .split(inner);

    let stickers = document
        .stickers
        .iter()
        .map(|g| g.as_str())
        .collect::<Vec<_>>()
        .join(" ");
    frame.render_widget(Paragraph::new(stickers).style(base), sections[0]);

    let focus_style = |pane: FocusPane| {
        if state.focus == pane {
            base.add_modifier(Modifier::BOLD)
        } else {
            base
        }
    };

    let body = text_block(
        &document.body_text,
        "Write your thoughts...",
        state.focus == FocusPane::Body,
        base,
    );
    frame.render_widget(
        Paragraph::new(body)
            .style(base)
            .wrap(Wrap { trim: false })
            .block(
                Block::default()
                    .title(" Entry ")
                    .borders(Borders::ALL)
                    .border_style(focus_style(FocusPane::Body)),
            ),
        sections[1],
    );

    let lyrics = text_block(
        &document.lyrics_text,
        "🎵 Add meaningful lyrics...",
        state.focus == FocusPane::Lyrics,
        base.add_modifier(Modifier::ITALIC),
    );
    frame.render_widget(
        Paragraph::new(lyrics)
            .style(base.add_modifier(Modifier::ITALIC))
            .wrap(Wrap { trim: false })
            .block(
                Block::default()
                    .title(" Lyrics ")
                    .borders(Borders::ALL)
                    .border_style(focus_style(FocusPane::Lyrics)),
            ),
        sections[2],
    );
}

fn text_block(text: &str, placeholder: &str, focused: bool, style: Style) -> Text<'static> {
    if text.is_empty() && !focused {
        return Text::from(Line::from(Span::styled(
            placeholder.to_string(),
            style.add_modifier(Modifier::DIM),
        )));
    }
    let mut lines: Vec<Line<'static>> = text
        .split('\n')
        .map(|line| Line::from(Span::styled(line.to_string(), style)))
        .collect();
    if focused {
        if let Some(last) = lines.last_mut() {
            last.spans.push(Span::styled("▌", style));
        }
    }
    Text::from(lines)
}

fn status_line(state: &AppState) -> Paragraph<'static> {
    let mut spans = vec![
        Span::raw("Focus: "),
        Span::styled(
            state.focus.label(),
            Style::default().add_modifier(Modifier::BOLD),
        ),
        Span::raw(" | Tab focus • Ctrl-r restore • Ctrl-l clear • Ctrl-e export • Ctrl-q quit"),
    ];
    if state.exports_in_flight() > 0 {
        spans.push(Span::styled(
            format!(" | exporting ({})", state.exports_in_flight()),
            Style::default().fg(Color::Yellow),
        ));
    }
    let mut lines = vec![Line::from(spans)];
    if state.toast().is_visible() {
        lines.push(Line::from(Span::styled(
            state.toast().current().to_string(),
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )));
    }
    Paragraph::new(lines).style(Style::default().fg(Color::Gray))
}

fn render_overlay(frame: &mut Frame, state: &AppState) {
    match state.overlay() {
        Some(OverlayState::ColorPrompt(prompt)) => {
            let mut input = prompt.input.clone();
            input.push('▌');
            let swatch = match prompt.input.parse::<journal::Color>() {
                Ok(color) => Span::styled("      ", Style::default().bg(term_color(color))),
                Err(_) => Span::raw(""),
            };
            let mut body = vec![
                bold_line(prompt.target.label().to_string()),
                Line::default(),
                Line::from(vec![Span::raw(input), Span::raw("  "), swatch]),
            ];
            if let Some(error) = &prompt.error {
                body.push(Line::styled(error.clone(), Style::new().fg(Color::Red)));
            }
            body.push(Line::default());
            body.push(hint("Enter #rrggbb or #rgb • Enter to apply • Esc to cancel"));
            modal(frame, "Pick Color", Color::Cyan, (50, 30), body);
        }
        Some(OverlayState::Alert(message)) => {
            let body = vec![
                bold_line(message.clone()),
                Line::default(),
                hint("Enter or Esc to dismiss"),
            ];
            modal(frame, "Export", Color::Red, (50, 25), body);
        }
        None => {}
    }
}

fn hint(text: &'static str) -> Line<'static> {
    Line::styled(text, Style::new().fg(Color::Gray))
}

fn bold_line(text: String) -> Line<'static> {
    Line::styled(text, Style::new().add_modifier(Modifier::BOLD))
}

fn modal(
    frame: &mut Frame,
    title: &'static str,
    accent: Color,
    (width_pct, height_pct): (u16, u16),
    body: Vec<Line<'static>>,
) {
    let area = centered_rect(width_pct, height_pct, frame.size());
    let block = Block::bordered()
        .title(title)
        .border_style(Style::new().fg(accent));
    frame.render_widget(Clear, area);
    frame.render_widget(
        Paragraph::new(body).block(block).wrap(Wrap { trim: false }),
        area,
    );
}

/// A `percent_x` by `percent_y` rectangle centred inside `area`.
fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let band = |pct: u16| {
        [
            Constraint::Percentage((100 - pct) / 2),
            Constraint::Percentage(pct),
            Constraint::Percentage((100 - pct) / 2),
        ]
    };
    let row = Layout::vertical(band(percent_y)).split(area)[1];
    Layout::horizontal(band(percent_x)).split(row)[1]
}
