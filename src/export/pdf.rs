use printpdf::{
    BuiltinFont, Color as PdfColor, IndirectFontRef, Mm, PdfDocument, PdfDocumentReference,
    PdfLayerReference, Rect, Rgb,
};
use unicode_width::UnicodeWidthChar;

use crate::journal::{Color, FontFamily, StickerTray};

use super::{ExportOptions, JournalSnapshot, RenderFailure, RendererPort};

const PT_TO_MM: f32 = 25.4 / 72.0;
const STICKER_SIZE_PT: f32 = 18.0;
const BODY_SIZE_PT: f32 = 12.0;
const LINE_SPACING: f32 = 1.4;
const BLOCK_GAP_MM: f32 = 6.0;
const LAYER_NAME: &str = "journal";

/// Vector PDF renderer using the standard PDF base fonts.
///
/// Base fonts only cover Latin-1, so stickers are written as their tray names
/// and other unsupported characters become `?`.
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfRenderer;

impl RendererPort for PdfRenderer {
    fn render(
        &self,
        snapshot: &JournalSnapshot,
        options: &ExportOptions,
    ) -> Result<Vec<u8>, RenderFailure> {
        tracing::debug!(
            raster_scale = options.raster_scale,
            image_quality = options.image_quality,
            "rendering journal as vector pdf"
        );
        let (width, height) = options.page_size_mm();
        let (doc, page, layer) =
            PdfDocument::new("Solace Journal", Mm(width), Mm(height), LAYER_NAME);
        let regular = builtin(&doc, regular_font(snapshot.font))?;
        let italic = builtin(&doc, italic_font(snapshot.font))?;

        let mut writer = PageWriter {
            layer: doc.get_page(page).get_layer(layer),
            doc: &doc,
            width,
            height,
            margin: options.margin_mm(),
            background: snapshot.background,
            text: snapshot.text_color,
            cursor: 0.0,
        };
        writer.paint_page();

        let stickers = sticker_row(snapshot);
        if !stickers.is_empty() {
            writer.paragraph(&stickers, STICKER_SIZE_PT, &regular, snapshot.font);
            writer.gap(BLOCK_GAP_MM);
        }
        writer.paragraph(&snapshot.body, BODY_SIZE_PT, &regular, snapshot.font);
        writer.gap(BLOCK_GAP_MM);
        writer.paragraph(&snapshot.lyrics, BODY_SIZE_PT, &italic, snapshot.font);

        doc.save_to_bytes()
            .map_err(|err| RenderFailure::new(format!("serialising pdf: {err}")))
    }
}

struct PageWriter<'a> {
    doc: &'a PdfDocumentReference,
    layer: PdfLayerReference,
    width: f32,
    height: f32,
    margin: f32,
    background: Color,
    text: Color,
    /// Baseline of the next line, in mm from the bottom edge.
    cursor: f32,
}

impl PageWriter<'_> {
    fn paint_page(&mut self) {
        self.layer.set_fill_color(pdf_color(self.background));
        self.layer.add_rect(Rect::new(
            Mm(self.margin),
            Mm(self.margin),
            Mm(self.width - self.margin),
            Mm(self.height - self.margin),
        ));
        self.layer.set_fill_color(pdf_color(self.text));
        self.cursor = self.height - self.margin;
    }

    fn new_page(&mut self) {
        let (page, layer) = self
            .doc
            .add_page(Mm(self.width), Mm(self.height), LAYER_NAME);
        self.layer = self.doc.get_page(page).get_layer(layer);
        self.paint_page();
    }

    fn gap(&mut self, mm: f32) {
        self.cursor -= mm;
    }

    fn paragraph(&mut self, text: &str, size_pt: f32, font: &IndirectFontRef, family: FontFamily) {
        let line_height = size_pt * LINE_SPACING * PT_TO_MM;
        let content_width = self.width - 2.0 * self.margin;
        let columns = (content_width / (size_pt * char_width_em(family) * PT_TO_MM)).floor() as usize;
        for line in wrap(&sanitize(text), columns.max(1)) {
            if self.cursor - line_height < self.margin {
                self.new_page();
            }
            self.cursor -= line_height;
            self.layer
                .use_text(line, size_pt, Mm(self.margin + 2.0), Mm(self.cursor), font);
        }
    }
}

fn builtin(doc: &PdfDocumentReference, font: BuiltinFont) -> Result<IndirectFontRef, RenderFailure> {
    doc.add_builtin_font(font)
        .map_err(|err| RenderFailure::new(format!("loading base font: {err}")))
}

fn regular_font(family: FontFamily) -> BuiltinFont {
    match family {
        FontFamily::SansSerif => BuiltinFont::Helvetica,
        FontFamily::Serif => BuiltinFont::TimesRoman,
        FontFamily::Cursive => BuiltinFont::TimesItalic,
        FontFamily::Monospace => BuiltinFont::Courier,
    }
}

fn italic_font(family: FontFamily) -> BuiltinFont {
    match family {
        FontFamily::SansSerif => BuiltinFont::HelveticaOblique,
        FontFamily::Serif | FontFamily::Cursive => BuiltinFont::TimesItalic,
        FontFamily::Monospace => BuiltinFont::CourierOblique,
    }
}

/// Average advance of one character, in em.
fn char_width_em(family: FontFamily) -> f32 {
    match family {
        FontFamily::Monospace => 0.6,
        _ => 0.5,
    }
}

fn pdf_color(color: Color) -> PdfColor {
    let (r, g, b) = color.to_unit_rgb();
    PdfColor::Rgb(Rgb::new(r, g, b, None))
}

fn sticker_row(snapshot: &JournalSnapshot) -> String {
    let tray = StickerTray;
    snapshot
        .stickers
        .iter()
        .map(|glyph| match tray.name_of(glyph) {
            Some(name) => format!("({name})"),
            None => glyph.to_string(),
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn sanitize(text: &str) -> String {
    text.chars()
        .filter_map(|c| match c {
            '\t' => Some(' '),
            '\n' => Some('\n'),
            // variation selectors and joiners trail emoji; drop them with the emoji
            '\u{fe0e}' | '\u{fe0f}' | '\u{200d}' => None,
            c if c.is_control() => None,
            c if (c as u32) < 0x100 => Some(c),
            _ => Some('?'),
        })
        .collect()
}

/// Greedy word wrap on display columns. Hard newlines are preserved and
/// words longer than a line are split.
fn wrap(text: &str, columns: usize) -> Vec<String> {
    let mut lines = Vec::new();
    for raw_line in text.split('\n') {
        let mut current = String::new();
        let mut used = 0usize;
        for word in raw_line.split(' ') {
            let width: usize = word.chars().map(|c| c.width().unwrap_or(0)).sum();
            let needed = if current.is_empty() { width } else { width + 1 };
            if used + needed > columns && !current.is_empty() {
                lines.push(std::mem::take(&mut current));
                used = 0;
            }
            if !current.is_empty() {
                current.push(' ');
                used += 1;
            }
            for c in word.chars() {
                let w = c.width().unwrap_or(0);
                if used + w > columns && !current.is_empty() {
                    lines.push(std::mem::take(&mut current));
                    used = 0;
                }
                current.push(c);
                used += w;
            }
        }
        lines.push(current);
    }
    while lines.last().is_some_and(String::is_empty) {
        lines.pop();
    }
    lines
}
