use std::fmt::Write as _;
use std::io::{self, Read};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, bail, Context, Result};
use clap::{Args, Subcommand};
use time::format_description::well_known::Rfc3339;

use crate::app::App;
use crate::config::themes::ThemeCatalog;
use crate::config::AppConfig;
use crate::export::{ExportPipeline, JournalSnapshot, PdfRenderer};
use crate::journal::{FieldUpdate, JournalDocument, JournalField, JournalStateStore, StickerTray};
use crate::notify::ToastNotifier;
use crate::storage::PersistenceAdapter;

#[derive(Args, Debug, Clone)]
pub struct SetArgs {
    /// Field to set: body, lyrics, background, text-color or font
    pub field: JournalField,
    /// New value. If omitted, reads from stdin.
    pub value: Option<String>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum ThemeCommand {
    /// List presets in display order
    List,
    /// Apply a preset to both background and text color
    Apply(ThemeApplyArgs),
}

#[derive(Args, Debug, Clone)]
pub struct ThemeApplyArgs {
    /// Preset name (case-insensitive)
    pub name: String,
}

#[derive(Args, Debug, Clone)]
pub struct ThemeArgs {
    #[command(subcommand)]
    pub command: ThemeCommand,
}

#[derive(Subcommand, Debug, Clone)]
pub enum StickerCommand {
    /// List available stickers
    List,
    /// Append a sticker, given as its symbol or name
    Add(StickerAddArgs),
}

#[derive(Args, Debug, Clone)]
pub struct StickerAddArgs {
    pub sticker: String,
}

#[derive(Args, Debug, Clone)]
pub struct StickerArgs {
    #[command(subcommand)]
    pub command: StickerCommand,
}

#[derive(Args, Debug, Clone)]
pub struct ExportArgs {
    /// Directory to save the PDF in (defaults to the configured export dir)
    #[arg(long)]
    pub output_dir: Option<PathBuf>,
}

pub fn run_tui<P: PersistenceAdapter>(app: &mut App<P>) -> Result<()> {
    app.run()
}

pub fn show<P: PersistenceAdapter>(adapter: P) -> Result<()> {
    let store = JournalStateStore::open(adapter);
    print!("{}", render_document(store.document()));
    Ok(())
}

pub fn set_field<P: PersistenceAdapter>(adapter: P, args: SetArgs) -> Result<()> {
    let raw = match args.value {
        Some(value) => value,
        None => read_stdin()?.unwrap_or_default(),
    };
    let update = FieldUpdate::parse(args.field, &raw)
        .with_context(|| format!("parsing value for {}", args.field))?;
    let mut store = JournalStateStore::open(adapter);
    store.set_field(update);
    println!("Saved {}", args.field);
    Ok(())
}

pub fn handle_theme_command<P: PersistenceAdapter>(adapter: P, args: ThemeArgs) -> Result<()> {
    let catalog = ThemeCatalog::default();
    match args.command {
        ThemeCommand::List => {
            print!("{}", render_theme_list(&catalog));
            Ok(())
        }
        ThemeCommand::Apply(apply) => {
            let Some(preset) = catalog.get(&apply.name) else {
                let known = catalog.all().map(|p| p.name).collect::<Vec<_>>().join(", ");
                bail!("unknown theme '{}' (available: {known})", apply.name);
            };
            let mut store = JournalStateStore::open(adapter);
            store.apply_theme(preset);
            println!(
                "Applied {} ({} on {})",
                preset.name, preset.text, preset.background
            );
            Ok(())
        }
    }
}

pub fn handle_sticker_command<P: PersistenceAdapter>(adapter: P, args: StickerArgs) -> Result<()> {
    let tray = StickerTray;
    match args.command {
        StickerCommand::List => {
            for (idx, sticker) in tray.all().iter().enumerate() {
                println!("{:>2}. {} {}", idx + 1, sticker.symbol, sticker.name);
            }
            Ok(())
        }
        StickerCommand::Add(add) => {
            let sticker = tray
                .find(&add.sticker)
                .ok_or_else(|| anyhow!("'{}' is not in the sticker tray", add.sticker))?;
            let mut store = JournalStateStore::open(adapter);
            store.add_sticker(sticker.glyph());
            println!(
                "Added {} ({} sticker(s) on the journal)",
                sticker.symbol,
                store.document().stickers.len()
            );
            Ok(())
        }
    }
}

pub fn restore<P: PersistenceAdapter>(adapter: P) -> Result<()> {
    let mut store = JournalStateStore::open(adapter);
    let mut toast = ToastNotifier::new();
    store.restore(&mut toast);
    println!("{}", toast.current());
    print!("{}", render_document(store.document()));
    Ok(())
}

pub fn clear<P: PersistenceAdapter>(adapter: P) -> Result<()> {
    let mut store = JournalStateStore::open(adapter);
    let mut toast = ToastNotifier::new();
    store.clear(&mut toast);
    println!("{}", toast.current());
    Ok(())
}

pub fn export<P: PersistenceAdapter>(
    config: Arc<AppConfig>,
    adapter: P,
    args: ExportArgs,
) -> Result<()> {
    let output_dir = args
        .output_dir
        .unwrap_or_else(|| config.export.output_dir().to_path_buf());
    let pipeline = ExportPipeline::new(Arc::new(PdfRenderer), output_dir);
    let store = JournalStateStore::open(adapter);
    let snapshot = JournalSnapshot::capture(store.document());
    match pipeline.export(Some(&snapshot)) {
        Ok(receipt) => {
            let when = receipt
                .exported_at
                .format(&Rfc3339)
                .unwrap_or_else(|_| receipt.exported_at.to_string());
            println!(
                "Exported {} ({} bytes) at {when}",
                receipt.path.display(),
                receipt.bytes
            );
            Ok(())
        }
        Err(err) => {
            let message = err.user_message();
            Err(anyhow::Error::new(err).context(message))
        }
    }
}

pub fn render_document(document: &JournalDocument) -> String {
    let mut out = String::new();
    let stickers = if document.stickers.is_empty() {
        "(none)".to_string()
    } else {
        document
            .stickers
            .iter()
            .map(|g| g.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    };
    let _ = writeln!(out, "Background  {}", document.background_color);
    let _ = writeln!(out, "Text color  {}", document.text_color);
    let _ = writeln!(
        out,
        "Font        {} ({})",
        document.font_family,
        document.font_family.label()
    );
    let _ = writeln!(out, "Stickers    {stickers}");
    let _ = writeln!(out, "--- entry ---");
    let _ = writeln!(out, "{}", or_empty(&document.body_text));
    let _ = writeln!(out, "--- lyrics ---");
    let _ = writeln!(out, "{}", or_empty(&document.lyrics_text));
    out
}

fn render_theme_list(catalog: &ThemeCatalog) -> String {
    let mut out = String::new();
    for (idx, preset) in catalog.all().enumerate() {
        let _ = writeln!(
            out,
            "{}. {:<9} background {}  text {}",
            idx + 1,
            preset.name,
            preset.background,
            preset.text
        );
    }
    out
}

fn or_empty(text: &str) -> &str {
    if text.is_empty() {
        "(empty)"
    } else {
        text
    }
}

fn read_stdin() -> Result<Option<String>> {
    let mut buf = String::new();
    io::stdin()
        .read_to_string(&mut buf)
        .context("reading value from stdin")?;
    if buf.is_empty() {
        Ok(None)
    } else {
        Ok(Some(buf))
    }
}
