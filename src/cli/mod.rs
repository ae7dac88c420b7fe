use std::env;
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use once_cell::sync::OnceCell;
use tracing_subscriber::{fmt, EnvFilter};

use crate::app::App;
use crate::config::ConfigLoader;
use crate::export::{ExportPipeline, PdfRenderer};
use crate::storage;

pub mod commands;

use self::commands::{ExportArgs, SetArgs, StickerArgs, ThemeArgs};

#[derive(Parser, Debug)]
#[command(
    name = "solace",
    version,
    about = "A cozy terminal journal with stickers, themes and PDF export"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Override the config file location (takes precedence over SOLACE_CONFIG)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Override the data directory (takes precedence over SOLACE_DATA)
    #[arg(long)]
    pub data_dir: Option<PathBuf>,

    /// Minimum log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Launch the interactive journal (default)
    Tui,
    /// Print the saved journal
    Show,
    /// Set one journal field (body, lyrics, background, text-color, font)
    Set(SetArgs),
    /// List or apply color presets
    Theme(ThemeArgs),
    /// List stickers or add one to the journal
    Sticker(StickerArgs),
    /// Reload the journal from its last saved state
    Restore,
    /// Delete the saved journal and reset to defaults
    Clear,
    /// Export the journal as a PDF
    Export(ExportArgs),
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    if let Some(path) = &cli.config {
        env::set_var("SOLACE_CONFIG", path);
    }
    if let Some(path) = &cli.data_dir {
        env::set_var("SOLACE_DATA", path);
    }

    let loader = ConfigLoader::discover()?;
    loader.paths().ensure_directories()?;
    let paths = loader.paths().clone();
    let command = cli.command.unwrap_or(Commands::Tui);
    let log_file = matches!(command, Commands::Tui).then(|| paths.log_dir.join("solace.log"));
    init_tracing(&cli.log_level, log_file.as_deref())
        .with_context(|| format!("initialising logging at level {}", cli.log_level))?;
    let config = loader.load_or_init()?;
    let storage = storage::init(&paths, &config.storage)?;

    let config = Arc::new(config);
    match command {
        Commands::Tui => {
            let exports =
                ExportPipeline::new(Arc::new(PdfRenderer), config.export.output_dir());
            let mut app = App::new(config.clone(), storage, exports);
            commands::run_tui(&mut app)
        }
        Commands::Show => commands::show(storage),
        Commands::Set(args) => commands::set_field(storage, args),
        Commands::Theme(args) => commands::handle_theme_command(storage, args),
        Commands::Sticker(args) => commands::handle_sticker_command(storage, args),
        Commands::Restore => commands::restore(storage),
        Commands::Clear => commands::clear(storage),
        Commands::Export(args) => commands::export(config, storage, args),
    }
}

fn init_tracing(level: &str, log_file: Option<&Path>) -> Result<()> {
    static INIT: OnceCell<()> = OnceCell::new();
    INIT.get_or_try_init(|| {
        let env_filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"));
        match log_file {
            // the TUI owns the terminal, so logs go to a file
            Some(path) => {
                if let Some(parent) = path.parent() {
                    fs::create_dir_all(parent)
                        .with_context(|| format!("creating log dir {}", parent.display()))?;
                }
                let file = OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(path)
                    .with_context(|| format!("opening log file {}", path.display()))?;
                fmt()
                    .with_env_filter(env_filter)
                    .with_ansi(false)
                    .with_writer(Mutex::new(file))
                    .init();
            }
            None => {
                fmt()
                    .with_env_filter(env_filter)
                    .with_writer(std::io::stderr)
                    .init();
            }
        }
        Ok::<(), anyhow::Error>(())
    })
    .map(|_| ())
}
