use std::error::Error as StdError;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;

use crossbeam_channel::Sender;
use thiserror::Error;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::journal::{Color, FontFamily, Glyph, JournalDocument};

mod pdf;

pub use pdf::PdfRenderer;

pub const EXPORT_FILE_NAME: &str = "solace_journal.pdf";
const MM_PER_INCH: f32 = 25.4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageFormat {
    Letter,
}

impl PageFormat {
    /// Portrait width and height in inches.
    pub fn size_in(self) -> (f32, f32) {
        match self {
            PageFormat::Letter => (8.5, 11.0),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    Portrait,
}

/// Output policy for exported journals.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportOptions {
    pub page: PageFormat,
    pub orientation: Orientation,
    pub margin_in: f32,
    /// Rasterisation factor for renderers that paint through a bitmap.
    pub raster_scale: f32,
    /// Quality of embedded JPEG images, `0.0..=1.0`.
    pub image_quality: f32,
    pub file_name: &'static str,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            page: PageFormat::Letter,
            orientation: Orientation::Portrait,
            margin_in: 0.5,
            raster_scale: 2.0,
            image_quality: 0.98,
            file_name: EXPORT_FILE_NAME,
        }
    }
}

impl ExportOptions {
    pub fn page_size_mm(&self) -> (f32, f32) {
        let (w, h) = match self.orientation {
            Orientation::Portrait => self.page.size_in(),
        };
        (w * MM_PER_INCH, h * MM_PER_INCH)
    }

    pub fn margin_mm(&self) -> f32 {
        self.margin_in * MM_PER_INCH
    }
}

/// The journal panel as it was drawn when export was requested.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JournalSnapshot {
    pub background: Color,
    pub text_color: Color,
    pub font: FontFamily,
    pub stickers: Vec<Glyph>,
    pub body: String,
    pub lyrics: String,
}

impl JournalSnapshot {
    pub fn capture(document: &JournalDocument) -> Self {
        Self {
            background: document.background_color,
            text_color: document.text_color,
            font: document.font_family,
            stickers: document.stickers.clone(),
            body: document.body_text.clone(),
            lyrics: document.lyrics_text.clone(),
        }
    }
}

#[derive(Debug, Error)]
#[error("{message}")]
pub struct RenderFailure {
    message: String,
    #[source]
    source: Option<Box<dyn StdError + Send + Sync>>,
}

impl RenderFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    pub fn with_source<E>(message: impl Into<String>, source: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Self {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }
}

/// Turns a journal snapshot into document bytes.
pub trait RendererPort: Send + Sync {
    fn render(
        &self,
        snapshot: &JournalSnapshot,
        options: &ExportOptions,
    ) -> Result<Vec<u8>, RenderFailure>;
}

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("no journal snapshot is mounted")]
    TargetMissing,
    #[error("rendering the journal failed")]
    RenderFailure(#[source] RenderFailure),
}

impl ExportError {
    pub fn user_message(&self) -> &'static str {
        match self {
            ExportError::TargetMissing => "Journal content not found.",
            ExportError::RenderFailure(_) => {
                "Something went wrong while exporting. Please try again."
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct ExportReceipt {
    pub id: Uuid,
    pub path: PathBuf,
    pub bytes: usize,
    pub exported_at: OffsetDateTime,
}

pub type ExportOutcome = Result<ExportReceipt, ExportError>;

/// Renders journal snapshots and saves them as files. Every call produces a
/// new file; nothing is cached or coalesced between calls.
#[derive(Clone)]
pub struct ExportPipeline {
    renderer: Arc<dyn RendererPort>,
    output_dir: PathBuf,
    options: ExportOptions,
}

impl ExportPipeline {
    pub fn new(renderer: Arc<dyn RendererPort>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            renderer,
            output_dir: output_dir.into(),
            options: ExportOptions::default(),
        }
    }

    pub fn export(&self, snapshot: Option<&JournalSnapshot>) -> ExportOutcome {
        let snapshot = snapshot.ok_or_else(|| {
            tracing::warn!("export requested without a mounted journal");
            ExportError::TargetMissing
        })?;
        self.run(Uuid::new_v4(), snapshot)
    }

    /// Starts an export on a worker thread; the outcome is sent on `results`.
    /// A missing snapshot is reported immediately and nothing is spawned.
    pub fn spawn(
        &self,
        snapshot: Option<JournalSnapshot>,
        results: Sender<ExportOutcome>,
    ) -> Result<Uuid, ExportError> {
        let snapshot = snapshot.ok_or_else(|| {
            tracing::warn!("export requested without a mounted journal");
            ExportError::TargetMissing
        })?;
        let id = Uuid::new_v4();
        let pipeline = self.clone();
        thread::Builder::new()
            .name(format!("export-{id}"))
            .spawn(move || {
                let outcome = pipeline.run(id, &snapshot);
                if results.send(outcome).is_err() {
                    tracing::debug!(%id, "export finished after the receiver went away");
                }
            })
            .map_err(|err| {
                tracing::error!(?err, %id, "failed to start export worker");
                ExportError::RenderFailure(RenderFailure::with_source(
                    "starting export worker",
                    err,
                ))
            })?;
        Ok(id)
    }

    fn run(&self, id: Uuid, snapshot: &JournalSnapshot) -> ExportOutcome {
        let span = tracing::info_span!("export", %id);
        let _entered = span.enter();
        match self.render_and_save(id, snapshot) {
            Ok(receipt) => {
                tracing::info!(path = %receipt.path.display(), bytes = receipt.bytes, "journal exported");
                Ok(receipt)
            }
            Err(err) => {
                tracing::error!(error = %err, source = ?err.source(), "journal export failed");
                Err(ExportError::RenderFailure(err))
            }
        }
    }

    fn render_and_save(
        &self,
        id: Uuid,
        snapshot: &JournalSnapshot,
    ) -> Result<ExportReceipt, RenderFailure> {
        let rendered = panic::catch_unwind(AssertUnwindSafe(|| {
            self.renderer.render(snapshot, &self.options)
        }))
        .map_err(|_| RenderFailure::new("renderer panicked"))??;

        fs::create_dir_all(&self.output_dir).map_err(|err| {
            RenderFailure::with_source(
                format!("creating export directory {}", self.output_dir.display()),
                err,
            )
        })?;
        let path = write_new_file(&self.output_dir, self.options.file_name, &rendered)?;
        Ok(ExportReceipt {
            id,
            path,
            bytes: rendered.len(),
            exported_at: OffsetDateTime::now_utc(),
        })
    }
}

/// Writes `bytes` under `file_name`, or `stem (n).ext` when the name is taken.
fn write_new_file(dir: &Path, file_name: &str, bytes: &[u8]) -> Result<PathBuf, RenderFailure> {
    let base = Path::new(file_name);
    let stem = base
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(file_name);
    let extension = base.extension().and_then(|s| s.to_str());

    for attempt in 0u32.. {
        let candidate = match (attempt, extension) {
            (0, _) => dir.join(file_name),
            (n, Some(ext)) => dir.join(format!("{stem} ({n}).{ext}")),
            (n, None) => dir.join(format!("{stem} ({n})")),
        };
        match OpenOptions::new().write(true).create_new(true).open(&candidate) {
            Ok(file) => {
                fill_or_discard(&candidate, file, bytes)?;
                return Ok(candidate);
            }
            Err(err) if err.kind() == io::ErrorKind::AlreadyExists => continue,
            Err(err) => {
                return Err(RenderFailure::with_source(
                    format!("creating {}", candidate.display()),
                    err,
                ))
            }
        }
    }
    Err(RenderFailure::new("no free export file name"))
}

/// Writes the whole document to a freshly created file. A partial file is
/// removed so a failed export leaves nothing behind.
fn fill_or_discard<W: Write>(
    path: &Path,
    mut sink: W,
    bytes: &[u8],
) -> Result<(), RenderFailure> {
    match sink.write_all(bytes).and_then(|()| sink.flush()) {
        Ok(()) => Ok(()),
        Err(err) => {
            drop(sink);
            if let Err(cleanup) = fs::remove_file(path) {
                tracing::warn!(
                    ?cleanup,
                    path = %path.display(),
                    "could not remove partial export"
                );
            }
            Err(RenderFailure::with_source(
                format!("writing {}", path.display()),
                err,
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tempfile::TempDir;

    #[derive(Default)]
    struct RecordingRenderer {
        calls: AtomicUsize,
    }

    impl RendererPort for RecordingRenderer {
        fn render(
            &self,
            snapshot: &JournalSnapshot,
            _options: &ExportOptions,
        ) -> Result<Vec<u8>, RenderFailure> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(format!("%PDF {}", snapshot.body).into_bytes())
        }
    }

    struct FailingRenderer;

    impl RendererPort for FailingRenderer {
        fn render(&self, _: &JournalSnapshot, _: &ExportOptions) -> Result<Vec<u8>, RenderFailure> {
            Err(RenderFailure::new("canvas tainted"))
        }
    }

    struct PanickingRenderer;

    impl RendererPort for PanickingRenderer {
        fn render(&self, _: &JournalSnapshot, _: &ExportOptions) -> Result<Vec<u8>, RenderFailure> {
            panic!("renderer blew up")
        }
    }

    fn snapshot() -> JournalSnapshot {
        JournalSnapshot::capture(&JournalDocument {
            body_text: "Dear diary".into(),
            ..JournalDocument::default()
        })
    }

    #[test]
    fn default_policy_is_letter_portrait() {
        let options = ExportOptions::default();
        let (w, h) = options.page_size_mm();
        assert!((w - 215.9).abs() < 0.01 && (h - 279.4).abs() < 0.01);
        assert!((options.margin_mm() - 12.7).abs() < 0.01);
        assert_eq!(options.raster_scale, 2.0);
        assert_eq!(options.image_quality, 0.98);
        assert_eq!(options.file_name, "solace_journal.pdf");
    }

    #[test]
    fn missing_snapshot_never_reaches_renderer() -> anyhow::Result<()> {
        let temp = TempDir::new()?;
        let renderer = Arc::new(RecordingRenderer::default());
        let pipeline = ExportPipeline::new(renderer.clone(), temp.path());

        let err = pipeline.export(None).unwrap_err();
        assert_matches!(err, ExportError::TargetMissing);
        assert_eq!(err.user_message(), "Journal content not found.");

        let (tx, _rx) = crossbeam_channel::unbounded();
        assert_matches!(pipeline.spawn(None, tx), Err(ExportError::TargetMissing));
        assert_eq!(renderer.calls.load(Ordering::SeqCst), 0);
        Ok(())
    }

    #[test]
    fn repeated_exports_produce_repeated_files() -> anyhow::Result<()> {
        let temp = TempDir::new()?;
        let renderer = Arc::new(RecordingRenderer::default());
        let pipeline = ExportPipeline::new(renderer.clone(), temp.path().join("out"));
        let snap = snapshot();

        let first = pipeline.export(Some(&snap))?;
        let second = pipeline.export(Some(&snap))?;

        assert_eq!(first.path, temp.path().join("out/solace_journal.pdf"));
        assert_eq!(second.path, temp.path().join("out/solace_journal (1).pdf"));
        assert_ne!(first.id, second.id);
        assert_eq!(fs::read(&first.path)?, b"%PDF Dear diary");
        assert_eq!(renderer.calls.load(Ordering::SeqCst), 2);
        Ok(())
    }

    #[test]
    fn render_errors_become_retry_message() -> anyhow::Result<()> {
        let temp = TempDir::new()?;
        let pipeline = ExportPipeline::new(Arc::new(FailingRenderer), temp.path());

        let err = pipeline.export(Some(&snapshot())).unwrap_err();
        assert_matches!(&err, ExportError::RenderFailure(inner) if inner.to_string() == "canvas tainted");
        assert_eq!(
            err.user_message(),
            "Something went wrong while exporting. Please try again."
        );
        assert!(!temp.path().join(EXPORT_FILE_NAME).exists());
        Ok(())
    }

    #[test]
    fn renderer_panics_are_contained() -> anyhow::Result<()> {
        let temp = TempDir::new()?;
        let pipeline = ExportPipeline::new(Arc::new(PanickingRenderer), temp.path());
        assert_matches!(
            pipeline.export(Some(&snapshot())),
            Err(ExportError::RenderFailure(_))
        );
        Ok(())
    }

    #[test]
    fn concurrent_spawns_each_deliver() -> anyhow::Result<()> {
        let temp = TempDir::new()?;
        let renderer = Arc::new(RecordingRenderer::default());
        let pipeline = ExportPipeline::new(renderer.clone(), temp.path());
        let (tx, rx) = crossbeam_channel::unbounded();

        let a = pipeline.spawn(Some(snapshot()), tx.clone())?;
        let b = pipeline.spawn(Some(snapshot()), tx)?;
        assert_ne!(a, b);

        let mut paths = Vec::new();
        for _ in 0..2 {
            let receipt = rx.recv_timeout(Duration::from_secs(10))??;
            paths.push(receipt.path);
        }
        paths.sort();
        paths.dedup();
        assert_eq!(paths.len(), 2);
        assert_eq!(renderer.calls.load(Ordering::SeqCst), 2);
        Ok(())
    }

    struct ShortWriter {
        room: usize,
    }

    impl Write for ShortWriter {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            if self.room == 0 {
                return Err(io::Error::new(io::ErrorKind::Other, "disk full"));
            }
            let n = buf.len().min(self.room);
            self.room -= n;
            Ok(n)
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn failed_write_removes_partial_file() -> anyhow::Result<()> {
        let temp = TempDir::new()?;
        let path = temp.path().join(EXPORT_FILE_NAME);
        fs::write(&path, b"%PDF")?;

        let err =
            fill_or_discard(&path, ShortWriter { room: 4 }, b"%PDF Dear diary").unwrap_err();
        assert!(err.to_string().contains("writing"));
        assert!(!path.exists());
        Ok(())
    }
}
