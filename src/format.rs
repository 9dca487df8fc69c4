//! Reformatting entry points: Extract → Infer → Render.
//!
//! The stages run strictly in sequence and the first failure ends the run;
//! nothing is retried here and no partial document is ever returned.
//! Extraction and rendering are CPU-bound ZIP/XML work, so they run on the
//! blocking pool to keep server worker threads free while a large upload is
//! unpacked.

use crate::config::FormatConfig;
use crate::error::AutodoxError;
use crate::model::StructuredDocument;
use crate::output::{FormatOutput, FormatStats};
use crate::pipeline::infer::{infer_structure, resolve_backend, CompletionBackend};
use crate::pipeline::{extract, render};
use crate::progress::Stage;
use std::io::Write;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info};

/// File name extension every upload must carry.
pub const DOCX_EXTENSION: &str = ".docx";

/// File name of the generated document.
pub const OUTPUT_FILENAME: &str = "formatted_autodox.docx";

/// Check an upload's file name and return it.
pub fn validate_upload_name(name: Option<&str>) -> Result<&str, AutodoxError> {
    match name {
        None => Err(AutodoxError::InvalidUpload {
            reason: "upload has no file name".into(),
        }),
        Some(n) if !n.ends_with(DOCX_EXTENSION) => Err(AutodoxError::InvalidUpload {
            reason: format!("'{}' is not a {} file", n, DOCX_EXTENSION),
        }),
        Some(n) => Ok(n),
    }
}

/// Reformat a `.docx` held in memory.
///
/// This is the primary entry point for the library. The backend comes from
/// `config.backend`, or is created from the configured provider.
///
/// # Example
/// ```rust,no_run
/// use autodox::{format_document, FormatConfig};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let bytes = std::fs::read("thesis.docx")?;
/// let output = format_document(bytes, &FormatConfig::default()).await?;
/// std::fs::write("formatted_autodox.docx", &output.document)?;
/// # Ok(())
/// # }
/// ```
pub async fn format_document(
    bytes: Vec<u8>,
    config: &FormatConfig,
) -> Result<FormatOutput, AutodoxError> {
    let backend = resolve_backend(config)?;
    format_with_backend(bytes, backend.as_ref(), config).await
}

/// Reformat a `.docx` using an explicit backend.
///
/// The server calls this with the backend it resolved once at startup.
pub async fn format_with_backend(
    bytes: Vec<u8>,
    backend: &dyn CompletionBackend,
    config: &FormatConfig,
) -> Result<FormatOutput, AutodoxError> {
    let total_start = Instant::now();
    let input_bytes = bytes.len();
    info!("Starting reformat: {} bytes", input_bytes);
    if let Some(ref cb) = config.progress_callback {
        cb.on_format_start(input_bytes);
    }

    // ── Step 1: Extract ──────────────────────────────────────────────────
    let stage_start = begin(config, Stage::Extract);
    let extracted = report(
        config,
        Stage::Extract,
        stage_start,
        blocking(move || extract::extract_text(&bytes)).await,
    )?;
    let extract_duration_ms = elapsed_ms(stage_start);
    info!(
        "Extracted {} paragraphs ({} chars) in {}ms",
        extracted.paragraphs,
        extracted.char_count(),
        extract_duration_ms
    );

    // ── Step 2: Infer ────────────────────────────────────────────────────
    let stage_start = begin(config, Stage::Infer);
    let inference = report(
        config,
        Stage::Infer,
        stage_start,
        infer_structure(backend, &extracted.text, config).await,
    )?;
    let infer_duration_ms = elapsed_ms(stage_start);
    info!(
        "Inferred structure with {} entries, {} roman pages in {}ms",
        inference.structure.entry_count(),
        inference.structure.roman_page_count,
        infer_duration_ms
    );

    // ── Step 3: Render ───────────────────────────────────────────────────
    let stage_start = begin(config, Stage::Render);
    let structure = inference.structure.clone();
    let labels = config.labels.clone();
    let document = report(
        config,
        Stage::Render,
        stage_start,
        blocking(move || render::render_document(&structure, &labels)).await,
    )?;
    let render_duration_ms = elapsed_ms(stage_start);
    debug!("Rendered {} bytes in {}ms", document.len(), render_duration_ms);

    let stats = FormatStats {
        input_bytes,
        output_bytes: document.len(),
        paragraphs: extracted.paragraphs,
        extracted_chars: extracted.char_count(),
        truncated: inference.truncated,
        input_tokens: inference.input_tokens,
        output_tokens: inference.output_tokens,
        attempts: inference.attempts,
        extract_duration_ms,
        infer_duration_ms,
        render_duration_ms,
        total_duration_ms: elapsed_ms(total_start),
    };

    info!(
        "Reformat complete: {} → {} bytes, {}ms total",
        stats.input_bytes, stats.output_bytes, stats.total_duration_ms
    );
    if let Some(ref cb) = config.progress_callback {
        cb.on_format_complete(stats.output_bytes);
    }

    Ok(FormatOutput {
        document,
        structure: inference.structure,
        stats,
    })
}

/// Reformat a file on disk and write the result to `output_path`.
///
/// Uses atomic write (temp file in the target directory + rename) so a
/// failed run never leaves a half-written document behind.
pub async fn format_file(
    input_path: impl AsRef<Path>,
    output_path: impl AsRef<Path>,
    config: &FormatConfig,
) -> Result<FormatStats, AutodoxError> {
    let bytes = read_input(input_path.as_ref()).await?;
    let output = format_document(bytes, config).await?;
    write_atomic(output_path.as_ref(), output.document).await?;
    Ok(output.stats)
}

/// Run Extract → Infer only and return the structure the document would
/// be rebuilt from. Nothing is rendered.
pub async fn infer_document(
    bytes: Vec<u8>,
    config: &FormatConfig,
) -> Result<StructuredDocument, AutodoxError> {
    let backend = resolve_backend(config)?;

    let stage_start = begin(config, Stage::Extract);
    let extracted = report(
        config,
        Stage::Extract,
        stage_start,
        blocking(move || extract::extract_text(&bytes)).await,
    )?;

    let stage_start = begin(config, Stage::Infer);
    let inference = report(
        config,
        Stage::Infer,
        stage_start,
        infer_structure(backend.as_ref(), &extracted.text, config).await,
    )?;
    info!(
        "Inferred structure with {} entries, {} roman pages",
        inference.structure.entry_count(),
        inference.structure.roman_page_count
    );
    Ok(inference.structure)
}

/// [`infer_document`] for a file on disk, with the same name check as
/// [`format_file`].
pub async fn infer_file(
    input_path: impl AsRef<Path>,
    config: &FormatConfig,
) -> Result<StructuredDocument, AutodoxError> {
    let bytes = read_input(input_path.as_ref()).await?;
    infer_document(bytes, config).await
}

/// Synchronous wrapper around [`format_document`].
///
/// Creates a temporary tokio runtime internally.
pub fn format_sync(bytes: Vec<u8>, config: &FormatConfig) -> Result<FormatOutput, AutodoxError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| AutodoxError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(format_document(bytes, config))
}

/// Write `data` to `path` via a sibling temp file and rename.
pub async fn write_atomic(path: &Path, data: Vec<u8>) -> Result<(), AutodoxError> {
    let path = path.to_path_buf();
    blocking(move || {
        let write_failed = |source| AutodoxError::OutputWriteFailed {
            path: path.clone(),
            source,
        };
        let dir = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => std::path::PathBuf::from("."),
        };
        std::fs::create_dir_all(&dir).map_err(write_failed)?;
        let mut tmp = tempfile::NamedTempFile::new_in(&dir).map_err(write_failed)?;
        tmp.write_all(&data).map_err(write_failed)?;
        tmp.persist(&path).map_err(|e| write_failed(e.error))?;
        Ok(())
    })
    .await
}

// ── Internal helpers ─────────────────────────────────────────────────────

/// Check the input's name, then read it.
async fn read_input(input: &Path) -> Result<Vec<u8>, AutodoxError> {
    validate_upload_name(input.file_name().and_then(|n| n.to_str()))?;
    tokio::fs::read(input).await.map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => AutodoxError::FileNotFound {
            path: input.to_path_buf(),
        },
        _ => AutodoxError::Internal(format!("cannot read '{}': {}", input.display(), e)),
    })
}

/// Run CPU-bound work on the blocking pool.
async fn blocking<T, F>(f: F) -> Result<T, AutodoxError>
where
    F: FnOnce() -> Result<T, AutodoxError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| AutodoxError::Internal(format!("Blocking task panicked: {}", e)))?
}

fn begin(config: &FormatConfig, stage: Stage) -> Instant {
    if let Some(ref cb) = config.progress_callback {
        cb.on_stage_start(stage);
    }
    Instant::now()
}

/// Forward a stage outcome to the progress callback and pass it through.
fn report<T>(
    config: &FormatConfig,
    stage: Stage,
    started: Instant,
    result: Result<T, AutodoxError>,
) -> Result<T, AutodoxError> {
    if let Some(ref cb) = config.progress_callback {
        match &result {
            Ok(_) => cb.on_stage_complete(stage, elapsed_ms(started)),
            Err(e) => cb.on_stage_error(stage, &e.to_string()),
        }
    }
    result
}

fn elapsed_ms(start: Instant) -> u64 {
    start.elapsed().as_millis() as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upload_name_must_end_in_docx() {
        assert_eq!(validate_upload_name(Some("skripsi.docx")).unwrap(), "skripsi.docx");
        assert!(validate_upload_name(Some("skripsi.pdf")).is_err());
        assert!(validate_upload_name(Some("skripsi.docx.zip")).is_err());
        assert!(validate_upload_name(None).is_err());
    }

    #[test]
    fn upload_name_errors_are_client_errors() {
        let err = validate_upload_name(Some("notes.txt")).unwrap_err();
        assert!(err.is_client_error());
        assert!(err.to_string().contains("notes.txt"));
    }

    #[tokio::test]
    async fn write_atomic_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("nested/out.docx");
        write_atomic(&target, b"PK\x03\x04data".to_vec()).await.unwrap();
        assert_eq!(std::fs::read(&target).unwrap(), b"PK\x03\x04data");
    }

    #[tokio::test]
    async fn format_file_rejects_wrong_extension_before_reading() {
        let err = format_file("/nonexistent/input.pdf", "/tmp/out.docx", &FormatConfig::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AutodoxError::InvalidUpload { .. }));
    }
}
