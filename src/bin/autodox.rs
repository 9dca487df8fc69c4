//! CLI binary for autodox.
//!
//! A thin shim over the library crate: `serve` runs the HTTP service,
//! `format` runs the pipeline on a local file, and `submit` uploads a file
//! to a running service and saves the answer.

use anyhow::{bail, Context, Result};
use autodox::pipeline::render::DOCX_MIME;
use autodox::server::{self, UPLOAD_FIELD};
use autodox::{
    format::write_atomic, infer_file, FormatConfig, FormatProgressCallback,
    ProgressCallback, SectionLabels, ServerConfig, Stage, OUTPUT_FILENAME,
};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal spinner that names the running stage and logs each finished one.
struct CliProgressCallback {
    bar: ProgressBar,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}  ⏱ {elapsed}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]),
        );
        bar.set_prefix("Preparing");
        bar.enable_steady_tick(Duration::from_millis(80));
        Arc::new(Self { bar })
    }
}

impl FormatProgressCallback for CliProgressCallback {
    fn on_format_start(&self, input_bytes: usize) {
        self.bar.set_message(format!("{input_bytes} bytes"));
    }

    fn on_stage_start(&self, stage: Stage) {
        self.bar.set_prefix(match stage {
            Stage::Extract => "Extracting",
            Stage::Infer => "Inferring",
            Stage::Render => "Rendering",
        });
    }

    fn on_stage_complete(&self, stage: Stage, elapsed_ms: u64) {
        self.bar.println(format!(
            "  {} {:<8} {}",
            green("✓"),
            stage,
            dim(&format!("{:.1}s", elapsed_ms as f64 / 1000.0)),
        ));
    }

    fn on_stage_error(&self, stage: Stage, error: &str) {
        let msg: String = if error.chars().count() > 80 {
            let head: String = error.chars().take(79).collect();
            format!("{head}\u{2026}")
        } else {
            error.to_string()
        };
        self.bar.println(format!("  {} {:<8} {}", red("✗"), stage, red(&msg)));
        self.bar.finish_and_clear();
    }

    fn on_format_complete(&self, output_bytes: usize) {
        self.bar
            .finish_with_message(format!("{output_bytes} bytes written ✓"));
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Run the HTTP service
  autodox serve --bind 127.0.0.1:8787

  # Reformat a local file
  autodox format skripsi.docx -o formatted_autodox.docx

  # Show the structure the model inferred, without rendering
  autodox format skripsi.docx --json

  # English section headings
  autodox format --labels english thesis.docx

  # Upload to a running service
  autodox submit skripsi.docx --url http://127.0.0.1:8787/format

ENVIRONMENT VARIABLES:
  GEMINI_API_KEY      Google Gemini API key (default provider)
  OPENAI_API_KEY      OpenAI API key (with --provider openai)
  AUTODOX_PROVIDER    Override provider
  AUTODOX_MODEL       Override model ID
  AUTODOX_BIND        Listen address for `serve`
  RUST_LOG            Log filter, overrides -v / -q
"#;

/// Reformat .docx documents with LLM-extracted structure.
#[derive(Parser, Debug)]
#[command(
    name = "autodox",
    version,
    about = "Reformat .docx documents with LLM-extracted structure",
    long_about = "Reformat .docx documents: the text is read by a language model which \
infers the table of contents, the lists of figures, tables and appendices, the references \
and the front-matter length. A new document is generated with roman-numbered front matter, \
the generated lists and an alphabetised bibliography.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// LLM provider: gemini, openai, anthropic, ollama.
    #[arg(long, global = true, env = "AUTODOX_PROVIDER")]
    provider: Option<String>,

    /// LLM model ID.
    #[arg(long, global = true, env = "AUTODOX_MODEL",
          long_help = "Model used for structure extraction. Default: gemini-1.5-flash.")]
    model: Option<String>,

    /// Heading language of the generated document.
    #[arg(long, global = true, value_enum, default_value = "indonesian")]
    labels: LabelsArg,

    /// Retries on a failed completion call.
    #[arg(long, global = true, env = "AUTODOX_MAX_RETRIES", default_value_t = 0)]
    max_retries: u32,

    /// Completion call timeout in seconds (unlimited if unset).
    #[arg(long, global = true, env = "AUTODOX_API_TIMEOUT")]
    api_timeout: Option<u64>,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP service.
    Serve {
        /// Socket address to listen on.
        #[arg(long, env = "AUTODOX_BIND", default_value = "0.0.0.0:8787")]
        bind: String,

        /// Largest accepted upload in MiB.
        #[arg(long, env = "AUTODOX_MAX_UPLOAD_MB", default_value_t = 20)]
        max_upload_mb: usize,
    },

    /// Reformat a local .docx file.
    Format {
        /// Input .docx file.
        input: PathBuf,

        /// Output file.
        #[arg(short, long, default_value = OUTPUT_FILENAME)]
        output: PathBuf,

        /// Print the inferred structure as JSON instead of writing a document.
        #[arg(long)]
        json: bool,
    },

    /// Upload a .docx file to a running service and save the result.
    Submit {
        /// Input .docx file.
        input: PathBuf,

        /// Endpoint to post to.
        #[arg(long, env = "AUTODOX_URL", default_value = "http://127.0.0.1:8787/format")]
        url: String,

        /// Output file.
        #[arg(short, long, default_value = OUTPUT_FILENAME)]
        output: PathBuf,
    },
}

#[derive(clap::ValueEnum, Clone, Debug)]
enum LabelsArg {
    Indonesian,
    English,
}

impl From<LabelsArg> for SectionLabels {
    fn from(v: LabelsArg) -> Self {
        match v {
            LabelsArg::Indonesian => SectionLabels::indonesian(),
            LabelsArg::English => SectionLabels::english(),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    match cli.command {
        Command::Serve {
            ref bind,
            max_upload_mb,
        } => {
            let server_config = ServerConfig {
                bind: bind.clone(),
                max_upload_bytes: upload_limit_bytes(max_upload_mb)?,
            };
            let config = build_config(&cli, None)?;
            server::serve(server_config, config)
                .await
                .context("Server failed")?;
        }
        Command::Format {
            ref input,
            ref output,
            json,
        } => run_format(&cli, input, output, json).await?,
        Command::Submit {
            ref input,
            ref url,
            ref output,
        } => run_submit(&cli, input, url, output).await?,
    }

    Ok(())
}

/// Convert `--max-upload-mb` to bytes.
fn upload_limit_bytes(mb: usize) -> Result<usize> {
    mb.checked_mul(1024 * 1024)
        .with_context(|| format!("--max-upload-mb {mb} is too large"))
}

/// Map CLI args to `FormatConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<FormatConfig> {
    let mut builder = FormatConfig::builder()
        .labels(cli.labels.clone().into())
        .max_retries(cli.max_retries);
    if let Some(ref p) = cli.provider {
        builder = builder.provider_name(p);
    }
    if let Some(ref m) = cli.model {
        builder = builder.model(m);
    }
    if let Some(secs) = cli.api_timeout {
        builder = builder.api_timeout_secs(secs);
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }
    builder.build().context("Invalid configuration")
}

async fn run_format(cli: &Cli, input: &Path, output: &Path, json: bool) -> Result<()> {
    let progress: Option<ProgressCallback> = if cli.quiet || json {
        None
    } else {
        Some(CliProgressCallback::new() as Arc<dyn FormatProgressCallback>)
    };
    let config = build_config(cli, progress)?;

    if json {
        let structure = infer_file(input, &config)
            .await
            .context("Structure extraction failed")?;
        let json = serde_json::to_string_pretty(&structure)
            .context("Failed to serialise structure")?;
        println!("{json}");
        return Ok(());
    }

    let stats = autodox::format_file(input, output, &config)
        .await
        .context("Reformat failed")?;

    if !cli.quiet {
        eprintln!(
            "{}  {} → {}  {}ms  →  {}",
            green("✔"),
            stats.input_bytes,
            stats.output_bytes,
            stats.total_duration_ms,
            bold(&output.display().to_string()),
        );
        eprintln!(
            "   {} tokens in  /  {} tokens out  ({})",
            dim(&stats.input_tokens.to_string()),
            dim(&stats.output_tokens.to_string()),
            config.effective_model(),
        );
    }
    Ok(())
}

async fn run_submit(cli: &Cli, input: &Path, url: &str, output: &Path) -> Result<()> {
    let file_name = input
        .file_name()
        .and_then(|n| n.to_str())
        .context("Input path has no file name")?
        .to_string();
    let bytes = tokio::fs::read(input)
        .await
        .with_context(|| format!("Failed to read {}", input.display()))?;

    let part = reqwest::multipart::Part::bytes(bytes)
        .file_name(file_name)
        .mime_str(DOCX_MIME)
        .context("Invalid MIME type")?;
    let form = reqwest::multipart::Form::new().part(UPLOAD_FIELD, part);

    let spinner = (!cli.quiet).then(|| {
        let bar = ProgressBar::new_spinner();
        bar.set_message(format!("Uploading to {url}"));
        bar.enable_steady_tick(Duration::from_millis(80));
        bar
    });

    let response = reqwest::Client::new()
        .post(url)
        .multipart(form)
        .send()
        .await
        .with_context(|| format!("Failed to reach {url}"))?;

    let status = response.status();
    if !status.is_success() {
        if let Some(bar) = spinner {
            bar.finish_and_clear();
        }
        let body = response.text().await.unwrap_or_default();
        bail!("Server answered {}: {}", status, body.trim());
    }

    let document = response
        .bytes()
        .await
        .context("Failed to read response body")?;
    let len = document.len();
    write_atomic(output, document.to_vec())
        .await
        .context("Failed to save document")?;

    if let Some(bar) = spinner {
        bar.finish_with_message(format!(
            "{} {} bytes → {}",
            green("✔"),
            len,
            bold(&output.display().to_string())
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upload_limit_is_mebibytes() {
        assert_eq!(upload_limit_bytes(20).unwrap(), 20 * 1024 * 1024);
        assert_eq!(upload_limit_bytes(0).unwrap(), 0);
    }

    #[test]
    fn oversized_upload_limit_is_an_error() {
        let err = upload_limit_bytes(usize::MAX).unwrap_err();
        assert!(err.to_string().contains("too large"));
    }

    #[test]
    fn json_flag_parses() {
        let cli = Cli::try_parse_from(["autodox", "format", "skripsi.docx", "--json"]).unwrap();
        assert!(matches!(cli.command, Command::Format { json: true, .. }));
    }
}
