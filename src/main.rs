use std::path::{Path, PathBuf};
use std::sync::Arc;

use canvas::doc::{CanvasData, DocError, Position};
use canvas::engine::{CanvasController, CanvasError, Surface};
use canvas::input::ExportFormat;
use clap::{Parser, Subcommand, ValueEnum};
use planboard::autosave::{Autosave, SaveStatus};
use planboard::backend::{BackendError, CanvasBackend, HttpBackend, NewArtifact};
use planboard::config::{AutosaveConfig, BackendConfig, ConfigError, ExportConfig, GenerationConfig};
use planboard::export::{self, ExportError, ExportOptions};
use planboard::generation::{BmcRequest, GenerationClient, GenerationError, bmc_element};
use planboard::notify::ToastSink;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Backend(#[from] BackendError),
    #[error(transparent)]
    Generation(#[from] GenerationError),
    #[error(transparent)]
    Export(#[from] ExportError),
    #[error(transparent)]
    Canvas(#[from] CanvasError),
    #[error("invalid canvas document: {0}")]
    Doc(#[from] DocError),
    #[error("{path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error("project {0} has no saved canvas")]
    NoCanvas(String),
    #[error("saving the canvas for project {0} failed")]
    SaveFailed(String),
}

#[derive(Parser, Debug)]
#[command(name = "planboard", about = "Planning canvas export, repair and sync")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render a canvas document to PNG or PDF.
    Export {
        input: PathBuf,
        #[arg(long, value_enum, default_value_t = FormatArg::Png)]
        format: FormatArg,
        #[arg(long, env = "PLANBOARD_EXPORT_SCALE")]
        scale: Option<f32>,
        #[arg(long, env = "PLANBOARD_EXPORT_BACKGROUND")]
        background: Option<String>,
        /// Name used for the default output filename.
        #[arg(long, default_value = "")]
        name: String,
        /// Export only these element ids.
        #[arg(long = "only")]
        only: Vec<String>,
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Load, repair and print a canvas document.
    Normalize {
        input: PathBuf,
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Download a project's canvas.
    Pull {
        #[arg(long)]
        project: String,
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Upload a canvas document to a project.
    Push {
        #[arg(long)]
        project: String,
        input: PathBuf,
    },
    /// Generate a Business Model Canvas, optionally placing it on a project canvas.
    GenerateBmc {
        #[arg(long)]
        company: String,
        #[arg(long, default_value = "")]
        industry: String,
        #[arg(long)]
        description: String,
        /// Store the result as an artifact and add it to this project's canvas.
        #[arg(long)]
        project: Option<String>,
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum FormatArg {
    Png,
    Pdf,
}

impl From<FormatArg> for ExportFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Png => Self::Png,
            FormatArg::Pdf => Self::Pdf,
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    tracing_subscriber::fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();

    match cli.command {
        Command::Export { input, format, scale, background, name, only, out } => {
            let defaults = ExportConfig::default();
            let config = ExportConfig {
                scale: scale.unwrap_or(defaults.scale),
                background: background.unwrap_or(defaults.background),
            };
            run_export(&input, format.into(), &config, &name, only, out)
        }
        Command::Normalize { input, out } => run_normalize(&input, out),
        Command::Pull { project, out } => run_pull(&project, out).await,
        Command::Push { project, input } => run_push(&project, &input).await,
        Command::GenerateBmc { company, industry, description, project, out } => {
            let request = BmcRequest { company_name: company, industry, description };
            run_generate_bmc(&request, project, out).await
        }
    }
}

fn read_document(path: &Path) -> Result<CanvasData, CliError> {
    let text = std::fs::read_to_string(path).map_err(|source| CliError::Io { path: path.to_path_buf(), source })?;
    let (data, report) = CanvasData::from_json(&text)?;
    if !report.is_clean() {
        info!(path = %path.display(), ?report, "document repaired on load");
    }
    Ok(data)
}

fn write_output(path: Option<PathBuf>, bytes: &[u8]) -> Result<(), CliError> {
    match path {
        Some(path) => {
            std::fs::write(&path, bytes).map_err(|source| CliError::Io { path: path.clone(), source })?;
            info!(path = %path.display(), bytes = bytes.len(), "written");
        }
        None => println!("{}", String::from_utf8_lossy(bytes)),
    }
    Ok(())
}

fn backend() -> Result<Arc<dyn CanvasBackend>, CliError> {
    Ok(Arc::new(HttpBackend::new(&BackendConfig::from_env()?)?))
}

fn run_export(
    input: &Path,
    format: ExportFormat,
    config: &ExportConfig,
    name: &str,
    only: Vec<String>,
    out: Option<PathBuf>,
) -> Result<(), CliError> {
    let data = read_document(input)?;
    let options = ExportOptions { only, ..ExportOptions::from_config(format, config) };
    let exported = export::export(&data.elements, &options)?;
    let path = out.unwrap_or_else(|| PathBuf::from(export::default_filename(name, format)));
    std::fs::write(&path, &exported.bytes).map_err(|source| CliError::Io { path: path.clone(), source })?;
    println!("{} ({}x{}, {} bytes)", path.display(), exported.width, exported.height, exported.bytes.len());
    Ok(())
}

fn run_normalize(input: &Path, out: Option<PathBuf>) -> Result<(), CliError> {
    let text = std::fs::read_to_string(input).map_err(|source| CliError::Io { path: input.to_path_buf(), source })?;
    let (data, report) = CanvasData::from_json(&text)?;
    eprintln!(
        "generated ids: {}, re-keyed duplicates: {}, clamped positions: {}, resized hexagons: {}, fixed sizes: {}",
        report.generated_ids, report.rekeyed_duplicates, report.clamped_positions, report.resized_hexagons, report.fixed_sizes
    );
    write_output(out, serde_json::to_string_pretty(&data)?.as_bytes())
}

async fn run_pull(project: &str, out: Option<PathBuf>) -> Result<(), CliError> {
    let data = backend()?.get_canvas(project).await?.ok_or_else(|| CliError::NoCanvas(project.to_string()))?;
    write_output(out, serde_json::to_string_pretty(&data)?.as_bytes())
}

async fn run_push(project: &str, input: &Path) -> Result<(), CliError> {
    let data = read_document(input)?;
    let backend = backend()?;
    let exists = backend.get_canvas(project).await?.is_some();
    save_once(backend, project, exists, data).await
}

async fn run_generate_bmc(request: &BmcRequest, project: Option<String>, out: Option<PathBuf>) -> Result<(), CliError> {
    let client = GenerationClient::from_config(&GenerationConfig::from_env()?)?;
    let bmc = client.generate_bmc(request).await?;

    if let Some(project) = project {
        let backend = backend()?;
        let artifact = backend
            .create_artifact(&NewArtifact {
                project_id: project.clone(),
                kind: "bmc".to_owned(),
                title: format!("{} business model", request.company_name.trim()),
                data: serde_json::to_value(&bmc)?,
            })
            .await?;
        info!(%project, artifact = %artifact.id, "bmc artifact stored");

        let existing = backend.get_canvas(&project).await?;
        let exists = existing.is_some();
        let mut controller = CanvasController::with_document(Surface::Project, existing.unwrap_or_default());
        controller.insert_elements(vec![bmc_element(bmc.clone(), Position::new(0.0, 0.0))])?;
        save_once(backend, &project, exists, controller.document().clone()).await?;
    }

    write_output(out, serde_json::to_string_pretty(&bmc)?.as_bytes())
}

/// Save through the autosave worker so failures surface the same way as in the editor.
async fn save_once(backend: Arc<dyn CanvasBackend>, project: &str, exists: bool, data: CanvasData) -> Result<(), CliError> {
    let autosave = Autosave::spawn(backend, project, exists, AutosaveConfig::for_surface(Surface::Project), ToastSink::Log);
    let status = autosave.subscribe();
    autosave.save_now(data);
    autosave.close().await;
    if *status.borrow() == SaveStatus::Error {
        return Err(CliError::SaveFailed(project.to_string()));
    }
    Ok(())
}
