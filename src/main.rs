mod commands;
mod config;

use std::path::PathBuf;
use std::process::ExitCode;

use canvas::error::ErrorCode;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Debug, thiserror::Error)]
pub(crate) enum CliError {
    #[error(transparent)]
    Config(#[from] config::ConfigError),
    #[error(transparent)]
    Store(#[from] store::StoreError),
    #[error(transparent)]
    Remote(#[from] store::RemoteError),
    #[error(transparent)]
    Validation(#[from] store::ValidationError),
    #[error(transparent)]
    Render(#[from] render::RenderError),
    #[error(transparent)]
    Transform(#[from] canvas::transform::TransformError),
    #[error(transparent)]
    PageSpec(#[from] canvas::pages::PageSpecError),
    #[error("{path}: {source}")]
    Io { path: PathBuf, source: std::io::Error },
    #[error("{path}: {source}")]
    Image { path: PathBuf, source: image::ImageError },
    #[error("invalid JSON payload: {0}")]
    Json(#[from] serde_json::Error),
    #[error("--display-width and --display-height must be given together")]
    PartialDisplaySize,
}

impl ErrorCode for CliError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Config(e) => e.error_code(),
            Self::Store(e) => e.error_code(),
            Self::Remote(e) => e.error_code(),
            Self::Validation(e) => e.error_code(),
            Self::Render(e) => e.error_code(),
            Self::Transform(e) => e.error_code(),
            Self::PageSpec(e) => e.error_code(),
            Self::Io { .. } => "E_IO",
            Self::Image { .. } => "E_IMAGE",
            Self::Json(_) => "E_JSON",
            Self::PartialDisplaySize => "E_CLI_ARGS",
        }
    }

    fn retryable(&self) -> bool {
        match self {
            Self::Store(e) => e.retryable(),
            Self::Remote(e) => e.retryable(),
            Self::Render(e) => e.retryable(),
            Self::Transform(e) => e.retryable(),
            _ => false,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "anchorstamp", about = "Place text anchors on PDF templates and stamp them onto new PDFs")]
pub(crate) struct Cli {
    #[arg(long, env = "ANCHORSTAMP_API_URL")]
    api_url: Option<String>,

    #[arg(long, env = "ANCHORSTAMP_RENDER_SCALE")]
    render_scale: Option<f64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
pub(crate) enum Command {
    #[command(subcommand)]
    Providers(ProviderCommand),
    #[command(subcommand)]
    Pdfs(PdfCommand),
    #[command(subcommand)]
    Anchors(AnchorCommand),
    /// Click on a rendered page and save an anchor at that spot.
    Place(PlaceArgs),
    /// Render a page and list the anchor indicators visible on it.
    View(ViewArgs),
    /// Open an anchor in the zoom preview, optionally moving it.
    Preview(PreviewArgs),
    /// Stamp a template's anchors onto a new PDF.
    Autofill(AutofillArgs),
}

#[derive(Subcommand, Debug)]
pub(crate) enum ProviderCommand {
    List,
    Create { name: String },
    Rename { provider_id: String, name: String },
    Toggle { provider_id: String },
    Delete { provider_id: String },
}

#[derive(Subcommand, Debug)]
pub(crate) enum PdfCommand {
    Upload {
        provider_id: String,
        file: PathBuf,
    },
    /// Ask the backend whether this file was uploaded before.
    Check {
        file: PathBuf,
    },
    Toggle {
        pdf_id: i64,
    },
    Delete {
        pdf_id: i64,
        #[arg(long, default_value_t = false)]
        hard: bool,
    },
    Download {
        pdf_id: i64,
        #[arg(long)]
        out: PathBuf,
    },
}

#[derive(Subcommand, Debug)]
pub(crate) enum AnchorCommand {
    List {
        pdf_id: i64,
    },
    Add {
        pdf_id: i64,
        #[arg(long)]
        key: String,
        #[arg(long)]
        x: u32,
        #[arg(long)]
        y: u32,
        #[arg(long, default_value = "1")]
        page: String,
        #[arg(long, requires = "canvas_height")]
        canvas_width: Option<u32>,
        #[arg(long, requires = "canvas_width")]
        canvas_height: Option<u32>,
    },
    Edit {
        anchor_id: i64,
        #[arg(long)]
        key: Option<String>,
        #[arg(long)]
        x: Option<u32>,
        #[arg(long)]
        y: Option<u32>,
        #[arg(long)]
        page: Option<String>,
    },
    Delete {
        anchor_id: i64,
    },
}

/// Size and position the rendered surface is laid out at.
#[derive(Args, Debug, Clone, Copy)]
pub(crate) struct LayoutArgs {
    #[arg(long)]
    display_width: Option<f64>,
    #[arg(long)]
    display_height: Option<f64>,
    #[arg(long, default_value_t = 0.0)]
    surface_left: f64,
    #[arg(long, default_value_t = 0.0)]
    surface_top: f64,
}

#[derive(Args, Debug)]
pub(crate) struct PlaceArgs {
    pdf_id: i64,
    #[arg(long, default_value_t = 1)]
    page: u32,
    #[arg(long)]
    client_x: f64,
    #[arg(long)]
    client_y: f64,
    #[arg(long)]
    key: String,
    /// Page rule for the new anchor; defaults to the clicked page.
    #[arg(long)]
    rule: Option<String>,
    #[command(flatten)]
    layout: LayoutArgs,
}

#[derive(Args, Debug)]
pub(crate) struct ViewArgs {
    pdf_id: i64,
    #[arg(long, default_value_t = 1)]
    page: u32,
    /// Also write the rendered page to this PNG file.
    #[arg(long)]
    png: Option<PathBuf>,
    #[command(flatten)]
    layout: LayoutArgs,
}

#[derive(Args, Debug)]
pub(crate) struct PreviewArgs {
    anchor_id: i64,
    #[arg(long, default_value_t = 1.0)]
    zoom: f64,
    /// Click position in the zoomed preview; moves the marker.
    #[arg(long, requires = "client_y")]
    client_x: Option<f64>,
    #[arg(long, requires = "client_x")]
    client_y: Option<f64>,
    /// Save the moved marker back to the anchor.
    #[arg(long, default_value_t = false)]
    save: bool,
}

#[derive(Args, Debug)]
pub(crate) struct AutofillArgs {
    pdf_id: i64,
    input: PathBuf,
    #[arg(long)]
    out: PathBuf,
    /// Red ink for checking placement instead of white.
    #[arg(long, default_value_t = false)]
    preview: bool,
    /// Burn in locally instead of calling the backend.
    #[arg(long, default_value_t = false)]
    local: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let dotenv = dotenvy::dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();
    if let Err(e) = dotenv {
        tracing::debug!(error = %e, "no .env loaded");
    }

    let cli = Cli::parse();
    match commands::run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(code = e.error_code(), retryable = e.retryable(), error = %e, "command failed");
            ExitCode::FAILURE
        }
    }
}
