//! Subcommand handlers. The mirror is refreshed once per invocation; each
//! handler then performs one store or rendering operation and prints JSON.

use std::path::Path;
use std::sync::Arc;

use canvas::overlay::Placed;
use canvas::pages::PageSpec;
use canvas::transform::{DisplaySize, Point, SurfaceRect};
use image::ImageFormat;
use render::{Ink, PdfViewer, RenderError, ViewerEvents, ZoomPreviewController, shared_backend};
use serde::Serialize;
use store::model::DeleteMode;
use store::{AnchorAggregateStore, AnchorDraft, AnchorKey, AnchorPatch, HttpRemote, StoreError};
use tracing::info;

use crate::config::AppConfig;
use crate::{AnchorCommand, AutofillArgs, Cli, CliError, Command, LayoutArgs, PdfCommand, PlaceArgs, PreviewArgs, ProviderCommand, ViewArgs};

pub(crate) async fn run(cli: Cli) -> Result<(), CliError> {
    let config = AppConfig::from_env()?.with_overrides(cli.api_url, cli.render_scale)?;
    let remote = HttpRemote::new(&config.api_url, config.timeouts)?;
    info!(api_url = %config.api_url, render_scale = config.render_scale, "anchorstamp starting");

    let mut store = AnchorAggregateStore::new(Arc::new(remote));
    store.refresh().await?;
    execute(cli.command, &mut store, config.render_scale).await
}

pub(crate) async fn execute(command: Command, store: &mut AnchorAggregateStore, render_scale: f64) -> Result<(), CliError> {
    match command {
        Command::Providers(cmd) => providers(cmd, store).await,
        Command::Pdfs(cmd) => pdfs(cmd, store).await,
        Command::Anchors(cmd) => anchors(cmd, store).await,
        Command::Place(args) => place(args, store, render_scale).await,
        Command::View(args) => view(args, store, render_scale).await,
        Command::Preview(args) => preview(args, store, render_scale).await,
        Command::Autofill(args) => autofill(args, store).await,
    }
}

// =============================================================================
// CRUD
// =============================================================================

async fn providers(cmd: ProviderCommand, store: &mut AnchorAggregateStore) -> Result<(), CliError> {
    match cmd {
        ProviderCommand::List => print_json(&store.providers()),
        ProviderCommand::Create { name } => {
            let provider = store.create_provider(&name).await?;
            print_json(provider)
        }
        ProviderCommand::Rename { provider_id, name } => {
            store.rename_provider(&provider_id, &name).await?;
            print_json(&store.provider(&provider_id))
        }
        ProviderCommand::Toggle { provider_id } => {
            let active = store.toggle_provider_active(&provider_id).await?;
            print_json(&serde_json::json!({ "id": provider_id, "active": active }))
        }
        ProviderCommand::Delete { provider_id } => {
            store.delete_provider(&provider_id).await?;
            print_json(&serde_json::json!({ "deleted": provider_id }))
        }
    }
}

async fn pdfs(cmd: PdfCommand, store: &mut AnchorAggregateStore) -> Result<(), CliError> {
    match cmd {
        PdfCommand::Upload { provider_id, file } => {
            let bytes = read_file(&file)?;
            let pdf = store.upload_pdf(&provider_id, &file_name(&file), bytes).await?;
            print_json(pdf)
        }
        PdfCommand::Check { file } => {
            let bytes = read_file(&file)?;
            let check = store.check_duplicate(&file_name(&file), bytes).await?;
            print_json(&check)
        }
        PdfCommand::Toggle { pdf_id } => {
            let active = store.toggle_pdf_active(pdf_id).await?;
            print_json(&serde_json::json!({ "id": pdf_id, "isActive": active }))
        }
        PdfCommand::Delete { pdf_id, hard } => {
            let mode = if hard { DeleteMode::Hard } else { DeleteMode::Soft };
            store.delete_pdf(pdf_id, mode).await?;
            print_json(&serde_json::json!({ "deleted": pdf_id, "hard": hard }))
        }
        PdfCommand::Download { pdf_id, out } => {
            let bytes = store.download(pdf_id).await?;
            write_file(&out, &bytes)
        }
    }
}

async fn anchors(cmd: AnchorCommand, store: &mut AnchorAggregateStore) -> Result<(), CliError> {
    match cmd {
        AnchorCommand::List { pdf_id } => {
            let pdf = store.pdf(pdf_id).ok_or(StoreError::UnknownPdf(pdf_id))?;
            print_json(&pdf.anchors)
        }
        AnchorCommand::Add { pdf_id, key, x, y, page, canvas_width, canvas_height } => {
            let canvas = canvas_width.zip(canvas_height).map(|(w, h)| canvas::transform::CanvasSize::new(w, h));
            let draft = AnchorDraft::parse(&key, x, y, &page, canvas)?;
            let anchor = store.create_anchor(pdf_id, &draft).await?;
            print_json(&anchor)
        }
        AnchorCommand::Edit { anchor_id, key, x, y, page } => {
            let patch = AnchorPatch {
                key: key.as_deref().map(AnchorKey::parse).transpose()?,
                x,
                y,
                page: page.as_deref().map(str::parse::<PageSpec>).transpose()?,
                canvas: None,
            };
            let anchor = store.update_anchor(anchor_id, &patch).await?;
            print_json(&anchor)
        }
        AnchorCommand::Delete { anchor_id } => {
            store.delete_anchor(anchor_id).await?;
            print_json(&serde_json::json!({ "deleted": anchor_id }))
        }
    }
}

// =============================================================================
// RENDERING
// =============================================================================

/// Logs viewer callbacks; a terminal has nothing else to repaint.
pub(crate) struct LogEvents;

impl ViewerEvents for LogEvents {
    fn on_canvas_click(&self, x: u32, y: u32, page: u32) {
        info!(x, y, page, "canvas click");
    }

    fn on_dimensions_change(&self, canvas_width: u32, canvas_height: u32) {
        info!(canvas_width, canvas_height, "canvas dimensions changed");
    }

    fn on_pages_loaded(&self, total_pages: u32) {
        info!(total_pages, "document loaded");
    }
}

/// Resolve the layout flags into a display size and surface origin.
pub(crate) fn layout(args: LayoutArgs) -> Result<Option<(DisplaySize, SurfaceRect)>, CliError> {
    match (args.display_width, args.display_height) {
        (Some(width), Some(height)) => {
            Ok(Some((DisplaySize::new(width, height), SurfaceRect::new(args.surface_left, args.surface_top))))
        }
        (None, None) => Ok(None),
        _ => Err(CliError::PartialDisplaySize),
    }
}

async fn open_viewer(
    store: &AnchorAggregateStore,
    pdf_id: i64,
    page: u32,
    layout_args: LayoutArgs,
    render_scale: f64,
) -> Result<PdfViewer<LogEvents>, CliError> {
    let placement = layout(layout_args)?;
    let bytes = store.download(pdf_id).await?;
    let mut viewer = PdfViewer::open(shared_backend(), &bytes, render_scale, LogEvents).await?;
    if page != viewer.current_page() {
        viewer.go_to_page(page).await?;
    }
    if let Some((display, rect)) = placement {
        viewer.set_display_size(display, rect);
    }
    Ok(viewer)
}

async fn place(args: PlaceArgs, store: &mut AnchorAggregateStore, render_scale: f64) -> Result<(), CliError> {
    let viewer = open_viewer(store, args.pdf_id, args.page, args.layout, render_scale).await?;
    let clicked = viewer.click(Point::new(args.client_x, args.client_y));
    let canvas = viewer.canvas_size();
    let rule = args.rule.unwrap_or_else(|| viewer.current_page().to_string());
    viewer.close();

    let position = clicked?;
    let draft = AnchorDraft::parse(&args.key, position.x, position.y, &rule, canvas)?;
    let anchor = store.create_anchor(args.pdf_id, &draft).await?;
    print_json(&anchor)
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PageView {
    page: u32,
    total_pages: u32,
    canvas_width: Option<u32>,
    canvas_height: Option<u32>,
    indicators: Vec<IndicatorView>,
}

#[derive(Serialize)]
struct IndicatorView {
    id: i64,
    label: String,
    x: f64,
    y: f64,
    radius: f64,
}

async fn view(args: ViewArgs, store: &mut AnchorAggregateStore, render_scale: f64) -> Result<(), CliError> {
    let anchors = store.pdf(args.pdf_id).ok_or(StoreError::UnknownPdf(args.pdf_id))?.anchors.clone();
    let viewer = open_viewer(store, args.pdf_id, args.page, args.layout, render_scale).await?;
    let canvas = viewer.canvas_size();
    let page_view = PageView {
        page: viewer.current_page(),
        total_pages: viewer.total_pages(),
        canvas_width: canvas.map(|c| c.width),
        canvas_height: canvas.map(|c| c.height),
        indicators: viewer
            .indicators(&anchors)
            .into_iter()
            .map(|i| IndicatorView { id: i.id, label: i.label, x: i.center.x, y: i.center.y, radius: i.radius })
            .collect(),
    };
    let written = args.png.as_deref().map_or(Ok(()), |path| write_png(&viewer, path));
    viewer.close();
    written?;
    print_json(&page_view)
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PreviewView {
    anchor_id: i64,
    page: u32,
    zoom_percent: u32,
    marker_x: Option<u32>,
    marker_y: Option<u32>,
    display_x: Option<f64>,
    display_y: Option<f64>,
    radius: Option<f64>,
    saved: bool,
}

async fn preview(args: PreviewArgs, store: &mut AnchorAggregateStore, render_scale: f64) -> Result<(), CliError> {
    let anchor = store.anchor(args.anchor_id).cloned().ok_or(StoreError::UnknownAnchor(args.anchor_id))?;
    let pdf_id = anchor.pdf_id.ok_or(StoreError::UnknownAnchor(args.anchor_id))?;
    let spec: PageSpec = anchor.page.parse()?;

    let bytes = store.download(pdf_id).await?;
    let mut controller = ZoomPreviewController::load(shared_backend(), &bytes, render_scale)?;
    controller.open_for(&spec).await?;
    controller.set_marker(anchor.position(), anchor.canvas());
    controller.set_zoom(args.zoom);

    let moved = match args.client_x.zip(args.client_y) {
        Some((x, y)) => Some(controller.click(Point::new(x, y), SurfaceRect::default())?),
        None => None,
    };
    let marker = controller.marker_position();
    let view = controller.marker_view();
    let page = controller.page();
    let zoom_percent = controller.zoom_percent();
    let canvas = controller.canvas_size();
    controller.close();

    let saved = match moved {
        Some(position) if args.save => {
            let patch = AnchorPatch { x: Some(position.x), y: Some(position.y), canvas, ..AnchorPatch::default() };
            store.update_anchor(args.anchor_id, &patch).await?;
            true
        }
        _ => false,
    };

    print_json(&PreviewView {
        anchor_id: args.anchor_id,
        page,
        zoom_percent,
        marker_x: marker.map(|m| m.x),
        marker_y: marker.map(|m| m.y),
        display_x: view.map(|v| v.center.x),
        display_y: view.map(|v| v.center.y),
        radius: view.map(|v| v.radius),
        saved,
    })
}

async fn autofill(args: AutofillArgs, store: &mut AnchorAggregateStore) -> Result<(), CliError> {
    let bytes = read_file(&args.input)?;
    let filled = if args.local {
        let pdf = store.pdf(args.pdf_id).ok_or(StoreError::UnknownPdf(args.pdf_id))?;
        if !pdf.is_active {
            return Err(StoreError::InactivePdf(args.pdf_id).into());
        }
        let canvas = AnchorAggregateStore::autofill_canvas(pdf);
        render::burn_in(&bytes, &pdf.anchors, canvas, Ink::from_preview(args.preview))?
    } else {
        store.autofill(args.pdf_id, &file_name(&args.input), bytes, args.preview).await?
    };
    write_file(&args.out, &filled)
}

// =============================================================================
// OUTPUT
// =============================================================================

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<(), CliError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn read_file(path: &Path) -> Result<Vec<u8>, CliError> {
    std::fs::read(path).map_err(|source| CliError::Io { path: path.to_path_buf(), source })
}

fn write_file(path: &Path, bytes: &[u8]) -> Result<(), CliError> {
    std::fs::write(path, bytes).map_err(|source| CliError::Io { path: path.to_path_buf(), source })?;
    info!(path = %path.display(), bytes = bytes.len(), "wrote file");
    Ok(())
}

/// Save the viewer's current page pixels as a PNG.
pub(crate) fn write_png<E: ViewerEvents>(viewer: &PdfViewer<E>, path: &Path) -> Result<(), CliError> {
    let pixels = viewer
        .snapshot()
        .ok_or_else(|| RenderError::Backend("no page has been drawn".to_owned()))?;
    pixels
        .save_with_format(path, ImageFormat::Png)
        .map_err(|source| CliError::Image { path: path.to_path_buf(), source })?;
    info!(path = %path.display(), width = pixels.width(), height = pixels.height(), "wrote page image");
    Ok(())
}

pub(crate) fn file_name(path: &Path) -> String {
    path.file_name().map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned())
}
