//! File picker and import sessions
//!
//! A session runs the native picker, loads whatever was picked on the
//! blocking pool and reports back to the UI through an [`ImportEvent`].
//! Cancelling the picker reports [`ImportEvent::Cancelled`] and nothing else.

use serde::{Deserialize, Serialize};
use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::content::loader::{self, classify, ImportBatch};
use crate::content::ContentKind;
use crate::navigation::poll_loop::RepaintSignal;

const IMAGE_EXTENSIONS: &[&str] = &[
    "png", "jpg", "jpeg", "gif", "bmp", "tif", "tiff", "webp", "ico",
];
const PDF_EXTENSIONS: &[&str] = &["pdf"];

/// Content types offered by the picker
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentFilter {
    Images,
    Pdf,
    #[default]
    All,
}

impl ContentFilter {
    pub fn extensions(&self) -> Vec<&'static str> {
        match self {
            ContentFilter::Images => IMAGE_EXTENSIONS.to_vec(),
            ContentFilter::Pdf => PDF_EXTENSIONS.to_vec(),
            ContentFilter::All => IMAGE_EXTENSIONS
                .iter()
                .chain(PDF_EXTENSIONS)
                .copied()
                .collect(),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ContentFilter::Images => "Images",
            ContentFilter::Pdf => "PDF documents",
            ContentFilter::All => "Images and PDF documents",
        }
    }

    pub fn accepts(&self, path: &Path) -> bool {
        match (self, classify(path)) {
            (ContentFilter::All, Some(_)) => true,
            (ContentFilter::Images, Some(ContentKind::Image)) => true,
            (ContentFilter::Pdf, Some(ContentKind::Pdf)) => true,
            _ => false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PickRequest {
    pub filter: ContentFilter,
    pub allow_multiple: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PickOutcome {
    Picked(Vec<PathBuf>),
    Cancelled,
}

pub type PickFuture = Pin<Box<dyn Future<Output = PickOutcome> + Send>>;

/// Source of file selections, normally the native dialog
pub trait FilePicker: Send + Sync {
    fn pick(&self, request: PickRequest) -> PickFuture;
}

/// Native dialog through rfd
#[derive(Debug, Default)]
pub struct RfdPicker;

impl FilePicker for RfdPicker {
    fn pick(&self, request: PickRequest) -> PickFuture {
        Box::pin(async move {
            let dialog = rfd::AsyncFileDialog::new()
                .set_title("Import files")
                .add_filter(request.filter.label(), &request.filter.extensions());

            let picked = if request.allow_multiple {
                dialog.pick_files().await
            } else {
                dialog.pick_file().await.map(|handle| vec![handle])
            };

            match picked {
                Some(handles) => PickOutcome::Picked(
                    handles
                        .into_iter()
                        .map(|handle| handle.path().to_path_buf())
                        .collect(),
                ),
                None => PickOutcome::Cancelled,
            }
        })
    }
}

#[derive(Debug)]
pub enum ImportEvent {
    Loaded(ImportBatch),
    Cancelled,
}

/// Reply slot of a running session. Reports [`ImportEvent::Cancelled`] if the
/// session is dropped before answering, so the UI never waits on a dead picker.
struct SessionReply {
    sender: Option<mpsc::Sender<ImportEvent>>,
    repaint: RepaintSignal,
}

impl SessionReply {
    async fn send(mut self, event: ImportEvent) {
        if let Some(sender) = self.sender.take() {
            if sender.send(event).await.is_err() {
                debug!("Import finished after the UI closed");
            }
        }
        self.repaint.request();
    }
}

impl Drop for SessionReply {
    fn drop(&mut self) {
        if let Some(sender) = self.sender.take() {
            warn!("Import session ended without a result");
            if sender.try_send(ImportEvent::Cancelled).is_ok() {
                self.repaint.request();
            }
        }
    }
}

/// Runs one picker session to completion in the background
pub fn spawn_import(
    runtime: &Handle,
    picker: Arc<dyn FilePicker>,
    request: PickRequest,
    sender: mpsc::Sender<ImportEvent>,
    repaint: RepaintSignal,
) {
    let blocking = runtime.clone();
    let reply = SessionReply {
        sender: Some(sender),
        repaint,
    };
    runtime.spawn(async move {
        let event = run_import(&blocking, picker.as_ref(), request).await;
        reply.send(event).await;
    });
}

async fn run_import(runtime: &Handle, picker: &dyn FilePicker, request: PickRequest) -> ImportEvent {
    info!("Opening file picker ({:?})", request);
    let paths = match picker.pick(request).await {
        PickOutcome::Picked(paths) => paths,
        PickOutcome::Cancelled => {
            info!("File picker cancelled");
            return ImportEvent::Cancelled;
        }
    };

    let (accepted, rejected): (Vec<_>, Vec<_>) =
        paths.into_iter().partition(|path| request.filter.accepts(path));
    let mut rejected: Vec<_> = rejected
        .into_iter()
        .map(loader::ImportError::Unsupported)
        .collect();

    let mut batch = match runtime
        .spawn_blocking(move || loader::load_files(&accepted))
        .await
    {
        Ok(batch) => batch,
        Err(e) => {
            error!("Import task failed: {}", e);
            ImportBatch::default()
        }
    };
    batch.failures.append(&mut rejected);
    ImportEvent::Loaded(batch)
}
