//! Turns picked file paths into [`ContentPage`]s
//!
//! Images are fully decoded here. PDFs only have their pages counted; the
//! pages themselves are rasterised when first shown. Files that fail are
//! dropped from the batch and reported in [`ImportBatch::failures`].

use egui::ColorImage;
use image::imageops::{self, FilterType};
use image::{ImageReader, RgbaImage};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use super::{pdf, ContentKind, ContentPage};

/// Longest side kept when decoding; larger images are scaled down on import
pub const MAX_DECODED_SIDE: u32 = 8192;

#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to decode image {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("Failed to open PDF {path}: {source}")]
    Pdf {
        path: PathBuf,
        #[source]
        source: pdf::RenderError,
    },

    #[error("PDF {0} has no pages")]
    EmptyDocument(PathBuf),

    #[error("Unsupported file type: {0}")]
    Unsupported(PathBuf),
}

#[derive(Debug, Default)]
pub struct ImportBatch {
    pub pages: Vec<ContentPage>,
    pub failures: Vec<ImportError>,
}

impl ImportBatch {
    pub fn files_failed(&self) -> usize {
        self.failures.len()
    }
}

pub fn classify(path: &Path) -> Option<ContentKind> {
    let extension = path.extension()?.to_string_lossy().to_ascii_lowercase();
    if extension == "pdf" {
        return Some(ContentKind::Pdf);
    }
    image::ImageFormat::from_extension(&extension).map(|_| ContentKind::Image)
}

pub fn decode_image(path: &Path) -> Result<ColorImage, ImportError> {
    let reader = ImageReader::open(path)
        .and_then(|reader| reader.with_guessed_format())
        .map_err(|source| ImportError::Io {
            path: path.to_path_buf(),
            source,
        })?;

    let mut decoded = reader.decode().map_err(|source| ImportError::Decode {
        path: path.to_path_buf(),
        source,
    })?;
    if decoded.width().max(decoded.height()) > MAX_DECODED_SIDE {
        debug!(
            "Scaling down {} from {}x{}",
            path.display(),
            decoded.width(),
            decoded.height()
        );
        decoded = decoded.resize(MAX_DECODED_SIDE, MAX_DECODED_SIDE, FilterType::Triangle);
    }

    let size = [decoded.width() as usize, decoded.height() as usize];
    let rgba = decoded.to_rgba8();
    debug!("Decoded {} ({}x{})", path.display(), size[0], size[1]);
    Ok(ColorImage::from_rgba_unmultiplied(size, rgba.as_flat_samples().as_slice()))
}

/// Scales `image` down so neither side exceeds `max_side`, keeping the aspect
/// ratio. `None` when it already fits.
pub fn fit_within(image: &ColorImage, max_side: usize) -> Option<ColorImage> {
    let [width, height] = image.size;
    let longest = width.max(height);
    if max_side == 0 || longest <= max_side {
        return None;
    }

    let scale = max_side as f64 / longest as f64;
    let target = |side: usize| ((side as f64 * scale).round() as u32).clamp(1, max_side as u32);
    let (new_width, new_height) = (target(width), target(height));

    let buffer = RgbaImage::from_raw(width as u32, height as u32, image.as_raw().to_vec())?;
    let resized = imageops::resize(&buffer, new_width, new_height, FilterType::Triangle);
    Some(ColorImage::from_rgba_premultiplied(
        [new_width as usize, new_height as usize],
        resized.as_raw(),
    ))
}

pub fn load_file(path: &Path) -> Result<Vec<ContentPage>, ImportError> {
    match classify(path) {
        Some(ContentKind::Image) => Ok(vec![ContentPage::image(path, decode_image(path)?)]),
        Some(ContentKind::Pdf) => {
            let page_count = pdf::page_count(path).map_err(|source| ImportError::Pdf {
                path: path.to_path_buf(),
                source,
            })?;
            pdf_pages(path, page_count)
        }
        None => Err(ImportError::Unsupported(path.to_path_buf())),
    }
}

/// One entry per page; a document without pages is a failed file
fn pdf_pages(path: &Path, page_count: usize) -> Result<Vec<ContentPage>, ImportError> {
    if page_count == 0 {
        return Err(ImportError::EmptyDocument(path.to_path_buf()));
    }
    Ok((0..page_count)
        .map(|page| ContentPage::pdf_page(path, page, page_count))
        .collect())
}

/// Loads files in pick order. Blocking, run it off the UI thread.
pub fn load_files(paths: &[PathBuf]) -> ImportBatch {
    let mut batch = ImportBatch::default();

    for path in paths {
        match load_file(path) {
            Ok(pages) => batch.pages.extend(pages),
            Err(e) => {
                warn!("Skipping {}: {}", path.display(), e);
                batch.failures.push(e);
            }
        }
    }

    info!(
        "Loaded {} pages from {} files ({} skipped)",
        batch.pages.len(),
        paths.len(),
        batch.failures.len()
    );
    batch
}
