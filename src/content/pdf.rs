//! PDF page counting and rasterising
//!
//! Backed by mupdf when built with the `pdf` feature. Without it, a PDF is
//! still accepted after a header check and shows up as a single page that
//! renders as a placeholder.

use egui::ColorImage;
use std::path::Path;

/// Zoom applied when rasterising; 2x of the 72 dpi page space keeps text
/// readable when the page is scaled up in the viewer
pub const RENDER_ZOOM: f32 = 2.0;

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Not a PDF document")]
    NotPdf,

    #[cfg(feature = "pdf")]
    #[error("Page {page} out of range ({page_count} pages)")]
    PageOutOfRange { page: usize, page_count: usize },

    #[error("PDF support not built")]
    Unsupported,

    #[cfg(feature = "pdf")]
    #[error("mupdf: {0}")]
    Mupdf(#[from] mupdf::error::Error),

    #[error("Unsupported pixmap layout: {0}")]
    PixmapFormat(String),
}

/// Copies the colour channels of a rasterised page into a [`ColorImage`].
///
/// `samples` holds `height` rows of `stride` bytes, each pixel `n` bytes wide
/// with RGB first. Row padding and any alpha channel are dropped.
#[cfg_attr(not(feature = "pdf"), allow(dead_code))]
pub(crate) fn samples_to_color_image(
    width: usize,
    height: usize,
    stride: usize,
    n: usize,
    samples: &[u8],
) -> Result<ColorImage, RenderError> {
    if n < 3 {
        return Err(RenderError::PixmapFormat(format!("{} channels", n)));
    }

    let row_bytes = width * n;
    if row_bytes > stride {
        return Err(RenderError::PixmapFormat(format!(
            "stride {} shorter than a {} byte row",
            stride, row_bytes
        )));
    }
    let needed = match height {
        0 => 0,
        rows => (rows - 1) * stride + row_bytes,
    };
    if samples.len() < needed {
        return Err(RenderError::PixmapFormat(format!(
            "{} sample bytes, {} needed",
            samples.len(),
            needed
        )));
    }

    let mut rgb = Vec::with_capacity(width * height * 3);
    for y in 0..height {
        let row = &samples[y * stride..y * stride + row_bytes];
        for px in row.chunks_exact(n) {
            rgb.extend_from_slice(&px[..3]);
        }
    }

    Ok(ColorImage::from_rgb([width, height], &rgb))
}

#[cfg(feature = "pdf")]
pub use self::mupdf_backend::{page_count, render_page};

#[cfg(not(feature = "pdf"))]
pub use self::header_only::{page_count, render_page};

#[cfg(feature = "pdf")]
mod mupdf_backend {
    use super::*;
    use mupdf::{Colorspace, Document, Matrix, Pixmap};
    use tracing::debug;

    fn open(path: &Path) -> Result<Document, RenderError> {
        Ok(Document::open(path.to_string_lossy().as_ref())?)
    }

    pub fn page_count(path: &Path) -> Result<usize, RenderError> {
        let doc = open(path)?;
        let count = doc.page_count()?.max(0) as usize;
        debug!("{} has {} pages", path.display(), count);
        Ok(count)
    }

    pub fn render_page(path: &Path, page: usize, zoom: f32) -> Result<ColorImage, RenderError> {
        let doc = open(path)?;
        let page_count = doc.page_count()?.max(0) as usize;
        if page >= page_count {
            return Err(RenderError::PageOutOfRange { page, page_count });
        }

        let page = doc.load_page(page as i32)?;
        let rgb = Colorspace::device_rgb();
        let pixmap = page.to_pixmap(&Matrix::new_scale(zoom, zoom), &rgb, false, false)?;
        pixmap_to_color_image(&pixmap)
    }

    fn pixmap_to_color_image(pixmap: &Pixmap) -> Result<ColorImage, RenderError> {
        samples_to_color_image(
            pixmap.width() as usize,
            pixmap.height() as usize,
            pixmap.stride() as usize,
            pixmap.n() as usize,
            pixmap.samples(),
        )
    }
}

#[cfg(not(feature = "pdf"))]
mod header_only {
    use super::*;
    use std::io::Read;
    use tracing::warn;

    const PDF_MAGIC: &[u8] = b"%PDF-";

    pub fn page_count(path: &Path) -> Result<usize, RenderError> {
        let mut header = [0u8; 5];
        std::fs::File::open(path)?.read_exact(&mut header)?;
        if header != PDF_MAGIC {
            return Err(RenderError::NotPdf);
        }
        warn!(
            "{} accepted without page information, PDF support not built",
            path.display()
        );
        Ok(1)
    }

    pub fn render_page(_path: &Path, _page: usize, _zoom: f32) -> Result<ColorImage, RenderError> {
        Err(RenderError::Unsupported)
    }
}


#[cfg(all(test, feature = "pdf"))]
mod mupdf_tests {
    use super::*;

    /// Single 72x72pt page; mupdf rebuilds the missing xref table on open
    const ONE_PAGE_PDF: &[u8] = b"%PDF-1.4
1 0 obj << /Type /Catalog /Pages 2 0 R >> endobj
2 0 obj << /Type /Pages /Kids [3 0 R] /Count 1 >> endobj
3 0 obj << /Type /Page /Parent 2 0 R /MediaBox [0 0 72 72] >> endobj
trailer << /Root 1 0 R >>
%%EOF
";

    fn one_page_pdf(dir: &Path) -> std::path::PathBuf {
        let path = dir.join("one.pdf");
        std::fs::write(&path, ONE_PAGE_PDF).unwrap();
        path
    }

    #[test]
    fn renders_existing_pages() {
        let dir = tempfile::tempdir().unwrap();
        let path = one_page_pdf(dir.path());

        assert_eq!(page_count(&path).unwrap(), 1);
        let image = render_page(&path, 0, RENDER_ZOOM).unwrap();
        assert!(image.width() > 0 && image.height() > 0);
    }

    #[test]
    fn pages_past_the_end_are_out_of_range() {
        let dir = tempfile::tempdir().unwrap();
        let path = one_page_pdf(dir.path());

        assert!(matches!(
            render_page(&path, 1, RENDER_ZOOM),
            Err(RenderError::PageOutOfRange {
                page: 1,
                page_count: 1
            })
        ));
    }
}

#[cfg(all(test, not(feature = "pdf")))]
mod header_tests {
    use super::*;

    #[test]
    fn header_check_accepts_pdf_magic_only() {
        let dir = tempfile::tempdir().unwrap();
        let pdf = dir.path().join("a.pdf");
        std::fs::write(&pdf, b"%PDF-1.7\n...").unwrap();
        let fake = dir.path().join("b.pdf");
        std::fs::write(&fake, b"GIF89a").unwrap();

        assert_eq!(page_count(&pdf).unwrap(), 1);
        assert!(matches!(page_count(&fake), Err(RenderError::NotPdf)));
        assert!(matches!(
            render_page(&pdf, 0, RENDER_ZOOM),
            Err(RenderError::Unsupported)
        ));
    }

    #[test]
    fn truncated_file_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let short = dir.path().join("short.pdf");
        std::fs::write(&short, b"%P").unwrap();

        assert!(matches!(page_count(&short), Err(RenderError::Io(_))));
    }
}
