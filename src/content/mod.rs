//! Imported content
//!
//! Every entry of [`ImportedContentList`] is one displayable page: a decoded
//! image, or a single page of a PDF document. Navigation indexes into this flat
//! list, so paging walks through images and PDF pages alike.

pub mod loader;
pub mod pdf;

use egui::ColorImage;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

pub use loader::{load_files, ImportBatch, ImportError};

/// How a new import combines with what is already loaded
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImportMode {
    #[default]
    Replace,
    Append,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentKind {
    Image,
    Pdf,
}

#[derive(Clone)]
pub enum PageSource {
    /// Decoded at import time
    Image(Arc<ColorImage>),
    /// Rasterised on demand, `page` is zero based
    Pdf { page: usize, page_count: usize },
}

impl std::fmt::Debug for PageSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PageSource::Image(image) => write!(f, "Image({}x{})", image.width(), image.height()),
            PageSource::Pdf { page, page_count } => {
                write!(f, "Pdf({}/{})", page + 1, page_count)
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct ContentPage {
    pub path: PathBuf,
    pub source: PageSource,
}

impl ContentPage {
    pub fn image(path: impl Into<PathBuf>, image: ColorImage) -> Self {
        Self {
            path: path.into(),
            source: PageSource::Image(Arc::new(image)),
        }
    }

    pub fn pdf_page(path: impl Into<PathBuf>, page: usize, page_count: usize) -> Self {
        Self {
            path: path.into(),
            source: PageSource::Pdf { page, page_count },
        }
    }

    pub fn kind(&self) -> ContentKind {
        match self.source {
            PageSource::Image(_) => ContentKind::Image,
            PageSource::Pdf { .. } => ContentKind::Pdf,
        }
    }

    /// File name plus the page within the document for PDFs
    pub fn label(&self) -> String {
        let name = file_name(&self.path);
        match self.source {
            PageSource::Image(_) => name,
            PageSource::Pdf { page, page_count } => {
                format!("{} (page {}/{})", name, page + 1, page_count)
            }
        }
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListChange {
    /// Previous pages were discarded, navigation starts over
    Replaced { pages: usize },
    Appended { added: usize },
    Unchanged,
}

#[derive(Debug, Default)]
pub struct ImportedContentList {
    pages: Vec<ContentPage>,
    /// Bumped on every replace so cached renders of old pages are dropped
    generation: u64,
}

impl ImportedContentList {
    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&ContentPage> {
        self.pages.get(index)
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Number of distinct files behind the pages
    pub fn file_count(&self) -> usize {
        let mut count = 0;
        let mut last: Option<&Path> = None;
        for page in &self.pages {
            if last != Some(page.path.as_path()) {
                count += 1;
                last = Some(page.path.as_path());
            }
        }
        count
    }

    /// Merges an import. An empty batch never clears what is already shown.
    pub fn apply(&mut self, pages: Vec<ContentPage>, mode: ImportMode) -> ListChange {
        if pages.is_empty() {
            warn!("Import produced no displayable pages, keeping current content");
            return ListChange::Unchanged;
        }

        match mode {
            ImportMode::Replace => {
                self.pages = pages;
                self.generation += 1;
                info!("Replaced content with {} pages", self.pages.len());
                ListChange::Replaced {
                    pages: self.pages.len(),
                }
            }
            ImportMode::Append => {
                let added = pages.len();
                self.pages.extend(pages);
                info!("Appended {} pages, {} total", added, self.pages.len());
                ListChange::Appended { added }
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub fn test_image(path: &str) -> ContentPage {
        ContentPage::image(path, ColorImage::new([2, 2], egui::Color32::WHITE))
    }

    #[test]
    fn replace_swaps_the_whole_list() {
        let mut list = ImportedContentList::default();
        list.apply(vec![test_image("a.png"), test_image("b.png")], ImportMode::Replace);
        let change = list.apply(vec![test_image("c.png")], ImportMode::Replace);

        assert_eq!(change, ListChange::Replaced { pages: 1 });
        assert_eq!(list.len(), 1);
        assert_eq!(list.get(0).unwrap().label(), "c.png");
        assert_eq!(list.generation(), 2);
    }

    #[test]
    fn append_keeps_existing_pages_and_generation() {
        let mut list = ImportedContentList::default();
        list.apply(vec![test_image("a.png")], ImportMode::Append);
        let generation = list.generation();
        let change = list.apply(vec![test_image("b.png"), test_image("c.png")], ImportMode::Append);

        assert_eq!(change, ListChange::Appended { added: 2 });
        assert_eq!(list.len(), 3);
        assert_eq!(list.generation(), generation);
    }

    #[test]
    fn empty_import_leaves_content_alone() {
        let mut list = ImportedContentList::default();
        list.apply(vec![test_image("a.png")], ImportMode::Replace);

        assert_eq!(list.apply(Vec::new(), ImportMode::Replace), ListChange::Unchanged);
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn pdf_pages_are_labelled_and_counted_per_file() {
        let mut list = ImportedContentList::default();
        list.apply(
            vec![
                ContentPage::pdf_page("doc.pdf", 0, 2),
                ContentPage::pdf_page("doc.pdf", 1, 2),
                test_image("a.png"),
            ],
            ImportMode::Replace,
        );

        assert_eq!(list.len(), 3);
        assert_eq!(list.file_count(), 2);
        assert_eq!(list.get(1).unwrap().label(), "doc.pdf (page 2/2)");
        assert_eq!(list.get(1).unwrap().kind(), ContentKind::Pdf);
    }
}
