//! Page display
//!
//! Uploads decoded images as textures on first use and rasterises PDF pages
//! on the blocking pool. Textures are kept in a small LRU cache keyed by the
//! content generation, so a replaced list never shows stale pages.

use egui::{
    pos2, Align2, Color32, ColorImage, FontId, ImageData, Rect, Response, Sense, TextureHandle,
    TextureOptions, Ui, Vec2,
};
use lru::LruCache;
use std::collections::{HashMap, HashSet};
use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tracing::{debug, error};

use super::common::UiColors;
use super::state::ViewerState;
use crate::content::loader::fit_within;
use crate::content::pdf::{self, RenderError};
use crate::content::PageSource;
use crate::navigation::poll_loop::RepaintSignal;

const TEXTURE_CACHE_PAGES: usize = 24;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct PageKey {
    generation: u64,
    index: usize,
}

struct RenderedPage {
    key: PageKey,
    result: Result<ColorImage, RenderError>,
}

pub struct PageView {
    textures: LruCache<PageKey, TextureHandle>,
    pending: HashSet<PageKey>,
    failed: HashMap<PageKey, String>,
    generation: u64,
    render_sender: mpsc::Sender<RenderedPage>,
    render_receiver: mpsc::Receiver<RenderedPage>,
    runtime: Handle,
    repaint: RepaintSignal,
}

impl PageView {
    pub fn new(runtime: Handle, repaint: RepaintSignal) -> Self {
        let (render_sender, render_receiver) = mpsc::channel(16);
        let capacity = NonZeroUsize::new(TEXTURE_CACHE_PAGES).unwrap_or(NonZeroUsize::MIN);
        Self {
            textures: LruCache::new(capacity),
            pending: HashSet::new(),
            failed: HashMap::new(),
            generation: 0,
            render_sender,
            render_receiver,
            runtime,
            repaint,
        }
    }

    fn sync_generation(&mut self, generation: u64) {
        if generation != self.generation {
            debug!("Content replaced, dropping {} cached pages", self.textures.len());
            self.textures.clear();
            self.pending.clear();
            self.failed.clear();
            self.generation = generation;
        }
    }

    /// Moves finished PDF renders into the texture cache
    fn collect_renders(&mut self, ctx: &egui::Context) {
        while let Ok(rendered) = self.render_receiver.try_recv() {
            if !self.pending.remove(&rendered.key) {
                continue;
            }
            match rendered.result {
                Ok(image) => {
                    let name = format!("page_{}_{}", rendered.key.generation, rendered.key.index);
                    let texture = upload_texture(ctx, name, Arc::new(image));
                    self.textures.put(rendered.key, texture);
                }
                Err(e) => {
                    error!("Failed to render page {}: {}", rendered.key.index, e);
                    self.failed.insert(rendered.key, e.to_string());
                }
            }
        }
    }

    fn request_render(&mut self, key: PageKey, path: PathBuf, page: usize) {
        if !self.pending.insert(key) {
            return;
        }
        let sender = self.render_sender.clone();
        let repaint = self.repaint.clone();
        self.runtime.spawn_blocking(move || {
            let result = pdf::render_page(&path, page, pdf::RENDER_ZOOM);
            if sender.blocking_send(RenderedPage { key, result }).is_ok() {
                repaint.request();
            }
        });
    }

    /// Draws the current page filling the available space. The returned
    /// response carries drag gestures over the page area.
    pub fn show(&mut self, ui: &mut Ui, state: &ViewerState) -> Response {
        self.sync_generation(state.content.generation());
        self.collect_renders(ui.ctx());

        let (area, response) = ui.allocate_exact_size(ui.available_size(), Sense::drag());
        let painter = ui.painter_at(area);
        painter.rect_filled(area, 0.0, UiColors::EXTREME_BG);

        if let Some(placeholder) = state.placeholder() {
            centered_text(&painter, area, placeholder);
            return response;
        }

        let index = state.navigation.current_index();
        let Some(page) = state.current_page() else {
            centered_text(&painter, area, "Page unavailable");
            return response;
        };
        let key = PageKey {
            generation: self.generation,
            index,
        };

        if let Some(message) = self.failed.get(&key) {
            centered_text(&painter, area, message);
            return response;
        }

        if !self.textures.contains(&key) {
            match &page.source {
                PageSource::Image(image) => {
                    let name = format!("page_{}_{}", key.generation, key.index);
                    let texture = upload_texture(ui.ctx(), name, image.clone());
                    self.textures.put(key, texture);
                }
                PageSource::Pdf { page: pdf_page, .. } => {
                    self.request_render(key, page.path.clone(), *pdf_page);
                    centered_text(&painter, area, "Rendering…");
                    return response;
                }
            }
        }

        if let Some(texture) = self.textures.get(&key) {
            let rect = page_rect(
                area,
                texture.size_vec2(),
                state.navigation.scale,
                state.navigation.vertical_offset,
            );
            painter.image(
                texture.id(),
                rect,
                Rect::from_min_max(pos2(0.0, 0.0), pos2(1.0, 1.0)),
                Color32::WHITE,
            );
        }

        response
    }
}

/// Uploads `image`, scaled down first when a side exceeds the GPU texture limit
fn upload_texture(ctx: &egui::Context, name: String, image: Arc<ColorImage>) -> TextureHandle {
    let max_side = ctx.input(|input| input.max_texture_side);
    let image = match fit_within(&image, max_side) {
        Some(smaller) => {
            debug!(
                "{} is {}x{}, scaled to fit {} px textures",
                name, image.size[0], image.size[1], max_side
            );
            Arc::new(smaller)
        }
        None => image,
    };
    ctx.load_texture(name, ImageData::Color(image), TextureOptions::LINEAR)
}

fn centered_text(painter: &egui::Painter, area: Rect, text: &str) {
    painter.text(
        area.center(),
        Align2::CENTER_CENTER,
        text,
        FontId::proportional(28.0),
        Color32::GRAY,
    );
}

/// Fits `texture_size` into `area`, then applies zoom and vertical offset.
/// Positive offsets move the page down.
pub fn page_rect(area: Rect, texture_size: Vec2, scale: f32, vertical_offset: f32) -> Rect {
    if texture_size.x <= 0.0 || texture_size.y <= 0.0 {
        return Rect::from_center_size(area.center(), Vec2::ZERO);
    }
    let fit = (area.width() / texture_size.x).min(area.height() / texture_size.y);
    let size = texture_size * fit * scale;
    let center = area.center() + Vec2::new(0.0, vertical_offset);
    Rect::from_center_size(center, size)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn area() -> Rect {
        Rect::from_min_size(pos2(0.0, 0.0), Vec2::new(800.0, 600.0))
    }

    #[test]
    fn wide_pages_fit_the_width() {
        let rect = page_rect(area(), Vec2::new(1600.0, 400.0), 1.0, 0.0);
        assert_eq!(rect.width(), 800.0);
        assert_eq!(rect.height(), 200.0);
        assert_eq!(rect.center(), area().center());
    }

    #[test]
    fn scale_and_offset_apply_after_fitting() {
        let rect = page_rect(area(), Vec2::new(300.0, 600.0), 2.0, 50.0);
        assert_eq!(rect.size(), Vec2::new(600.0, 1200.0));
        assert_eq!(rect.center(), pos2(400.0, 350.0));
    }

    #[test]
    fn oversized_pages_are_scaled_before_upload() {
        let ctx = egui::Context::default();
        let max_side = ctx.input(|input| input.max_texture_side);
        let wide = ColorImage::new([max_side * 6, 8], Color32::WHITE);

        let texture = upload_texture(&ctx, "wide".to_string(), Arc::new(wide));

        assert_eq!(texture.size(), [max_side, 1]);
    }

    #[test]
    fn empty_textures_do_not_divide_by_zero() {
        let rect = page_rect(area(), Vec2::ZERO, 1.0, 0.0);
        assert_eq!(rect.size(), Vec2::ZERO);
    }
}
