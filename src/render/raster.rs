//! Raster renderer - draws option records into RGBA canvases.
//!
//! Drawing happens on a dedicated worker thread. `apply_options` only queues
//! a job; when several jobs queue up faster than they are drawn, only the
//! newest is drawn. Each finished draw is published to the canvas before the
//! completion callback fires.

use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};

use base64::Engine;
use image::imageops::{self, FilterType};
use image::{DynamicImage, Rgba, RgbaImage};

use crate::error::{QrError, Result};
use crate::types::{LogoOverlay, RenderOptions, MAX_SIZE};

use super::shapes::{dot_covers, frame_covers, module_covers};
use super::surface::GridLayout;
use super::{
    Canvas, DisplayTarget, DrawCallback, FrameId, ModuleGrid, Node, QrEncoder, RenderInstance,
    Surface, SymbolEncoder,
};

struct DrawJob {
    frame: FrameId,
    options: RenderOptions,
}

/// State shared with the draw worker.
#[derive(Default)]
struct Shared {
    canvas: Canvas,
    callback: Mutex<Option<DrawCallback>>,
}

impl Shared {
    fn signal(&self, frame: FrameId) {
        let callback = self
            .callback
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        if let Some(callback) = callback {
            callback(frame);
        }
    }
}

/// The production [`RenderInstance`]: QR symbols drawn into an RGBA canvas.
pub struct RasterRenderer {
    jobs: Option<Sender<DrawJob>>,
    worker: Option<JoinHandle<()>>,
    shared: Arc<Shared>,
    target: Option<Arc<DisplayTarget>>,
    latest: FrameId,
}

impl RasterRenderer {
    /// Create a renderer using the QR encoder.
    pub fn new() -> Result<Self> {
        Self::with_encoder(QrEncoder)
    }

    /// Create a renderer with a specific symbol encoder.
    ///
    /// The placeholder options are queued immediately as [`FrameId::INITIAL`].
    pub fn with_encoder<E: SymbolEncoder + 'static>(encoder: E) -> Result<Self> {
        let (tx, rx) = mpsc::channel();
        let shared = Arc::new(Shared::default());
        let worker_shared = Arc::clone(&shared);

        let worker = thread::Builder::new()
            .name("qrstyle-draw".to_string())
            .spawn(move || draw_loop(rx, &encoder, &worker_shared))
            .map_err(|e| QrError::Build {
                message: format!("Failed to start draw worker: {}", e),
                help: None,
            })?;

        let mut renderer = Self {
            jobs: Some(tx),
            worker: Some(worker),
            shared,
            target: None,
            latest: FrameId::INITIAL,
        };
        renderer.apply_options(FrameId::INITIAL, RenderOptions::placeholder());
        Ok(renderer)
    }

    /// Handle to the canvas this renderer draws into.
    pub fn canvas(&self) -> Canvas {
        self.shared.canvas.clone()
    }
}

impl RenderInstance for RasterRenderer {
    fn mount(&mut self, target: &Arc<DisplayTarget>) -> Result<()> {
        if target.is_torn_down() {
            return Err(QrError::SurfaceUnavailable {
                message: format!("target '{}' has been torn down", target.name()),
            });
        }

        if let Some(previous) = self.target.take() {
            previous.remove_canvas(&self.shared.canvas);
        }
        target.append(Node::Canvas(self.shared.canvas.clone()));
        self.target = Some(Arc::clone(target));
        log::debug!("mounted canvas on '{}'", target.name());

        if self.shared.canvas.frame() == Some(self.latest) {
            self.shared.signal(self.latest);
        }
        Ok(())
    }

    fn apply_options(&mut self, frame: FrameId, options: RenderOptions) {
        self.latest = frame;
        let sent = self
            .jobs
            .as_ref()
            .is_some_and(|jobs| jobs.send(DrawJob { frame, options }).is_ok());
        if !sent {
            log::warn!("draw worker has stopped; frame {} will not be drawn", frame);
        }
    }

    fn on_draw_complete(&mut self, callback: DrawCallback) {
        *self
            .shared
            .callback
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(callback);
    }
}

impl Drop for RasterRenderer {
    fn drop(&mut self) {
        // Closing the queue ends the worker loop
        self.jobs.take();
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

fn draw_loop(jobs: Receiver<DrawJob>, encoder: &dyn SymbolEncoder, shared: &Shared) {
    while let Ok(mut job) = jobs.recv() {
        while let Ok(newer) = jobs.try_recv() {
            job = newer;
        }

        let surface = draw(encoder, job.frame, job.options);
        shared.canvas.publish(surface);
        log::debug!("frame {} drawn", job.frame);
        shared.signal(job.frame);
    }
}

/// Encode, rasterize and package one frame.
fn draw(encoder: &dyn SymbolEncoder, frame: FrameId, mut options: RenderOptions) -> Surface {
    let size = options.width.clamp(1, MAX_SIZE);
    let in_range = size == options.width;
    if !in_range {
        log::warn!(
            "size {} is outside 1..={}; drawing an empty glyph at {}",
            options.width,
            MAX_SIZE,
            size
        );
        options.width = size;
        options.height = size;
    }

    let grid = if options.data.is_empty() || !in_range {
        None
    } else {
        match encoder.encode(&options.data, options.error_correction) {
            Ok(grid) => Some(grid),
            Err(e) => {
                log::warn!("{}; drawing an empty glyph", e);
                None
            }
        }
    };

    let logo = options.logo.as_ref().and_then(|overlay| {
        load_logo(&overlay.image)
            .map_err(|e| log::warn!("logo skipped: {}", e))
            .ok()
    });

    let image = rasterize(&options, grid.as_ref(), logo.as_ref());
    Surface {
        frame,
        image,
        grid,
        options,
    }
}

/// Draw an option record. Without a grid only the background is drawn.
pub fn rasterize(
    options: &RenderOptions,
    grid: Option<&ModuleGrid>,
    logo: Option<&DynamicImage>,
) -> RgbaImage {
    let size = options.width.clamp(1, MAX_SIZE);
    let mut img = RgbaImage::from_pixel(size, size, Rgba(options.background_options.to_rgba()));

    let Some(grid) = grid else {
        return img;
    };

    let n = grid.width();
    let layout = GridLayout::fit(size, n);
    let excavated = excavation(options.logo.as_ref(), size, n, layout);

    let module = Rgba(options.dots_options.color.to_rgba());
    let frame = Rgba(options.corners_square_options.color.to_rgba());
    let dot = Rgba(options.corners_dot_options.color.to_rgba());

    for py in 0..size {
        let y = (py as f32 + 0.5 - layout.offset) / layout.module_px;
        if y < 0.0 || y >= n as f32 {
            continue;
        }
        for px in 0..size {
            let x = (px as f32 + 0.5 - layout.offset) / layout.module_px;
            if x < 0.0 || x >= n as f32 {
                continue;
            }
            let (mx, my) = (x as usize, y as usize);

            if let Some((ox, oy)) = grid.finder_at(mx, my) {
                let u = x - ox as f32;
                let v = y - oy as f32;
                let centre = (2.0..5.0).contains(&u) && (2.0..5.0).contains(&v);
                if centre && dot_covers(options.corners_dot_options.shape, u - 2.0, v - 2.0) {
                    img.put_pixel(px, py, dot);
                } else if frame_covers(options.corners_square_options.shape, u, v) {
                    img.put_pixel(px, py, frame);
                }
                continue;
            }

            if !grid.is_dark(mx as isize, my as isize) || excavated.contains(mx, my) {
                continue;
            }
            let neighbours = grid.neighbours(mx, my);
            let (fx, fy) = (x - mx as f32, y - my as f32);
            if module_covers(options.dots_options.shape, neighbours, fx, fy) {
                img.put_pixel(px, py, module);
            }
        }
    }

    if let (Some(overlay), Some(logo)) = (options.logo.as_ref(), logo) {
        composite_logo(&mut img, overlay, logo);
    }

    img
}

/// Module range hidden under the logo.
#[derive(Debug, Clone, Copy, Default)]
struct Excavation {
    from: usize,
    to: usize,
}

impl Excavation {
    fn contains(&self, x: usize, y: usize) -> bool {
        (self.from..self.to).contains(&x) && (self.from..self.to).contains(&y)
    }
}

/// Every module touching the centred logo box, when excavation is on.
fn excavation(overlay: Option<&LogoOverlay>, size: u32, n: usize, layout: GridLayout) -> Excavation {
    let Some(overlay) = overlay.filter(|o| o.hide_background_dots) else {
        return Excavation::default();
    };
    let edge = overlay.edge_px(size) as f32 + 2.0 * overlay.margin as f32;
    if edge <= 0.0 {
        return Excavation::default();
    }
    let start = (size as f32 - edge) / 2.0;
    let to_module = |p: f32| (p - layout.offset) / layout.module_px;
    let from = to_module(start).floor().max(0.0) as usize;
    let to = (to_module(start + edge).ceil().max(0.0) as usize).min(n);
    Excavation { from, to }
}

fn composite_logo(img: &mut RgbaImage, overlay: &LogoOverlay, logo: &DynamicImage) {
    let size = img.width();
    let edge = overlay.edge_px(size);
    if edge == 0 {
        return;
    }
    // Fits inside edge x edge, aspect preserved
    let fitted = logo.resize(edge, edge, FilterType::Triangle).to_rgba8();
    let x = (size - fitted.width()) / 2;
    let y = (size - fitted.height()) / 2;
    imageops::overlay(img, &fitted, x as i64, y as i64);
}

/// Load a logo from a file path or a base64 `data:` URI.
pub fn load_logo(source: &str) -> Result<DynamicImage> {
    if let Some(rest) = source.strip_prefix("data:") {
        let (meta, payload) = rest.split_once(',').ok_or_else(|| QrError::Parse {
            message: "malformed data URI for logo".to_string(),
            help: Some("Expected data:<mime>;base64,<payload>".to_string()),
        })?;
        if !meta.ends_with(";base64") {
            return Err(QrError::Parse {
                message: "logo data URI is not base64-encoded".to_string(),
                help: None,
            });
        }
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(payload.trim())
            .map_err(|e| QrError::Parse {
                message: format!("invalid base64 in logo data URI: {}", e),
                help: None,
            })?;
        return image::load_from_memory(&bytes).map_err(|e| QrError::Parse {
            message: format!("unreadable logo image: {}", e),
            help: None,
        });
    }

    image::open(source).map_err(|e| QrError::Io {
        path: source.into(),
        message: format!("Failed to load logo: {}", e),
    })
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;
    use std::time::Duration;

    use super::*;
    use crate::types::{Colour, LogoSpec, PatternId, StyleDescriptor};

    fn options_for(descriptor: &StyleDescriptor) -> RenderOptions {
        RenderOptions::from_descriptor(descriptor)
    }

    fn png_data_uri(img: &RgbaImage) -> String {
        let mut bytes = Vec::new();
        img.write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
            .unwrap();
        format!(
            "data:image/png;base64,{}",
            base64::engine::general_purpose::STANDARD.encode(bytes)
        )
    }

    #[test]
    fn test_empty_grid_draws_background_only() {
        let descriptor = StyleDescriptor::new("", 32).with_colours(Colour::BLACK, Colour::rgb(0, 0, 255));
        let img = rasterize(&options_for(&descriptor), None, None);
        assert_eq!(img.dimensions(), (32, 32));
        assert!(img.pixels().all(|p| p.0 == [0, 0, 255, 255]));
    }

    #[test]
    fn test_square_modules_fill_whole_cells() {
        let grid = ModuleGrid::from_rows(&["#.", ".#"]).unwrap();
        let descriptor = StyleDescriptor::new("x", 4);
        let img = rasterize(&options_for(&descriptor), Some(&grid), None);

        assert_eq!(img.get_pixel(0, 0).0, [0, 0, 0, 255]);
        assert_eq!(img.get_pixel(1, 1).0, [0, 0, 0, 255]);
        assert_eq!(img.get_pixel(2, 0).0, [255, 255, 255, 255]);
        assert_eq!(img.get_pixel(3, 3).0, [0, 0, 0, 255]);
    }

    #[test]
    fn test_dots_leave_cell_corners_clear() {
        let grid = ModuleGrid::from_rows(&["#"]).unwrap();
        let descriptor = StyleDescriptor::new("x", 20).with_pattern(PatternId::Dots);
        let img = rasterize(&options_for(&descriptor), Some(&grid), None);

        assert_eq!(img.get_pixel(10, 10).0, [0, 0, 0, 255]);
        assert_eq!(img.get_pixel(0, 0).0, [255, 255, 255, 255]);
    }

    #[test]
    fn test_finder_centre_drawn_with_dot_colour() {
        let grid = QrEncoder.encode("hello", crate::types::EcLevel::L).unwrap();
        let mut options = options_for(&StyleDescriptor::new("hello", 210));
        options.corners_dot_options.color = Colour::rgb(255, 0, 0);
        let img = rasterize(&options, Some(&grid), None);

        // 21 modules at 10px: finder centre is module (3, 3)
        assert_eq!(img.get_pixel(35, 35).0, [255, 0, 0, 255]);
        // Outer ring stays the frame colour
        assert_eq!(img.get_pixel(5, 35).0, [0, 0, 0, 255]);
    }

    #[test]
    fn test_excavation_clears_modules_under_logo() {
        let grid = ModuleGrid::new(10, vec![true; 100]).unwrap();
        let logo = RgbaImage::from_pixel(4, 4, Rgba([0, 0, 0, 0]));
        let uri = png_data_uri(&logo);
        let descriptor = StyleDescriptor::new("x", 100).with_logo(LogoSpec::new(uri.clone(), 40, 40));
        let options = options_for(&descriptor);
        let decoded = load_logo(&uri).unwrap();

        let img = rasterize(&options, Some(&grid), Some(&decoded));

        // Centre modules cleared to background, transparent logo on top
        assert_eq!(img.get_pixel(50, 50).0, [255, 255, 255, 255]);
        assert_eq!(img.get_pixel(5, 5).0, [0, 0, 0, 255]);

        let kept = StyleDescriptor::new("x", 100)
            .with_logo(LogoSpec::new(uri, 40, 40).with_excavate(false));
        let img = rasterize(&options_for(&kept), Some(&grid), Some(&decoded));
        assert_eq!(img.get_pixel(50, 50).0, [0, 0, 0, 255]);
    }

    #[test]
    fn test_logo_composited_at_centre() {
        let grid = ModuleGrid::new(10, vec![false; 100]).unwrap();
        let logo = DynamicImage::ImageRgba8(RgbaImage::from_pixel(8, 8, Rgba([0, 255, 0, 255])));
        let descriptor =
            StyleDescriptor::new("x", 100).with_logo(LogoSpec::new("unused.png", 20, 20));

        let img = rasterize(&options_for(&descriptor), Some(&grid), Some(&logo));

        assert_eq!(img.get_pixel(50, 50).0, [0, 255, 0, 255]);
        assert_eq!(img.get_pixel(35, 50).0, [255, 255, 255, 255]);
    }

    #[test]
    fn test_load_logo_errors() {
        assert!(load_logo("/definitely/not/here.png").is_err());
        assert!(load_logo("data:image/png,plain").is_err());
        assert!(load_logo("data:image/png;base64,!!!").is_err());
        assert!(load_logo("data:nocomma").is_err());
    }

    #[test]
    fn test_renderer_draws_and_signals() {
        let (tx, rx) = mpsc::channel();
        let mut renderer = RasterRenderer::new().unwrap();
        renderer.on_draw_complete(Arc::new(move |frame: FrameId| {
            let _ = tx.send(frame);
        }));

        let options = options_for(&StyleDescriptor::new("https://example.com", 100));
        renderer.apply_options(FrameId(1), options);

        let mut seen = FrameId::INITIAL;
        while seen != FrameId(1) {
            seen = rx.recv_timeout(Duration::from_secs(10)).unwrap();
        }
        let surface = renderer.canvas().snapshot().unwrap();
        assert_eq!(surface.frame, FrameId(1));
        assert_eq!(surface.image.dimensions(), (100, 100));
        assert_eq!(surface.grid.unwrap().width(), 25);
    }

    #[test]
    fn test_out_of_range_size_draws_empty_glyph() {
        let (tx, rx) = mpsc::channel();
        let mut renderer = RasterRenderer::new().unwrap();
        renderer.on_draw_complete(Arc::new(move |frame: FrameId| {
            let _ = tx.send(frame);
        }));

        renderer.apply_options(
            FrameId(1),
            options_for(&StyleDescriptor::new("https://example.com", u32::MAX)),
        );
        let mut seen = FrameId::INITIAL;
        while seen != FrameId(1) {
            seen = rx.recv_timeout(Duration::from_secs(10)).unwrap();
        }
        let surface = renderer.canvas().snapshot().unwrap();
        assert_eq!(surface.width(), MAX_SIZE);
        assert!(surface.grid.is_none());

        // The worker survives and keeps drawing
        renderer.apply_options(
            FrameId(2),
            options_for(&StyleDescriptor::new("https://example.com", 64)),
        );
        while seen != FrameId(2) {
            seen = rx.recv_timeout(Duration::from_secs(10)).unwrap();
        }
        assert_eq!(renderer.canvas().snapshot().unwrap().width(), 64);
    }

    #[test]
    fn test_mount_moves_canvas_between_targets() {
        let mut renderer = RasterRenderer::new().unwrap();
        let first = DisplayTarget::new("first");
        let second = DisplayTarget::new("second");

        renderer.mount(&first).unwrap();
        assert!(first.find_canvas().is_some());

        renderer.mount(&second).unwrap();
        assert!(first.find_canvas().is_none());
        assert!(second.find_canvas().unwrap().same_as(&renderer.canvas()));
    }

    #[test]
    fn test_mount_on_torn_down_target_fails() {
        let mut renderer = RasterRenderer::new().unwrap();
        let target = DisplayTarget::new("gone");
        target.tear_down();
        assert!(matches!(
            renderer.mount(&target),
            Err(QrError::SurfaceUnavailable { .. })
        ));
    }
}
