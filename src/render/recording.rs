//! Recording renderer - a test double for [`RenderInstance`].
//!
//! Records every mount and option record it receives and never draws on its
//! own. Draws complete only when the test calls
//! [`RecorderHandle::complete_draw`] (or [`RecorderHandle::complete_frame`]
//! for out-of-order completions).

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use image::{Rgba, RgbaImage};

use crate::error::{QrError, Result};
use crate::types::{RenderOptions, MAX_SIZE};

use super::{Canvas, DisplayTarget, DrawCallback, FrameId, Node, RenderInstance, Surface};

struct Recording {
    applied: Vec<(FrameId, RenderOptions)>,
    mounts: Vec<String>,
    current: (FrameId, RenderOptions),
    callback: Option<DrawCallback>,
    canvas: Canvas,
    target: Option<Arc<DisplayTarget>>,
}

/// Renderer double that records instead of drawing.
pub struct RecordingRenderer {
    state: Arc<Mutex<Recording>>,
}

/// Inspection and control handle for a [`RecordingRenderer`].
#[derive(Clone)]
pub struct RecorderHandle {
    state: Arc<Mutex<Recording>>,
}

fn lock(state: &Mutex<Recording>) -> MutexGuard<'_, Recording> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

impl RecordingRenderer {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(Recording {
                applied: Vec::new(),
                mounts: Vec::new(),
                current: (FrameId::INITIAL, RenderOptions::placeholder()),
                callback: None,
                canvas: Canvas::new(),
                target: None,
            })),
        }
    }

    /// A handle that stays usable after the renderer is moved into a synchronizer.
    pub fn handle(&self) -> RecorderHandle {
        RecorderHandle {
            state: Arc::clone(&self.state),
        }
    }
}

impl Default for RecordingRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderInstance for RecordingRenderer {
    fn mount(&mut self, target: &Arc<DisplayTarget>) -> Result<()> {
        if target.is_torn_down() {
            return Err(QrError::SurfaceUnavailable {
                message: format!("target '{}' has been torn down", target.name()),
            });
        }
        let mut state = lock(&self.state);
        if let Some(previous) = state.target.take() {
            previous.remove_canvas(&state.canvas);
        }
        target.append(Node::Canvas(state.canvas.clone()));
        state.target = Some(Arc::clone(target));
        state.mounts.push(target.name().to_string());
        Ok(())
    }

    fn apply_options(&mut self, frame: FrameId, options: RenderOptions) {
        let mut state = lock(&self.state);
        state.applied.push((frame, options.clone()));
        state.current = (frame, options);
    }

    fn on_draw_complete(&mut self, callback: DrawCallback) {
        lock(&self.state).callback = Some(callback);
    }
}

impl RecorderHandle {
    /// Every option record applied so far, in order.
    pub fn applied(&self) -> Vec<(FrameId, RenderOptions)> {
        lock(&self.state).applied.clone()
    }

    pub fn apply_count(&self) -> usize {
        lock(&self.state).applied.len()
    }

    /// Options the renderer would draw next.
    pub fn current_options(&self) -> RenderOptions {
        lock(&self.state).current.1.clone()
    }

    /// Names of targets mounted on, in order.
    pub fn mounts(&self) -> Vec<String> {
        lock(&self.state).mounts.clone()
    }

    /// Finish drawing the latest frame. Returns the frame completed.
    pub fn complete_draw(&self) -> FrameId {
        let (frame, options) = lock(&self.state).current.clone();
        self.finish(frame, options);
        frame
    }

    /// Report completion of a specific frame with the options it was applied with.
    ///
    /// Used to simulate a stale draw finishing after newer options arrived.
    pub fn complete_frame(&self, frame: FrameId) {
        let options = {
            let state = lock(&self.state);
            state
                .applied
                .iter()
                .rev()
                .find(|(f, _)| *f == frame)
                .map(|(_, o)| o.clone())
                .unwrap_or_else(|| state.current.1.clone())
        };
        self.finish(frame, options);
    }

    fn finish(&self, frame: FrameId, options: RenderOptions) {
        let size = options.width.clamp(1, MAX_SIZE);
        let image = RgbaImage::from_pixel(size, size, Rgba(options.background_options.to_rgba()));
        let surface = Surface {
            frame,
            image,
            grid: None,
            options,
        };

        let callback = {
            let state = lock(&self.state);
            state.canvas.publish(surface);
            state.callback.clone()
        };
        // Outside the lock: the callback may call back into the handle
        if let Some(callback) = callback {
            callback(frame);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::StyleDescriptor;

    #[test]
    fn test_records_applied_options() {
        let mut renderer = RecordingRenderer::new();
        let handle = renderer.handle();
        let options = RenderOptions::from_descriptor(&StyleDescriptor::new("abc", 64));

        renderer.apply_options(FrameId(1), options.clone());

        assert_eq!(handle.apply_count(), 1);
        assert_eq!(handle.current_options(), options);
    }

    #[test]
    fn test_complete_draw_fires_callback_with_latest_frame() {
        let mut renderer = RecordingRenderer::new();
        let handle = renderer.handle();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        renderer.on_draw_complete(Arc::new(move |frame: FrameId| sink.lock().unwrap().push(frame)));

        renderer.apply_options(FrameId(1), RenderOptions::placeholder());
        renderer.apply_options(FrameId(2), RenderOptions::placeholder());

        assert_eq!(handle.complete_draw(), FrameId(2));
        assert_eq!(*seen.lock().unwrap(), vec![FrameId(2)]);
    }

    #[test]
    fn test_mount_publishes_canvas_node() {
        let mut renderer = RecordingRenderer::new();
        let handle = renderer.handle();
        let target = DisplayTarget::new("preview");

        renderer.mount(&target).unwrap();
        handle.complete_draw();

        let surface = target.find_canvas().unwrap().snapshot().unwrap();
        assert_eq!(surface.width(), 256);
        assert_eq!(handle.mounts(), vec!["preview".to_string()]);
    }
}
