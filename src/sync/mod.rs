//! Descriptor synchronization.
//!
//! [`DescriptorSynchronizer`] owns the one long-lived [`RenderInstance`] of a
//! display session. Every descriptor change is mapped to a complete option
//! record and handed to the renderer in a single call, so the renderer never
//! holds a mix of old and new fields. A single lock serializes applies,
//! mounts and surface reads.

mod readiness;

pub use readiness::{Readiness, ReadinessGate};

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use crate::error::{QrError, Result};
use crate::render::{DisplayTarget, FrameId, RenderInstance, Surface};
use crate::types::{RenderOptions, StyleDescriptor};

struct Inner<R> {
    renderer: R,
    target: Option<Arc<DisplayTarget>>,
    frame: FrameId,
    options: RenderOptions,
}

/// Keeps a renderer's visible output consistent with the latest descriptor.
pub struct DescriptorSynchronizer<R: RenderInstance> {
    inner: Mutex<Inner<R>>,
    gate: Arc<ReadinessGate>,
}

impl<R: RenderInstance> DescriptorSynchronizer<R> {
    /// Take ownership of a freshly created renderer and subscribe to its draws.
    pub fn new(mut renderer: R) -> Self {
        let gate = Arc::new(ReadinessGate::new());
        let signal = Arc::clone(&gate);
        renderer.on_draw_complete(Arc::new(move |frame: FrameId| {
            signal.complete(frame);
        }));

        Self {
            inner: Mutex::new(Inner {
                renderer,
                target: None,
                frame: FrameId::INITIAL,
                options: RenderOptions::placeholder(),
            }),
            gate,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner<R>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Attach the renderer under `target`, clearing whatever the target held.
    pub fn mount(&self, target: &Arc<DisplayTarget>) -> Result<()> {
        let mut inner = self.lock();
        target.clear();
        // Mounted before the renderer attaches, so a completion it signals
        // during mount is not dropped
        self.gate.set_mounted(true);
        if let Err(e) = inner.renderer.mount(target) {
            self.gate.set_mounted(false);
            inner.target = None;
            return Err(e);
        }
        inner.target = Some(Arc::clone(target));
        Ok(())
    }

    /// Remove the renderer's target from display.
    pub fn tear_down(&self) {
        let mut inner = self.lock();
        if let Some(target) = inner.target.take() {
            target.tear_down();
        }
        self.gate.set_mounted(false);
    }

    /// Apply a descriptor: map it to a full option record and hand it to the
    /// renderer in one call. Never fails; empty content draws an empty glyph.
    pub fn apply(&self, descriptor: &StyleDescriptor) {
        let options = RenderOptions::from_descriptor(descriptor);
        let mut inner = self.lock();

        let frame = inner.frame.next();
        inner.frame = frame;
        self.gate.arm(frame);
        log::debug!("applying frame {} ({} px, {})", frame, descriptor.size, descriptor.pattern);

        inner.renderer.apply_options(frame, options.clone());
        inner.options = options;
    }

    pub fn readiness(&self) -> Readiness {
        self.gate.readiness()
    }

    pub fn gate(&self) -> &Arc<ReadinessGate> {
        &self.gate
    }

    /// Block until the latest frame is drawn, up to `timeout`.
    pub fn wait_ready(&self, timeout: Duration) -> bool {
        self.gate.wait_ready(timeout)
    }

    /// The option record most recently applied.
    pub fn current_options(&self) -> RenderOptions {
        self.lock().options.clone()
    }

    pub fn current_frame(&self) -> FrameId {
        self.lock().frame
    }

    /// Read the drawn surface for export.
    ///
    /// Fails with [`QrError::SurfaceUnavailable`] if nothing was ever mounted,
    /// with [`QrError::NotReady`] while the latest frame is undrawn, and with
    /// [`QrError::SurfaceUnavailable`] if the target no longer holds a canvas.
    pub fn read_surface(&self) -> Result<Surface> {
        let inner = self.lock();

        let target = inner
            .target
            .as_ref()
            .ok_or_else(|| QrError::SurfaceUnavailable {
                message: "the renderer was never mounted".to_string(),
            })?;

        let frame = self.gate.ready_frame().ok_or(QrError::NotReady)?;

        let canvas = target
            .find_canvas()
            .ok_or_else(|| QrError::SurfaceUnavailable {
                message: format!("no canvas found on target '{}'", target.name()),
            })?;

        let surface = canvas
            .snapshot()
            .ok_or_else(|| QrError::SurfaceUnavailable {
                message: format!("canvas on '{}' has never been drawn", target.name()),
            })?;

        if surface.frame != frame {
            return Err(QrError::NotReady);
        }
        Ok(surface)
    }
}
