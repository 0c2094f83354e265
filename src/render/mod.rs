//! Rendering module for qrstyle.
//!
//! A [`RenderInstance`] is the stateful renderer behind the synchronizer. It
//! is mounted into a [`DisplayTarget`], takes whole option records, and
//! draws asynchronously; completion is reported through a registered
//! [`DrawCallback`] rather than returned from `apply_options`.

mod encoder;
mod raster;
mod recording;
mod shapes;
mod surface;
mod target;

use std::fmt;
use std::sync::Arc;

use crate::error::Result;
use crate::types::RenderOptions;

pub use encoder::{QrEncoder, SymbolEncoder};
pub use raster::{load_logo, rasterize, RasterRenderer};
pub use recording::{RecorderHandle, RecordingRenderer};
pub use shapes::{module_corners, Neighbours};
pub use surface::{GridLayout, ModuleGrid, Surface, FINDER_EDGE};
pub use target::{Canvas, DisplayTarget, Node};

/// Identifies one `apply_options` call, so a draw completion can be matched
/// to the options it drew.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct FrameId(pub u64);

impl FrameId {
    /// The frame a renderer draws its placeholder options as.
    pub const INITIAL: FrameId = FrameId(0);

    pub fn next(self) -> FrameId {
        FrameId(self.0 + 1)
    }
}

impl fmt::Display for FrameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Called by a renderer once a frame has been fully drawn.
pub type DrawCallback = Arc<dyn Fn(FrameId) + Send + Sync>;

/// The stateful renderer contract.
///
/// Implementations start with placeholder options drawn as
/// [`FrameId::INITIAL`]. There is exactly one instance per display session;
/// it is mutated in place, never recreated.
pub trait RenderInstance: Send {
    /// Attach the drawable surface under `target`.
    ///
    /// If the instance was attached elsewhere, it detaches from the old
    /// target first. When the latest frame is already drawn, completion is
    /// signalled again so observers waiting on the new target see it.
    fn mount(&mut self, target: &Arc<DisplayTarget>) -> Result<()>;

    /// Replace the full visual configuration and start an asynchronous redraw.
    fn apply_options(&mut self, frame: FrameId, options: RenderOptions);

    /// Register the draw-completion callback, replacing any previous one.
    fn on_draw_complete(&mut self, callback: DrawCallback);
}
