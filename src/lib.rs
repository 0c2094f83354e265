//! qrstyle - Styled QR codes from declarative descriptors
//!
//! A library for keeping a stateful QR renderer in sync with a declarative
//! style descriptor and exporting what it drew as PNG or SVG.

pub mod cli;
pub mod config;
pub mod error;
pub mod export;
pub mod output;
pub mod render;
pub mod sync;
pub mod types;
pub mod validation;

pub use config::{Config, CONFIG_FILENAME};
pub use error::{QrError, Result};
pub use export::{
    artifact_filename, ExportArtifact, ExportFormat, Exporter, Fidelity, SurfaceSource, SvgMode,
};
pub use render::{
    DisplayTarget, DrawCallback, FrameId, ModuleGrid, QrEncoder, RasterRenderer, RecorderHandle,
    RecordingRenderer, RenderInstance, Surface, SymbolEncoder,
};
pub use sync::{DescriptorSynchronizer, Readiness, ReadinessGate};
pub use types::{
    Colour, DescriptorFile, EcLevel, LogoOverlay, LogoSpec, PatternId, PatternMapper,
    RenderOptions, ShapeTriple, StyleDescriptor,
};
pub use validation::{validate_descriptor, Diagnostic, Severity, ValidationResult};
