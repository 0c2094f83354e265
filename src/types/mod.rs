//! Core value types: colours, patterns, descriptors and option records.

mod colour;
mod descriptor;
mod options;
mod pattern;

pub use colour::Colour;
pub use descriptor::{
    DescriptorDefaults, DescriptorFile, EcLevel, LogoSpec, StyleDescriptor, DEFAULT_LOGO_EDGE,
    DEFAULT_SIZE, MAX_SIZE,
};
pub use options::{logo_fraction, LogoOverlay, RenderOptions, Styled, MAX_LOGO_FRACTION};
pub use pattern::{DotShape, FrameShape, ModuleShape, PatternId, PatternMapper, ShapeTriple};
