//! The concrete option record a render instance understands.
//!
//! [`RenderOptions::from_descriptor`] is the single mapping from a declared
//! [`StyleDescriptor`] to the renderer's full configuration. The record is
//! always built whole and applied whole.

use serde::{Deserialize, Serialize};

use super::{
    Colour, DotShape, EcLevel, FrameShape, LogoSpec, ModuleShape, PatternMapper, StyleDescriptor,
};

/// Hard cap on the logo footprint, as a fraction of the code's edge.
pub const MAX_LOGO_FRACTION: f32 = 0.4;

/// A colour paired with a shape.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Styled<S> {
    pub color: Colour,
    #[serde(rename = "type")]
    pub shape: S,
}

/// Logo overlay settings derived from a [`LogoSpec`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogoOverlay {
    /// File path or `data:` URI.
    pub image: String,

    /// Overlay edge as a fraction of the code's edge, never above 0.4.
    pub image_size: f32,

    /// Clear modules under the overlay before compositing.
    pub hide_background_dots: bool,

    /// Gap between the overlay and surrounding modules, in pixels.
    pub margin: u32,
}

impl LogoOverlay {
    /// Compute the overlay for a logo on a code of `size` pixels.
    pub fn compute(logo: &LogoSpec, size: u32) -> Self {
        Self {
            image: logo.source.clone(),
            image_size: logo_fraction(logo, size),
            hide_background_dots: logo.excavate.unwrap_or(true),
            margin: 0,
        }
    }

    /// Overlay edge in pixels for a canvas of `size` pixels.
    pub fn edge_px(&self, size: u32) -> u32 {
        (self.image_size * size as f32).floor() as u32
    }
}

/// Logo footprint fraction: `min(width/size, height/size, 0.4)`.
pub fn logo_fraction(logo: &LogoSpec, size: u32) -> f32 {
    let size = size.max(1) as f32;
    (logo.width as f32 / size)
        .min(logo.height as f32 / size)
        .min(MAX_LOGO_FRACTION)
}

/// Complete visual configuration of a render instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderOptions {
    pub width: u32,
    pub height: u32,
    pub data: String,
    pub error_correction: EcLevel,
    pub dots_options: Styled<ModuleShape>,
    pub background_options: Colour,
    pub corners_square_options: Styled<FrameShape>,
    pub corners_dot_options: Styled<DotShape>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logo: Option<LogoOverlay>,
}

impl RenderOptions {
    /// Options a renderer starts with before any descriptor is applied.
    pub fn placeholder() -> Self {
        Self::from_descriptor(&StyleDescriptor::new("https://default.com", 256))
    }

    /// Build the full option record for a descriptor.
    pub fn from_descriptor(descriptor: &StyleDescriptor) -> Self {
        let shapes = PatternMapper::resolve(&descriptor.pattern);
        let fg = descriptor.foreground;

        Self {
            width: descriptor.size,
            height: descriptor.size,
            data: descriptor.content.clone(),
            error_correction: descriptor.level,
            dots_options: Styled {
                color: fg,
                shape: shapes.module,
            },
            background_options: descriptor.background,
            corners_square_options: Styled {
                color: fg,
                shape: shapes.frame,
            },
            corners_dot_options: Styled {
                color: fg,
                shape: shapes.dot,
            },
            logo: descriptor
                .logo
                .as_ref()
                .map(|logo| LogoOverlay::compute(logo, descriptor.size)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PatternId;

    #[test]
    fn test_logo_fraction_is_capped() {
        let logo = LogoSpec::new("logo.png", 120, 120);
        assert_eq!(logo_fraction(&logo, 200), 0.4);
    }

    #[test]
    fn test_logo_fraction_uses_smaller_side() {
        let logo = LogoSpec::new("logo.png", 40, 20);
        assert_eq!(logo_fraction(&logo, 200), 0.1);
    }

    #[test]
    fn test_logo_fraction_never_exceeds_cap() {
        for size in [1, 7, 64, 200, 256, 4096] {
            for edge in [0, 1, 40, 100, 500, 10_000, u32::MAX] {
                let logo = LogoSpec::new("x", edge, edge.saturating_add(3));
                assert!(logo_fraction(&logo, size) <= MAX_LOGO_FRACTION);
            }
        }
    }

    #[test]
    fn test_excavate_defaults_to_true() {
        let overlay = LogoOverlay::compute(&LogoSpec::new("a.png", 40, 40), 256);
        assert!(overlay.hide_background_dots);

        let overlay = LogoOverlay::compute(&LogoSpec::new("a.png", 40, 40).with_excavate(false), 256);
        assert!(!overlay.hide_background_dots);
    }

    #[test]
    fn test_from_descriptor_builds_complete_record() {
        let descriptor = StyleDescriptor::new("https://example.com", 300)
            .with_colours(Colour::rgb(1, 2, 3), Colour::rgb(250, 250, 250))
            .with_pattern(PatternId::Rounded);

        let options = RenderOptions::from_descriptor(&descriptor);

        assert_eq!((options.width, options.height), (300, 300));
        assert_eq!(options.data, "https://example.com");
        assert_eq!(options.dots_options.shape, ModuleShape::Rounded);
        assert_eq!(options.dots_options.color, Colour::rgb(1, 2, 3));
        assert_eq!(options.corners_square_options.shape, FrameShape::ExtraRounded);
        assert_eq!(options.corners_square_options.color, Colour::rgb(1, 2, 3));
        assert_eq!(options.corners_dot_options.shape, DotShape::Dot);
        assert_eq!(options.background_options, Colour::rgb(250, 250, 250));
        assert!(options.logo.is_none());
    }

    #[test]
    fn test_overlay_edge_px() {
        let overlay = LogoOverlay::compute(&LogoSpec::new("a.png", 120, 120), 200);
        assert_eq!(overlay.edge_px(200), 80);
    }

    #[test]
    fn test_serializes_camel_case() {
        let json = serde_json::to_value(RenderOptions::placeholder()).unwrap();
        assert_eq!(json["dotsOptions"]["type"], "square");
        assert_eq!(json["backgroundOptions"], "#FFFFFF");
        assert!(json.get("logo").is_none());
    }
}
