//! Lint checks for style descriptors.
//!
//! Each check takes a `&StyleDescriptor` and returns a `ValidationResult`.

use std::path::Path;

use crate::types::{logo_fraction, StyleDescriptor, MAX_LOGO_FRACTION, MAX_SIZE};

use super::diagnostic::{Diagnostic, ValidationResult};

/// Scanners struggle below this WCAG contrast ratio.
pub const MIN_CONTRAST: f32 = 3.0;

/// Size must fit the canvas limits.
pub fn check_size(descriptor: &StyleDescriptor) -> ValidationResult {
    let mut result = ValidationResult::new();

    if descriptor.size == 0 || descriptor.size > MAX_SIZE {
        result.push(
            Diagnostic::error(
                "qrstyle::validate::size",
                format!("Size {} is outside 1..={}", descriptor.size, MAX_SIZE),
            )
            .with_help("Pick a canvas edge between 1 and 4096 pixels"),
        );
    }

    result
}

pub fn check_content(descriptor: &StyleDescriptor) -> ValidationResult {
    let mut result = ValidationResult::new();

    if descriptor.content.is_empty() {
        result.push(
            Diagnostic::warning(
                "qrstyle::validate::empty-content",
                "Content is empty; an empty glyph will be drawn",
            )
            .with_help("Set `content` to the text or URL to encode"),
        );
    }

    result
}

pub fn check_pattern(descriptor: &StyleDescriptor) -> ValidationResult {
    let mut result = ValidationResult::new();

    if !descriptor.pattern.is_known() {
        result.push(
            Diagnostic::warning(
                "qrstyle::validate::unknown-pattern",
                format!(
                    "Unknown pattern '{}' falls back to squares",
                    descriptor.pattern
                ),
            )
            .with_help("Use one of: squares, dots, rounded, classy"),
        );
    }

    result
}

/// Foreground and background must be far enough apart, and the right way round.
pub fn check_colours(descriptor: &StyleDescriptor) -> ValidationResult {
    let mut result = ValidationResult::new();
    let (fg, bg) = (descriptor.foreground, descriptor.background);

    let ratio = fg.contrast_ratio(bg);
    if ratio < MIN_CONTRAST {
        result.push(
            Diagnostic::warning(
                "qrstyle::validate::contrast",
                format!(
                    "Contrast between {} and {} is {:.2}:1",
                    fg, bg, ratio
                ),
            )
            .with_help(format!(
                "Aim for at least {}:1 so scanners can tell modules apart",
                MIN_CONTRAST
            )),
        );
    }

    if fg.relative_luminance() > bg.relative_luminance() {
        result.push(
            Diagnostic::warning(
                "qrstyle::validate::inverted",
                format!("Foreground {} is lighter than background {}", fg, bg),
            )
            .with_help("Some scanners cannot read light-on-dark codes"),
        );
    }

    result
}

pub fn check_logo(descriptor: &StyleDescriptor) -> ValidationResult {
    let mut result = ValidationResult::new();
    let Some(logo) = descriptor.logo.as_ref() else {
        return result;
    };

    let size = descriptor.size.max(1) as f32;
    let requested = (logo.width as f32 / size).min(logo.height as f32 / size);
    if requested > MAX_LOGO_FRACTION {
        result.push(
            Diagnostic::warning(
                "qrstyle::validate::logo-capped",
                format!(
                    "Logo {}x{} covers {:.0}% of the code; it will be capped at {:.0}%",
                    logo.width,
                    logo.height,
                    requested * 100.0,
                    logo_fraction(logo, descriptor.size) * 100.0
                ),
            )
            .with_help("Shrink the logo or enlarge the code"),
        );
    }

    if logo.excavate == Some(false) {
        result.push(
            Diagnostic::warning(
                "qrstyle::validate::logo-not-excavated",
                "Logo is drawn over modules without clearing them",
            )
            .with_help("Remove `excavate: false` unless the logo is very small"),
        );
    }

    if !logo.source.starts_with("data:") && !Path::new(&logo.source).exists() {
        result.push(
            Diagnostic::error(
                "qrstyle::validate::logo-source",
                format!("Logo file not found: {}", logo.source),
            )
            .with_help("Paths are relative to the descriptor file"),
        );
    }

    result
}
