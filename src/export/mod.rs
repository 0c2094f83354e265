//! Export pipeline: drawn surface to downloadable artifact.
//!
//! PNG output is a lossless copy of the drawn pixels. SVG output is, by
//! default, the same pixels embedded as a base64 PNG inside a minimal SVG
//! wrapper. That keeps the look but does not scale like real vector art.
//! [`SvgMode::Vector`] traces the module grid into SVG shapes instead, when
//! the surface exposes a grid and carries no logo. Every artifact reports
//! the [`Fidelity`] it was actually produced with.

mod png;
mod svg;

pub use png::encode_png;
pub use svg::{embedded_svg, vector_svg};

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{QrError, Result};
use crate::render::{RenderInstance, Surface};
use crate::sync::DescriptorSynchronizer;

/// Base name of every exported file.
pub const BASE_FILENAME: &str = "qrcode";

/// Output file format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Png,
    Svg,
}

impl ExportFormat {
    pub const ALL: [ExportFormat; 2] = [ExportFormat::Png, ExportFormat::Svg];

    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Png => "png",
            ExportFormat::Svg => "svg",
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            ExportFormat::Png => "image/png",
            ExportFormat::Svg => "image/svg+xml",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.extension())
    }
}

impl FromStr for ExportFormat {
    type Err = QrError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "png" => Ok(ExportFormat::Png),
            "svg" => Ok(ExportFormat::Svg),
            other => Err(QrError::Parse {
                message: format!("unknown export format '{}'", other),
                help: Some("Use png or svg".to_string()),
            }),
        }
    }
}

/// How faithfully an artifact represents the drawn code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Fidelity {
    /// Pixel-exact copy of the drawn surface.
    Exact,
    /// Raster snapshot inside an SVG wrapper. Does not scale.
    RasterEmbedded,
    /// SVG shapes traced from the module grid.
    Vector,
}

impl Fidelity {
    /// Whether the artifact stays sharp when scaled up.
    pub fn is_scalable(self) -> bool {
        self == Fidelity::Vector
    }
}

impl fmt::Display for Fidelity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Fidelity::Exact => write!(f, "exact"),
            Fidelity::RasterEmbedded => write!(f, "raster embedded in svg"),
            Fidelity::Vector => write!(f, "vector"),
        }
    }
}

/// Which SVG encoding to attempt.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SvgMode {
    #[default]
    Embedded,
    Vector,
}

impl FromStr for SvgMode {
    type Err = QrError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "embedded" => Ok(SvgMode::Embedded),
            "vector" => Ok(SvgMode::Vector),
            other => Err(QrError::Parse {
                message: format!("unknown svg mode '{}'", other),
                help: Some("Use embedded or vector".to_string()),
            }),
        }
    }
}

/// One exported file, built per request and never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportArtifact {
    pub format: ExportFormat,
    pub bytes: Vec<u8>,
    pub filename: String,
    pub fidelity: Fidelity,
}

impl ExportArtifact {
    pub fn mime_type(&self) -> &'static str {
        self.format.mime_type()
    }

    /// Write the artifact into `dir` under its suggested filename.
    pub fn write_to(&self, dir: &Path) -> Result<PathBuf> {
        let path = dir.join(&self.filename);
        std::fs::write(&path, &self.bytes).map_err(|e| QrError::Io {
            path: path.clone(),
            message: format!("Failed to write {}: {}", self.format, e),
        })?;
        Ok(path)
    }
}

/// Suggested filename: `qrcode.<ext>`, or `qrcode-<id>.<ext>` when an
/// identifier is supplied. Characters outside `[A-Za-z0-9_-]` in the
/// identifier become `-`.
pub fn artifact_filename(format: ExportFormat, id: Option<&str>) -> String {
    let id = id.map(str::trim).filter(|id| !id.is_empty());
    match id {
        Some(id) => {
            let clean: String = id
                .chars()
                .map(|c| {
                    if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                        c
                    } else {
                        '-'
                    }
                })
                .collect();
            format!("{}-{}.{}", BASE_FILENAME, clean, format.extension())
        }
        None => format!("{}.{}", BASE_FILENAME, format.extension()),
    }
}

/// Anything that can hand over its current drawn surface for export.
///
/// Implementations must fail with [`QrError::NotReady`] rather than return a
/// stale surface.
pub trait SurfaceSource {
    fn read_surface(&self) -> Result<Surface>;
}

impl<R: RenderInstance> SurfaceSource for DescriptorSynchronizer<R> {
    fn read_surface(&self) -> Result<Surface> {
        DescriptorSynchronizer::read_surface(self)
    }
}

/// Converts drawn surfaces into artifacts.
#[derive(Debug, Clone, Copy, Default)]
pub struct Exporter {
    svg_mode: SvgMode,
}

impl Exporter {
    pub fn new(svg_mode: SvgMode) -> Self {
        Self { svg_mode }
    }

    pub fn svg_mode(&self) -> SvgMode {
        self.svg_mode
    }

    /// Export the source's current surface. No extraction is attempted
    /// while the source is not ready.
    pub fn export(
        &self,
        source: &impl SurfaceSource,
        format: ExportFormat,
        id: Option<&str>,
    ) -> Result<ExportArtifact> {
        let surface = source.read_surface()?;
        self.encode(&surface, format, id)
    }

    /// Export several formats from one consistent surface read.
    pub fn export_all(
        &self,
        source: &impl SurfaceSource,
        formats: &[ExportFormat],
        id: Option<&str>,
    ) -> Result<Vec<ExportArtifact>> {
        let surface = source.read_surface()?;
        formats
            .iter()
            .map(|&format| self.encode(&surface, format, id))
            .collect()
    }

    /// Encode an already-read surface.
    pub fn encode(
        &self,
        surface: &Surface,
        format: ExportFormat,
        id: Option<&str>,
    ) -> Result<ExportArtifact> {
        let (bytes, fidelity) = match format {
            ExportFormat::Png => (encode_png(&surface.image)?, Fidelity::Exact),
            ExportFormat::Svg => self.encode_svg(surface)?,
        };
        log::debug!(
            "exported frame {} as {} ({} bytes, {})",
            surface.frame,
            format,
            bytes.len(),
            fidelity
        );
        Ok(ExportArtifact {
            format,
            bytes,
            filename: artifact_filename(format, id),
            fidelity,
        })
    }

    fn encode_svg(&self, surface: &Surface) -> Result<(Vec<u8>, Fidelity)> {
        if self.svg_mode == SvgMode::Vector {
            match vector_svg(surface) {
                Some(svg) => return Ok((svg.into_bytes(), Fidelity::Vector)),
                None => log::debug!("surface cannot be traced; embedding raster snapshot"),
            }
        }
        Ok((embedded_svg(surface)?.into_bytes(), Fidelity::RasterEmbedded))
    }
}
