//! Symbol encoders: content + error-correction level in, module grid out.

use crate::error::{QrError, Result};
use crate::types::EcLevel;

use super::ModuleGrid;

/// Turns content into a module grid. Treated as a black box by the renderer.
pub trait SymbolEncoder: Send {
    fn encode(&self, content: &str, level: EcLevel) -> Result<ModuleGrid>;
}

/// QR Code Model 2 encoder backed by the `qrcode` crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct QrEncoder;

impl From<EcLevel> for qrcode::EcLevel {
    fn from(level: EcLevel) -> Self {
        match level {
            EcLevel::L => qrcode::EcLevel::L,
            EcLevel::M => qrcode::EcLevel::M,
            EcLevel::Q => qrcode::EcLevel::Q,
            EcLevel::H => qrcode::EcLevel::H,
        }
    }
}

impl SymbolEncoder for QrEncoder {
    fn encode(&self, content: &str, level: EcLevel) -> Result<ModuleGrid> {
        let code = qrcode::QrCode::with_error_correction_level(content.as_bytes(), level.into())
            .map_err(|e| QrError::Encode {
                message: format!("cannot encode {} bytes at level {}: {}", content.len(), level, e),
            })?;

        let width = code.width();
        let modules = code
            .to_colors()
            .into_iter()
            .map(|c| matches!(c, qrcode::Color::Dark))
            .collect();

        ModuleGrid::new(width, modules).ok_or_else(|| QrError::Encode {
            message: format!("encoder returned a malformed {}x{} grid", width, width),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encodes_url_into_square_grid() {
        let grid = QrEncoder.encode("https://example.com", EcLevel::M).unwrap();
        // Version 2 is 25 modules wide
        assert_eq!(grid.width(), 25);
        // Top-left finder corner is always dark
        assert!(grid.is_dark(0, 0));
        assert!(grid.is_dark(6, 6));
        assert!(!grid.is_dark(7, 7));
    }

    #[test]
    fn test_higher_level_needs_larger_symbol() {
        let content = "https://example.com/a/fairly/long/path?with=query&and=more";
        let low = QrEncoder.encode(content, EcLevel::L).unwrap();
        let high = QrEncoder.encode(content, EcLevel::H).unwrap();
        assert!(high.width() > low.width());
    }

    #[test]
    fn test_oversized_content_is_an_error() {
        let content = "x".repeat(8000);
        let err = QrEncoder.encode(&content, EcLevel::H).unwrap_err();
        assert!(matches!(err, QrError::Encode { .. }));
    }
}
