//! PNG encoding of drawn surfaces.

use std::io::Cursor;

use base64::Engine;
use image::{ImageFormat, RgbaImage};

use crate::error::{QrError, Result};

/// Encode pixels losslessly as PNG.
pub fn encode_png(image: &RgbaImage) -> Result<Vec<u8>> {
    let mut bytes = Cursor::new(Vec::new());
    image
        .write_to(&mut bytes, ImageFormat::Png)
        .map_err(|e| QrError::Encode {
            message: format!("Failed to encode PNG: {}", e),
        })?;
    Ok(bytes.into_inner())
}

/// Encode pixels as a `data:image/png;base64,` URI.
pub fn png_data_uri(image: &RgbaImage) -> Result<String> {
    let bytes = encode_png(image)?;
    Ok(format!(
        "data:image/png;base64,{}",
        base64::engine::general_purpose::STANDARD.encode(bytes)
    ))
}
