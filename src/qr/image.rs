//! Barcode rendering of a Fatoora payload.
//!
//! The barcode carries the raw TLV bytes, not their base64 text.

use std::io::Cursor;

use image::{DynamicImage, ImageBuffer, Luma};
use qrcode::QrCode;

use super::{FatooraFields, encode_tlv};
use crate::core::QrError;

/// Grayscale barcode bitmap, quiet zone included.
pub type QrBitmap = ImageBuffer<Luma<u8>, Vec<u8>>;

/// Side length the barcode is scaled up to, in pixels.
pub const MIN_DIMENSION: u32 = 200;

/// Render TLV bytes as a grayscale barcode.
pub fn render_luma(tlv: &[u8]) -> Result<QrBitmap, QrError> {
    let code = QrCode::new(tlv).map_err(|e| QrError::Image(e.to_string()))?;
    Ok(code
        .render::<Luma<u8>>()
        .min_dimensions(MIN_DIMENSION, MIN_DIMENSION)
        .build())
}

/// Render TLV bytes as a PNG image.
pub fn render_png(tlv: &[u8]) -> Result<Vec<u8>, QrError> {
    let bitmap = render_luma(tlv)?;
    let mut buffer = Cursor::new(Vec::new());
    DynamicImage::ImageLuma8(bitmap)
        .write_to(&mut buffer, image::ImageOutputFormat::Png)
        .map_err(|e| QrError::Image(e.to_string()))?;
    Ok(buffer.into_inner())
}

/// Encode `fields` and render the resulting payload as a PNG barcode.
pub fn fatoora_png(fields: &FatooraFields) -> Result<Vec<u8>, QrError> {
    render_png(&encode_tlv(fields)?)
}
