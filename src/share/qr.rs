//! QR code rendering for share links.

use std::io::Cursor;
use std::path::Path;

use image::{ImageFormat, Rgb, RgbImage};
use qrcode::types::QrError as EncodeError;
use qrcode::{Color, EcLevel, QrCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum QrError {
    #[error("link cannot be encoded as a QR code: {0:?}")]
    Encode(EncodeError),

    #[error("failed to write QR image: {0}")]
    Image(#[from] image::ImageError),

    #[error("failed to save QR image: {0}")]
    Io(#[from] std::io::Error),
}

impl From<EncodeError> for QrError {
    fn from(e: EncodeError) -> Self {
        Self::Encode(e)
    }
}

/// How a share link is drawn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QrOptions {
    /// Side of the square image in pixels.
    pub width: u32,
    /// Quiet zone around the code, in modules.
    pub margin: u32,
    pub dark: [u8; 3],
    pub light: [u8; 3],
}

impl Default for QrOptions {
    fn default() -> Self {
        Self {
            width: 256,
            margin: 2,
            dark: [0x1e, 0x29, 0x3b],
            light: [0xff, 0xff, 0xff],
        }
    }
}

/// Encode `link`, preferring level M and dropping to L when the link is too
/// long for M. Self-contained links can get long enough to need it.
pub fn encode(link: &str) -> Result<QrCode, QrError> {
    match QrCode::with_error_correction_level(link.as_bytes(), EcLevel::M) {
        Ok(code) => Ok(code),
        Err(EncodeError::DataTooLong) => {
            tracing::debug!(len = link.len(), "link too long for level M, using L");
            Ok(QrCode::with_error_correction_level(link.as_bytes(), EcLevel::L)?)
        }
        Err(e) => Err(e.into()),
    }
}

/// Render `link` as a PNG.
pub fn render_png(link: &str, options: &QrOptions) -> Result<Vec<u8>, QrError> {
    let code = encode(link)?;
    let image = rasterize(&code, options);

    let mut bytes = Vec::new();
    image.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;
    Ok(bytes)
}

/// Render `link` and write the PNG to `path`. Nothing is written when the
/// link cannot be encoded.
pub fn write_png(link: &str, options: &QrOptions, path: &Path) -> Result<(), QrError> {
    let png = render_png(link, options)?;
    std::fs::write(path, png)?;
    Ok(())
}

/// Nearest-neighbour scale of the module grid (plus margin) onto a
/// `width`-pixel square.
fn rasterize(code: &QrCode, options: &QrOptions) -> RgbImage {
    let size = code.width() as u32;
    let colors = code.to_colors();
    let total = size + 2 * options.margin;
    let width = options.width.max(total);

    RgbImage::from_fn(width, width, |x, y| {
        let mx = x * total / width;
        let my = y * total / width;
        let inside = (options.margin..options.margin + size).contains(&mx)
            && (options.margin..options.margin + size).contains(&my);
        if inside {
            let idx = ((my - options.margin) * size + (mx - options.margin)) as usize;
            if colors[idx] == Color::Dark {
                return Rgb(options.dark);
            }
        }
        Rgb(options.light)
    })
}
