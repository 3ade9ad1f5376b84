// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Image file loading.
//!
//! Background, overlay and cleanup images are embedded in the project as
//! base64 data URLs. This module loads image files into that form and
//! reads the pixel size back out of it.

use crate::util::geometry::{fit_image_scale, overlay_image_scale};
use anyhow::{bail, Context, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use std::path::Path;

/// An image ready to be embedded in a project.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedImage {
    pub width: u32,
    pub height: u32,
    pub data_url: String,
}

impl LoadedImage {
    /// Scale for showing this image as the background of a canvas.
    pub fn fit_scale(&self, canvas_width: f64, canvas_height: f64) -> f64 {
        fit_image_scale(f64::from(self.width), f64::from(self.height), canvas_width, canvas_height)
    }

    /// Starting scale for this image as an overlay.
    pub fn overlay_scale(&self, canvas_width: f64, canvas_height: f64) -> f64 {
        overlay_image_scale(f64::from(self.width), f64::from(self.height), canvas_width, canvas_height)
    }
}

/// Load an image file as a data URL.
pub fn load_image(path: &Path) -> Result<LoadedImage> {
    let bytes = std::fs::read(path).with_context(|| format!("could not read image {}", path.display()))?;
    let image = encode_image(&bytes).with_context(|| format!("could not decode image {}", path.display()))?;
    log::info!("Loaded image {} ({}x{})", path.display(), image.width, image.height);
    Ok(image)
}

/// Probe encoded image bytes and wrap them in a data URL.
pub fn encode_image(bytes: &[u8]) -> Result<LoadedImage> {
    let format = image::guess_format(bytes).context("unrecognized image format")?;
    let decoded = image::load_from_memory_with_format(bytes, format)?;
    Ok(LoadedImage {
        width: decoded.width(),
        height: decoded.height(),
        data_url: format!("data:{};base64,{}", format.to_mime_type(), STANDARD.encode(bytes)),
    })
}

/// Split a base64 data URL into its MIME type and decoded bytes.
pub fn decode_data_url(data_url: &str) -> Result<(String, Vec<u8>)> {
    let Some(rest) = data_url.strip_prefix("data:") else {
        bail!("not a data URL");
    };
    let Some((mime, payload)) = rest.split_once(";base64,") else {
        bail!("data URL is not base64 encoded");
    };
    let bytes = STANDARD.decode(payload.trim()).context("invalid base64 payload")?;
    Ok((mime.to_string(), bytes))
}

/// Pixel size of the image embedded in a data URL.
pub fn data_url_dimensions(data_url: &str) -> Result<(u32, u32)> {
    let (_, bytes) = decode_data_url(data_url)?;
    let image = encode_image(&bytes)?;
    Ok((image.width, image.height))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgba, RgbaImage};
    use std::io::Cursor;

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = RgbaImage::from_pixel(width, height, Rgba([200, 40, 40, 255]));
        let mut bytes = Cursor::new(Vec::new());
        img.write_to(&mut bytes, ImageFormat::Png).unwrap();
        bytes.into_inner()
    }

    #[test]
    fn test_encode_and_decode_png() {
        let bytes = png_bytes(40, 20);
        let image = encode_image(&bytes).unwrap();
        assert_eq!((image.width, image.height), (40, 20));
        assert!(image.data_url.starts_with("data:image/png;base64,"));

        let (mime, decoded) = decode_data_url(&image.data_url).unwrap();
        assert_eq!(mime, "image/png");
        assert_eq!(decoded, bytes);
        assert_eq!(data_url_dimensions(&image.data_url).unwrap(), (40, 20));
    }

    #[test]
    fn test_load_image_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tile.png");
        std::fs::write(&path, png_bytes(2000, 1000)).unwrap();

        let image = load_image(&path).unwrap();
        assert!((image.fit_scale(800.0, 600.0) - 0.36).abs() < 1e-9);
        assert!((image.overlay_scale(800.0, 600.0) - 0.15).abs() < 1e-9);
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(encode_image(b"definitely not an image").is_err());
        assert!(decode_data_url("http://example.com/a.png").is_err());
        assert!(decode_data_url("data:image/png,rawpixels").is_err());
        assert!(decode_data_url("data:image/png;base64,***").is_err());
    }
}
