use std::path::Path;

use anyhow::Context;
use image::RgbaImage;

use crate::foundation::error::{PreloadError, PreloadResult};

/// Decode encoded image bytes to RGBA8, rotating hue by `hue` degrees when non-zero.
pub fn decode_image(bytes: &[u8], hue: i32) -> PreloadResult<RgbaImage> {
    let dyn_img = image::load_from_memory(bytes)
        .map_err(|e| PreloadError::decode(format!("decode image from memory: {e}")))?;
    Ok(apply_hue(dyn_img.to_rgba8(), hue))
}

/// Read and decode an image file. Read failures carry the path as context; undecodable bytes
/// are [`PreloadError::Decode`].
pub fn decode_image_file(path: &Path, hue: i32) -> PreloadResult<RgbaImage> {
    let bytes =
        std::fs::read(path).with_context(|| format!("read image '{}'", path.display()))?;
    let dyn_img = image::load_from_memory(&bytes)
        .map_err(|e| PreloadError::decode(format!("decode image '{}': {e}", path.display())))?;
    Ok(apply_hue(dyn_img.to_rgba8(), hue))
}

fn apply_hue(img: RgbaImage, hue: i32) -> RgbaImage {
    if hue.rem_euclid(360) == 0 {
        return img;
    }
    image::imageops::huerotate(&img, hue)
}

#[cfg(test)]
#[path = "../../tests/unit/surface/decode.rs"]
mod tests;
