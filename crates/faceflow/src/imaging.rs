//! Image decoding and face cropping, delegated to the `image` crate.

use faceflow_sdk::BoundingBox;
use image::{imageops, DynamicImage, RgbaImage};

use crate::error::FlowError;

/// Decode encoded image bytes, guessing the format from the content.
pub(crate) fn decode_bytes(bytes: &[u8]) -> Result<DynamicImage, FlowError> {
    Ok(image::load_from_memory(bytes)?)
}

/// Render the source image into a canvas sized to the face bounds, drawing it
/// at the negative of the bounds origin. Regions of the canvas the source
/// does not reach stay transparent.
pub(crate) fn crop_to_bounds(
    image: &DynamicImage,
    bounds: &BoundingBox,
) -> Result<DynamicImage, FlowError> {
    let width = bounds.width.round() as i64;
    let height = bounds.height.round() as i64;
    if width <= 0 || height <= 0 {
        return Err(FlowError::ImageDecoding(format!(
            "face bounds {}x{} produce an empty canvas",
            bounds.width, bounds.height
        )));
    }

    let mut canvas = RgbaImage::new(width as u32, height as u32);
    imageops::overlay(
        &mut canvas,
        &image.to_rgba8(),
        -(bounds.x.round() as i64),
        -(bounds.y.round() as i64),
    );
    Ok(DynamicImage::ImageRgba8(canvas))
}
