use image::{ImageBuffer, Rgba};

use crate::layout::PixelRect;

/// Crops a sub-region from an image using absolute pixel coordinates.
///
/// The rectangle is clamped to the image bounds; a rectangle that starts
/// outside the image yields an empty (0x0 or 0xN) image.
pub fn crop_region(
    img: &ImageBuffer<Rgba<u8>, Vec<u8>>,
    region: &PixelRect,
) -> ImageBuffer<Rgba<u8>, Vec<u8>> {
    let (w, h) = img.dimensions();

    let x0 = region.x.min(w);
    let y0 = region.y.min(h);
    let rw = region.width.min(w - x0);
    let rh = region.height.min(h - y0);

    image::imageops::crop_imm(img, x0, y0, rw, rh).to_image()
}
