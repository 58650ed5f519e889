use super::error::PixelateError;

/// Splits `img` into `block_size`-square blocks anchored at (0, 0) and
/// floods each block with the color of its top-left pixel.
///
/// Blocks along the right and bottom edges are clipped to the image.
/// No averaging happens; every output color already exists in `img`.
pub fn pixelate(img: &image::RgbaImage, block_size: u32) -> Result<image::RgbaImage, PixelateError> {
	if block_size == 0 {
		return Err(PixelateError::ZeroBlockSize);
	}
	let (width, height) = img.dimensions();
	let mut out = image::RgbaImage::new(width, height);
	for y in (0..height).step_by(block_size as usize) {
		for x in (0..width).step_by(block_size as usize) {
			let tile = image::RgbaImage::from_pixel(
				block_size.min(width - x),
				block_size.min(height - y),
				*img.get_pixel(x, y),
			);
			image::imageops::replace(&mut out, &tile, i64::from(x), i64::from(y));
		}
	}
	Ok(out)
}
