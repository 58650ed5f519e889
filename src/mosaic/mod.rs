pub mod error;
pub mod pixelate;
pub mod quantize;
pub mod remap;

pub use error::{MosaicError, PixelateError, QuantizeError};
pub use pixelate::pixelate;
pub use quantize::{cluster, quantize, Clustering, QuantizeConfig, DEFAULT_ROUNDS};
pub use quantize::sample::{color_distance, Color, Sample};
pub use remap::remap;

/// Source image with every channel on the wide 0..=65535 scale, color
/// channels premultiplied by alpha.
pub type WideImage = image::ImageBuffer<Sample, Vec<u16>>;

/// Converts a decoded image of any pixel layout into wide, premultiplied
/// RGBA samples.
///
/// 8-bit channels are scaled by 257, so 0xff becomes 0xffff and narrowing
/// an opaque pixel gives back the original byte. Transparent pixels lose
/// whatever color they carried, so it can't pull on the palette.
pub fn widen(img: &image::DynamicImage) -> WideImage {
	let mut wide = img.to_rgba16();
	for p in wide.pixels_mut() {
		*p = quantize::sample::premultiply(p);
	}
	wide
}

/// Quantizes `img` to `config.colors` colors, then pixelates the result
/// with `block_size`-square blocks.
pub fn stylize(
	img: &WideImage,
	config: &QuantizeConfig,
	block_size: u32
) -> Result<(image::RgbaImage, Clustering), MosaicError> {
	if block_size == 0 {
		return Err(PixelateError::ZeroBlockSize.into());
	}
	let (quantized, clustering) = quantize(img, config)?;
	Ok((pixelate(&quantized, block_size)?, clustering))
}
