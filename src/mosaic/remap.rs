use std::collections::HashMap;

use rayon::prelude::*;

use super::error::QuantizeError;
use super::quantize::nearest_centroid;
use super::quantize::sample::{narrow, unpremultiply, Color, Sample};
use super::WideImage;

/// Paints every pixel of `img` with the nearest of `centroids`, narrowed
/// to 8 bits per channel.
///
/// `img` and `centroids` are premultiplied; the output has straight alpha.
///
/// Pixels are read straight from `img`, so this works for any centroid set,
/// not just one computed from the same image. Rows are processed in
/// parallel; repeated colors within a row are looked up once.
pub fn remap(img: &WideImage, centroids: &[Sample]) -> Result<image::RgbaImage, QuantizeError> {
	if centroids.is_empty() {
		return Err(QuantizeError::EmptyPalette);
	}
	let palette = centroids.iter().map(|c| unpremultiply(&narrow(c))).collect::<Vec<_>>();
	let mut out = image::RgbaImage::new(img.width(), img.height());
	let row_len = img.width() as usize * 4;
	if row_len == 0 {
		return Ok(out);
	}
	out.par_chunks_mut(row_len)
		.zip(img.par_chunks(row_len))
		.for_each(|(dst_row, src_row)| {
			let mut cache: HashMap<Sample, Option<Color>> = HashMap::new();
			for (dst, src) in dst_row.chunks_exact_mut(4).zip(src_row.chunks_exact(4)) {
				let sample = image::Rgba([src[0], src[1], src[2], src[3]]);
				let color = *cache.entry(sample)
					.or_insert_with(|| nearest_centroid(&sample, centroids).map(|ind| palette[ind]));
				if let Some(c) = color {
					dst.copy_from_slice(&c.0);
				}
			}
		});
	Ok(out)
}
