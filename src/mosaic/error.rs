use thiserror::Error;

/// Reason why an image couldn't be quantized.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum QuantizeError {
	/// A palette of zero colors was requested, so no pixel has a nearest color.
	#[error("palette size must be at least 1")]
	EmptyPalette,
}

/// Reason why an image couldn't be pixelated.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PixelateError {
	/// A block size of zero would never advance across the image.
	#[error("pixel block size must be at least 1")]
	ZeroBlockSize,
}

/// Reason why the full quantize-then-pixelate pipeline failed.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MosaicError {
	#[error(transparent)]
	Quantize(#[from] QuantizeError),
	#[error(transparent)]
	Pixelate(#[from] PixelateError),
}
