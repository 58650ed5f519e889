use std::ffi::OsString;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use image::{DynamicImage, GenericImageView, ImageError, ImageFormat, ImageOutputFormat};
use thiserror::Error;
use tracing::{debug, warn};

use crate::mosaic::{self, MosaicError, QuantizeConfig, DEFAULT_ROUNDS};

/// Block size used when `PIXEL_SIZE` is not a number.
pub const DEFAULT_BLOCK_SIZE: i64 = 10;
/// Palette size used when `NUM_COLORS` is not a number.
pub const DEFAULT_PALETTE_SIZE: i64 = 16;
/// JPEG output is written at full quality.
pub const JPEG_QUALITY: u8 = 100;

/// Reason why a CLI run couldn't produce an output image.
#[derive(Debug, Error)]
pub enum RunError {
	/// The pixel block size was zero or negative.
	#[error("pixel block size must be a positive integer, got {0}")]
	InvalidBlockSize(i64),
	/// The palette size was zero or negative.
	#[error("palette size must be a positive integer, got {0}")]
	InvalidPaletteSize(i64),
	/// The input file could not be opened or read.
	#[error("error opening input file {}: {source}", .path.display())]
	Open { path: PathBuf, source: std::io::Error },
	/// The input bytes are not a decodable image.
	#[error("error decoding image: {0}")]
	Decode(ImageError),
	/// The input decoded fine, but its format can't be written back out.
	#[error("unsupported image format: {0}")]
	UnsupportedFormat(String),
	/// The output file could not be created.
	#[error("error creating output file {}: {source}", .path.display())]
	Create { path: PathBuf, source: std::io::Error },
	/// Encoding or writing the output image failed.
	#[error("error encoding output image: {0}")]
	Encode(ImageError),
	#[error(transparent)]
	Mosaic(#[from] MosaicError),
}

impl RunError {
	/// Process exit status for this error.
	///
	/// 2: invalid arguments
	///
	/// 3: file I/O issues
	///
	/// 4: invalid image data
	///
	/// 6: unsupported image format
	///
	/// 7: output encoding failed
	pub fn exit_code(&self) -> i32 {
		match self {
			RunError::InvalidBlockSize(_) | RunError::InvalidPaletteSize(_) | RunError::Mosaic(_) => 2,
			RunError::Open { .. } | RunError::Create { .. } => 3,
			RunError::Decode(ImageError::IoError(_)) => 3,
			RunError::Decode(_) => 4,
			RunError::UnsupportedFormat(_) => 6,
			RunError::Encode(_) => 7,
		}
	}
}

/// Image container written for the output; always the input's own format.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
	Png,
	Jpeg,
}

impl TryFrom<Option<ImageFormat>> for OutputFormat {
	type Error = RunError;

	fn try_from(format: Option<ImageFormat>) -> Result<Self, RunError> {
		match format {
			Some(ImageFormat::Png) => Ok(OutputFormat::Png),
			Some(ImageFormat::Jpeg) => Ok(OutputFormat::Jpeg),
			Some(other) => Err(RunError::UnsupportedFormat(format!("{:?}", other).to_lowercase())),
			None => Err(RunError::UnsupportedFormat("unknown".to_string())),
		}
	}
}

/// Everything a run needs, as given on the command line.
///
/// Numeric fields are kept signed and unvalidated here; `run` rejects
/// values that make no sense.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Settings {
	pub input: PathBuf,
	pub output: PathBuf,
	pub block_size: i64,
	pub colors: i64,
	pub rounds: usize,
	pub stop_when_stable: bool,
}

/// What a successful run did.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Report {
	pub colors: usize,
	pub output: PathBuf,
	pub format: OutputFormat,
	pub rounds_run: usize,
}

fn is_count(v: String) -> Result<(), String> {
	v.parse::<usize>().map(|_| ()).map_err(|_| format!("Non-numeric value for rounds: {}", v))
}

/// Lenient integer parsing: anything unparsable becomes `default`.
fn int_or(value: Option<&str>, default: i64) -> i64 {
	value.and_then(|v| v.parse().ok()).unwrap_or(default)
}

/// The `clap` application definition.
pub fn app<'a, 'b>() -> clap::App<'a, 'b> {
	clap::App::new("pixmosaic")
		.version("0.1.0")
		.author("vkcz")
		.about("Reduces an image to a k-means palette, then pixelates it into a block mosaic.")
		.setting(clap::AppSettings::AllowNegativeNumbers)
		.arg_from_usage("<INPUT> 'Path to input image (PNG or JPEG)'")
		.arg_from_usage("<OUTPUT> 'Path to output image; written in the same format as the input'")
		.arg_from_usage("<PIXEL_SIZE> 'Side length of each mosaic block; defaults to 10 if not a number'")
		.arg_from_usage("<NUM_COLORS> 'Number of palette colors; defaults to 16 if not a number'")
		.arg(clap::Arg::from_usage("-r, --rounds=[N] 'Maximum number of clustering rounds; defaults to 5'")
			.validator(is_count))
		.arg_from_usage("--stop-when-stable 'Stop clustering once no pixel changes cluster between rounds'")
}

impl Settings {
	/// Parses a full argument list, program name first.
	pub fn parse_from<I, T>(args: I) -> Result<Settings, clap::Error>
	where
		I: IntoIterator<Item = T>,
		T: Into<OsString> + Clone,
	{
		let matches = app().get_matches_from_safe(args)?;
		Ok(Settings::from_matches(&matches))
	}

	fn from_matches(m: &clap::ArgMatches) -> Settings {
		Settings {
			input: m.value_of_os("INPUT").map(PathBuf::from).unwrap_or_default(),
			output: m.value_of_os("OUTPUT").map(PathBuf::from).unwrap_or_default(),
			block_size: int_or(m.value_of("PIXEL_SIZE"), DEFAULT_BLOCK_SIZE),
			colors: int_or(m.value_of("NUM_COLORS"), DEFAULT_PALETTE_SIZE),
			rounds: m.value_of("rounds").and_then(|v| v.parse().ok()).unwrap_or(DEFAULT_ROUNDS),
			stop_when_stable: m.is_present("stop-when-stable"),
		}
	}
}

/// Opens and decodes `path`, sniffing the format from its contents.
fn load(path: &Path) -> Result<(DynamicImage, OutputFormat), RunError> {
	let open_err = |source| RunError::Open { path: path.to_owned(), source };
	let reader = image::io::Reader::open(path)
		.map_err(open_err)?
		.with_guessed_format()
		.map_err(open_err)?;
	let format = reader.format();
	let img = reader.decode().map_err(RunError::Decode)?;
	debug!(?format, width = img.width(), height = img.height(), "decoded input image");
	Ok((img, OutputFormat::try_from(format)?))
}

fn save(img: image::RgbaImage, path: &Path, format: OutputFormat, colors: usize) -> Result<(), RunError> {
	let file = File::create(path)
		.map_err(|source| RunError::Create { path: path.to_owned(), source })?;
	if colors == 2 {
		warn!("for exactly 2 colors, PNG output is recommended to avoid compression artifacts");
	}
	let mut writer = BufWriter::new(file);
	let img = DynamicImage::ImageRgba8(img);
	let written = match format {
		OutputFormat::Png => img.write_to(&mut writer, ImageOutputFormat::Png),
		OutputFormat::Jpeg => DynamicImage::ImageRgb8(img.to_rgb8())
			.write_to(&mut writer, ImageOutputFormat::Jpeg(JPEG_QUALITY)),
	};
	written.map_err(RunError::Encode)?;
	writer.flush().map_err(|e| RunError::Encode(ImageError::IoError(e)))
}

/// Decodes the input, quantizes and pixelates it, and writes the output.
///
/// Argument values are checked before any file is touched, and the input
/// format before any output file is created.
pub fn run(settings: &Settings) -> Result<Report, RunError> {
	if settings.block_size <= 0 {
		return Err(RunError::InvalidBlockSize(settings.block_size));
	}
	// Anything past u32::MAX is one block covering the whole image anyway.
	let block_size = u32::try_from(settings.block_size).unwrap_or(u32::MAX);
	let colors = usize::try_from(settings.colors).ok()
		.filter(|n| *n > 0)
		.ok_or(RunError::InvalidPaletteSize(settings.colors))?;
	let config = QuantizeConfig {
		colors,
		rounds: settings.rounds,
		stop_when_stable: settings.stop_when_stable,
	};

	let (source, format) = load(&settings.input)?;
	let (result, clustering) = mosaic::stylize(&mosaic::widen(&source), &config, block_size)?;
	debug!(rounds_run = clustering.rounds_run, "palette search finished");
	save(result, &settings.output, format, colors)?;

	Ok(Report {
		colors,
		output: settings.output.clone(),
		format,
		rounds_run: clustering.rounds_run,
	})
}
