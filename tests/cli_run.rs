use std::io::Write;
use std::path::Path;
use std::sync::{Arc, Mutex};

use image::GenericImageView;
use pixmosaic::cli::{run, OutputFormat, RunError, Settings};

use pretty_assertions::assert_eq;

fn settings(input: &Path, output: &Path, block_size: i64, colors: i64) -> Settings {
	Settings {
		input: input.to_owned(),
		output: output.to_owned(),
		block_size,
		colors,
		rounds: pixmosaic::DEFAULT_ROUNDS,
		stop_when_stable: false,
	}
}

/// Four colors in contiguous row-major runs of 12 pixels, so the stride
/// initializer starts from one centroid per color.
fn bands() -> image::RgbaImage {
	const COLORS: [image::Rgba<u8>; 4] = [
		image::Rgba([255, 0, 0, 255]),
		image::Rgba([0, 255, 0, 255]),
		image::Rgba([0, 0, 255, 255]),
		image::Rgba([255, 255, 255, 255]),
	];
	image::RgbaImage::from_fn(8, 6, |x, y| COLORS[((y * 8 + x) / 12) as usize])
}

#[test]
fn png_in_png_out() {
	let dir = tempfile::tempdir().unwrap();
	let input = dir.path().join("bands.png");
	let output = dir.path().join("mosaic.png");
	bands().save(&input).unwrap();

	let report = run(&settings(&input, &output, 1, 4)).unwrap();
	assert_eq!(report.colors, 4);
	assert_eq!(report.format, OutputFormat::Png);
	assert_eq!(report.output, output);

	let written = image::open(&output).unwrap().to_rgba8();
	assert_eq!(written, bands());
}

#[test]
fn format_follows_contents_not_extension() {
	let dir = tempfile::tempdir().unwrap();
	let input = dir.path().join("really_a_png.jpg");
	let output = dir.path().join("out.bin");
	bands().save_with_format(&input, image::ImageFormat::Png).unwrap();

	let report = run(&settings(&input, &output, 3, 2)).unwrap();
	assert_eq!(report.format, OutputFormat::Png);
	let bytes = std::fs::read(&output).unwrap();
	assert_eq!(&bytes[..8], b"\x89PNG\r\n\x1a\n");
}

#[test]
fn jpeg_in_jpeg_out() {
	let dir = tempfile::tempdir().unwrap();
	let input = dir.path().join("bands.jpg");
	let output = dir.path().join("mosaic.jpg");
	image::DynamicImage::ImageRgba8(bands()).to_rgb8().save(&input).unwrap();

	let report = run(&settings(&input, &output, 4, 3)).unwrap();
	assert_eq!(report.format, OutputFormat::Jpeg);
	let written = image::open(&output).unwrap();
	assert_eq!(written.dimensions(), (8, 6));
	assert_eq!(image::io::Reader::open(&output).unwrap().with_guessed_format().unwrap().format(),
		Some(image::ImageFormat::Jpeg));
}

#[test]
fn other_formats_are_rejected_without_output() {
	let dir = tempfile::tempdir().unwrap();
	let input = dir.path().join("bands.bmp");
	let output = dir.path().join("mosaic.bmp");
	image::DynamicImage::ImageRgba8(bands()).to_rgb8().save(&input).unwrap();

	let err = run(&settings(&input, &output, 2, 4)).unwrap_err();
	assert!(matches!(err, RunError::UnsupportedFormat(ref f) if f == "bmp"), "{:?}", err);
	assert_eq!(err.exit_code(), 6);
	assert!(!output.exists());
}

#[test]
fn garbage_input_is_a_decode_error() {
	let dir = tempfile::tempdir().unwrap();
	let input = dir.path().join("noise.png");
	std::fs::write(&input, b"definitely not an image").unwrap();

	let err = run(&settings(&input, &dir.path().join("out.png"), 2, 4)).unwrap_err();
	assert!(matches!(err, RunError::Decode(_)), "{:?}", err);
	assert_eq!(err.exit_code(), 4);
}

#[test]
fn unwritable_output_is_an_io_error() {
	let dir = tempfile::tempdir().unwrap();
	let input = dir.path().join("bands.png");
	bands().save(&input).unwrap();

	let output = dir.path().join("missing_dir").join("out.png");
	let err = run(&settings(&input, &output, 2, 4)).unwrap_err();
	assert!(matches!(err, RunError::Create { .. }), "{:?}", err);
	assert_eq!(err.exit_code(), 3);
}

#[test]
fn lenient_arguments_reach_the_pipeline() {
	let dir = tempfile::tempdir().unwrap();
	let input = dir.path().join("bands.png");
	let output = dir.path().join("out.png");
	bands().save(&input).unwrap();

	let args = vec![
		"pixmosaic".to_string(),
		input.display().to_string(),
		output.display().to_string(),
		"not-a-number".to_string(),
		"lots".to_string(),
	];
	let s = Settings::parse_from(args).unwrap();
	let report = run(&s).unwrap();
	assert_eq!(report.colors, 16);
	// One 10x10 block covers the whole 8x6 image.
	let written = image::open(&output).unwrap().to_rgba8();
	assert!(written.pixels().all(|p| *p == image::Rgba([255, 0, 0, 255])));
}

#[test]
fn oversized_block_size_covers_the_image() {
	let dir = tempfile::tempdir().unwrap();
	let input = dir.path().join("bands.png");
	let output = dir.path().join("out.png");
	bands().save(&input).unwrap();

	run(&settings(&input, &output, i64::MAX, 4)).unwrap();
	let written = image::open(&output).unwrap().to_rgba8();
	assert!(written.pixels().all(|p| *p == image::Rgba([255, 0, 0, 255])));
}

/// Log sink shared between the subscriber and the test.
#[derive(Clone, Default)]
struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl Write for LogBuffer {
	fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
		self.0.lock().unwrap().extend_from_slice(buf);
		Ok(buf.len())
	}

	fn flush(&mut self) -> std::io::Result<()> {
		Ok(())
	}
}

fn logged_run(colors: i64) -> String {
	let dir = tempfile::tempdir().unwrap();
	let input = dir.path().join("bands.jpg");
	let output = dir.path().join("out.jpg");
	image::DynamicImage::ImageRgba8(bands()).to_rgb8().save(&input).unwrap();

	let logs = LogBuffer::default();
	let sink = logs.clone();
	let subscriber = tracing_subscriber::fmt()
		.with_writer(move || sink.clone())
		.with_ansi(false)
		.finish();
	tracing::subscriber::with_default(subscriber, || {
		run(&settings(&input, &output, 2, colors)).unwrap();
	});
	let bytes = logs.0.lock().unwrap().clone();
	String::from_utf8(bytes).unwrap()
}

#[test]
fn two_colors_recommends_png() {
	let logs = logged_run(2);
	assert!(logs.contains("WARN"), "{}", logs);
	assert!(logs.contains("PNG output is recommended"), "{}", logs);
}

#[test]
fn other_palette_sizes_stay_quiet() {
	let logs = logged_run(3);
	assert!(!logs.contains("PNG output is recommended"), "{}", logs);
}
