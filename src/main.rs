use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pixmosaic::cli::{self, Settings};

/// Helper function for `main`.
fn error_exit(msg: &str, code: i32) -> ! {
	error!("{}", msg);
	std::process::exit(code)
}

/// `clap`-based CLI that quantizes an image and renders it as a block mosaic.
///
/// Usage errors are reported by `clap` itself (status 1). Otherwise the
/// process may exit with:
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
fn main() {
	tracing_subscriber::registry()
		.with(
			tracing_subscriber::EnvFilter::try_from_default_env()
				.unwrap_or_else(|_| "pixmosaic=info".into()),
		)
		.with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
		.init();

	let settings = Settings::parse_from(std::env::args_os()).unwrap_or_else(|e| e.exit());
	match cli::run(&settings) {
		Ok(report) => info!(
			"pixelated image with {} colors saved to {}",
			report.colors,
			report.output.display()
		),
		Err(e) => error_exit(&e.to_string(), e.exit_code()),
	}
}
