/// One pixel's RGBA reading, each channel on the wide 0..=65535 scale.
///
/// Color channels are premultiplied by alpha, so no channel exceeds alpha.
pub type Sample = image::Rgba<u16>;

/// One pixel of the narrowed, 8-bit-per-channel output (straight alpha).
pub type Color = image::Rgba<u8>;

fn signed_sub(a: u16, b: u16) -> i64 {
	a as i64 - b as i64
}

fn vec4_len_squared(a: i64, b: i64, c: i64, d: i64) -> u64 {
	(a * a + b * b + c * c + d * d) as u64
}

/// Squared Euclidean distance between two samples, all four channels
/// weighted equally.
///
/// The largest possible result is `4 * 65535^2`, well inside `u64`.
pub fn color_distance(a: &Sample, b: &Sample) -> u64 {
	vec4_len_squared(
		signed_sub(a.0[0], b.0[0]),
		signed_sub(a.0[1], b.0[1]),
		signed_sub(a.0[2], b.0[2]),
		signed_sub(a.0[3], b.0[3]),
	)
}

/// Drops the low byte of every channel. Truncates, never rounds.
pub fn narrow(s: &Sample) -> Color {
	image::Rgba::<u8>([
		(s.0[0] >> 8) as u8,
		(s.0[1] >> 8) as u8,
		(s.0[2] >> 8) as u8,
		(s.0[3] >> 8) as u8,
	])
}

/// Scales the color channels of a straight-alpha sample by its alpha.
pub fn premultiply(s: &Sample) -> Sample {
	let a = s.0[3] as u32;
	let scale = |c: u16| (c as u32 * a / 0xffff) as u16;
	image::Rgba::<u16>([scale(s.0[0]), scale(s.0[1]), scale(s.0[2]), s.0[3]])
}

/// Turns a narrowed premultiplied color back into straight alpha.
///
/// Fully transparent colors come out as all-zero.
pub fn unpremultiply(c: &Color) -> Color {
	let a = c.0[3] as u32 * 0x101;
	let scale = |v: u8| ((v as u32 * 0x101 * 0xffff / a) >> 8).min(0xff) as u8;
	match a {
		0 => image::Rgba::<u8>([0; 4]),
		0xffff => *c,
		_ => image::Rgba::<u8>([scale(c.0[0]), scale(c.0[1]), scale(c.0[2]), c.0[3]]),
	}
}

/// Running per-channel sums for one cluster during an update step.
///
/// Sums are associative, so partial accumulators built on different
/// threads can be merged in any order.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ClusterSum {
	pub channels: [u64; 4],
	pub count: u64,
}

impl ClusterSum {
	pub fn add(&mut self, s: &Sample) {
		for (sum, c) in self.channels.iter_mut().zip(s.0.iter()) {
			*sum += *c as u64;
		}
		self.count += 1;
	}

	pub fn merge(mut self, other: ClusterSum) -> ClusterSum {
		for (sum, o) in self.channels.iter_mut().zip(other.channels.iter()) {
			*sum += o;
		}
		self.count += other.count;
		self
	}

	/// Per-channel floor mean, or `None` for a cluster nobody joined.
	pub fn mean(&self) -> Option<Sample> {
		if self.count == 0 {
			return None;
		}
		Some(image::Rgba::<u16>([
			(self.channels[0] / self.count) as u16,
			(self.channels[1] / self.count) as u16,
			(self.channels[2] / self.count) as u16,
			(self.channels[3] / self.count) as u16,
		]))
	}
}
