pub mod sample;

use rayon::prelude::*;
use tracing::debug;

use super::error::QuantizeError;
use super::WideImage;
use sample::{ClusterSum, Sample};

/// Number of assignment/update rounds run when nothing else is asked for.
pub const DEFAULT_ROUNDS: usize = 5;

/// Knobs for the k-means palette search.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QuantizeConfig {
	/// Number of palette entries (clusters) to find.
	pub colors: usize,
	/// Upper bound on the number of rounds.
	pub rounds: usize,
	/// Ends the search as soon as a round reproduces the previous round's
	/// cluster assignment. The centroids are the same either way; only the
	/// wasted rounds are skipped.
	pub stop_when_stable: bool,
}

impl QuantizeConfig {
	pub fn new(colors: usize) -> Self {
		QuantizeConfig { colors, rounds: DEFAULT_ROUNDS, stop_when_stable: false }
	}
}

/// Outcome of a palette search.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Clustering {
	/// One centroid per requested color; the index is the cluster identity.
	pub centroids: Vec<Sample>,
	/// How many full assignment/update rounds were carried out.
	pub rounds_run: usize,
}

/// Flattens an image into its samples, row by row.
pub fn collect_samples(img: &WideImage) -> Vec<Sample> {
	img.pixels().copied().collect()
}

/// Picks `k` starting centroids by sampling the list at a fixed stride.
///
/// Slots beyond the number of available samples stay all-zero.
pub fn initial_centroids(samples: &[Sample], k: usize) -> Vec<Sample> {
	let mut centroids = vec![image::Rgba([0u16; 4]); k];
	for (ind, centroid) in centroids.iter_mut().enumerate().take(samples.len()) {
		*centroid = samples[ind * samples.len() / k];
	}
	centroids
}

/// Index of the centroid closest to `sample`.
///
/// Ties go to the lowest index. Returns `None` only if `centroids` is empty.
pub fn nearest_centroid(sample: &Sample, centroids: &[Sample]) -> Option<usize> {
	centroids.iter()
		.enumerate()
		.map(|(ind, c)| (sample::color_distance(sample, c), ind))
		.min()
		.map(|(_, ind)| ind)
}

/// Assigns every sample to its nearest centroid, reporting whether any
/// label differs from the one it held before.
fn assign(samples: &[Sample], centroids: &[Sample], labels: &mut [Option<usize>]) -> bool {
	samples.par_iter()
		.zip(labels.par_iter_mut())
		.map(|(s, label)| {
			let nearest = nearest_centroid(s, centroids);
			let changed = *label != nearest;
			*label = nearest;
			changed
		})
		.reduce(|| false, |a, b| a || b)
}

/// Builds per-cluster sums from the current labels.
fn accumulate(samples: &[Sample], labels: &[Option<usize>], k: usize) -> Vec<ClusterSum> {
	samples.par_iter()
		.zip(labels.par_iter())
		.fold(|| vec![ClusterSum::default(); k], |mut sums, (s, label)| {
			if let Some(ind) = label {
				sums[*ind].add(s);
			}
			sums
		})
		.reduce(|| vec![ClusterSum::default(); k], |a, b| {
			a.into_iter().zip(b).map(|(x, y)| x.merge(y)).collect()
		})
}

/// Moves each centroid to the mean of its cluster. Empty clusters keep
/// their centroid as is.
fn update(centroids: &mut [Sample], sums: &[ClusterSum]) {
	for (centroid, sum) in centroids.iter_mut().zip(sums.iter()) {
		if let Some(mean) = sum.mean() {
			*centroid = mean;
		}
	}
}

/// Runs k-means over `samples` and returns the resulting centroids.
///
/// Each round is a parallel assignment pass followed by a sequential
/// update; a round never starts before the previous update finished.
pub fn cluster(samples: &[Sample], config: &QuantizeConfig) -> Result<Clustering, QuantizeError> {
	if config.colors == 0 {
		return Err(QuantizeError::EmptyPalette);
	}
	let mut centroids = initial_centroids(samples, config.colors);
	let mut labels = vec![None; samples.len()];
	let mut rounds_run = 0;
	for round in 0..config.rounds {
		let changed = assign(samples, &centroids, &mut labels);
		if config.stop_when_stable && !changed {
			debug!(round, "cluster assignment stable, stopping early");
			break;
		}
		let sums = accumulate(samples, &labels, centroids.len());
		update(&mut centroids, &sums);
		rounds_run += 1;
		debug!(round, changed, "clustering round complete");
	}
	Ok(Clustering { centroids, rounds_run })
}

/// Finds a palette for `img` and maps every pixel onto it.
pub fn quantize(
	img: &WideImage,
	config: &QuantizeConfig
) -> Result<(image::RgbaImage, Clustering), QuantizeError> {
	let clustering = {
		let samples = collect_samples(img);
		cluster(&samples, config)?
	};
	let remapped = super::remap::remap(img, &clustering.centroids)?;
	Ok((remapped, clustering))
}
