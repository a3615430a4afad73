//! Synthetic score distribution for the box-plot chart.
//!
//! There is no per-student data, so a plausible class is drawn from a
//! two-component bounded normal mixture built from the class mean and the
//! A/AB ratios. The upper tail thins as A becomes scarcer. This is an
//! illustration, not a fitted model.

use rand::Rng;
use rand_distr::StandardNormal;
use serde::Serialize;
use tracing::trace;

use crate::models::StudentRecord;

pub const MIN_SAMPLES: usize = 80;
pub const MAX_SAMPLES: usize = 520;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MixtureShape {
    pub sample_count: usize,
    pub sd: f64,
    pub tail_fraction: f64,
    pub main_count: usize,
    pub tail_count: usize,
}

impl MixtureShape {
    pub fn for_record(record: &StudentRecord) -> Self {
        let sample_count = (record.students as usize).clamp(MIN_SAMPLES, MAX_SAMPLES);
        let a = (record.a_ratio / 100.0).clamp(0.05, 0.55);
        let ab = (record.ab_ratio / 100.0).clamp(0.08, 0.75);

        let mut sd = 10.5;
        sd += (0.30 - ab.min(0.30)) * 12.0;
        sd -= (a.min(0.45) - 0.12) * 6.0;
        let sd = sd.clamp(6.5, 14.5);

        let tail_fraction = (0.10 + (0.16 - a) * 0.25).clamp(0.06, 0.18);
        let main_count = (sample_count as f64 * (1.0 - tail_fraction)).round() as usize;
        let tail_count = sample_count - main_count;

        Self {
            sample_count,
            sd,
            tail_fraction,
            main_count,
            tail_count,
        }
    }
}

/// Draws a fresh sample on every call; pass a seeded rng for reproducible output.
pub fn synthesize<R: Rng>(record: &StudentRecord, rng: &mut R) -> Vec<f64> {
    let shape = MixtureShape::for_record(record);
    let tail_center = record.mean + 1.2 * shape.sd;
    let tail_sd = 0.55 * shape.sd;
    trace!(
        id = %record.id,
        sd = shape.sd,
        tail_fraction = shape.tail_fraction,
        main = shape.main_count,
        tail = shape.tail_count,
        "synthesizing scores"
    );

    let mut scores = Vec::with_capacity(shape.sample_count);
    for _ in 0..shape.main_count {
        let z: f64 = rng.sample(StandardNormal);
        scores.push((record.mean + z * shape.sd).clamp(0.0, 100.0));
    }
    for _ in 0..shape.tail_count {
        let z: f64 = rng.sample(StandardNormal);
        scores.push((tail_center + z * tail_sd).clamp(0.0, 100.0));
    }
    scores
}

/// Five-number summary a renderer draws the box plot from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BoxSummary {
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
}

impl BoxSummary {
    pub fn from_samples(samples: &[f64]) -> Option<Self> {
        if samples.is_empty() {
            return None;
        }
        let mut sorted = samples.to_vec();
        sorted.sort_by(|a, b| a.total_cmp(b));
        Some(Self {
            min: sorted[0],
            q1: quantile(&sorted, 0.25),
            median: quantile(&sorted, 0.5),
            q3: quantile(&sorted, 0.75),
            max: sorted[sorted.len() - 1],
        })
    }
}

// linear interpolation between closest ranks
fn quantile(sorted: &[f64], q: f64) -> f64 {
    let pos = q * (sorted.len() - 1) as f64;
    let lower = pos.floor() as usize;
    let upper = pos.ceil() as usize;
    let frac = pos - lower as f64;
    sorted[lower] + (sorted[upper] - sorted[lower]) * frac
}
