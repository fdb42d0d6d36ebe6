//! Pairwise distance and similarity scores between frequency trajectories
//!
//! Every function takes two series aligned on the same timepoint axis and is
//! pure and symmetric in its arguments. The binomial probability is the score
//! the genotype builder and lineage resolver threshold on; the other metrics
//! are reported alongside it.

use statrs::function::erf::erf;

use crate::error::{MullerError, Result};

/// Frequency below which a curve does not contribute to the shared area.
pub const DEFAULT_AREA_FLOOR: f64 = 0.03;

fn check_aligned(left: &[f64], right: &[f64]) -> Result<()> {
    if left.len() != right.len() {
        return Err(MullerError::domain(format!(
            "series have different lengths ({} vs {})",
            left.len(),
            right.len()
        )));
    }
    if left.is_empty() {
        return Err(MullerError::domain("series are empty"));
    }
    Ok(())
}

/// Generic lp-norm of the difference: (Σ|lᵢ − rᵢ|^p)^(1/p).
pub fn minkowski_distance(left: &[f64], right: &[f64], p: f64) -> Result<f64> {
    if !p.is_finite() || p <= 0.0 {
        return Err(MullerError::configuration(format!(
            "minkowski exponent must be positive, got {p}"
        )));
    }
    check_aligned(left, right)?;

    let total: f64 = left
        .iter()
        .zip(right)
        .map(|(l, r)| (l - r).abs().powf(p))
        .sum();
    Ok(total.powf(1.0 / p))
}

/// 1 − Pearson correlation, in [0, 2].
pub fn pearson_distance(left: &[f64], right: &[f64]) -> Result<f64> {
    check_aligned(left, right)?;

    let n = left.len() as f64;
    let mean_left = left.iter().sum::<f64>() / n;
    let mean_right = right.iter().sum::<f64>() / n;

    let mut covariance = 0.0;
    let mut variance_left = 0.0;
    let mut variance_right = 0.0;
    for (l, r) in left.iter().zip(right) {
        let dl = l - mean_left;
        let dr = r - mean_right;
        covariance += dl * dr;
        variance_left += dl * dl;
        variance_right += dr * dr;
    }

    if variance_left <= f64::EPSILON || variance_right <= f64::EPSILON {
        return Err(MullerError::domain(
            "pearson correlation is undefined for a constant series",
        ));
    }

    let pcc = (covariance / (variance_left.sqrt() * variance_right.sqrt())).clamp(-1.0, 1.0);
    Ok(1.0 - pcc)
}

/// Difference of two trajectories in units of binomial sampling noise.
///
/// With p̄ᵢ the mean of both frequencies at timepoint i, σ the average of
/// p̄ᵢ(1 − p̄ᵢ) and d = Σ|rᵢ − lᵢ|, returns X = d / √(2σ). Identical series give
/// 0 even when σ is 0; different series with σ = 0 give +∞.
pub fn binomial_distance(left: &[f64], right: &[f64]) -> Result<f64> {
    check_aligned(left, right)?;

    let n = left.len() as f64;
    let mut sigma = 0.0;
    let mut difference = 0.0;
    for (l, r) in left.iter().zip(right) {
        let mean = (l + r) / 2.0;
        sigma += mean * (1.0 - mean);
        difference += (r - l).abs();
    }
    let sigma = sigma / n;

    if difference == 0.0 {
        return Ok(0.0);
    }
    if sigma <= 0.0 {
        return Ok(f64::INFINITY);
    }
    Ok(difference / (2.0 * sigma).sqrt())
}

/// 1 − erf(X) of the binomial distance. Near 1 means the two series differ
/// only by sampling noise; near 0 means they are significantly different.
pub fn binomial_probability(left: &[f64], right: &[f64]) -> Result<f64> {
    let x = binomial_distance(left, right)?;
    if x == 0.0 {
        return Ok(1.0);
    }
    if x.is_infinite() {
        return Ok(0.0);
    }
    Ok((1.0 - erf(x)).clamp(0.0, 1.0))
}

fn trapezoid(timepoints: &[f64], values: impl Fn(usize) -> f64) -> f64 {
    timepoints
        .windows(2)
        .enumerate()
        .map(|(i, w)| (w[1] - w[0]) * (values(i) + values(i + 1)) / 2.0)
        .sum()
}

/// Area under a frequency curve over time (trapezoid rule).
pub fn area_of_series(timepoints: &[f64], series: &[f64]) -> Result<f64> {
    check_aligned(timepoints, series)?;
    Ok(trapezoid(timepoints, |i| series[i]))
}

/// Area both curves have in common. At timepoints where either curve is below
/// `floor` the overlap counts as zero.
pub fn common_area(timepoints: &[f64], left: &[f64], right: &[f64], floor: f64) -> Result<f64> {
    check_aligned(timepoints, left)?;
    check_aligned(left, right)?;

    let shared: Vec<f64> = left
        .iter()
        .zip(right)
        .map(|(&l, &r)| if l >= floor && r >= floor { l.min(r) } else { 0.0 })
        .collect();
    Ok(trapezoid(timepoints, |i| shared[i]))
}

pub fn bray_curtis_distance(
    timepoints: &[f64],
    left: &[f64],
    right: &[f64],
    floor: f64,
) -> Result<f64> {
    let area_left = area_of_series(timepoints, left)?;
    let area_right = area_of_series(timepoints, right)?;
    let shared = common_area(timepoints, left, right, floor)?;

    let total = area_left + area_right;
    if total <= 0.0 {
        return Err(MullerError::domain("bray-curtis is undefined for two zero-area series"));
    }
    Ok(1.0 - (2.0 * shared) / total)
}

pub fn jaccard_distance(
    timepoints: &[f64],
    left: &[f64],
    right: &[f64],
    floor: f64,
) -> Result<f64> {
    let area_left = area_of_series(timepoints, left)?;
    let area_right = area_of_series(timepoints, right)?;
    let shared = common_area(timepoints, left, right, floor)?;

    let union = area_left + area_right - shared;
    if union <= 0.0 {
        return Err(MullerError::domain("jaccard is undefined for two zero-area series"));
    }
    Ok(1.0 - shared / union)
}

/// 2·pearson + minkowski(p = 2). Auxiliary ranking signal only.
pub fn combined_score(left: &[f64], right: &[f64]) -> Result<f64> {
    Ok(2.0 * pearson_distance(left, right)? + minkowski_distance(left, right, 2.0)?)
}

/// Every named score for one pair of series.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DistanceResult {
    pub minkowski: f64,
    pub pearson: f64,
    pub binomial_distance: f64,
    pub binomial_probability: f64,
    pub bray_curtis: f64,
    pub jaccard: f64,
    pub combined: f64,
}

impl DistanceResult {
    pub fn between(timepoints: &[f64], left: &[f64], right: &[f64]) -> Result<Self> {
        let minkowski = minkowski_distance(left, right, 2.0)?;
        let pearson = pearson_distance(left, right)?;
        Ok(DistanceResult {
            minkowski,
            pearson,
            binomial_distance: binomial_distance(left, right)?,
            binomial_probability: binomial_probability(left, right)?,
            bray_curtis: bray_curtis_distance(timepoints, left, right, DEFAULT_AREA_FLOOR)?,
            jaccard: jaccard_distance(timepoints, left, right, DEFAULT_AREA_FLOOR)?,
            combined: 2.0 * pearson + minkowski,
        })
    }
}
