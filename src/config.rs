/// Analysis configuration shared by every pipeline stage
///
/// One immutable `AnalysisConfig` is built up front (from CLI flags or the
/// MATLAB compatibility preset), validated once, and then passed by reference
/// into the builder, sorter and resolver.
use crate::error::{MullerError, Result};

/// Default step used to derive the sorting breakpoints.
pub const DEFAULT_FREQUENCY_STEP: f64 = 0.15;

#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisConfig {
    /// Minimum frequency for a trajectory to count as present at a timepoint.
    pub detection_breakpoint: f64,
    /// Frequency above which a trajectory is considered fixed.
    pub fixed_breakpoint: f64,
    /// Frequency at which a genotype is significantly above zero.
    pub significant_breakpoint: f64,
    /// p-value at or above which two trajectories are linked into one genotype.
    /// In the lineage fallback, candidates below it are unrelated.
    pub similarity_cutoff: f64,
    /// p-value above which two genotypes cannot be told apart (same lineage).
    pub difference_cutoff: f64,
    /// Strictly decreasing tiers used by the sorter, e.g. [1.0, 0.85, ..., 0.0].
    pub frequency_breakpoints: Vec<f64>,
    /// Slack allowed when testing whether a genotype fits inside a candidate.
    pub containment_tolerance: f64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        AnalysisConfig {
            detection_breakpoint: 0.03,
            fixed_breakpoint: 0.97,
            significant_breakpoint: 0.15,
            similarity_cutoff: 0.05,
            difference_cutoff: 0.10,
            frequency_breakpoints: frequency_breakpoints_from_step(DEFAULT_FREQUENCY_STEP)
                .unwrap_or_else(|_| vec![1.0, 0.0]),
            containment_tolerance: 1e-6,
        }
    }
}

impl AnalysisConfig {
    /// Fixed legacy values matching the MATLAB lineage scripts.
    pub fn matlab() -> Self {
        AnalysisConfig {
            detection_breakpoint: 0.03,
            fixed_breakpoint: 0.97,
            significant_breakpoint: 0.15,
            similarity_cutoff: 0.05,
            difference_cutoff: 0.10,
            frequency_breakpoints: vec![1.0, 0.9, 0.8, 0.7, 0.6, 0.5, 0.4, 0.3, 0.2, 0.1, 0.0],
            containment_tolerance: 1e-6,
        }
    }

    pub fn with_frequency_breakpoints(mut self, breakpoints: Vec<f64>) -> Self {
        self.frequency_breakpoints = breakpoints;
        self
    }

    /// Check every threshold precondition. Called once before any clustering.
    pub fn validate(&self) -> Result<()> {
        let named = [
            ("detection breakpoint", self.detection_breakpoint),
            ("fixed breakpoint", self.fixed_breakpoint),
            ("significant breakpoint", self.significant_breakpoint),
            ("similarity cutoff", self.similarity_cutoff),
            ("difference cutoff", self.difference_cutoff),
        ];
        for (name, value) in named {
            if !value.is_finite() || !(0.0..=1.0).contains(&value) {
                return Err(MullerError::configuration(format!(
                    "{name} must lie in [0, 1], got {value}"
                )));
            }
        }

        if self.detection_breakpoint >= self.fixed_breakpoint {
            return Err(MullerError::configuration(format!(
                "detection breakpoint ({}) must be below fixed breakpoint ({})",
                self.detection_breakpoint, self.fixed_breakpoint
            )));
        }

        // Lineage fallback bands: [0, similarity) unrelated,
        // [similarity, difference] child, (difference, 1] same lineage.
        if self.similarity_cutoff > self.difference_cutoff {
            return Err(MullerError::configuration(format!(
                "similarity cutoff ({}) must not exceed difference cutoff ({})",
                self.similarity_cutoff, self.difference_cutoff
            )));
        }

        if self.frequency_breakpoints.is_empty() {
            return Err(MullerError::configuration("no frequency breakpoints given"));
        }
        if self
            .frequency_breakpoints
            .iter()
            .any(|b| !b.is_finite() || !(0.0..=1.0).contains(b))
        {
            return Err(MullerError::configuration(
                "frequency breakpoints must lie in [0, 1]",
            ));
        }
        if self.frequency_breakpoints.windows(2).any(|w| w[0] <= w[1]) {
            return Err(MullerError::configuration(
                "frequency breakpoints must be strictly decreasing",
            ));
        }

        if !self.containment_tolerance.is_finite() || self.containment_tolerance < 0.0 {
            return Err(MullerError::configuration(
                "containment tolerance must be a non-negative number",
            ));
        }

        Ok(())
    }
}

fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

/// Build the descending sorting tiers from a single step.
///
/// 0.15 gives [1.0, 0.85, 0.7, 0.55, 0.4, 0.25, 0.1, 0.0].
pub fn frequency_breakpoints_from_step(step: f64) -> Result<Vec<f64>> {
    if !step.is_finite() || step <= 0.0 || step > 1.0 {
        return Err(MullerError::configuration(format!(
            "frequency step must lie in (0, 1], got {step}"
        )));
    }

    // Rounded first so that 1/0.1 does not land on 9.999...
    let count = round2(1.0 / step).floor() as usize;
    let mut breakpoints: Vec<f64> = (0..=count)
        .map(|i| round2(1.0 - i as f64 * step).max(0.0))
        .collect();
    breakpoints.dedup();
    if breakpoints.last().copied() != Some(0.0) {
        breakpoints.push(0.0);
    }
    Ok(breakpoints)
}

/// Parse a `--frequencies` value: one step ("0.15") or an explicit list ("1,0.5,0").
pub fn parse_frequency_breakpoints(value: &str) -> Result<Vec<f64>> {
    let value = value.trim();
    if !value.contains(',') {
        let step: f64 = value.parse().map_err(|_| {
            MullerError::configuration(format!("invalid frequency step '{value}'"))
        })?;
        return frequency_breakpoints_from_step(step);
    }

    let mut breakpoints = value
        .split(',')
        .map(|part| {
            let part = part.trim();
            part.parse::<f64>()
                .map(round2)
                .map_err(|_| MullerError::configuration(format!("invalid frequency '{part}'")))
        })
        .collect::<Result<Vec<f64>>>()?;
    breakpoints.sort_by(|a, b| b.total_cmp(a));
    breakpoints.dedup();
    Ok(breakpoints)
}
