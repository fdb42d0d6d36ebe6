//! Genotype formation by significance-based merging
//!
//! Trajectories that are not significantly different from each other
//! (binomial probability at or above the similarity cutoff) are linked, and
//! links are transitive: the genotypes are the connected components of that
//! graph. Trajectories that are never detected are rejected up front.

use indexmap::IndexMap;
use log::{debug, info};
use rayon::prelude::*;

use crate::config::AnalysisConfig;
use crate::distance::binomial_probability;
use crate::error::{MullerError, Result};
use crate::table::{natural_cmp, TrajectoryTable};
use crate::union_find::UnionFind;

/// Prefix of generated genotype names; `genotype-0` is reserved for the root.
pub const GENOTYPE_PREFIX: &str = "genotype-";

/// Timepoints that carry information about whether two trajectories differ.
///
/// A timepoint is dropped when both trajectories are below the detection
/// breakpoint or both are above the fixed breakpoint.
pub fn informative_timepoints(
    left: &[f64],
    right: &[f64],
    detection_breakpoint: f64,
    fixed_breakpoint: f64,
) -> Vec<usize> {
    (0..left.len().min(right.len()))
        .filter(|&i| {
            let (l, r) = (left[i], right[i]);
            let undetected = l < detection_breakpoint && r < detection_breakpoint;
            let fixed = l > fixed_breakpoint && r > fixed_breakpoint;
            !(undetected || fixed)
        })
        .collect()
}

/// Binomial probability of two trajectories over their informative timepoints.
///
/// Falls back to the full axis when no timepoint is informative.
pub fn pairwise_probability(left: &[f64], right: &[f64], config: &AnalysisConfig) -> Result<f64> {
    if left.len() != right.len() {
        return Err(MullerError::domain("trajectories do not share a timepoint axis"));
    }
    let keep = informative_timepoints(
        left,
        right,
        config.detection_breakpoint,
        config.fixed_breakpoint,
    );
    if keep.is_empty() {
        debug!("No informative timepoints; comparing over the full axis");
        return binomial_probability(left, right);
    }

    let l: Vec<f64> = keep.iter().map(|&i| left[i]).collect();
    let r: Vec<f64> = keep.iter().map(|&i| right[i]).collect();
    binomial_probability(&l, &r)
}

/// Symmetric matrix of pairwise probabilities, diagonal 1.0.
#[derive(Debug, Clone, PartialEq)]
pub struct PairwiseMatrix {
    ids: Vec<String>,
    values: Vec<f64>,
}

impl PairwiseMatrix {
    /// Compute every unordered pair of the given rows in parallel.
    pub fn compute(
        table: &TrajectoryTable,
        rows: &[usize],
        config: &AnalysisConfig,
    ) -> Result<Self> {
        let n = rows.len();
        let pairs: Vec<(usize, usize)> = (0..n)
            .flat_map(|i| ((i + 1)..n).map(move |j| (i, j)))
            .collect();

        let scores: Vec<f64> = pairs
            .par_iter()
            .map(|&(i, j)| pairwise_probability(table.row(rows[i]), table.row(rows[j]), config))
            .collect::<Result<Vec<f64>>>()?;

        let mut values = vec![1.0; n * n];
        for (&(i, j), &score) in pairs.iter().zip(&scores) {
            values[i * n + j] = score;
            values[j * n + i] = score;
        }

        Ok(PairwiseMatrix {
            ids: rows.iter().map(|&r| table.id(r).to_string()).collect(),
            values,
        })
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    /// Probability between the i-th and j-th compared trajectories.
    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.values[i * self.ids.len() + j]
    }
}

/// Output of the builder: mean genotype table plus membership.
#[derive(Debug, Clone)]
pub struct GenotypeSet {
    table: TrajectoryTable,
    members: IndexMap<String, Vec<String>>,
    rejected: Vec<String>,
    pairwise: PairwiseMatrix,
}

impl GenotypeSet {
    /// Mean trajectory per genotype, in creation order.
    pub fn table(&self) -> &TrajectoryTable {
        &self.table
    }

    /// Genotype name to member trajectory ids (ascending).
    pub fn members(&self) -> &IndexMap<String, Vec<String>> {
        &self.members
    }

    pub fn members_of(&self, genotype: &str) -> Option<&[String]> {
        self.members.get(genotype).map(Vec::as_slice)
    }

    /// Trajectories that never exceeded the detection breakpoint.
    pub fn rejected(&self) -> &[String] {
        &self.rejected
    }

    pub fn pairwise(&self) -> &PairwiseMatrix {
        &self.pairwise
    }

    /// Genotype a trajectory was assigned to, or None if it was rejected.
    pub fn genotype_of(&self, trajectory: &str) -> Option<&str> {
        self.members
            .iter()
            .find(|(_, ids)| ids.iter().any(|id| id == trajectory))
            .map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

/// Arithmetic mean of the given rows at each timepoint.
pub fn mean_trajectory(table: &TrajectoryTable, rows: &[usize]) -> Vec<f64> {
    let mut mean = vec![0.0; table.timepoints().len()];
    if rows.is_empty() {
        return mean;
    }
    for &r in rows {
        for (acc, value) in mean.iter_mut().zip(table.row(r)) {
            *acc += value;
        }
    }
    let n = rows.len() as f64;
    mean.iter_mut().for_each(|v| *v /= n);
    mean
}

pub struct GenotypeBuilder<'a> {
    config: &'a AnalysisConfig,
}

impl<'a> GenotypeBuilder<'a> {
    pub fn new(config: &'a AnalysisConfig) -> Self {
        GenotypeBuilder { config }
    }

    /// Partition the trajectories into genotypes.
    pub fn build(&self, trajectories: &TrajectoryTable) -> Result<GenotypeSet> {
        let detection = self.config.detection_breakpoint;

        let mut rejected = Vec::new();
        let mut candidates = Vec::new();
        for (index, (id, row)) in trajectories.iter().enumerate() {
            if row.iter().all(|&v| v <= detection) {
                rejected.push(id.to_string());
            } else {
                candidates.push(index);
            }
        }
        rejected.sort_by(|a, b| natural_cmp(a, b));
        candidates.sort_by(|&a, &b| natural_cmp(trajectories.id(a), trajectories.id(b)));

        if candidates.is_empty() {
            return Err(MullerError::input_shape(format!(
                "all {} trajectories are below the detection breakpoint ({detection})",
                trajectories.len()
            )));
        }

        let pairwise = PairwiseMatrix::compute(trajectories, &candidates, self.config)?;

        // Merge in ascending id order so the result is reproducible.
        let n = candidates.len();
        let mut clusters = UnionFind::new(n);
        for i in 0..n {
            for j in (i + 1)..n {
                if clusters.connected(i, j) {
                    continue;
                }
                let p = pairwise.get(i, j);
                if p >= self.config.similarity_cutoff && clusters.union(i, j) {
                    debug!(
                        "Linked trajectory {} with {} (p = {p:.4})",
                        pairwise.ids()[i],
                        pairwise.ids()[j]
                    );
                }
            }
        }

        let mut members = IndexMap::with_capacity(clusters.set_count());
        let mut names = Vec::with_capacity(clusters.set_count());
        let mut means = Vec::with_capacity(clusters.set_count());
        for (k, group) in clusters.get_sets().into_iter().enumerate() {
            let name = format!("{GENOTYPE_PREFIX}{}", k + 1);
            let rows: Vec<usize> = group.iter().map(|&g| candidates[g]).collect();
            means.push(mean_trajectory(trajectories, &rows));
            members.insert(
                name.clone(),
                rows.iter().map(|&r| trajectories.id(r).to_string()).collect(),
            );
            names.push(name);
        }

        info!(
            "Grouped {} trajectories into {} genotypes ({} rejected)",
            n,
            members.len(),
            rejected.len()
        );

        let table = TrajectoryTable::new(names, trajectories.timepoints().to_vec(), means)?;
        Ok(GenotypeSet {
            table,
            members,
            rejected,
            pairwise,
        })
    }
}
