//! Lineage inference between sorted genotypes
//!
//! Genotypes are placed one at a time in sort order. A genotype nests under
//! the most recently placed genotype whose remaining (unexplained) frequency
//! can hold it at every timepoint it is present. When nothing can hold it, the
//! binomial probability against every placed genotype decides between child,
//! same lineage, and a new root lineage. Each placement subtracts the child's
//! frequency from its parent's remaining frequency, so two children can never
//! be approved against the same frequency budget.

use indexmap::IndexMap;
use log::{debug, info, warn};

use crate::config::AnalysisConfig;
use crate::distance::binomial_probability;
use crate::error::{MullerError, Result};
use crate::table::TrajectoryTable;

/// Background population every lineage ultimately descends from.
pub const ROOT_GENOTYPE: &str = "genotype-0";

/// How a genotype obtained its parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// Fits inside the parent's remaining frequency.
    Contained,
    /// No container; the significance test put it under the best candidate.
    Child,
    /// Indistinguishable from a candidate; placed beside it under the candidate's parent.
    SameLineage,
    /// Nothing qualified; descends from the background.
    Root,
}

/// Child genotype -> parent genotype, in the order genotypes were placed.
#[derive(Debug, Clone, PartialEq)]
pub struct LineageMap {
    parents: IndexMap<String, (String, Placement)>,
    merged: Vec<(String, String)>,
}

impl LineageMap {
    pub fn len(&self) -> usize {
        self.parents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parents.is_empty()
    }

    pub fn parent_of(&self, genotype: &str) -> Option<&str> {
        self.parents.get(genotype).map(|(parent, _)| parent.as_str())
    }

    pub fn placement(&self, genotype: &str) -> Option<Placement> {
        self.parents.get(genotype).map(|(_, placement)| *placement)
    }

    /// Genotypes in placement (sorted) order.
    pub fn genotypes(&self) -> impl Iterator<Item = &str> {
        self.parents.keys().map(String::as_str)
    }

    /// (parent, child) pairs in placement order.
    pub fn edges(&self) -> impl Iterator<Item = (&str, &str)> {
        self.parents
            .iter()
            .map(|(child, (parent, _))| (parent.as_str(), child.as_str()))
    }

    pub fn children_of<'a>(&'a self, genotype: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.edges()
            .filter(move |(parent, _)| *parent == genotype)
            .map(|(_, child)| child)
    }

    /// Parent chain from `genotype` up to and including the root.
    pub fn ancestry(&self, genotype: &str) -> Vec<&str> {
        let mut chain = Vec::new();
        let mut current = genotype;
        // Parents are always placed earlier, so the walk is bounded.
        for _ in 0..=self.parents.len() {
            match self.parent_of(current) {
                Some(parent) => {
                    chain.push(parent);
                    if parent == ROOT_GENOTYPE {
                        break;
                    }
                    current = parent;
                }
                None => break,
            }
        }
        chain
    }

    /// (genotype, candidate) pairs judged to be the same lineage.
    pub fn merged(&self) -> &[(String, String)] {
        &self.merged
    }
}

pub struct LineageResolver<'a> {
    config: &'a AnalysisConfig,
}

impl<'a> LineageResolver<'a> {
    pub fn new(config: &'a AnalysisConfig) -> Self {
        LineageResolver { config }
    }

    /// Timepoints at which the genotype counts as present.
    fn presence(&self, trajectory: &[f64]) -> Vec<usize> {
        let detected: Vec<usize> = (0..trajectory.len())
            .filter(|&t| trajectory[t] > self.config.detection_breakpoint)
            .collect();
        if !detected.is_empty() {
            return detected;
        }
        (0..trajectory.len()).filter(|&t| trajectory[t] > 0.0).collect()
    }

    fn fits_inside(&self, trajectory: &[f64], remaining: &[f64], present: &[usize]) -> bool {
        let tolerance = self.config.containment_tolerance;
        present
            .iter()
            .all(|&t| remaining[t] >= trajectory[t] - tolerance)
    }

    /// Candidate with the highest binomial probability; ties go to the earlier one.
    fn most_similar(&self, sorted: &TrajectoryTable, k: usize) -> Result<Option<(usize, f64)>> {
        let mut best: Option<(usize, f64)> = None;
        for j in 0..k {
            let p = binomial_probability(sorted.row(k), sorted.row(j))?;
            if best.map_or(true, |(_, best_p)| p > best_p) {
                best = Some((j, p));
            }
        }
        Ok(best)
    }

    /// Build the lineage map for a table already in emergence order.
    pub fn resolve(&self, sorted: &TrajectoryTable) -> Result<LineageMap> {
        if sorted.ids().iter().any(|id| id == ROOT_GENOTYPE) {
            return Err(MullerError::input_shape(format!(
                "'{ROOT_GENOTYPE}' is reserved for the background population"
            )));
        }

        let mut remaining: Vec<Vec<f64>> = (0..sorted.len()).map(|i| sorted.row(i).to_vec()).collect();
        let mut parent_index: Vec<Option<usize>> = Vec::with_capacity(sorted.len());
        let mut parents = IndexMap::with_capacity(sorted.len());
        let mut merged = Vec::new();

        for k in 0..sorted.len() {
            let name = sorted.id(k);
            let trajectory = sorted.row(k);
            let present = self.presence(trajectory);

            let (parent, placement) = if present.is_empty() {
                warn!("Genotype {name} is never present; placing it under the background");
                (None, Placement::Root)
            } else if let Some(j) =
                (0..k).rev().find(|&j| self.fits_inside(trajectory, &remaining[j], &present))
            {
                (Some(j), Placement::Contained)
            } else {
                match self.most_similar(sorted, k)? {
                    Some((_, p)) if p < self.config.similarity_cutoff => (None, Placement::Root),
                    Some((j, p)) if p > self.config.difference_cutoff => {
                        debug!(
                            "Genotype {name} is indistinguishable from {} (p = {p:.4})",
                            sorted.id(j)
                        );
                        merged.push((name.to_string(), sorted.id(j).to_string()));
                        (parent_index[j], Placement::SameLineage)
                    }
                    Some((j, _)) => (Some(j), Placement::Child),
                    None => (None, Placement::Root),
                }
            };

            if let Some(p) = parent {
                for (slot, value) in remaining[p].iter_mut().zip(trajectory) {
                    *slot = (*slot - value).max(0.0);
                }
            }

            let parent_name = parent.map_or(ROOT_GENOTYPE, |p| sorted.id(p));
            debug!("Assigned {name} -> {parent_name} ({placement:?})");
            parent_index.push(parent);
            parents.insert(name.to_string(), (parent_name.to_string(), placement));
        }

        info!(
            "Resolved lineages for {} genotypes ({} background lineages, {} same-lineage merges)",
            parents.len(),
            parents.values().filter(|(p, _)| p == ROOT_GENOTYPE).count(),
            merged.len()
        );

        Ok(LineageMap { parents, merged })
    }
}
