/// End-to-end analysis: validate, cluster, sort, resolve lineages
///
/// A run either completes every stage or returns the first error; no partial
/// result is ever handed back.
use log::info;

use crate::config::AnalysisConfig;
use crate::error::Result;
use crate::genotypes::{GenotypeBuilder, GenotypeSet};
use crate::lineage::{LineageMap, LineageResolver};
use crate::sort_genotypes::GenotypeSorter;
use crate::table::TrajectoryTable;

#[derive(Debug, Clone)]
pub struct AnalysisResult {
    genotypes: GenotypeSet,
    sorted: TrajectoryTable,
    lineage: LineageMap,
}

impl AnalysisResult {
    /// Mean genotype trajectories in emergence order.
    pub fn sorted_genotypes(&self) -> &TrajectoryTable {
        &self.sorted
    }

    pub fn genotypes(&self) -> &GenotypeSet {
        &self.genotypes
    }

    pub fn lineage(&self) -> &LineageMap {
        &self.lineage
    }
}

pub fn run_analysis(trajectories: &TrajectoryTable, config: &AnalysisConfig) -> Result<AnalysisResult> {
    config.validate()?;
    info!(
        "Analysing {} trajectories over {} timepoints",
        trajectories.len(),
        trajectories.timepoints().len()
    );

    let genotypes = GenotypeBuilder::new(config).build(trajectories)?;
    let sorted = GenotypeSorter::new(config).sort(genotypes.table())?;
    let lineage = LineageResolver::new(config).resolve(&sorted)?;

    Ok(AnalysisResult {
        genotypes,
        sorted,
        lineage,
    })
}
