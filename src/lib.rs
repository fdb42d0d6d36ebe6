// Library exports for muller
pub mod assemble;
pub mod config;
pub mod distance;
pub mod error;
pub mod format_io;
pub mod genotypes;
pub mod lineage;
pub mod pipeline;
pub mod sort_genotypes;
pub mod table;
pub mod union_find;

pub use config::AnalysisConfig;
pub use error::{MullerError, Result};
pub use genotypes::{GenotypeBuilder, GenotypeSet};
pub use lineage::{LineageMap, LineageResolver, Placement, ROOT_GENOTYPE};
pub use pipeline::{run_analysis, AnalysisResult};
pub use sort_genotypes::GenotypeSorter;
pub use table::TrajectoryTable;
