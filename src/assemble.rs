//! Display tables derived from an analysis result
//!
//! These mirror what ggmuller expects: a long population table
//! (Generation, Identity, Population) including the background genotype, and
//! a (Parent, Identity) edge table.

use crate::genotypes::GenotypeSet;
use crate::lineage::{LineageMap, ROOT_GENOTYPE};
use crate::pipeline::AnalysisResult;
use crate::table::TrajectoryTable;

/// Label used for trajectories that belong to no genotype.
pub const REJECTED: &str = "rejected";

#[derive(Debug, Clone, PartialEq)]
pub struct PopulationRow {
    pub generation: f64,
    pub identity: String,
    pub population: f64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EdgeRow {
    pub parent: String,
    pub identity: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrajectoryRow {
    pub id: String,
    pub frequencies: Vec<f64>,
    pub genotype: String,
}

/// Long-format populations, one row per (timepoint, genotype).
///
/// Each genotype's frequency includes its descendants, so every row holds only
/// what its direct children leave over (clamped at 0). The background row is
/// whatever the root lineages leave unexplained.
pub fn population_table(result: &AnalysisResult) -> Vec<PopulationRow> {
    let sorted = result.sorted_genotypes();
    let lineage = result.lineage();
    let width = sorted.timepoints().len();

    let mut own: Vec<Vec<f64>> = (0..sorted.len()).map(|i| sorted.row(i).to_vec()).collect();
    let mut background = vec![1.0; width];
    for (child, frequencies) in sorted.iter() {
        let target = match lineage.parent_of(child) {
            Some(ROOT_GENOTYPE) | None => &mut background,
            Some(parent) => match sorted.index_of(parent) {
                Some(p) => &mut own[p],
                None => continue,
            },
        };
        for (slot, value) in target.iter_mut().zip(frequencies) {
            *slot -= value;
        }
    }

    let mut rows = Vec::with_capacity(width * (sorted.len() + 1));
    for (t, &generation) in sorted.timepoints().iter().enumerate() {
        rows.push(PopulationRow {
            generation,
            identity: ROOT_GENOTYPE.to_string(),
            population: background[t].max(0.0),
        });
        for (i, name) in sorted.ids().iter().enumerate() {
            rows.push(PopulationRow {
                generation,
                identity: name.clone(),
                population: own[i][t].max(0.0),
            });
        }
    }
    rows
}

/// One (parent, child) row per genotype, in sorted order.
pub fn edge_table(lineage: &LineageMap) -> Vec<EdgeRow> {
    lineage
        .edges()
        .map(|(parent, identity)| EdgeRow {
            parent: parent.to_string(),
            identity: identity.to_string(),
        })
        .collect()
}

/// Genotype name and its members joined with `|`, in the table's order.
pub fn genotype_member_table(sorted: &TrajectoryTable, genotypes: &GenotypeSet) -> Vec<(String, String)> {
    sorted
        .ids()
        .iter()
        .filter_map(|name| {
            genotypes
                .members_of(name)
                .map(|members| (name.clone(), members.join("|")))
        })
        .collect()
}

/// Input trajectories annotated with their genotype (or `rejected`).
pub fn annotated_trajectory_table(
    trajectories: &TrajectoryTable,
    genotypes: &GenotypeSet,
) -> Vec<TrajectoryRow> {
    trajectories
        .iter()
        .map(|(id, frequencies)| TrajectoryRow {
            id: id.to_string(),
            frequencies: frequencies.to_vec(),
            genotype: genotypes.genotype_of(id).unwrap_or(REJECTED).to_string(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AnalysisConfig;
    use crate::pipeline::run_analysis;

    fn result() -> (TrajectoryTable, AnalysisResult) {
        let table = TrajectoryTable::new(
            vec!["a".into(), "b".into(), "z".into()],
            vec![0.0, 1.0, 2.0, 3.0],
            vec![
                vec![0.0, 0.5, 0.9, 1.0],
                vec![0.0, 0.0, 0.3, 0.6],
                vec![0.0, 0.01, 0.0, 0.02],
            ],
        )
        .unwrap();
        let result = run_analysis(&table, &AnalysisConfig::default()).unwrap();
        (table, result)
    }

    #[test]
    fn test_population_table_includes_background() {
        let (_, result) = result();
        let rows = population_table(&result);
        let genotypes = result.sorted_genotypes().len();
        assert_eq!(rows.len(), 4 * (genotypes + 1));

        let background: Vec<f64> = rows
            .iter()
            .filter(|r| r.identity == ROOT_GENOTYPE)
            .map(|r| r.population)
            .collect();
        assert_eq!(background.len(), 4);
        assert!((background[0] - 1.0).abs() < 1e-12);
        assert!(background.iter().all(|&p| (0.0..=1.0).contains(&p)));
    }

    #[test]
    fn test_parent_population_excludes_nested_child() {
        let (_, result) = result();
        let rows = population_table(&result);
        let at = |identity: &str, generation: f64| {
            rows.iter()
                .find(|r| r.identity == identity && r.generation == generation)
                .map(|r| r.population)
                .unwrap()
        };
        let parent = result.genotypes().genotype_of("a").unwrap();
        let child = result.genotypes().genotype_of("b").unwrap();
        assert_eq!(result.lineage().parent_of(child), Some(parent));
        // a holds 1.0 at the last timepoint, 0.6 of which is b.
        assert!((at(parent, 3.0) - 0.4).abs() < 1e-12);
        assert!((at(child, 3.0) - 0.6).abs() < 1e-12);
        assert!((at(ROOT_GENOTYPE, 3.0)).abs() < 1e-12);
    }

    #[test]
    fn test_edge_table_has_one_row_per_genotype() {
        let (_, result) = result();
        let edges = edge_table(result.lineage());
        assert_eq!(edges.len(), result.sorted_genotypes().len());
        assert_eq!(edges[0].parent, ROOT_GENOTYPE);
    }

    #[test]
    fn test_rejected_trajectories_are_labelled() {
        let (table, result) = result();
        let rows = annotated_trajectory_table(&table, result.genotypes());
        let z = rows.iter().find(|r| r.id == "z").unwrap();
        assert_eq!(z.genotype, REJECTED);
        assert!(rows.iter().filter(|r| r.id != "z").all(|r| r.genotype.starts_with("genotype-")));
    }

    #[test]
    fn test_member_table_joins_ids() {
        let (_, result) = result();
        let members = genotype_member_table(result.sorted_genotypes(), result.genotypes());
        let all: Vec<&str> = members
            .iter()
            .flat_map(|(_, m)| m.split('|'))
            .collect();
        assert_eq!(all.len(), 2);
        assert!(all.contains(&"a") && all.contains(&"b"));
    }
}
