/// Property-based tests for the distance measures and pipeline invariants
///
/// Uses proptest over random trajectory tables on a fixed axis.
use muller::distance::{binomial_distance, binomial_probability, minkowski_distance};
use muller::genotypes::GenotypeBuilder;
use muller::sort_genotypes::GenotypeSorter;
use muller::{run_analysis, AnalysisConfig, TrajectoryTable, ROOT_GENOTYPE};
use proptest::prelude::*;

const WIDTH: usize = 6;

fn frequencies() -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(0.0f64..=1.0, WIDTH)
}

/// Tables of 1..12 rows where the first row is always detected.
fn tables() -> impl Strategy<Value = TrajectoryTable> {
    prop::collection::vec(frequencies(), 1..12).prop_map(|mut rows| {
        rows[0][WIDTH - 1] = 0.5;
        TrajectoryTable::new(
            (0..rows.len()).map(|i| (i + 1).to_string()).collect(),
            (0..WIDTH).map(|t| (t * 10) as f64).collect(),
            rows,
        )
        .unwrap()
    })
}

/// Property: Minkowski distance does not depend on argument order
#[test]
fn prop_minkowski_symmetric() {
    proptest!(|(left in frequencies(), right in frequencies(), p in 0.5f64..4.0)| {
        let forward = minkowski_distance(&left, &right, p).unwrap();
        let backward = minkowski_distance(&right, &left, p).unwrap();
        prop_assert!((forward - backward).abs() < 1e-12);
        prop_assert!(forward >= 0.0);
    });
}

/// Property: a trajectory is never distinguishable from itself
#[test]
fn prop_binomial_self_distance_is_zero() {
    proptest!(|(series in frequencies())| {
        prop_assert_eq!(binomial_distance(&series, &series).unwrap(), 0.0);
        prop_assert_eq!(binomial_probability(&series, &series).unwrap(), 1.0);
    });
}

/// Property: binomial probability always lies in [0, 1]
#[test]
fn prop_binomial_probability_in_unit_interval() {
    proptest!(|(left in frequencies(), right in frequencies())| {
        let p = binomial_probability(&left, &right).unwrap();
        prop_assert!((0.0..=1.0).contains(&p));
    });
}

/// Property: every trajectory is either in exactly one genotype or rejected
#[test]
fn prop_genotypes_partition_trajectories() {
    proptest!(|(table in tables())| {
        let config = AnalysisConfig::default();
        let set = GenotypeBuilder::new(&config).build(&table).unwrap();
        for id in table.ids() {
            let groups = set.members().values().filter(|m| m.contains(id)).count();
            let rejected = set.rejected().contains(id);
            prop_assert!(groups + usize::from(rejected) == 1, "{} placed {} times", id, groups);
        }
    });
}

/// Property: sorting only permutes rows
#[test]
fn prop_sort_is_a_permutation() {
    proptest!(|(table in tables())| {
        let config = AnalysisConfig::default();
        let order = GenotypeSorter::new(&config).sort_order(&table).unwrap();
        let mut seen = order.clone();
        seen.sort_unstable();
        prop_assert_eq!(seen, (0..table.len()).collect::<Vec<_>>());
    });
}

/// Property: the lineage map is a forest rooted at the background genotype
#[test]
fn prop_lineage_is_a_forest() {
    proptest!(|(table in tables())| {
        let result = run_analysis(&table, &AnalysisConfig::default()).unwrap();
        let sorted = result.sorted_genotypes();
        let lineage = result.lineage();
        prop_assert_eq!(lineage.len(), sorted.len());
        for (position, genotype) in lineage.genotypes().enumerate() {
            prop_assert_eq!(genotype, sorted.id(position));
            let parent = lineage.parent_of(genotype).unwrap();
            prop_assert!(parent != genotype);
            if parent != ROOT_GENOTYPE {
                prop_assert!(sorted.index_of(parent).unwrap() < position);
            }
            prop_assert_eq!(lineage.ancestry(genotype).last().copied(), Some(ROOT_GENOTYPE));
        }
    });
}
