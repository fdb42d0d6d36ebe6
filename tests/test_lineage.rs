/// Lineage inference over the full pipeline
mod common;

use common::{full_table, table_from};
use muller::assemble::{edge_table, population_table};
use muller::lineage::{LineageResolver, Placement};
use muller::{run_analysis, AnalysisConfig, ROOT_GENOTYPE};
use pretty_assertions::assert_eq;

#[test]
fn test_full_table_lineage() {
    let config = AnalysisConfig::matlab();
    let result = run_analysis(&full_table(), &config).unwrap();

    let order: Vec<&str> = result.sorted_genotypes().ids().iter().map(String::as_str).collect();
    assert_eq!(
        order,
        vec!["genotype-1", "genotype-3", "genotype-2", "genotype-5", "genotype-4"]
    );

    let edges: Vec<(&str, &str)> = result.lineage().edges().collect();
    assert_eq!(
        edges,
        vec![
            (ROOT_GENOTYPE, "genotype-1"),
            ("genotype-1", "genotype-3"),
            (ROOT_GENOTYPE, "genotype-2"),
            (ROOT_GENOTYPE, "genotype-5"),
            ("genotype-2", "genotype-4"),
        ]
    );
    assert_eq!(result.lineage().placement("genotype-4"), Some(Placement::Contained));
    assert_eq!(
        result.lineage().ancestry("genotype-4"),
        vec!["genotype-2", ROOT_GENOTYPE]
    );
    assert!(result.lineage().merged().is_empty());
}

#[test]
fn test_default_breakpoints_give_the_same_tree() {
    let matlab = run_analysis(&full_table(), &AnalysisConfig::matlab()).unwrap();
    let default = run_analysis(&full_table(), &AnalysisConfig::default()).unwrap();
    assert_eq!(
        edge_table(matlab.lineage()),
        edge_table(default.lineage())
    );
}

#[test]
fn test_every_genotype_reaches_the_root() {
    let result = run_analysis(&full_table(), &AnalysisConfig::default()).unwrap();
    let lineage = result.lineage();
    assert_eq!(lineage.len(), result.sorted_genotypes().len());
    for genotype in lineage.genotypes() {
        assert_eq!(lineage.ancestry(genotype).last().copied(), Some(ROOT_GENOTYPE));
    }
}

#[test]
fn test_parents_precede_children() {
    let result = run_analysis(&full_table(), &AnalysisConfig::default()).unwrap();
    let sorted = result.sorted_genotypes();
    for (parent, child) in result.lineage().edges() {
        if parent == ROOT_GENOTYPE {
            continue;
        }
        assert!(sorted.index_of(parent).unwrap() < sorted.index_of(child).unwrap());
    }
}

#[test]
fn test_background_population() {
    let result = run_analysis(&full_table(), &AnalysisConfig::default()).unwrap();
    let background: Vec<f64> = population_table(&result)
        .into_iter()
        .filter(|row| row.identity == ROOT_GENOTYPE)
        .map(|row| row.population)
        .collect();
    // Root lineages: genotype-1, genotype-2 and genotype-5.
    let expected = [1.0, 0.62, 0.307, 0.0, 0.0, 0.0, 0.0];
    assert_eq!(background.len(), expected.len());
    for (b, e) in background.iter().zip(expected) {
        common::assert_close(*b, e, 1e-9);
    }
}

#[test]
fn test_populations_count_each_genotype_once() {
    let result = run_analysis(&full_table(), &AnalysisConfig::default()).unwrap();
    let rows = population_table(&result);
    let population = |identity: &str, generation: f64| {
        rows.iter()
            .find(|row| row.identity == identity && row.generation == generation)
            .map(|row| row.population)
            .unwrap()
    };

    // genotype-4 is nested in genotype-2, genotype-3 in genotype-1.
    common::assert_close(population("genotype-2", 66.0), 0.4482 - 0.1826, 1e-9);
    common::assert_close(population("genotype-4", 66.0), 0.1826, 1e-9);
    common::assert_close(population("genotype-1", 75.0), 0.0, 1e-9);
    common::assert_close(population("genotype-3", 75.0), 1.0, 1e-9);

    for generation in common::TIMEPOINTS {
        let total: f64 = rows
            .iter()
            .filter(|row| row.generation == generation)
            .map(|row| row.population)
            .sum();
        assert!(total >= 1.0 - 1e-9, "generation {generation} sums to {total}");
    }
}

#[test]
fn test_never_present_genotype_goes_to_root() {
    let config = AnalysisConfig::default();
    let table = table_from(&[
        ("genotype-1", [0.0, 0.2, 0.5, 0.9, 1.0, 1.0, 1.0]),
        ("genotype-2", [0.0; 7]),
    ]);
    let map = LineageResolver::new(&config).resolve(&table).unwrap();
    assert_eq!(map.parent_of("genotype-2"), Some(ROOT_GENOTYPE));
    assert_eq!(map.placement("genotype-2"), Some(Placement::Root));
}
