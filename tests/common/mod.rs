// Shared fixtures for integration tests
#![allow(dead_code)]

use muller::TrajectoryTable;

pub const TIMEPOINTS: [f64; 7] = [0.0, 17.0, 25.0, 44.0, 66.0, 75.0, 90.0];

/// Thirteen trajectories from a long-term evolution experiment.
pub const TRAJECTORIES: [(&str, [f64; 7]); 13] = [
    ("1", [0.0, 0.0, 0.261, 1.0, 1.0, 1.0, 1.0]),
    ("2", [0.0, 0.0, 0.0, 0.525, 0.454, 0.911, 0.91]),
    ("3", [0.0, 0.0, 0.0, 0.147, 0.45, 0.924, 0.887]),
    ("4", [0.0, 0.0, 0.0, 0.0, 0.211, 0.811, 0.813]),
    ("6", [0.0, 0.0, 0.0, 0.0, 0.0, 1.0, 1.0]),
    ("7", [0.0, 0.0, 0.0, 0.273, 0.781, 1.0, 1.0]),
    ("8", [0.0, 0.0, 0.0, 0.0, 0.345, 0.833, 0.793]),
    ("10", [0.0, 0.0, 0.117, 0.0, 0.0, 0.0, 0.103]),
    ("11", [0.0, 0.0, 0.0, 0.108, 0.151, 0.0, 0.0]),
    ("13", [0.0, 0.0, 0.0, 0.0, 0.258, 0.057, 0.075]),
    ("14", [0.0, 0.38, 0.432, 0.0, 0.0, 0.0, 0.0]),
    ("16", [0.0, 0.0, 0.0, 0.0, 0.209, 0.209, 0.0]),
    ("20", [0.0, 0.0, 0.0, 0.138, 0.295, 0.0, 0.081]),
];

pub fn row(id: &str) -> [f64; 7] {
    TRAJECTORIES
        .iter()
        .find(|(name, _)| *name == id)
        .map(|(_, r)| *r)
        .unwrap_or_else(|| panic!("no fixture trajectory {id}"))
}

pub fn table_from(rows: &[(&str, [f64; 7])]) -> TrajectoryTable {
    TrajectoryTable::new(
        rows.iter().map(|(id, _)| id.to_string()).collect(),
        TIMEPOINTS.to_vec(),
        rows.iter().map(|(_, r)| r.to_vec()).collect(),
    )
    .unwrap()
}

/// Fixture rows restricted to `ids`, in the given order.
pub fn subset(ids: &[&str]) -> TrajectoryTable {
    let rows: Vec<(&str, [f64; 7])> = ids.iter().map(|&id| (id, row(id))).collect();
    table_from(&rows)
}

pub fn full_table() -> TrajectoryTable {
    table_from(&TRAJECTORIES)
}

/// The fixture table as tab-separated text, in percentages.
pub fn full_table_tsv() -> String {
    let mut text = String::from("Trajectory");
    for t in TIMEPOINTS {
        text.push_str(&format!("\t{t}"));
    }
    text.push('\n');
    for (id, values) in TRAJECTORIES {
        text.push_str(id);
        for v in values {
            text.push_str(&format!("\t{}", (v * 1000.0).round() / 10.0));
        }
        text.push('\n');
    }
    text
}

pub fn assert_close(actual: f64, expected: f64, tolerance: f64) {
    assert!(
        (actual - expected).abs() <= tolerance,
        "expected {expected} ± {tolerance}, got {actual}"
    );
}
