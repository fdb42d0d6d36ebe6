//! Canonical emergence ordering of genotypes
//!
//! Rows are bucketed by the highest frequency tier they ever reach, then
//! ordered inside a tier by how early they reach it, when they fix, when they
//! become significant and when they are first detected. Remaining ties keep
//! their input order.

use log::debug;
use ordered_float::OrderedFloat;

use crate::config::AnalysisConfig;
use crate::error::{MullerError, Result};
use crate::table::TrajectoryTable;

/// Index of the first value at or above `threshold`, if any.
pub fn first_index_at_or_above(row: &[f64], threshold: f64) -> Option<usize> {
    row.iter().position(|&v| v >= threshold)
}

/// Per row, the first timepoint at which the frequency meets `threshold`.
///
/// Rows that never reach it get the earliest timepoint of the axis, so they
/// sort together with early low-frequency rows instead of trailing the table.
pub fn timepoint_above_threshold(table: &TrajectoryTable, threshold: f64) -> Vec<f64> {
    let timepoints = table.timepoints();
    (0..table.len())
        .map(|r| {
            let index = first_index_at_or_above(table.row(r), threshold).unwrap_or(0);
            timepoints[index]
        })
        .collect()
}

/// Composite sort key of one row; derived `Ord` compares fields in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct EmergenceKey {
    tier: usize,
    tier_reached: OrderedFloat<f64>,
    fixed: OrderedFloat<f64>,
    significant: OrderedFloat<f64>,
    detected: OrderedFloat<f64>,
}

pub struct GenotypeSorter<'a> {
    config: &'a AnalysisConfig,
}

impl<'a> GenotypeSorter<'a> {
    pub fn new(config: &'a AnalysisConfig) -> Self {
        GenotypeSorter { config }
    }

    fn key(&self, row: &[f64], timepoints: &[f64]) -> EmergenceKey {
        let breakpoints = &self.config.frequency_breakpoints;
        let reach = |threshold: f64| {
            OrderedFloat(timepoints[first_index_at_or_above(row, threshold).unwrap_or(0)])
        };

        // First tier, highest first, that the row reaches at any timepoint.
        let (tier, tier_reached) = breakpoints
            .iter()
            .enumerate()
            .find_map(|(tier, &b)| {
                first_index_at_or_above(row, b).map(|i| (tier, OrderedFloat(timepoints[i])))
            })
            .unwrap_or((breakpoints.len(), OrderedFloat(timepoints[0])));

        EmergenceKey {
            tier,
            tier_reached,
            fixed: reach(self.config.fixed_breakpoint),
            significant: reach(self.config.significant_breakpoint),
            detected: reach(self.config.detection_breakpoint),
        }
    }

    /// Row indices of `table` in emergence order.
    pub fn sort_order(&self, table: &TrajectoryTable) -> Result<Vec<usize>> {
        if self.config.frequency_breakpoints.is_empty() {
            return Err(MullerError::configuration("no frequency breakpoints given"));
        }

        let timepoints = table.timepoints();
        let keys: Vec<EmergenceKey> = (0..table.len())
            .map(|r| self.key(table.row(r), timepoints))
            .collect();

        let mut order: Vec<usize> = (0..table.len()).collect();
        // Stable: identical keys keep their input order.
        order.sort_by_key(|&r| keys[r]);

        for &r in &order {
            debug!(
                "Sorted {} into tier {} (reached at {})",
                table.id(r),
                keys[r].tier,
                keys[r].tier_reached
            );
        }
        Ok(order)
    }

    /// A copy of `table` with rows reordered; columns are unchanged.
    pub fn sort(&self, table: &TrajectoryTable) -> Result<TrajectoryTable> {
        let order = self.sort_order(table)?;
        table.reordered(&order)
    }
}
