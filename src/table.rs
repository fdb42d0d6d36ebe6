//! In-memory frequency tables
//!
//! A `TrajectoryTable` holds one row per trajectory (or genotype) over a
//! single shared, strictly increasing timepoint axis. The axis invariant is
//! checked once in [`TrajectoryTable::new`]; every later stage relies on it
//! and works with plain per-timepoint loops.

use std::cmp::Ordering;
use std::collections::HashSet;

use crate::error::{MullerError, Result};

#[derive(Debug, Clone, PartialEq)]
pub struct TrajectoryTable {
    ids: Vec<String>,
    timepoints: Vec<f64>,
    rows: Vec<Vec<f64>>,
}

impl TrajectoryTable {
    /// Build a table, validating the shared-axis invariant.
    pub fn new(ids: Vec<String>, timepoints: Vec<f64>, rows: Vec<Vec<f64>>) -> Result<Self> {
        if ids.is_empty() || rows.is_empty() {
            return Err(MullerError::input_shape("trajectory table has no rows"));
        }
        if ids.len() != rows.len() {
            return Err(MullerError::input_shape(format!(
                "{} ids given for {} rows",
                ids.len(),
                rows.len()
            )));
        }
        if timepoints.is_empty() {
            return Err(MullerError::input_shape("trajectory table has no timepoints"));
        }
        if timepoints.iter().any(|t| !t.is_finite()) {
            return Err(MullerError::input_shape("timepoints must be finite"));
        }
        if timepoints.windows(2).any(|w| w[0] >= w[1]) {
            return Err(MullerError::input_shape(
                "timepoints must be strictly increasing",
            ));
        }

        let mut seen = HashSet::with_capacity(ids.len());
        for id in &ids {
            if !seen.insert(id.as_str()) {
                return Err(MullerError::input_shape(format!("duplicate row id '{id}'")));
            }
        }

        for (id, row) in ids.iter().zip(&rows) {
            if row.len() != timepoints.len() {
                return Err(MullerError::input_shape(format!(
                    "row '{id}' has {} values but the axis has {} timepoints",
                    row.len(),
                    timepoints.len()
                )));
            }
            if let Some(bad) = row.iter().find(|v| !v.is_finite() || **v < 0.0 || **v > 1.0) {
                return Err(MullerError::input_shape(format!(
                    "row '{id}' has frequency {bad} outside [0, 1]"
                )));
            }
        }

        Ok(TrajectoryTable {
            ids,
            timepoints,
            rows,
        })
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    pub fn timepoints(&self) -> &[f64] {
        &self.timepoints
    }

    pub fn row(&self, index: usize) -> &[f64] {
        &self.rows[index]
    }

    pub fn id(&self, index: usize) -> &str {
        &self.ids[index]
    }

    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.ids.iter().position(|x| x == id)
    }

    pub fn row_by_id(&self, id: &str) -> Option<&[f64]> {
        self.index_of(id).map(|i| self.row(i))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[f64])> {
        self.ids
            .iter()
            .map(String::as_str)
            .zip(self.rows.iter().map(Vec::as_slice))
    }

    /// Header label of a timepoint column, e.g. `17` rather than `17.0`.
    pub fn timepoint_label(&self, index: usize) -> String {
        format!("{}", self.timepoints[index])
    }

    /// Rows in the given order. `order` must be a permutation of `0..len()`.
    pub fn reordered(&self, order: &[usize]) -> Result<Self> {
        let mut seen = vec![false; self.len()];
        if order.len() != self.len() {
            return Err(MullerError::input_shape("row order is not a permutation"));
        }
        for &i in order {
            if i >= self.len() || seen[i] {
                return Err(MullerError::input_shape("row order is not a permutation"));
            }
            seen[i] = true;
        }
        Ok(TrajectoryTable {
            ids: order.iter().map(|&i| self.ids[i].clone()).collect(),
            timepoints: self.timepoints.clone(),
            rows: order.iter().map(|&i| self.rows[i].clone()).collect(),
        })
    }
}

/// Order ids numerically when both parse as numbers, otherwise lexically.
///
/// Trajectory ids are usually integers stored as strings ("2" < "10").
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    match (a.parse::<f64>(), b.parse::<f64>()) {
        (Ok(x), Ok(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal).then_with(|| a.cmp(b)),
        (Ok(_), Err(_)) => Ordering::Less,
        (Err(_), Ok(_)) => Ordering::Greater,
        (Err(_), Err(_)) => a.cmp(b),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small() -> TrajectoryTable {
        TrajectoryTable::new(
            vec!["1".into(), "20".into()],
            vec![0.0, 17.0, 25.0],
            vec![vec![0.0, 0.0, 0.261], vec![0.0, 0.138, 0.295]],
        )
        .unwrap()
    }

    #[test]
    fn test_rejects_empty_table() {
        let err = TrajectoryTable::new(vec![], vec![0.0], vec![]).unwrap_err();
        assert!(matches!(err, MullerError::InputShape(_)));
    }

    #[test]
    fn test_rejects_ragged_rows() {
        let err = TrajectoryTable::new(
            vec!["a".into(), "b".into()],
            vec![0.0, 1.0],
            vec![vec![0.1, 0.2], vec![0.1]],
        )
        .unwrap_err();
        assert!(matches!(err, MullerError::InputShape(_)));
    }

    #[test]
    fn test_rejects_unsorted_axis_and_bad_values() {
        assert!(TrajectoryTable::new(vec!["a".into()], vec![1.0, 0.0], vec![vec![0.1, 0.2]]).is_err());
        assert!(TrajectoryTable::new(vec!["a".into()], vec![0.0, 1.0], vec![vec![0.1, 1.2]]).is_err());
        assert!(TrajectoryTable::new(vec!["a".into()], vec![0.0, 1.0], vec![vec![f64::NAN, 0.2]]).is_err());
    }

    #[test]
    fn test_rejects_duplicate_ids() {
        let err = TrajectoryTable::new(
            vec!["a".into(), "a".into()],
            vec![0.0],
            vec![vec![0.1], vec![0.2]],
        )
        .unwrap_err();
        assert!(err.to_string().contains("duplicate"));
    }

    #[test]
    fn test_lookup_and_labels() {
        let table = small();
        assert_eq!(table.row_by_id("20"), Some(&[0.0, 0.138, 0.295][..]));
        assert_eq!(table.timepoint_label(1), "17");
        assert_eq!(table.index_of("missing"), None);
    }

    #[test]
    fn test_reordered_requires_permutation() {
        let table = small();
        let swapped = table.reordered(&[1, 0]).unwrap();
        assert_eq!(swapped.ids(), &["20".to_string(), "1".to_string()]);
        assert!(table.reordered(&[0, 0]).is_err());
        assert!(table.reordered(&[0]).is_err());
    }

    #[test]
    fn test_natural_cmp_orders_numbers_numerically() {
        let mut ids = vec!["10", "2", "b", "1", "a"];
        ids.sort_by(|a, b| natural_cmp(a, b));
        assert_eq!(ids, vec!["1", "2", "10", "a", "b"]);
    }
}
