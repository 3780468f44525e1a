use std::collections::{BTreeMap, BTreeSet};

use ordered_float::OrderedFloat;

use super::{ProcessingError, Result, Statistic};
use crate::data::threeway::{L1Point, L2Point, ThreeWayData};

type Key = OrderedFloat<f64>;
/// y → z → value, X layers already summed
type Grid = BTreeMap<Key, BTreeMap<Key, f64>>;

/// Merges several 3-way containers that share their Y/Z grid into one,
/// removing the X dimension.
///
/// Each container contributes one value per (y, z) cell: the sum over all of
/// its X layers. Those per-container values are then reduced with a
/// statistic. Cells missing from some containers are reduced over the
/// containers that have them.
///
/// The output holds one L1 point per y, placed at the lowest x of the first
/// container (0 if it is empty).
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CollapseX {
    pub statistic: Statistic,
}

impl CollapseX {
    pub fn new(statistic: Statistic) -> Self {
        Self { statistic }
    }

    pub fn merge(&self, data: &[ThreeWayData]) -> Result<ThreeWayData> {
        let first = data
            .first()
            .ok_or_else(|| ProcessingError::EmptyInput("no 3-way data to collapse".into()))?;

        let x_union: BTreeSet<Key> = data
            .iter()
            .flat_map(|d| d.l1_points().iter().map(|p| OrderedFloat(p.x)))
            .collect();
        log::debug!(
            "collapsing {} containers over {} x layers with {}",
            data.len(),
            x_union.len(),
            self.statistic
        );

        // One value per container that has the cell
        let mut cells: BTreeMap<Key, BTreeMap<Key, Vec<f64>>> = BTreeMap::new();
        for grid in data.iter().map(sum_layers) {
            for (y, zs) in grid {
                let row = cells.entry(y).or_default();
                for (z, v) in zs {
                    row.entry(z).or_default().push(v);
                }
            }
        }

        let x = first.x_values().first().copied().unwrap_or(0.0);
        let mut out = first.clone_header();
        for (y, zs) in cells {
            let points = zs
                .into_iter()
                .map(|(z, values)| L2Point::new(z.0, self.statistic.apply(&values)))
                .collect();
            out.add(L1Point::with_points(x, y.0, points));
        }
        out.report
            .set_string("Collapse statistic", self.statistic.to_string());
        out.report
            .set_numeric("Collapse count", data.len() as f64);
        Ok(out)
    }
}

/// Index one container by (y, z), summing over its X layers.
fn sum_layers(data: &ThreeWayData) -> Grid {
    let mut grid = Grid::new();
    for (_, y, z, v) in data.cells() {
        *grid
            .entry(OrderedFloat(y))
            .or_default()
            .entry(OrderedFloat(z))
            .or_insert(0.0) += v;
    }
    grid
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Single layer at x = 0, rows and columns in ascending order.
    fn container(id: &str, scale: f64) -> ThreeWayData {
        let mut data = ThreeWayData::new(id);
        for y in [240.0, 250.0] {
            let points = [300.0, 310.0]
                .iter()
                .map(|&z| L2Point::new(z, scale * (y / 100.0 + z / 1000.0)))
                .collect();
            data.add(L1Point::with_points(0.0, y, points));
        }
        data
    }

    fn layered(id: &str, layers: &[(f64, f64)]) -> ThreeWayData {
        let mut data = ThreeWayData::new(id);
        for &(x, value) in layers {
            data.add(L1Point::with_points(x, 250.0, vec![L2Point::new(300.0, value)]));
        }
        data
    }

    #[test]
    fn test_mean_of_single_container_is_identity() {
        let input = container("only", 1.0);
        let out = CollapseX::new(Statistic::Mean)
            .merge(std::slice::from_ref(&input))
            .unwrap();

        assert_eq!(out.id, input.id);
        assert_eq!(out.l1_points(), input.l1_points());
    }

    #[test]
    fn test_statistics_across_containers() {
        let data = [container("a", 1.0), container("b", 2.0), container("c", 6.0)];
        let base = container("base", 1.0);

        let mean = CollapseX::new(Statistic::Mean).merge(&data).unwrap();
        let median = CollapseX::new(Statistic::Median).merge(&data).unwrap();
        let sd = CollapseX::new(Statistic::Stdev).merge(&data).unwrap();

        for (x, y, z, v) in base.cells() {
            assert!((mean.value_at(x, y, z).unwrap() - 3.0 * v).abs() < 1e-9);
            assert!((median.value_at(x, y, z).unwrap() - 2.0 * v).abs() < 1e-9);
            let expected_sd = crate::processing::stats::std_dev(&[v, 2.0 * v, 6.0 * v]);
            assert!((sd.value_at(x, y, z).unwrap() - expected_sd).abs() < 1e-9);
        }
        assert_eq!(mean.report.numeric("Collapse count"), Some(3.0));
    }

    #[test]
    fn test_x_layers_are_summed_then_reduced() {
        let data = [
            layered("a", &[(0.0, 1.0), (1.0, 2.0)]),
            layered("b", &[(0.0, 3.0), (1.0, 4.0)]),
        ];
        let out = CollapseX::new(Statistic::Mean).merge(&data).unwrap();

        assert_eq!(out.len(), 1);
        assert_eq!(out.x_values(), vec![0.0]);
        assert_eq!(out.value_at(0.0, 250.0, 300.0), Some(5.0));
    }

    #[test]
    fn test_containers_with_different_x_layers() {
        let data = [
            layered("a", &[(2.0, 1.0), (3.0, 1.0), (4.0, 1.0)]),
            layered("b", &[(7.0, 5.0)]),
            layered("c", &[(0.0, 2.0), (9.0, 7.0)]),
        ];
        let median = CollapseX::new(Statistic::Median).merge(&data).unwrap();

        // per-container sums 3, 5, 9; x taken from the first container
        assert_eq!(median.l1_points().len(), 1);
        assert_eq!(median.value_at(2.0, 250.0, 300.0), Some(5.0));
        assert_eq!(median.point_count(), 1);
    }

    #[test]
    fn test_cell_missing_from_a_container() {
        let mut partial = ThreeWayData::new("partial");
        partial.add(L1Point::with_points(0.0, 250.0, vec![L2Point::new(300.0, 4.0)]));
        let data = [container("full", 1.0), partial];

        let out = CollapseX::new(Statistic::Mean).merge(&data).unwrap();
        let full = container("full", 1.0);
        let v = full.value_at(0.0, 250.0, 300.0).unwrap();
        assert!((out.value_at(0.0, 250.0, 300.0).unwrap() - (v + 4.0) / 2.0).abs() < 1e-9);
        assert_eq!(out.value_at(0.0, 240.0, 310.0), full.value_at(0.0, 240.0, 310.0));
    }

    #[test]
    fn test_empty_input_is_error() {
        assert!(matches!(
            CollapseX::default().merge(&[]),
            Err(ProcessingError::EmptyInput(_))
        ));
    }
}
