use std::collections::BTreeSet;

use ordered_float::OrderedFloat;

use super::report::Report;

// ---------------------------------------------------------------------------
// 3-way data: L1 points (x, y) holding L2 points (z, value)
// ---------------------------------------------------------------------------

/// Innermost level of a 3-way structure.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct L2Point {
    pub z: f64,
    pub value: f64,
}

impl L2Point {
    pub fn new(z: f64, value: f64) -> Self {
        Self { z, value }
    }
}

/// Outer level: an (x, y) coordinate and its z profile.
#[derive(Debug, Clone, PartialEq)]
pub struct L1Point {
    pub x: f64,
    pub y: f64,
    pub points: Vec<L2Point>,
}

impl L1Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self {
            x,
            y,
            points: Vec::new(),
        }
    }

    pub fn with_points(x: f64, y: f64, points: Vec<L2Point>) -> Self {
        Self { x, y, points }
    }

    pub fn add(&mut self, point: L2Point) {
        self.points.push(point);
    }

    /// Value stored for `z`, if any.
    pub fn value_at(&self, z: f64) -> Option<f64> {
        self.points.iter().find(|p| p.z == z).map(|p| p.value)
    }
}

/// 3-way tensor (e.g. an excitation-emission matrix), stored as nested
/// points so that sparse grids need no padding.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ThreeWayData {
    pub id: String,
    pub report: Report,
    l1: Vec<L1Point>,
}

impl ThreeWayData {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    /// Same id and report, no points.
    pub fn clone_header(&self) -> Self {
        Self {
            id: self.id.clone(),
            report: self.report.clone(),
            l1: Vec::new(),
        }
    }

    pub fn add(&mut self, point: L1Point) {
        self.l1.push(point);
    }

    pub fn l1_points(&self) -> &[L1Point] {
        &self.l1
    }

    pub fn len(&self) -> usize {
        self.l1.len()
    }

    pub fn is_empty(&self) -> bool {
        self.l1.is_empty()
    }

    /// Total number of L2 points.
    pub fn point_count(&self) -> usize {
        self.l1.iter().map(|p| p.points.len()).sum()
    }

    /// Iterate over all cells as `(x, y, z, value)`.
    pub fn cells(&self) -> impl Iterator<Item = (f64, f64, f64, f64)> + '_ {
        self.l1
            .iter()
            .flat_map(|l1| l1.points.iter().map(move |l2| (l1.x, l1.y, l2.z, l2.value)))
    }

    pub fn x_values(&self) -> Vec<f64> {
        sorted_unique(self.l1.iter().map(|p| p.x))
    }

    pub fn y_values(&self) -> Vec<f64> {
        sorted_unique(self.l1.iter().map(|p| p.y))
    }

    pub fn z_values(&self) -> Vec<f64> {
        sorted_unique(self.l1.iter().flat_map(|p| p.points.iter().map(|l2| l2.z)))
    }

    /// First L1 point at (x, y).
    pub fn find(&self, x: f64, y: f64) -> Option<&L1Point> {
        self.l1.iter().find(|p| p.x == x && p.y == y)
    }

    pub fn value_at(&self, x: f64, y: f64, z: f64) -> Option<f64> {
        self.find(x, y).and_then(|p| p.value_at(z))
    }

    pub fn min_value(&self) -> Option<f64> {
        self.cells().map(|c| c.3).min_by(f64::total_cmp)
    }

    pub fn max_value(&self) -> Option<f64> {
        self.cells().map(|c| c.3).max_by(f64::total_cmp)
    }
}

fn sorted_unique(values: impl Iterator<Item = f64>) -> Vec<f64> {
    values
        .map(OrderedFloat)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(|v| v.0)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eem() -> ThreeWayData {
        let mut data = ThreeWayData::new("eem");
        data.add(L1Point::with_points(
            0.0,
            250.0,
            vec![L2Point::new(300.0, 1.0), L2Point::new(310.0, 2.0)],
        ));
        data.add(L1Point::with_points(
            0.0,
            240.0,
            vec![L2Point::new(300.0, 3.0), L2Point::new(310.0, -4.0)],
        ));
        data
    }

    #[test]
    fn test_axes_are_sorted_and_unique() {
        let data = eem();
        assert_eq!(data.x_values(), vec![0.0]);
        assert_eq!(data.y_values(), vec![240.0, 250.0]);
        assert_eq!(data.z_values(), vec![300.0, 310.0]);
        assert_eq!(data.point_count(), 4);
    }

    #[test]
    fn test_lookup_and_extremes() {
        let data = eem();
        assert_eq!(data.value_at(0.0, 240.0, 310.0), Some(-4.0));
        assert_eq!(data.value_at(0.0, 240.0, 320.0), None);
        assert_eq!(data.min_value(), Some(-4.0));
        assert_eq!(data.max_value(), Some(3.0));
        assert!(data.clone_header().is_empty());
    }
}
