use crate::data::threeway::ThreeWayData;

/// Flags every 3-way cell whose value lies outside `[min, max]`.
/// Both bounds default to unbounded.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValueRange {
    pub min: f64,
    pub max: f64,
}

impl Default for ValueRange {
    fn default() -> Self {
        Self {
            min: f64::NEG_INFINITY,
            max: f64::INFINITY,
        }
    }
}

impl ValueRange {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn name(&self) -> &str {
        "ValueRange"
    }

    /// One violation per offending cell.
    pub fn detect_three_way(&self, data: &ThreeWayData) -> Vec<String> {
        data.cells()
            .filter(|&(_, _, _, v)| v < self.min || v > self.max)
            .map(|(x, y, z, v)| {
                format!(
                    "value {v} at x={x}, y={y}, z={z} outside [{}, {}]",
                    self.min, self.max
                )
            })
            .collect()
    }
}
