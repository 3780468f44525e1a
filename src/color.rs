use std::collections::{BTreeMap, BTreeSet};

use eframe::egui::Color32;
use palette::{Hsl, IntoColor, Srgb};

use spectra_workbench::data::report::ReportValue;

/// Drawing colour for flagged spectra.
pub const OUTLIER_COLOR: Color32 = Color32::RED;

/// Numeric fields with more distinct values than this get a gradient.
const MAX_DISCRETE: usize = 12;

// ---------------------------------------------------------------------------
// Color palette generator
// ---------------------------------------------------------------------------

fn hsl_to_color32(hue: f32) -> Color32 {
    let rgb: Srgb = Hsl::new(hue, 0.75, 0.55).into_color();
    Color32::from_rgb(
        (rgb.red * 255.0) as u8,
        (rgb.green * 255.0) as u8,
        (rgb.blue * 255.0) as u8,
    )
}

/// Generates `n` visually distinct colours using evenly spaced hues.
pub fn generate_palette(n: usize) -> Vec<Color32> {
    (0..n)
        .map(|i| hsl_to_color32((i as f32 / n as f32) * 360.0))
        .collect()
}

/// Blue (low) to red (high) for `t` in [0, 1].
pub fn gradient(t: f64) -> Color32 {
    let t = if t.is_finite() { t.clamp(0.0, 1.0) } else { 0.0 };
    hsl_to_color32(240.0 * (1.0 - t as f32))
}

// ---------------------------------------------------------------------------
// Color mapping: report value → Color32
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
enum Scheme {
    Discrete(BTreeMap<ReportValue, Color32>),
    Gradient { min: f64, max: f64 },
}

/// Maps report values of a chosen field to colours: distinct hues for
/// few values, a gradient for many numeric ones.
#[derive(Debug, Clone)]
pub struct ColorMap {
    pub column: String,
    scheme: Scheme,
    default_color: Color32,
}

impl ColorMap {
    /// Build a colour map for the given field from its unique values.
    pub fn new(column: &str, unique_values: &BTreeSet<ReportValue>) -> Self {
        let numeric: Vec<f64> = unique_values.iter().filter_map(ReportValue::as_f64).collect();
        let scheme = if numeric.len() == unique_values.len() && numeric.len() > MAX_DISCRETE {
            let min = numeric.iter().copied().fold(f64::INFINITY, f64::min);
            let max = numeric.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            Scheme::Gradient { min, max }
        } else {
            let palette = generate_palette(unique_values.len());
            Scheme::Discrete(unique_values.iter().cloned().zip(palette).collect())
        };

        ColorMap {
            column: column.to_string(),
            scheme,
            default_color: Color32::GRAY,
        }
    }

    /// Look up the colour for a given report value.
    pub fn color_for(&self, value: &ReportValue) -> Color32 {
        match &self.scheme {
            Scheme::Discrete(mapping) => mapping.get(value).copied().unwrap_or(self.default_color),
            Scheme::Gradient { min, max } => match value.as_f64() {
                Some(v) if max > min => gradient((v - min) / (max - min)),
                Some(_) => gradient(0.0),
                None => self.default_color,
            },
        }
    }

    /// Legend entries (label → colour) for the UI.
    pub fn legend_entries(&self) -> Vec<(String, Color32)> {
        match &self.scheme {
            Scheme::Discrete(mapping) => mapping.iter().map(|(v, c)| (v.to_string(), *c)).collect(),
            Scheme::Gradient { min, max } => vec![
                (format!("{min}"), gradient(0.0)),
                (format!("{}", (min + max) / 2.0), gradient(0.5)),
                (format!("{max}"), gradient(1.0)),
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_discrete_for_few_values() {
        let values: BTreeSet<ReportValue> =
            ["a", "b"].into_iter().map(ReportValue::from).collect();
        let map = ColorMap::new("Group", &values);
        assert_eq!(map.legend_entries().len(), 2);
        assert_ne!(
            map.color_for(&ReportValue::from("a")),
            map.color_for(&ReportValue::from("b"))
        );
        assert_eq!(map.color_for(&ReportValue::from("c")), Color32::GRAY);
    }

    #[test]
    fn test_gradient_for_many_numbers() {
        let values: BTreeSet<ReportValue> =
            (0..20).map(|i| ReportValue::Numeric(i as f64)).collect();
        let map = ColorMap::new("Moisture", &values);
        assert_eq!(map.legend_entries().len(), 3);
        assert_eq!(map.color_for(&ReportValue::Numeric(0.0)), gradient(0.0));
        assert_eq!(map.color_for(&ReportValue::Numeric(19.0)), gradient(1.0));
    }
}
