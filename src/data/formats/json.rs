use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::data::model::{Spectrum, SpectrumPoint, DEFAULT_FORMAT};
use crate::data::report::{Report, ReportValue};

// ---------------------------------------------------------------------------
// JSON layout
// ---------------------------------------------------------------------------

/// One spectrum as stored on disk:
///
/// ```json
/// [
///   {
///     "id": "sample-01",
///     "format": "NIR",
///     "waves": [4000.0, 3998.0, ...],
///     "amplitudes": [0.12, 0.14, ...],
///     "report": { "Sample ID": "sample-01", "Moisture": 12.5, "Valid": true }
///   }
/// ]
/// ```
///
/// `x`/`y` are accepted as aliases for `waves`/`amplitudes`. Non-finite
/// amplitudes are written as `null` and read back as NaN. Non-finite numeric
/// report values are written as `{"numeric": "NaN"}` (or `"inf"`, `"-inf"`).
#[derive(Debug, Serialize, Deserialize)]
struct SpectrumRecord {
    #[serde(default)]
    id: String,
    #[serde(default = "default_format")]
    format: String,
    #[serde(alias = "x")]
    waves: Vec<f64>,
    #[serde(alias = "y")]
    amplitudes: Vec<Option<f64>>,
    #[serde(default)]
    report: BTreeMap<String, JsonValue>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Document {
    Many(Vec<SpectrumRecord>),
    One(SpectrumRecord),
}

fn default_format() -> String {
    DEFAULT_FORMAT.to_string()
}

// ---------------------------------------------------------------------------
// Reading
// ---------------------------------------------------------------------------

pub fn read_json(path: &Path) -> Result<Vec<Spectrum>> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    read_json_str(&text).with_context(|| format!("parsing {}", path.display()))
}

/// Parse either a single spectrum object or an array of them.
pub fn read_json_str(text: &str) -> Result<Vec<Spectrum>> {
    let doc: Document = serde_json::from_str(text).context("parsing JSON")?;
    let records = match doc {
        Document::Many(records) => records,
        Document::One(record) => vec![record],
    };

    records
        .into_iter()
        .enumerate()
        .map(|(i, rec)| record_to_spectrum(rec).with_context(|| format!("spectrum #{i}")))
        .collect()
}

fn record_to_spectrum(rec: SpectrumRecord) -> Result<Spectrum> {
    if rec.waves.len() != rec.amplitudes.len() {
        bail!(
            "'waves' has {} values but 'amplitudes' has {}",
            rec.waves.len(),
            rec.amplitudes.len()
        );
    }

    let mut sp = Spectrum::new(rec.id);
    sp.format = rec.format;
    for (w, a) in rec.waves.iter().zip(&rec.amplitudes) {
        sp.push(SpectrumPoint::new(*w, a.unwrap_or(f64::NAN)));
    }
    sp.report = rec
        .report
        .into_iter()
        .filter_map(|(k, v)| json_to_report_value(v).map(|v| (k, v)))
        .collect();
    Ok(sp)
}

fn json_to_report_value(val: JsonValue) -> Option<ReportValue> {
    match val {
        JsonValue::Null => None,
        JsonValue::Bool(b) => Some(ReportValue::Boolean(b)),
        JsonValue::Number(n) => Some(
            n.as_f64()
                .map(ReportValue::Numeric)
                .unwrap_or_else(|| ReportValue::Unknown(n.to_string())),
        ),
        JsonValue::String(s) => Some(ReportValue::String(s)),
        JsonValue::Object(map) => Some(
            non_finite_numeric(&map)
                .map(ReportValue::Numeric)
                .unwrap_or_else(|| ReportValue::Unknown(JsonValue::Object(map).to_string())),
        ),
        other => Some(ReportValue::Unknown(other.to_string())),
    }
}

const NON_FINITE_KEY: &str = "numeric";

/// `{"numeric": "NaN"}` and friends.
fn non_finite_numeric(map: &serde_json::Map<String, JsonValue>) -> Option<f64> {
    if map.len() != 1 {
        return None;
    }
    map.get(NON_FINITE_KEY)?.as_str()?.parse().ok()
}

// ---------------------------------------------------------------------------
// Writing
// ---------------------------------------------------------------------------

pub fn write_json(path: &Path, spectra: &[Spectrum]) -> Result<()> {
    let text = to_json_string(spectra)?;
    std::fs::write(path, text).with_context(|| format!("writing {}", path.display()))
}

pub fn to_json_string(spectra: &[Spectrum]) -> Result<String> {
    let records: Vec<SpectrumRecord> = spectra.iter().map(spectrum_to_record).collect();
    serde_json::to_string_pretty(&records).context("serializing spectra to JSON")
}

fn spectrum_to_record(sp: &Spectrum) -> SpectrumRecord {
    SpectrumRecord {
        id: sp.id.clone(),
        format: sp.format.clone(),
        waves: sp.wave_numbers(),
        amplitudes: sp
            .points()
            .iter()
            .map(|p| Some(p.amplitude()).filter(|a| a.is_finite()))
            .collect(),
        report: report_to_json(&sp.report),
    }
}

fn report_to_json(report: &Report) -> BTreeMap<String, JsonValue> {
    report
        .iter()
        .map(|(k, v)| {
            let json = match v {
                ReportValue::Numeric(f) if f.is_finite() => JsonValue::from(*f),
                ReportValue::Numeric(f) => {
                    serde_json::json!({ NON_FINITE_KEY: f.to_string() })
                }
                ReportValue::Boolean(b) => JsonValue::Bool(*b),
                ReportValue::String(s) | ReportValue::Unknown(s) => JsonValue::String(s.clone()),
            };
            (k.clone(), json)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Spectrum {
        let mut sp =
            Spectrum::from_arrays("sample-01", &[1000.0, 1002.0, 1004.0], &[0.1, 0.25, 0.3])
                .unwrap();
        sp.report.set_string("Sample ID", "sample-01");
        sp.report.set_numeric("Moisture", 12.5);
        sp.report.set_boolean("Valid", true);
        sp
    }

    #[test]
    fn test_round_trip_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("spectra.json");
        let original = vec![sample(), Spectrum::new("empty")];

        write_json(&path, &original).unwrap();
        let read = read_json(&path).unwrap();

        assert_eq!(read, original);
    }

    #[test]
    fn test_single_object_and_aliases() {
        let text = r#"{ "x": [1.0, 2.0], "y": [3.0, null], "report": { "n": 1, "skip": null } }"#;
        let spectra = read_json_str(text).unwrap();
        assert_eq!(spectra.len(), 1);
        let sp = &spectra[0];
        assert_eq!(sp.format, DEFAULT_FORMAT);
        assert_eq!(sp.points()[0].amplitude(), 3.0);
        assert!(sp.points()[1].amplitude().is_nan());
        assert_eq!(sp.report.numeric("n"), Some(1.0));
        assert!(!sp.report.has_field("skip"));
    }

    #[test]
    fn test_non_finite_report_values_stay_numeric() {
        let mut sp = sample();
        sp.report.set_numeric("MSC[0.0-1.0].slope", f64::NAN);
        sp.report.set_numeric("upper", f64::INFINITY);
        sp.report.set_numeric("lower", f64::NEG_INFINITY);
        sp.report.set_string("label", "NaN");

        let text = to_json_string(std::slice::from_ref(&sp)).unwrap();
        let read = read_json_str(&text).unwrap();
        let report = &read[0].report;

        assert!(report.numeric("MSC[0.0-1.0].slope").unwrap().is_nan());
        assert_eq!(report.numeric("upper"), Some(f64::INFINITY));
        assert_eq!(report.numeric("lower"), Some(f64::NEG_INFINITY));
        assert_eq!(report.string("label"), Some("NaN"));
        assert_eq!(report.numeric("Moisture"), Some(12.5));
    }

    #[test]
    fn test_length_mismatch_is_error() {
        let text = r#"[{ "waves": [1.0, 2.0], "amplitudes": [3.0] }]"#;
        let err = read_json_str(text).unwrap_err();
        assert!(format!("{err:#}").contains("spectrum #0"));
    }
}
