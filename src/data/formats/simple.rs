use std::fmt::Write as _;
use std::path::Path;

use anyhow::{bail, Context, Result};

use crate::data::model::{Spectrum, SpectrumPoint};
use crate::data::report::{DataType, ReportValue};

/// Report field holding the spectrum id.
pub const SAMPLE_ID: &str = "Sample ID";
/// Report field holding the spectrum format label.
pub const FORMAT: &str = "Format";

const TYPE_SUFFIX: &str = "\tDataType=";
const REPORT_END: &str = "---";
const SPECTRUM_END: &str = "%%%";
const POINTS_HEADER: &str = "waveno,amplitude";

// ---------------------------------------------------------------------------
// Simple text format (.sspec)
// ---------------------------------------------------------------------------
//
//   # optional comments
//   Sample ID=abc
//   Sample ID\tDataType=S
//   Moisture=12.5
//   Moisture\tDataType=N
//   ---
//   waveno,amplitude
//   4000.0,0.12
//   3998.0,0.14
//   %%%
//   <next spectrum>

pub fn read_simple(path: &Path) -> Result<Vec<Spectrum>> {
    let text = std::fs::read_to_string(path).context("reading simple spectrum file")?;
    read_simple_str(&text).with_context(|| format!("parsing {}", path.display()))
}

pub fn read_simple_str(text: &str) -> Result<Vec<Spectrum>> {
    let mut spectra = Vec::new();
    let mut block: Vec<(usize, &str)> = Vec::new();

    for (line_no, line) in text.lines().enumerate() {
        if line.trim() == SPECTRUM_END {
            if !block.is_empty() {
                spectra.push(parse_block(&block)?);
            }
            block.clear();
        } else {
            block.push((line_no + 1, line));
        }
    }
    if block.iter().any(|(_, l)| !l.trim().is_empty()) {
        spectra.push(parse_block(&block)?);
    }
    Ok(spectra)
}

fn parse_block(lines: &[(usize, &str)]) -> Result<Spectrum> {
    let mut raw_values: Vec<(String, String)> = Vec::new();
    let mut types: Vec<(String, DataType)> = Vec::new();
    let mut sp = Spectrum::default();
    let mut in_points = false;

    for &(line_no, line) in lines {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        if !in_points {
            if trimmed == REPORT_END {
                in_points = true;
                continue;
            }
            if let Some((name, code)) = line.split_once(TYPE_SUFFIX) {
                types.push((name.to_string(), DataType::from_code(code)));
            } else if let Some((name, value)) = line.split_once('=') {
                raw_values.push((name.to_string(), value.to_string()));
            } else {
                bail!("line {line_no}: expected 'name=value', got '{trimmed}'");
            }
            continue;
        }

        if trimmed.eq_ignore_ascii_case(POINTS_HEADER) {
            continue;
        }
        let (w, a) = trimmed
            .split_once(',')
            .with_context(|| format!("line {line_no}: expected 'waveno,amplitude'"))?;
        let w: f64 = w
            .trim()
            .parse()
            .with_context(|| format!("line {line_no}: bad wave number '{w}'"))?;
        let a: f64 = a
            .trim()
            .parse()
            .with_context(|| format!("line {line_no}: bad amplitude '{a}'"))?;
        sp.push(SpectrumPoint::new(w, a));
    }

    if !in_points {
        bail!("missing '{REPORT_END}' separator between report and points");
    }

    for (name, raw) in raw_values {
        let declared = types
            .iter()
            .rev()
            .find(|(n, _)| *n == name)
            .map(|(_, t)| *t);
        let value = match declared {
            Some(t) => ReportValue::parse_as(&raw, t),
            None => ReportValue::guess(&raw),
        };
        sp.report.insert(name, value);
    }

    if let Some(id) = sp.report.string(SAMPLE_ID) {
        sp.id = id.to_string();
    }
    if let Some(format) = sp.report.remove(FORMAT) {
        sp.format = format.to_string();
    }
    Ok(sp)
}

// ---------------------------------------------------------------------------
// Writer
// ---------------------------------------------------------------------------

pub fn write_simple(path: &Path, spectra: &[Spectrum]) -> Result<()> {
    std::fs::write(path, to_simple_string(spectra))
        .with_context(|| format!("writing {}", path.display()))
}

/// Render spectra in the simple text format. The id is stored as the
/// `Sample ID` field unless the report already carries one.
pub fn to_simple_string(spectra: &[Spectrum]) -> String {
    let mut out = String::new();
    for (i, sp) in spectra.iter().enumerate() {
        if i > 0 {
            let _ = writeln!(out, "{SPECTRUM_END}");
        }
        let mut report = sp.report.clone();
        if !report.has_field(SAMPLE_ID) && !sp.id.is_empty() {
            report.set_string(SAMPLE_ID, sp.id.clone());
        }
        report.set_string(FORMAT, sp.format.clone());

        for (name, value) in report.iter() {
            let _ = writeln!(out, "{name}={value}");
            let _ = writeln!(out, "{name}{TYPE_SUFFIX}{}", value.data_type().code());
        }
        let _ = writeln!(out, "{REPORT_END}");
        let _ = writeln!(out, "{POINTS_HEADER}");
        for p in sp.points() {
            let _ = writeln!(out, "{},{}", p.wave_number(), p.amplitude());
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_typed_report() {
        let text = "# comment\n\
                    Sample ID=abc\n\
                    Sample ID\tDataType=S\n\
                    Code=007\n\
                    Code\tDataType=S\n\
                    Moisture=12.5\n\
                    ---\n\
                    waveno,amplitude\n\
                    1.0,0.5\n\
                    2.0,0.75\n";
        let spectra = read_simple_str(text).unwrap();
        assert_eq!(spectra.len(), 1);
        let sp = &spectra[0];
        assert_eq!(sp.id, "abc");
        assert_eq!(sp.report.string("Code"), Some("007"));
        assert_eq!(sp.report.numeric("Moisture"), Some(12.5));
        assert_eq!(sp.amplitudes(), vec![0.5, 0.75]);
    }

    #[test]
    fn test_missing_separator_is_error() {
        assert!(read_simple_str("Sample ID=abc\n").is_err());
    }

    #[test]
    fn test_round_trip_multiple() {
        let mut a = Spectrum::from_arrays("a", &[1.0, 2.0], &[0.1, 0.2]).unwrap();
        a.report.set_string(SAMPLE_ID, "a");
        a.report.set_boolean("Valid", true);
        let mut b = Spectrum::from_arrays("b", &[3.0], &[-1.0]).unwrap();
        b.format = "MIR".into();
        b.report.set_string(SAMPLE_ID, "b");
        b.report.set_numeric("Protein", 11.25);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.sspec");
        write_simple(&path, &[a.clone(), b.clone()]).unwrap();
        let read = read_simple(&path).unwrap();

        assert_eq!(read, vec![a, b]);
    }
}
