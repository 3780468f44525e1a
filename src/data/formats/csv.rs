use std::collections::BTreeSet;
use std::path::Path;

use anyhow::{bail, Context, Result};

use crate::data::model::Spectrum;
use crate::data::report::ReportValue;

const ID_COLUMN: &str = "id";
const X_COLUMN: &str = "x";
const Y_COLUMN: &str = "y";

// ---------------------------------------------------------------------------
// CSV reader
// ---------------------------------------------------------------------------

/// CSV layout: header row with column names, one spectrum per row.
/// `x` and `y` columns contain semicolon-separated floats:
///   `"4000.0;3999.0;3998.0"`, `"0.12;0.14;0.11"`
/// An optional `id` column names the spectrum; all other columns are
/// report fields with guessed types (empty cells are skipped).
pub fn read_csv(path: &Path) -> Result<Vec<Spectrum>> {
    let reader = csv::Reader::from_path(path).context("opening CSV")?;
    read_csv_from(reader)
}

pub fn read_csv_from<R: std::io::Read>(mut reader: csv::Reader<R>) -> Result<Vec<Spectrum>> {
    let headers: Vec<String> = reader
        .headers()
        .context("reading CSV headers")?
        .iter()
        .map(|h| h.to_string())
        .collect();

    let x_idx = headers
        .iter()
        .position(|h| h == X_COLUMN)
        .context("CSV missing 'x' column")?;
    let y_idx = headers
        .iter()
        .position(|h| h == Y_COLUMN)
        .context("CSV missing 'y' column")?;
    let id_idx = headers.iter().position(|h| h == ID_COLUMN);

    let mut spectra = Vec::new();

    for (row_no, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("CSV row {row_no}"))?;

        let x = parse_semicolon_floats(record.get(x_idx).unwrap_or(""), row_no, X_COLUMN)?;
        let y = parse_semicolon_floats(record.get(y_idx).unwrap_or(""), row_no, Y_COLUMN)?;

        if x.len() != y.len() {
            bail!(
                "CSV row {row_no}: x has {} values but y has {}",
                x.len(),
                y.len()
            );
        }

        let id = id_idx
            .and_then(|i| record.get(i))
            .map(str::to_string)
            .unwrap_or_else(|| format!("spectrum {row_no}"));
        let mut sp = Spectrum::from_arrays(id, &x, &y)?;

        for (col_idx, value) in record.iter().enumerate() {
            if col_idx == x_idx || col_idx == y_idx || Some(col_idx) == id_idx {
                continue;
            }
            if value.is_empty() {
                continue;
            }
            sp.report
                .insert(headers[col_idx].clone(), ReportValue::guess(value));
        }

        spectra.push(sp);
    }

    Ok(spectra)
}

fn parse_semicolon_floats(s: &str, row: usize, col: &str) -> Result<Vec<f64>> {
    if s.trim().is_empty() {
        return Ok(Vec::new());
    }
    s.split(';')
        .enumerate()
        .map(|(j, tok)| {
            tok.trim()
                .parse::<f64>()
                .with_context(|| format!("Row {row}, {col}[{j}]: '{tok}' is not a number"))
        })
        .collect()
}

// ---------------------------------------------------------------------------
// CSV writer
// ---------------------------------------------------------------------------

/// Write spectra in the layout [`read_csv`] understands. Report columns are
/// the union of all report fields, in name order.
pub fn write_csv(path: &Path, spectra: &[Spectrum]) -> Result<()> {
    let writer = csv::Writer::from_path(path).context("creating CSV")?;
    write_csv_to(writer, spectra)
}

pub fn write_csv_to<W: std::io::Write>(mut writer: csv::Writer<W>, spectra: &[Spectrum]) -> Result<()> {
    let columns: BTreeSet<&str> = spectra
        .iter()
        .flat_map(|sp| sp.report.iter().map(|(k, _)| k.as_str()))
        .filter(|k| ![ID_COLUMN, X_COLUMN, Y_COLUMN].contains(k))
        .collect();

    let mut header = vec![ID_COLUMN, X_COLUMN, Y_COLUMN];
    header.extend(columns.iter().copied());
    writer.write_record(&header).context("writing CSV header")?;

    for sp in spectra {
        let mut row = vec![
            sp.id.clone(),
            join_floats(&sp.wave_numbers()),
            join_floats(&sp.amplitudes()),
        ];
        for col in &columns {
            row.push(
                sp.report
                    .value(col)
                    .map(|v| v.to_string())
                    .unwrap_or_default(),
            );
        }
        writer
            .write_record(&row)
            .with_context(|| format!("writing spectrum '{}'", sp.id))?;
    }
    writer.flush().context("flushing CSV")?;
    Ok(())
}

fn join_floats(values: &[f64]) -> String {
    values
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join(";")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_guesses_report_types() {
        let data = "id,x,y,sample,conc,valid,note\n\
                    a,1;2;3,0.1;0.2;0.3,S1,1.5,true,\n";
        let spectra = read_csv_from(csv::Reader::from_reader(data.as_bytes())).unwrap();
        assert_eq!(spectra.len(), 1);
        let sp = &spectra[0];
        assert_eq!(sp.id, "a");
        assert_eq!(sp.wave_numbers(), vec![1.0, 2.0, 3.0]);
        assert_eq!(sp.report.string("sample"), Some("S1"));
        assert_eq!(sp.report.numeric("conc"), Some(1.5));
        assert_eq!(sp.report.boolean("valid"), Some(true));
        assert!(!sp.report.has_field("note"));
    }

    #[test]
    fn test_bad_number_reports_position() {
        let data = "x,y\n1;oops,1;2\n";
        let err = read_csv_from(csv::Reader::from_reader(data.as_bytes())).unwrap_err();
        assert!(format!("{err:#}").contains("x[1]"));
    }

    #[test]
    fn test_round_trip_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("spectra.csv");

        let mut a = Spectrum::from_arrays("a", &[1.0, 2.0], &[0.5, -0.25]).unwrap();
        a.report.set_string("sample", "A");
        a.report.set_numeric("conc", 2.0);
        let mut b = Spectrum::from_arrays("b", &[1.0, 2.0], &[1.5, 1.25]).unwrap();
        b.report.set_boolean("valid", false);

        write_csv(&path, &[a.clone(), b.clone()]).unwrap();
        let read = read_csv(&path).unwrap();

        assert_eq!(read, vec![a, b]);
    }
}
