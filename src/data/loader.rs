use std::path::Path;

use anyhow::{bail, Context, Result};

use super::formats::{csv, json, parquet, simple, threeway};
use super::model::{SpectralDataset, Spectrum};
use super::threeway::ThreeWayData;

/// Extensions accepted by [`load_file`], for file dialogs.
pub const SPECTRUM_EXTENSIONS: &[&str] = &["parquet", "pq", "json", "csv", "sspec"];
/// Extensions accepted by [`save_file`].
pub const WRITABLE_EXTENSIONS: &[&str] = &["json", "csv", "sspec"];

fn extension(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase()
}

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Read all spectra from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.parquet` – Parquet file with `x` and `y` list columns
/// * `.json`    – `[{ "id", "waves", "amplitudes", "report" }, ...]`
/// * `.csv`     – columns `x` and `y` containing semicolon-separated floats
/// * `.sspec`   – simple text format (report lines, `---`, points)
pub fn read_spectra(path: &Path) -> Result<Vec<Spectrum>> {
    let spectra = match extension(path).as_str() {
        "parquet" | "pq" => parquet::read_parquet(path),
        "json" => json::read_json(path),
        "csv" => csv::read_csv(path),
        "sspec" => simple::read_simple(path),
        other => bail!("Unsupported file extension: .{other}"),
    }
    .with_context(|| format!("loading {}", path.display()))?;

    log::info!("read {} spectra from {}", spectra.len(), path.display());
    Ok(spectra)
}

/// Load a file into a [`SpectralDataset`] for viewing.
pub fn load_file(path: &Path) -> Result<SpectralDataset> {
    read_spectra(path).map(SpectralDataset::from_spectra)
}

/// Write spectra to a file.  Dispatch by extension (`.json`, `.csv`, `.sspec`).
pub fn save_file(path: &Path, spectra: &[Spectrum]) -> Result<()> {
    match extension(path).as_str() {
        "json" => json::write_json(path, spectra),
        "csv" => csv::write_csv(path, spectra),
        "sspec" => simple::write_simple(path, spectra),
        other => bail!("Unsupported output extension: .{other}"),
    }
    .with_context(|| format!("saving {}", path.display()))?;

    log::info!("wrote {} spectra to {}", spectra.len(), path.display());
    Ok(())
}

/// Read 3-way data: `.eem` as an excitation-emission matrix (x = 0),
/// anything else as `x,y,z,value` rows.
pub fn read_three_way(path: &Path) -> Result<ThreeWayData> {
    match extension(path).as_str() {
        "eem" => threeway::read_eem(path, 0.0),
        _ => threeway::read_xyz(path),
    }
    .with_context(|| format!("loading {}", path.display()))
}

/// Write 3-way data: `.eem` as a matrix, anything else as `x,y,z,value` rows.
pub fn save_three_way(path: &Path, data: &ThreeWayData) -> Result<()> {
    match extension(path).as_str() {
        "eem" => threeway::write_eem(path, data),
        _ => threeway::write_xyz(path, data),
    }
    .with_context(|| format!("saving {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dispatch_round_trip_per_extension() {
        let mut sp = Spectrum::from_arrays("s1", &[1.0, 2.0, 3.0], &[0.5, 0.25, 0.125]).unwrap();
        sp.report.set_numeric("Protein", 12.0);

        let dir = tempfile::tempdir().unwrap();
        for ext in WRITABLE_EXTENSIONS {
            let path = dir.path().join(format!("out.{ext}"));
            save_file(&path, std::slice::from_ref(&sp)).unwrap();
            let ds = load_file(&path).unwrap();
            assert_eq!(ds.len(), 1, "{ext}");
            assert_eq!(ds.spectra[0].amplitudes(), sp.amplitudes(), "{ext}");
            assert_eq!(ds.spectra[0].report.numeric("Protein"), Some(12.0), "{ext}");
        }
    }

    #[test]
    fn test_unknown_extension() {
        let err = read_spectra(Path::new("data.xyz")).unwrap_err();
        assert!(format!("{err:#}").contains("Unsupported"));
    }
}
