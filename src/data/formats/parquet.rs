use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use arrow::array::{
    Array, AsArray, BooleanArray, Float32Array, Float64Array, Int32Array, Int64Array,
    LargeListArray, ListArray, StringArray,
};
use arrow::datatypes::DataType;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;

use crate::data::model::Spectrum;
use crate::data::report::ReportValue;

// ---------------------------------------------------------------------------
// Parquet reader
// ---------------------------------------------------------------------------

/// Load a Parquet file containing spectral data.
///
/// Expected schema:
/// - `x`: List<Float64> or LargeList<Float64> – wavenumber arrays
/// - `y`: List<Float64> or LargeList<Float64> – amplitude arrays
/// - `id` (optional): Utf8 spectrum identifier
/// - Any other columns become report fields (strings, ints, floats, bools)
///
/// Works with files written by both **Pandas** (`df.to_parquet()`) and
/// **Polars** (`df.write_parquet()`).
pub fn read_parquet(path: &Path) -> Result<Vec<Spectrum>> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder =
        ParquetRecordBatchReaderBuilder::try_new(file).context("reading parquet metadata")?;
    let reader = builder.build().context("building parquet reader")?;

    let mut spectra = Vec::new();

    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        let schema = batch.schema();
        let n_rows = batch.num_rows();

        let x_idx = schema
            .index_of("x")
            .map_err(|_| anyhow::anyhow!("Parquet file missing 'x' column"))?;
        let y_idx = schema
            .index_of("y")
            .map_err(|_| anyhow::anyhow!("Parquet file missing 'y' column"))?;
        let id_idx = schema.index_of("id").ok();

        let x_col = batch.column(x_idx);
        let y_col = batch.column(y_idx);

        // Report columns: everything except x, y and id
        let meta_cols: Vec<(usize, String)> = schema
            .fields()
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != x_idx && *i != y_idx && Some(*i) != id_idx)
            .map(|(i, f)| (i, f.name().clone()))
            .collect();

        for row in 0..n_rows {
            let x = extract_f64_list(x_col, row)
                .with_context(|| format!("Row {row}: failed to read 'x'"))?;
            let y = extract_f64_list(y_col, row)
                .with_context(|| format!("Row {row}: failed to read 'y'"))?;

            let id = id_idx
                .and_then(|i| extract_report_value(batch.column(i), row))
                .map(|v| v.to_string())
                .unwrap_or_else(|| format!("spectrum {}", spectra.len()));

            let mut sp = Spectrum::from_arrays(id, &x, &y)
                .with_context(|| format!("Row {row}"))?;

            for (col_idx, col_name) in &meta_cols {
                if let Some(value) = extract_report_value(batch.column(*col_idx), row) {
                    sp.report.insert(col_name.clone(), value);
                }
            }

            spectra.push(sp);
        }
    }

    log::debug!("read {} spectra from {}", spectra.len(), path.display());
    Ok(spectra)
}

// -- Parquet / Arrow helpers --

/// Extract a `Vec<f64>` from a List or LargeList column at the given row.
fn extract_f64_list(col: &Arc<dyn Array>, row: usize) -> Result<Vec<f64>> {
    if col.is_null(row) {
        bail!("null value in list column");
    }

    let values_array = match col.data_type() {
        DataType::List(_) => {
            let list_arr = col
                .as_any()
                .downcast_ref::<ListArray>()
                .context("expected ListArray")?;
            list_arr.value(row)
        }
        DataType::LargeList(_) => {
            let list_arr = col
                .as_any()
                .downcast_ref::<LargeListArray>()
                .context("expected LargeListArray")?;
            list_arr.value(row)
        }
        other => bail!("Expected List or LargeList column, got {other:?}"),
    };

    // The inner array can be Float64 or Float32
    if let Some(f64_arr) = values_array.as_any().downcast_ref::<Float64Array>() {
        Ok(f64_arr.iter().map(|v| v.unwrap_or(f64::NAN)).collect())
    } else if let Some(f32_arr) = values_array.as_any().downcast_ref::<Float32Array>() {
        Ok(f32_arr.iter().map(|v| v.unwrap_or(f32::NAN) as f64).collect())
    } else {
        bail!(
            "List inner type is {:?}, expected Float64 or Float32",
            values_array.data_type()
        )
    }
}

/// Extract a single report value from an Arrow column at a given row.
/// Nulls yield `None`; unsupported column types are kept as `Unknown` text.
fn extract_report_value(col: &Arc<dyn Array>, row: usize) -> Option<ReportValue> {
    if col.is_null(row) {
        return None;
    }
    let any = col.as_any();
    let value = match col.data_type() {
        DataType::Utf8 => ReportValue::String(any.downcast_ref::<StringArray>()?.value(row).to_string()),
        DataType::LargeUtf8 => ReportValue::String(col.as_string::<i64>().value(row).to_string()),
        DataType::Int32 => ReportValue::Numeric(any.downcast_ref::<Int32Array>()?.value(row) as f64),
        DataType::Int64 => ReportValue::Numeric(any.downcast_ref::<Int64Array>()?.value(row) as f64),
        DataType::Float32 => {
            ReportValue::Numeric(any.downcast_ref::<Float32Array>()?.value(row) as f64)
        }
        DataType::Float64 => ReportValue::Numeric(any.downcast_ref::<Float64Array>()?.value(row)),
        DataType::Boolean => ReportValue::Boolean(any.downcast_ref::<BooleanArray>()?.value(row)),
        other => ReportValue::Unknown(format!("{other:?}")),
    };
    Some(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::{Float64Builder, ListBuilder};
    use arrow::datatypes::{Field, Schema};
    use arrow::record_batch::RecordBatch;
    use parquet::arrow::ArrowWriter;

    #[test]
    fn test_read_pandas_layout() {
        let mut x_builder = ListBuilder::new(Float64Builder::new());
        let mut y_builder = ListBuilder::new(Float64Builder::new());
        for row in 0..2 {
            for i in 0..3 {
                x_builder.values().append_value(1000.0 + i as f64);
                y_builder.values().append_value(row as f64 + i as f64 * 0.1);
            }
            x_builder.append(true);
            y_builder.append(true);
        }
        let item = Arc::new(Field::new("item", DataType::Float64, true));
        let schema = Arc::new(Schema::new(vec![
            Field::new("x", DataType::List(item.clone()), false),
            Field::new("y", DataType::List(item), false),
            Field::new("id", DataType::Utf8, false),
            Field::new("batch", DataType::Int64, true),
        ]));
        let batch = RecordBatch::try_new(
            schema.clone(),
            vec![
                Arc::new(x_builder.finish()),
                Arc::new(y_builder.finish()),
                Arc::new(StringArray::from(vec!["first", "second"])),
                Arc::new(Int64Array::from(vec![Some(7), None])),
            ],
        )
        .unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("spectra.parquet");
        let file = std::fs::File::create(&path).unwrap();
        let mut writer = ArrowWriter::try_new(file, schema, None).unwrap();
        writer.write(&batch).unwrap();
        writer.close().unwrap();

        let spectra = read_parquet(&path).unwrap();
        assert_eq!(spectra.len(), 2);
        assert_eq!(spectra[0].id, "first");
        assert_eq!(spectra[1].wave_numbers(), vec![1000.0, 1001.0, 1002.0]);
        assert_eq!(spectra[0].report.numeric("batch"), Some(7.0));
        assert!(!spectra[1].report.has_field("batch"));
    }
}
