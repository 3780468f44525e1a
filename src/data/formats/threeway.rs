use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{bail, Context, Result};
use ordered_float::OrderedFloat;

use crate::data::threeway::{L1Point, L2Point, ThreeWayData};

// ---------------------------------------------------------------------------
// XYZ layout: one row per cell
// ---------------------------------------------------------------------------
//
//   x,y,z,value
//   0,240,300,0.12
//   0,240,310,0.14
//
// Consecutive rows sharing (x, y) form one L1 point.

pub fn read_xyz(path: &Path) -> Result<ThreeWayData> {
    let reader = csv::Reader::from_path(path).context("opening XYZ file")?;
    let id = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_string();
    read_xyz_from(reader, id)
}

pub fn read_xyz_from<R: std::io::Read>(
    mut reader: csv::Reader<R>,
    id: impl Into<String>,
) -> Result<ThreeWayData> {
    let headers = reader.headers().context("reading XYZ header")?.clone();
    let column = |name: &str| {
        headers
            .iter()
            .position(|h| h.trim().eq_ignore_ascii_case(name))
            .with_context(|| format!("XYZ file missing '{name}' column"))
    };
    let (xi, yi, zi, vi) = (column("x")?, column("y")?, column("z")?, column("value")?);

    let mut data = ThreeWayData::new(id);
    let mut current: Option<L1Point> = None;

    for (row_no, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("XYZ row {row_no}"))?;
        let cell = |idx: usize, name: &str| -> Result<f64> {
            let raw = record.get(idx).unwrap_or("").trim();
            raw.parse::<f64>()
                .with_context(|| format!("XYZ row {row_no}, {name}: '{raw}' is not a number"))
        };
        let (x, y, z, v) = (cell(xi, "x")?, cell(yi, "y")?, cell(zi, "z")?, cell(vi, "value")?);

        match current.as_mut() {
            Some(l1) if l1.x == x && l1.y == y => l1.add(L2Point::new(z, v)),
            _ => {
                if let Some(done) = current.take() {
                    data.add(done);
                }
                current = Some(L1Point::with_points(x, y, vec![L2Point::new(z, v)]));
            }
        }
    }
    if let Some(done) = current {
        data.add(done);
    }
    Ok(data)
}

pub fn write_xyz(path: &Path, data: &ThreeWayData) -> Result<()> {
    let writer = csv::Writer::from_path(path).context("creating XYZ file")?;
    write_xyz_to(writer, data)
}

pub fn write_xyz_to<W: std::io::Write>(mut writer: csv::Writer<W>, data: &ThreeWayData) -> Result<()> {
    writer
        .write_record(["x", "y", "z", "value"])
        .context("writing XYZ header")?;
    for (x, y, z, v) in data.cells() {
        writer
            .write_record([x.to_string(), y.to_string(), z.to_string(), v.to_string()])
            .context("writing XYZ row")?;
    }
    writer.flush().context("flushing XYZ file")?;
    Ok(())
}

// ---------------------------------------------------------------------------
// EEM layout: excitation rows × emission columns
// ---------------------------------------------------------------------------
//
//   ,300,310,320        <- emission (z)
//   240,0.1,0.2,0.3     <- excitation (y), then one value per z
//   250,0.4,0.5,0.6
//
// Empty cells are skipped. All L1 points get the same caller-supplied x.

pub fn read_eem(path: &Path, x: f64) -> Result<ThreeWayData> {
    let reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .from_path(path)
        .context("opening EEM file")?;
    let id = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_string();
    read_eem_from(reader, id, x)
}

/// `reader` must be configured without headers; the first row is parsed here.
pub fn read_eem_from<R: std::io::Read>(
    mut reader: csv::Reader<R>,
    id: impl Into<String>,
    x: f64,
) -> Result<ThreeWayData> {
    let mut records = reader.records();
    let header = match records.next() {
        Some(h) => h.context("reading EEM header row")?,
        None => bail!("EEM file is empty"),
    };
    let emissions: Vec<f64> = header
        .iter()
        .skip(1)
        .enumerate()
        .map(|(j, raw)| {
            raw.trim()
                .parse::<f64>()
                .with_context(|| format!("EEM header column {}: '{raw}' is not a number", j + 1))
        })
        .collect::<Result<_>>()?;

    let mut data = ThreeWayData::new(id);
    for (row_no, result) in records.enumerate() {
        let record = result.with_context(|| format!("EEM row {}", row_no + 1))?;
        let mut cells = record.iter();
        let raw_y = cells.next().unwrap_or("").trim();
        if raw_y.is_empty() {
            continue;
        }
        let y: f64 = raw_y
            .parse()
            .with_context(|| format!("EEM row {}: bad excitation '{raw_y}'", row_no + 1))?;

        let mut l1 = L1Point::new(x, y);
        for (j, raw) in cells.enumerate() {
            let raw = raw.trim();
            if raw.is_empty() {
                continue;
            }
            let z = *emissions
                .get(j)
                .with_context(|| format!("EEM row {}: more values than emission columns", row_no + 1))?;
            let v: f64 = raw
                .parse()
                .with_context(|| format!("EEM row {}, column {}: '{raw}' is not a number", row_no + 1, j + 1))?;
            l1.add(L2Point::new(z, v));
        }
        data.add(l1);
    }
    Ok(data)
}

/// Write the (y, z) grid of `data` in EEM layout. L1 points with different x
/// values are summed into the same cell; use XYZ for multi-layer data.
pub fn write_eem(path: &Path, data: &ThreeWayData) -> Result<()> {
    let writer = csv::WriterBuilder::new()
        .flexible(true)
        .from_path(path)
        .context("creating EEM file")?;
    write_eem_to(writer, data)
}

pub fn write_eem_to<W: std::io::Write>(mut writer: csv::Writer<W>, data: &ThreeWayData) -> Result<()> {
    if data.x_values().len() > 1 {
        log::warn!(
            "'{}' has {} x layers; EEM output sums them",
            data.id,
            data.x_values().len()
        );
    }
    let zs = data.z_values();
    let mut grid: BTreeMap<OrderedFloat<f64>, BTreeMap<OrderedFloat<f64>, f64>> = BTreeMap::new();
    for (_, y, z, v) in data.cells() {
        *grid
            .entry(OrderedFloat(y))
            .or_default()
            .entry(OrderedFloat(z))
            .or_insert(0.0) += v;
    }

    let mut header = vec![String::new()];
    header.extend(zs.iter().map(|z| z.to_string()));
    writer.write_record(&header).context("writing EEM header")?;

    for (y, row) in &grid {
        let mut record = vec![y.0.to_string()];
        record.extend(zs.iter().map(|z| {
            row.get(&OrderedFloat(*z))
                .map(|v| v.to_string())
                .unwrap_or_default()
        }));
        writer.write_record(&record).context("writing EEM row")?;
    }
    writer.flush().context("flushing EEM file")?;
    Ok(())
}
