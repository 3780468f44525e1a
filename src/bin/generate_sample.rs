//! Writes synthetic NIR-like data for trying out the workbench:
//! `sample_data.parquet` and `sample_data.json` with scatter-affected
//! spectra, and `sample_eem.eem` with an excitation-emission matrix.

use std::fs::File;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{Float64Array, Float64Builder, ListBuilder, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use spectra_workbench::data::loader;
use spectra_workbench::data::model::Spectrum;
use spectra_workbench::data::threeway::{L1Point, L2Point, ThreeWayData};

fn gaussian(x: f64, mu: f64, sigma: f64, amplitude: f64) -> f64 {
    amplitude * (-(x - mu).powi(2) / (2.0 * sigma.powi(2))).exp()
}

/// Box-Muller normal sample.
fn normal(rng: &mut StdRng, std_dev: f64) -> f64 {
    let u1: f64 = rng.gen_range(f64::EPSILON..1.0);
    let u2: f64 = rng.gen();
    std_dev * (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos()
}

/// Peaks scaled by concentration, then multiplicative and additive scatter
/// plus noise: `offset + gain * signal + e`.
fn generate_spectrum(
    wave_numbers: &[f64],
    peaks: &[(f64, f64, f64)],
    noise_level: f64,
    rng: &mut StdRng,
) -> (Vec<f64>, f64, f64) {
    let gain = rng.gen_range(0.8..1.25);
    let offset = rng.gen_range(-0.05..0.05);
    let amplitudes = wave_numbers
        .iter()
        .map(|&wn| {
            let signal: f64 = peaks
                .iter()
                .map(|&(mu, sigma, amp)| gaussian(wn, mu, sigma, amp))
                .sum();
            offset + gain * signal + normal(rng, noise_level)
        })
        .collect();
    (amplitudes, gain, offset)
}

fn sample_spectra(rng: &mut StdRng) -> Result<Vec<Spectrum>> {
    // Wave numbers: 1100 → 2498, step 2
    let wave_numbers: Vec<f64> = (0..700).map(|i| 1100.0 + i as f64 * 2.0).collect();

    let concentrations = [0.1, 0.5, 1.0, 2.0, 5.0];
    let operators = ["Alice", "Bob"];
    let sample_peaks: [(&str, [(f64, f64, f64); 3]); 3] = [
        ("Sample_A", [(1450.0, 40.0, 0.8), (1940.0, 35.0, 0.5), (2100.0, 30.0, 0.3)]),
        ("Sample_B", [(1200.0, 30.0, 0.6), (1720.0, 25.0, 0.7), (2300.0, 35.0, 0.4)]),
        ("Sample_C", [(1500.0, 45.0, 0.9), (1900.0, 30.0, 0.4), (2350.0, 25.0, 0.5)]),
    ];

    let mut spectra = Vec::new();
    for (sample, peaks_base) in &sample_peaks {
        for &conc in &concentrations {
            let peaks: Vec<(f64, f64, f64)> = peaks_base
                .iter()
                .map(|&(mu, sigma, amp)| (mu, sigma, amp * conc))
                .collect();

            for &operator in &operators {
                let (amplitudes, gain, offset) =
                    generate_spectrum(&wave_numbers, &peaks, 0.005 * conc, rng);
                let id = format!("{sample}-{conc}-{operator}");
                let mut sp = Spectrum::from_arrays(id, &wave_numbers, &amplitudes)?;
                sp.report.set_string("sample", *sample);
                sp.report.set_numeric("concentration", conc);
                sp.report.set_string("operator", operator);
                sp.report.set_numeric("scatter gain", gain);
                sp.report.set_numeric("scatter offset", offset);
                spectra.push(sp);
            }
        }
    }

    // One spectrum with its halves swapped, to exercise outlier detection.
    if let Some(first) = spectra.first() {
        let mut amplitudes = first.amplitudes();
        let half = amplitudes.len() / 2;
        amplitudes.rotate_left(half);
        let mut swapped = Spectrum::from_arrays("swapped", &first.wave_numbers(), &amplitudes)?;
        swapped.report = first.report.clone();
        swapped.report.set_string("operator", "Mallory");
        spectra.push(swapped);
    }

    Ok(spectra)
}

fn write_parquet(path: &Path, spectra: &[Spectrum]) -> Result<()> {
    let list_field = Arc::new(Field::new("item", DataType::Float64, true));

    let mut x_builder = ListBuilder::new(Float64Builder::new());
    let mut y_builder = ListBuilder::new(Float64Builder::new());
    for sp in spectra {
        x_builder.values().append_slice(&sp.wave_numbers());
        x_builder.append(true);
        y_builder.values().append_slice(&sp.amplitudes());
        y_builder.append(true);
    }

    let text = |name: &str| -> StringArray {
        spectra
            .iter()
            .map(|sp| sp.report.string(name).map(str::to_string))
            .collect()
    };
    let number = |name: &str| -> Float64Array {
        spectra.iter().map(|sp| sp.report.numeric(name)).collect()
    };

    let schema = Arc::new(Schema::new(vec![
        Field::new("id", DataType::Utf8, false),
        Field::new("x", DataType::List(list_field.clone()), false),
        Field::new("y", DataType::List(list_field), false),
        Field::new("sample", DataType::Utf8, true),
        Field::new("concentration", DataType::Float64, true),
        Field::new("operator", DataType::Utf8, true),
    ]));

    let ids: StringArray = spectra.iter().map(|sp| Some(sp.id.as_str())).collect();
    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            Arc::new(ids),
            Arc::new(x_builder.finish()),
            Arc::new(y_builder.finish()),
            Arc::new(text("sample")),
            Arc::new(number("concentration")),
            Arc::new(text("operator")),
        ],
    )
    .context("Failed to create RecordBatch")?;

    let file = File::create(path)
        .with_context(|| format!("Failed to create output file: {}", path.display()))?;
    let mut writer = ArrowWriter::try_new(file, schema, None).context("Failed to create writer")?;
    writer.write(&batch).context("Failed to write batch")?;
    writer.close().context("Failed to close writer")?;
    Ok(())
}

/// Two fluorophores plus Rayleigh scatter along the excitation diagonal.
fn sample_eem(rng: &mut StdRng) -> ThreeWayData {
    let mut eem = ThreeWayData::new("sample_eem");
    eem.report.set_numeric("layer", 0.0);
    let fluorophores = [(280.0, 340.0, 1.0), (350.0, 450.0, 0.6)];

    for ex in (250..=400).step_by(10) {
        let ex = ex as f64;
        let mut l1 = L1Point::new(0.0, ex);
        for em in (300..=550).step_by(5) {
            let em = em as f64;
            let signal: f64 = fluorophores
                .iter()
                .map(|&(fex, fem, amp)| gaussian(ex, fex, 25.0, amp) * gaussian(em, fem, 30.0, 1.0))
                .sum();
            let scatter = gaussian(em, ex, 8.0, 2.0);
            l1.add(L2Point::new(em, signal + scatter + normal(rng, 0.002)));
        }
        eem.add(l1);
    }
    eem
}

fn main() -> Result<()> {
    env_logger::init();
    let mut rng = StdRng::seed_from_u64(42);

    let spectra = sample_spectra(&mut rng)?;
    write_parquet(Path::new("sample_data.parquet"), &spectra)?;
    loader::save_file(Path::new("sample_data.json"), &spectra)?;
    println!(
        "Wrote {} spectra to sample_data.parquet and sample_data.json",
        spectra.len()
    );

    let eem = sample_eem(&mut rng);
    loader::save_three_way(Path::new("sample_eem.eem"), &eem)?;
    println!("Wrote {} EEM cells to sample_eem.eem", eem.point_count());

    Ok(())
}
