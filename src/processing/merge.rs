use super::{ProcessingError, Result, Statistic};
use crate::data::model::{MultiSpectrum, Spectrum, SpectrumPoint};

/// Combine spectra point by point (paired by index) with `statistic`.
///
/// The output takes its wave numbers and header from the first spectrum and
/// records how it was built in the report.
pub fn combine(spectra: &[Spectrum], statistic: Statistic) -> Result<Spectrum> {
    let first = spectra
        .first()
        .ok_or_else(|| ProcessingError::EmptyInput("no spectra to combine".into()))?;
    if let Some(other) = spectra.iter().find(|sp| sp.len() != first.len()) {
        return Err(ProcessingError::LengthMismatch {
            expected: first.len(),
            actual: other.len(),
        });
    }

    let mut out = first.clone_header();
    let mut column = Vec::with_capacity(spectra.len());
    for (i, p) in first.points().iter().enumerate() {
        column.clear();
        column.extend(spectra.iter().map(|sp| sp.points()[i].amplitude()));
        out.push(SpectrumPoint::new(p.wave_number(), statistic.apply(&column)));
    }
    out.report.set_string("Merge statistic", statistic.to_string());
    out.report.set_numeric("Merge count", spectra.len() as f64);
    Ok(out)
}

/// Per-index mean of a set of spectra; the reference used by MSC.
pub fn average_spectrum(spectra: &[Spectrum]) -> Result<Spectrum> {
    let mut avg = combine(spectra, Statistic::Mean)?;
    avg.id = "average".to_string();
    Ok(avg)
}

/// Collapse replicate scans into a single spectrum carrying the
/// multi-spectrum's id and report.
pub fn reduce(multi: &MultiSpectrum, statistic: Statistic) -> Result<Spectrum> {
    let mut out = combine(multi.spectra(), statistic)?;
    out.id = multi.id.clone();
    out.report.merge(multi.report());
    log::debug!(
        "reduced {} replicates of '{}' with {statistic}",
        multi.len(),
        multi.id
    );
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn replicate(amps: &[f64]) -> Spectrum {
        Spectrum::from_arrays("r", &[1.0, 2.0, 3.0], amps).unwrap()
    }

    #[test]
    fn test_reduce_with_each_statistic() {
        let mut multi = MultiSpectrum::new("sample-7");
        multi.report.set_string("Instrument", "FOSS");
        multi.push(replicate(&[1.0, 2.0, 3.0]));
        multi.push(replicate(&[3.0, 2.0, 9.0]));
        multi.push(replicate(&[2.0, 5.0, 6.0]));

        let mean = reduce(&multi, Statistic::Mean).unwrap();
        assert_eq!(mean.id, "sample-7");
        assert_eq!(mean.amplitudes(), vec![2.0, 3.0, 6.0]);
        assert_eq!(mean.report.string("Instrument"), Some("FOSS"));
        assert_eq!(mean.report.numeric("Merge count"), Some(3.0));

        let median = reduce(&multi, Statistic::Median).unwrap();
        assert_eq!(median.amplitudes(), vec![2.0, 2.0, 6.0]);

        let sd = reduce(&multi, Statistic::Stdev).unwrap();
        assert_eq!(sd.amplitudes()[0], 1.0);
    }

    #[test]
    fn test_combine_errors() {
        assert!(matches!(
            combine(&[], Statistic::Mean),
            Err(ProcessingError::EmptyInput(_))
        ));
        let short = Spectrum::from_arrays("s", &[1.0], &[1.0]).unwrap();
        assert!(matches!(
            combine(&[replicate(&[1.0, 2.0, 3.0]), short], Statistic::Mean),
            Err(ProcessingError::LengthMismatch { expected: 3, actual: 1 })
        ));
    }
}
