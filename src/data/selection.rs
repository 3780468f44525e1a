use std::collections::{BTreeMap, BTreeSet};

use super::model::SpectralDataset;
use super::report::ReportValue;

// ---------------------------------------------------------------------------
// Selection predicate: which report values are selected per field
// ---------------------------------------------------------------------------

/// Per-field selection state: maps field name → set of selected values.
/// A field absent from the map places no constraint.
pub type SelectionState = BTreeMap<String, BTreeSet<ReportValue>>;

/// Initialise a [`SelectionState`] with all values selected (i.e., show everything).
pub fn init_selection_state(dataset: &SpectralDataset) -> SelectionState {
    dataset
        .unique_values
        .iter()
        .map(|(col, vals)| (col.clone(), vals.clone()))
        .collect()
}

/// Return indices of spectra that pass all active selections.
///
/// A spectrum passes a field selection when:
/// * The field is not present in `selections` → passes (no constraint)
/// * The selected set for that field is empty → nothing selected → fails
/// * Every distinct value of the field is selected → passes, even when the
///   spectrum lacks the field
/// * The spectrum's value for that field is in the selected set → passes
pub fn selected_indices(dataset: &SpectralDataset, selections: &SelectionState) -> Vec<usize> {
    dataset
        .spectra
        .iter()
        .enumerate()
        .filter(|(_, sp)| {
            selections.iter().all(|(col, selected)| {
                if selected.is_empty() {
                    return false;
                }
                if let Some(all_vals) = dataset.unique_values.get(col) {
                    if selected.len() == all_vals.len() {
                        return true;
                    }
                }
                sp.report
                    .value(col)
                    .is_some_and(|val| selected.contains(val))
            })
        })
        .map(|(i, _)| i)
        .collect()
}
