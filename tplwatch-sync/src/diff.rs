//! New-template detection: `current \ known`.

use tplwatch_core::TemplateSet;

/// Every path in `current` that is absent from `known`, in `current`'s order.
///
/// Pure: no first-run special case. An empty `known` makes everything new;
/// suppressing that notice is the pipeline's call.
pub fn diff(known: &TemplateSet, current: &TemplateSet) -> Vec<String> {
    current
        .iter()
        .filter(|path| !known.contains(path.as_str()))
        .cloned()
        .collect()
}
