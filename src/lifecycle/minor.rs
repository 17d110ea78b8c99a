//! Keeps the newest patch of every superseded minor line out of a purge.

use std::collections::BTreeMap;

use crate::version::{self, MinorBranch};

/// Branch of the highest version, or `None` for an empty list.
pub fn latest_minor<S: AsRef<str>>(versions: &[S]) -> Option<MinorBranch> {
    versions
        .iter()
        .map(AsRef::as_ref)
        .max_by(|a, b| version::compare_strict(a, b))
        .map(MinorBranch::of)
}

/// Highest version of each minor branch in `candidates`, except `latest_minor`'s.
///
/// Output is sorted ascending by version.
pub fn last_minor_patches<S: AsRef<str>>(
    latest_minor: Option<&MinorBranch>,
    candidates: &[S],
) -> Vec<String> {
    let mut branches: BTreeMap<MinorBranch, &str> = BTreeMap::new();

    for candidate in candidates.iter().map(AsRef::as_ref) {
        let branch = MinorBranch::of(candidate);
        if Some(&branch) == latest_minor {
            continue;
        }
        branches
            .entry(branch)
            .and_modify(|best| {
                if version::compare_strict(candidate, best).is_gt() {
                    *best = candidate;
                }
            })
            .or_insert(candidate);
    }

    let mut patches: Vec<String> = branches.into_values().map(str::to_string).collect();
    patches.sort_by(|a, b| version::compare_strict(a, b));
    patches
}
