use std::collections::BTreeMap;

use crate::store::PackageArtifact;
use crate::version;

/// Lists the fully published versions at or above `current`, oldest first.
///
/// A version counts as incomplete when any of its artifacts is pending or failed.
/// `current` itself is always reported, even if it is no longer in the store.
pub fn check_for_new_versions(current: Option<&str>, artifacts: &[PackageArtifact]) -> Vec<String> {
    let mut complete: BTreeMap<&str, bool> = BTreeMap::new();
    for artifact in artifacts {
        let entry = complete.entry(artifact.version.as_str()).or_insert(true);
        *entry &= artifact.is_synced();
    }
    if let Some(current) = current {
        complete.insert(current, true);
    }

    let mut versions: Vec<String> = complete
        .into_iter()
        .filter(|(_, complete)| *complete)
        .map(|(v, _)| v)
        .filter(|v| current.is_none_or(|c| version::compare(v, c).is_ge()))
        .map(str::to_string)
        .collect();
    versions.sort_by(|a, b| version::compare_strict(a, b));
    versions
}
