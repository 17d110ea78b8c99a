use std::fmt;

use super::strip_epoch;

/// Release line of a version, e.g. `22.3` for `1:22.3.4.3-1`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MinorBranch(String);

impl MinorBranch {
    pub fn of(version: &str) -> Self {
        MinorBranch(extract_minor(version))
    }
}

impl fmt::Display for MinorBranch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl PartialEq<&str> for MinorBranch {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// Extracts the minor branch key of a version string.
///
/// The epoch and the trailing `-<release>` are removed, then the first two dot
/// separated components are kept. Versions with a single component are their own
/// branch.
pub fn extract_minor(version: &str) -> String {
    let version = strip_epoch(version);
    let version = match version.rfind('-') {
        Some(idx) => &version[..idx],
        None => version,
    };

    let mut components = version.split('.');
    match (components.next(), components.next()) {
        (Some(major), Some(minor)) => format!("{}.{}", major, minor),
        _ => version.to_string(),
    }
}
