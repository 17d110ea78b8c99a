use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

use crate::store::PackageArtifact;

/// Aggregates keyed by version string.
pub type Catalog = BTreeMap<String, VersionAggregate>;

/// All artifacts sharing one version string.
#[derive(Debug, Clone, PartialEq)]
pub struct VersionAggregate {
    version: String,
    artifacts: Vec<PackageArtifact>,
    last_uploaded_at: Option<DateTime<Utc>>,
}

impl VersionAggregate {
    pub fn new(version: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            artifacts: Vec::new(),
            last_uploaded_at: None,
        }
    }

    /// Folds an artifact in and refreshes the latest upload time.
    pub fn consider(&mut self, artifact: PackageArtifact) {
        if let Some(uploaded_at) = artifact.uploaded_at
            && self.last_uploaded_at.is_none_or(|last| uploaded_at > last)
        {
            self.last_uploaded_at = Some(uploaded_at);
        }
        self.artifacts.push(artifact);
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn artifacts(&self) -> &[PackageArtifact] {
        &self.artifacts
    }

    pub fn last_uploaded_at(&self) -> Option<DateTime<Utc>> {
        self.last_uploaded_at
    }

    /// True if any artifact is still pending or failed to sync.
    pub fn has_incomplete(&self) -> bool {
        self.artifacts.iter().any(|a| !a.is_synced())
    }
}

/// Groups artifacts by version. The result does not depend on input order.
pub fn build(artifacts: impl IntoIterator<Item = PackageArtifact>) -> Catalog {
    let mut catalog = Catalog::new();
    for artifact in artifacts {
        catalog
            .entry(artifact.version.clone())
            .or_insert_with_key(|version| VersionAggregate::new(version.as_str()))
            .consider(artifact);
    }
    catalog
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::test_support::{artifact, uploaded};

    #[test]
    fn test_build_groups_by_version() {
        let catalog = build(vec![
            artifact("1.0", true, false),
            artifact("1.1", true, false),
            artifact("1.0", false, false),
        ]);

        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog["1.0"].artifacts().len(), 2);
        assert_eq!(catalog["1.0"].version(), "1.0");
        assert!(catalog["1.0"].has_incomplete());
        assert!(!catalog["1.1"].has_incomplete());
    }

    #[test]
    fn test_build_is_order_independent() {
        let a = build(vec![uploaded("1.0", 1), uploaded("1.0", 3), uploaded("2.0", 2)]);
        let b = build(vec![uploaded("2.0", 2), uploaded("1.0", 3), uploaded("1.0", 1)]);

        assert_eq!(a.keys().collect::<Vec<_>>(), b.keys().collect::<Vec<_>>());
        assert_eq!(a["1.0"].last_uploaded_at(), b["1.0"].last_uploaded_at());
    }

    #[test]
    fn test_last_uploaded_at_is_max() {
        let catalog = build(vec![uploaded("1.0", 5), uploaded("1.0", 9), uploaded("1.0", 2)]);
        assert_eq!(
            catalog["1.0"].last_uploaded_at(),
            uploaded("x", 9).uploaded_at
        );
    }

    #[test]
    fn test_missing_upload_time_is_ignored() {
        let mut aggregate = VersionAggregate::new("1.0");
        aggregate.consider(artifact("1.0", true, false));
        assert_eq!(aggregate.last_uploaded_at(), None);

        aggregate.consider(uploaded("1.0", 4));
        aggregate.consider(artifact("1.0", true, false));
        assert_eq!(aggregate.last_uploaded_at(), uploaded("x", 4).uploaded_at);
    }

    #[test]
    fn test_build_empty() {
        assert!(build(Vec::new()).is_empty());
    }
}
