use log::warn;
use std::cmp::Ordering;
use std::collections::BTreeSet;

use super::catalog::{Catalog, VersionAggregate};
use super::minor::{last_minor_patches, latest_minor};
use crate::version;

/// Sort key used to decide which versions are the oldest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RetentionOrder {
    #[default]
    Version,
    UploadDate,
}

impl RetentionOrder {
    pub fn from_order_by_version(order_by_version: bool) -> Self {
        if order_by_version {
            RetentionOrder::Version
        } else {
            RetentionOrder::UploadDate
        }
    }

    fn compare(&self, a: &VersionAggregate, b: &VersionAggregate) -> Ordering {
        let by_version = || version::compare_strict(a.version(), b.version());
        match self {
            RetentionOrder::Version => by_version(),
            RetentionOrder::UploadDate => a
                .last_uploaded_at()
                .cmp(&b.last_uploaded_at())
                .then_with(by_version),
        }
    }
}

/// Returns the versions to delete so that only the `keep_last_n` newest remain.
///
/// Versions come out oldest first.
pub fn filter_for_deletion<'a>(
    aggregates: impl IntoIterator<Item = &'a VersionAggregate>,
    keep_last_n: i64,
    order: RetentionOrder,
) -> Vec<String> {
    let mut aggregates: Vec<&VersionAggregate> = aggregates.into_iter().collect();
    let count = aggregates.len();

    let to_delete = if keep_last_n <= 0 {
        count
    } else {
        count.saturating_sub(usize::try_from(keep_last_n).unwrap_or(usize::MAX))
    };
    if to_delete == 0 {
        return Vec::new();
    }

    aggregates.sort_by(|a, b| order.compare(a, b));
    aggregates
        .into_iter()
        .take(to_delete)
        .map(|a| a.version().to_string())
        .collect()
}

/// Outcome of the retention policy over a catalog.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RetentionDecision {
    /// Versions that survive, exceptions included.
    pub keep: Vec<String>,
    /// Versions to remove, exceptions excluded.
    pub delete: Vec<String>,
    /// Versions selected for deletion but preserved as the last patch of their minor line.
    pub exceptions: Vec<String>,
    /// The minor-patch guard ran without version ordering.
    pub ordering_inconsistent: bool,
}

impl RetentionDecision {
    pub fn should_delete(&self, version: &str) -> bool {
        self.delete.iter().any(|v| v == version)
    }

    pub fn is_exception(&self, version: &str) -> bool {
        self.exceptions.iter().any(|v| v == version)
    }
}

/// Applies the keep-count rule and, optionally, the minor-patch guard.
pub fn decide_retention(
    catalog: &Catalog,
    keep_last_n: i64,
    order_by_version: bool,
    keep_last_minor_patches: bool,
) -> RetentionDecision {
    let order = RetentionOrder::from_order_by_version(order_by_version);
    let candidates = filter_for_deletion(catalog.values(), keep_last_n, order);

    let mut exceptions = Vec::new();
    let mut ordering_inconsistent = false;
    if keep_last_minor_patches {
        let versions: Vec<&str> = catalog.keys().map(String::as_str).collect();
        let latest = latest_minor(&versions);
        exceptions = last_minor_patches(latest.as_ref(), &candidates);
        if !order_by_version {
            warn!("keep_last_minor_patches should only be used with order_by: version");
            ordering_inconsistent = true;
        }
    }

    let protected: BTreeSet<&str> = exceptions.iter().map(String::as_str).collect();
    let delete: Vec<String> = candidates
        .iter()
        .filter(|v| !protected.contains(v.as_str()))
        .cloned()
        .collect();

    let removed: BTreeSet<&str> = delete.iter().map(String::as_str).collect();
    let mut keep: Vec<String> = catalog
        .keys()
        .filter(|v| !removed.contains(v.as_str()))
        .cloned()
        .collect();
    keep.sort_by(|a, b| version::compare_strict(a, b));

    RetentionDecision {
        keep,
        delete,
        exceptions,
        ordering_inconsistent,
    }
}
