//! JSON emitted back to the CI system and the upload helpers deciding what goes in it.

use anyhow::{Context, Result};
use regex::Regex;
use serde::Serialize;
use std::fmt;

use crate::input::VersionRef;

/// Version reported after a purge. Getting it back is a no-op.
pub const DELETED_VERSION: &str = "<DELETED>";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Envelope {
    pub version: VersionRef,
    pub metadata: Vec<serde_json::Value>,
}

impl Envelope {
    pub fn new(version: VersionRef) -> Self {
        Self {
            version,
            metadata: Vec::new(),
        }
    }

    pub fn deleted() -> Self {
        Self::new(VersionRef::new(DELETED_VERSION))
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("Failed to serialize output")
    }
}

/// Renders the `check` output: one `{"version": ...}` object per version.
pub fn versions_json(versions: &[String]) -> Result<String> {
    let refs: Vec<VersionRef> = versions.iter().map(VersionRef::new).collect();
    serde_json::to_string_pretty(&refs).context("Failed to serialize versions")
}

/// Store format of a batch of files.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackageType {
    Deb,
    Rpm,
    Raw,
}

impl PackageType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PackageType::Deb => "deb",
            PackageType::Rpm => "rpm",
            PackageType::Raw => "raw",
        }
    }
}

impl fmt::Display for PackageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `deb` or `rpm` when every file has that extension, `raw` otherwise.
pub fn determine_package_type<S: AsRef<str>>(filenames: &[S]) -> PackageType {
    let extension = |name: &str| {
        name.rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .unwrap_or_default()
    };

    let mut extensions = filenames.iter().map(|f| extension(f.as_ref()));
    let Some(first) = extensions.next() else {
        return PackageType::Raw;
    };
    if !extensions.all(|e| e == first) {
        return PackageType::Raw;
    }

    match first.as_str() {
        "deb" => PackageType::Deb,
        "rpm" => PackageType::Rpm,
        _ => PackageType::Raw,
    }
}

/// Applies a one-group regex to every filename; the last full match wins.
///
/// The pattern must match the whole filename. Fails if the pattern is not a
/// valid regex.
pub fn extract_version<S: AsRef<str>>(pattern: &str, filenames: &[S]) -> Result<Option<String>> {
    let regex = Regex::new(&format!("^(?:{})$", pattern))
        .with_context(|| format!("Invalid version pattern: {}", pattern))?;
    if regex.captures_len() != 2 {
        return Ok(None);
    }

    Ok(filenames
        .iter()
        .filter_map(|f| regex.captures(f.as_ref()))
        .filter_map(|c| c.get(1).map(|m| m.as_str().to_string()))
        .last())
}
