use anyhow::Result;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// Distribution of a deb/rpm package in `name/codename` form (e.g. `ubuntu/focal`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Distribution {
    pub name: String,
    pub codename: String,
}

impl fmt::Display for Distribution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.name, self.codename)
    }
}

impl FromStr for Distribution {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split('/').collect();
        if parts.len() != 2 || parts[0].is_empty() || parts[1].is_empty() {
            anyhow::bail!(
                "Distribution invalid: {}. Format should be {{distribution}}/{{codename}}, e.g. ubuntu/focal.",
                s
            )
        } else {
            Ok(Distribution {
                name: parts[0].to_string(),
                codename: parts[1].to_string(),
            })
        }
    }
}

/// Search criteria for listing artifacts.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchQuery {
    pub name: Option<String>,
    pub version_filter: Option<String>,
    pub version: Option<String>,
    pub distribution: Option<Distribution>,
    pub package_type: Option<String>,
}

impl SearchQuery {
    /// Renders the store's query language: terms joined by ` AND `.
    ///
    /// Returns `None` when there is no criteria at all.
    pub fn to_query_string(&self) -> Option<String> {
        let mut terms = Vec::new();

        if let Some(name) = &self.name {
            terms.push(format!("filename:{}", name));
        }
        if let Some(filter) = &self.version_filter {
            terms.push(format!("version:{}", filter));
        }
        if let Some(version) = &self.version {
            terms.push(format!("version:{}", version));
        }
        if let Some(distribution) = &self.distribution {
            terms.push(format!("distribution:{}", distribution.name));
            terms.push(format!("distribution:{}", distribution.codename));
        }
        if let Some(package_type) = &self.package_type
            && package_type != "raw"
        {
            terms.push(format!("filename:{}$", package_type));
        }

        if terms.is_empty() {
            None
        } else {
            Some(terms.join(" AND "))
        }
    }
}

/// Parameters sent when registering an uploaded file as a package.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UploadRequest {
    /// Store format: `deb`, `rpm` or `raw`.
    pub package_type: String,
    pub version: Option<String>,
    pub distribution: Option<String>,
    pub tags: Option<String>,
    pub republish: bool,
}

#[derive(Serialize, Debug)]
pub(crate) struct CreatePackageBody<'a> {
    pub package_file: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distribution: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<&'a str>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub republish: bool,
}

impl UploadRequest {
    pub(crate) fn body<'a>(&'a self, identifier: &'a str) -> CreatePackageBody<'a> {
        CreatePackageBody {
            package_file: identifier,
            version: self.version.as_deref(),
            distribution: self.distribution.as_deref(),
            tags: self.tags.as_deref(),
            republish: self.republish,
        }
    }
}
