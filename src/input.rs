//! Resource configuration: the Concourse JSON payload and its GitHub Actions
//! equivalent read from `INPUT_*` environment variables.

use anyhow::{Context, Result, bail};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::store::{Distribution, SearchQuery};

/// Version object exchanged with the CI system.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionRef {
    pub version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distribution: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub package_type: Option<String>,
}

impl VersionRef {
    pub fn new(version: impl Into<String>) -> Self {
        Self {
            version: Some(version.into()),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Source {
    pub username: Option<String>,
    pub organization: Option<String>,
    pub repository: Option<String>,
    pub api_key: Option<String>,
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub package_type: Option<String>,
    pub distribution: Option<String>,
    pub order_by: Option<String>,
}

impl Source {
    /// Versions are ordered by version unless `order_by` says otherwise.
    pub fn order_by_version(&self) -> bool {
        matches!(self.order_by.as_deref().map(str::trim), None | Some("" | "version"))
    }

    pub fn organization(&self) -> Result<&str> {
        self.organization
            .as_deref()
            .filter(|s| !s.is_empty())
            .context("source.organization is required")
    }

    pub fn repository(&self) -> Result<&str> {
        self.repository
            .as_deref()
            .filter(|s| !s.is_empty())
            .context("source.repository is required")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Params {
    pub delete: bool,
    pub do_delete: bool,
    pub republish: bool,
    pub globs: Option<String>,
    pub tags: Option<String>,
    pub local_path: Option<String>,
    /// Regex with one capture group extracting the version from uploaded filenames.
    pub version: Option<String>,
    pub version_filter: Option<String>,
    pub keep_last_n: i64,
    pub keep_last_minor_patches: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Input {
    pub source: Source,
    pub params: Params,
    pub version: Option<VersionRef>,
}

impl Input {
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("Failed to parse input JSON")
    }

    /// Version handed in by the CI system, if any.
    pub fn current_version(&self) -> Option<&str> {
        self.version.as_ref().and_then(|v| v.version.as_deref())
    }

    /// Builds the store search criteria.
    ///
    /// The CI version takes precedence over the source and params values. With
    /// `with_version` false the version is not used as a criterion at all.
    pub fn search_query(&self, with_version: bool) -> Result<SearchQuery> {
        let version_ref = self.version.as_ref().filter(|_| with_version);

        let version = if with_version {
            version_ref
                .and_then(|v| v.version.clone())
                .or_else(|| self.params.version.clone())
        } else {
            None
        };

        let distribution = version_ref
            .and_then(|v| v.distribution.as_deref())
            .or(self.source.distribution.as_deref())
            .filter(|d| !d.trim().is_empty())
            .map(str::parse::<Distribution>)
            .transpose()?;

        let package_type = version_ref
            .and_then(|v| v.package_type.clone())
            .or_else(|| self.source.package_type.clone());

        Ok(SearchQuery {
            name: self.source.name.clone(),
            version_filter: self.params.version_filter.clone(),
            version,
            distribution,
            package_type,
        })
    }
}

/// Operation requested through `INPUT_ACTION`.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Download,
    Upload,
    Delete,
}

/// GitHub Actions inputs. Every field maps to an `INPUT_<NAME>` variable.
///
/// The runner sets every declared input, so an input left out of the workflow
/// arrives as an empty variable. Values are kept as strings here and blank ones
/// are treated as absent when building the [`Input`].
#[derive(clap::Args, Debug, Clone, Default)]
pub struct ActionArgs {
    #[arg(long, env = "INPUT_ACTION")]
    pub action: Option<String>,

    #[arg(long, env = "INPUT_USERNAME")]
    pub username: Option<String>,
    #[arg(long, env = "INPUT_ORGANIZATION")]
    pub organization: Option<String>,
    #[arg(long, env = "INPUT_REPOSITORY")]
    pub repository: Option<String>,
    #[arg(long, env = "INPUT_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,
    #[arg(long, env = "INPUT_NAME")]
    pub name: Option<String>,
    #[arg(long = "type", env = "INPUT_TYPE")]
    pub package_type: Option<String>,
    #[arg(long, env = "INPUT_DISTRIBUTION")]
    pub distribution: Option<String>,
    #[arg(long, env = "INPUT_ORDER_BY")]
    pub order_by: Option<String>,

    #[arg(long, env = "INPUT_DELETE", num_args = 0..=1, default_missing_value = "true")]
    pub delete: Option<String>,
    #[arg(long, env = "INPUT_DO_DELETE", num_args = 0..=1, default_missing_value = "true")]
    pub do_delete: Option<String>,
    #[arg(long, env = "INPUT_REPUBLISH", num_args = 0..=1, default_missing_value = "true")]
    pub republish: Option<String>,
    #[arg(long, env = "INPUT_GLOBS")]
    pub globs: Option<String>,
    #[arg(long, env = "INPUT_TAGS")]
    pub tags: Option<String>,
    #[arg(long, env = "INPUT_LOCAL_PATH")]
    pub local_path: Option<String>,
    #[arg(long = "version-pattern", env = "INPUT_VERSION")]
    pub version: Option<String>,
    #[arg(long, env = "INPUT_VERSION_FILTER")]
    pub version_filter: Option<String>,
    #[arg(long, env = "INPUT_KEEP_LAST_N", allow_hyphen_values = true)]
    pub keep_last_n: Option<String>,
    #[arg(
        long,
        env = "INPUT_KEEP_LAST_MINOR_PATCHES",
        num_args = 0..=1,
        default_missing_value = "true"
    )]
    pub keep_last_minor_patches: Option<String>,
}

impl ActionArgs {
    /// The requested operation. Fails when `INPUT_ACTION` is blank or unknown.
    pub fn action(&self) -> Result<Action> {
        let Some(action) = non_blank(self.action.clone()) else {
            bail!("Action not supported: set INPUT_ACTION to download, upload or delete");
        };
        Action::from_str(action.trim(), true)
            .map_err(|_| anyhow::anyhow!("Action not supported: {}", action))
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn parse_flag(name: &str, value: Option<String>) -> Result<bool> {
    let Some(value) = non_blank(value) else {
        return Ok(false);
    };
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => bail!("Invalid value for {}: {}", name, value),
    }
}

fn parse_count(name: &str, value: Option<String>) -> Result<i64> {
    non_blank(value).map_or(Ok(0), |v| {
        v.trim()
            .parse()
            .with_context(|| format!("Invalid value for {}: {}", name, v))
    })
}

impl TryFrom<ActionArgs> for Input {
    type Error = anyhow::Error;

    fn try_from(args: ActionArgs) -> Result<Self> {
        Ok(Input {
            source: Source {
                username: non_blank(args.username),
                organization: non_blank(args.organization),
                repository: non_blank(args.repository),
                api_key: non_blank(args.api_key),
                name: non_blank(args.name),
                package_type: non_blank(args.package_type),
                distribution: non_blank(args.distribution),
                order_by: non_blank(args.order_by),
            },
            params: Params {
                delete: parse_flag("delete", args.delete)?,
                do_delete: parse_flag("do_delete", args.do_delete)?,
                republish: parse_flag("republish", args.republish)?,
                globs: non_blank(args.globs),
                tags: non_blank(args.tags),
                local_path: non_blank(args.local_path),
                version: non_blank(args.version),
                version_filter: non_blank(args.version_filter),
                keep_last_n: parse_count("keep_last_n", args.keep_last_n)?,
                keep_last_minor_patches: parse_flag(
                    "keep_last_minor_patches",
                    args.keep_last_minor_patches,
                )?,
            },
            version: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::env;

    #[derive(Parser, Debug)]
    struct TestCli {
        #[command(flatten)]
        args: ActionArgs,
    }

    #[test]
    fn test_input_from_concourse_json() {
        let input = Input::from_json(
            r#"{
                "source": {
                    "organization": "rabbitmq",
                    "repository": "rabbitmq-erlang",
                    "api_key": "secret",
                    "name": "erlang",
                    "type": "deb",
                    "distribution": "ubuntu/focal"
                },
                "params": {
                    "delete": true,
                    "keep_last_n": 2,
                    "keep_last_minor_patches": true,
                    "version_filter": "1:24*"
                },
                "version": {"version": "1:24.3-1"}
            }"#,
        )
        .unwrap();

        assert_eq!(input.source.organization().unwrap(), "rabbitmq");
        assert_eq!(input.source.package_type.as_deref(), Some("deb"));
        assert!(input.source.order_by_version());
        assert!(input.params.delete);
        assert!(!input.params.do_delete);
        assert_eq!(input.params.keep_last_n, 2);
        assert_eq!(input.current_version(), Some("1:24.3-1"));
    }

    #[test]
    fn test_input_defaults() {
        let input = Input::from_json(r#"{"source": {}}"#).unwrap();
        assert_eq!(input.params, Params::default());
        assert_eq!(input.current_version(), None);
        assert!(input.source.organization().is_err());
        assert!(Input::from_json("not json").is_err());
    }

    #[test]
    fn test_order_by() {
        let mut source = Source::default();
        assert!(source.order_by_version());
        source.order_by = Some("version".into());
        assert!(source.order_by_version());
        source.order_by = Some("upload_date".into());
        assert!(!source.order_by_version());
        source.order_by = Some("".into());
        assert!(source.order_by_version());
    }

    #[test]
    fn test_search_query_prefers_version_object() {
        let mut input = Input::default();
        input.source.name = Some("erlang".into());
        input.source.distribution = Some("ubuntu/bionic".into());
        input.source.package_type = Some("deb".into());
        input.version = Some(VersionRef {
            version: Some("1:24.3-1".into()),
            distribution: Some("ubuntu/focal".into()),
            package_type: None,
        });

        let query = input.search_query(true).unwrap();
        assert_eq!(query.version.as_deref(), Some("1:24.3-1"));
        assert_eq!(query.distribution.unwrap().codename, "focal");
        assert_eq!(query.package_type.as_deref(), Some("deb"));

        let query = input.search_query(false).unwrap();
        assert_eq!(query.version, None);
        assert_eq!(query.distribution.unwrap().codename, "bionic");
    }

    #[test]
    fn test_search_query_falls_back_to_params_version() {
        let mut input = Input::default();
        input.params.version = Some("1:24*".into());
        assert_eq!(
            input.search_query(true).unwrap().version.as_deref(),
            Some("1:24*")
        );
    }

    #[test]
    fn test_search_query_rejects_bad_distribution() {
        let mut input = Input::default();
        input.source.distribution = Some("focal".into());
        let err = input.search_query(false).unwrap_err();
        assert!(err.to_string().contains("Distribution invalid: focal"));
    }

    #[test]
    fn test_action_args_to_input() {
        let cli = TestCli::try_parse_from([
            "pkgci",
            "--action",
            "delete",
            "--organization",
            "rabbitmq",
            "--repository",
            "erlang",
            "--delete",
            "--keep-last-n",
            "3",
            "--order-by",
            "upload_date",
        ])
        .unwrap();
        assert_eq!(cli.args.action().unwrap(), Action::Delete);

        let input = Input::try_from(cli.args).unwrap();
        assert_eq!(input.source.repository().unwrap(), "erlang");
        assert!(input.params.delete);
        assert_eq!(input.params.keep_last_n, 3);
        assert!(!input.source.order_by_version());
        assert!(input.version.is_none());
    }

    #[test]
    fn test_action_args_reject_unknown_action() {
        let cli = TestCli::try_parse_from(["pkgci", "--action", "publish"]).unwrap();
        let err = cli.args.action().unwrap_err();
        assert!(err.to_string().contains("Action not supported: publish"));

        let cli = TestCli::try_parse_from(["pkgci", "--action", ""]).unwrap();
        assert!(cli.args.action().is_err());
    }

    #[test]
    fn test_blank_action_inputs_are_absent() {
        let cli = TestCli::try_parse_from([
            "pkgci",
            "--action",
            " Upload ",
            "--organization",
            "rabbitmq",
            "--distribution",
            "",
            "--order-by",
            " ",
            "--globs",
            "",
            "--delete",
            "",
            "--do-delete",
            "",
            "--republish",
            "",
            "--keep-last-minor-patches",
            "",
            "--keep-last-n",
            "",
        ])
        .unwrap();
        assert_eq!(cli.args.action().unwrap(), Action::Upload);

        let input = Input::try_from(cli.args).unwrap();
        assert_eq!(input.source.organization.as_deref(), Some("rabbitmq"));
        assert_eq!(input.source.distribution, None);
        assert_eq!(input.source.order_by, None);
        assert!(input.source.order_by_version());
        assert_eq!(input.params, Params::default());
        assert!(input.search_query(true).unwrap().distribution.is_none());
    }

    #[test]
    fn test_blank_action_env_vars_are_absent() {
        let blank = [
            "INPUT_KEEP_LAST_N",
            "INPUT_DO_DELETE",
            "INPUT_KEEP_LAST_MINOR_PATCHES",
            "INPUT_ORDER_BY",
            "INPUT_GLOBS",
        ];
        unsafe {
            for name in blank {
                env::set_var(name, "");
            }
        }

        let cli = TestCli::try_parse_from(["pkgci"]);

        unsafe {
            for name in blank {
                env::remove_var(name);
            }
        }

        let input = Input::try_from(cli.unwrap().args).unwrap();
        assert_eq!(input.params.keep_last_n, 0);
        assert!(!input.params.do_delete);
        assert!(!input.params.keep_last_minor_patches);
        assert_eq!(input.params.globs, None);
        assert!(input.source.order_by_version());
    }

    #[test]
    fn test_action_flag_values() {
        let cli = TestCli::try_parse_from([
            "pkgci",
            "--do-delete",
            "TRUE",
            "--republish",
            "false",
            "--keep-last-n",
            "-1",
        ])
        .unwrap();
        let input = Input::try_from(cli.args).unwrap();
        assert!(input.params.do_delete);
        assert!(!input.params.republish);
        assert_eq!(input.params.keep_last_n, -1);

        let cli = TestCli::try_parse_from(["pkgci", "--delete", "maybe"]).unwrap();
        let err = Input::try_from(cli.args).unwrap_err();
        assert!(err.to_string().contains("Invalid value for delete: maybe"));

        let cli = TestCli::try_parse_from(["pkgci", "--keep-last-n", "two"]).unwrap();
        assert!(Input::try_from(cli.args).is_err());
    }

    #[test]
    fn test_version_ref_serialization() {
        let json = serde_json::to_string(&VersionRef::new("1.0")).unwrap();
        assert_eq!(json, r#"{"version":"1.0"}"#);

        let version = VersionRef {
            version: Some("1.0".into()),
            distribution: Some("ubuntu/focal".into()),
            package_type: Some("deb".into()),
        };
        assert_eq!(
            serde_json::to_string(&version).unwrap(),
            r#"{"version":"1.0","distribution":"ubuntu/focal","type":"deb"}"#
        );
    }
}
