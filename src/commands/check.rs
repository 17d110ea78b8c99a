use anyhow::Result;
use log::debug;

use crate::{
    input::Input, lifecycle::check_for_new_versions, output::versions_json, runtime::Runtime,
    store::PackageStore,
};

use super::config::Config;

/// Reports the published versions at or above the current one.
#[tracing::instrument(skip(config, input))]
pub async fn check<R: Runtime, S: PackageStore>(
    config: &Config<R, S>,
    input: &Input,
) -> Result<Vec<String>> {
    // the current version is a lower bound, not a search criterion
    let query = input.search_query(false)?;
    let artifacts = config.store.find(&query).await?;
    debug!("Found {} artifact(s)", artifacts.len());

    let versions = check_for_new_versions(input.current_version(), &artifacts);
    config.console.out(&versions_json(&versions)?);
    Ok(versions)
}
