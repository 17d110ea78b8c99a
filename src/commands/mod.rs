use anyhow::Result;
use log::info;
use std::path::{Path, PathBuf};

use crate::{input::Action, input::Input, runtime::Runtime, store::PackageStore};

pub mod config;
mod check;
mod connectivity;
mod delete;
mod get;
mod put;

pub use check::check;
pub use connectivity::{DEFAULT_CONNECTIVITY_URL, check_connectivity};
pub use delete::{DeleteSummary, delete};
pub use get::{DownloadReport, get};
pub use put::put;

use config::Config;

/// Concourse `out`: purges old versions when `params.delete` is set, uploads otherwise.
pub async fn out<R: Runtime, S: PackageStore>(
    config: &Config<R, S>,
    input: &Input,
    dir: &Path,
) -> Result<()> {
    if input.params.delete {
        delete(config, input).await?;
    } else {
        put(config, input, dir).await?;
    }
    Ok(())
}

/// Runs a GitHub Actions step from the working directory.
pub async fn run_action<R: Runtime, S: PackageStore>(
    config: &Config<R, S>,
    input: &Input,
    action: Action,
) -> Result<()> {
    let cwd = config.runtime.current_dir()?;
    info!("Running {:?} from {:?}", action, cwd);

    match action {
        Action::Download => {
            get(config, input, &download_dir(&cwd, input)).await?;
        }
        Action::Upload => {
            put(config, input, &cwd).await?;
        }
        Action::Delete => {
            delete(config, input).await?;
        }
    }
    Ok(())
}

/// Downloads land in `local_path` when given, relative to the working directory.
fn download_dir(cwd: &Path, input: &Input) -> PathBuf {
    match input.params.local_path.as_deref().map(str::trim) {
        Some(local_path) if !local_path.is_empty() => cwd.join(local_path),
        _ => cwd.to_path_buf(),
    }
}
