use anyhow::{Context, Result};
use log::{debug, warn};
use sha2::{Digest, Sha256};
use std::path::Path;

use crate::{
    files::GlobFilter,
    input::Input,
    output::{DELETED_VERSION, Envelope},
    runtime::Runtime,
    store::{PackageArtifact, PackageStore},
    ui,
};

use super::config::Config;

/// What happened to each store file during a download.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct DownloadReport {
    pub downloaded: Vec<String>,
    /// Written to disk, but the content does not match the store checksum.
    pub checksum_mismatch: Vec<String>,
    pub failed: Vec<String>,
    pub ignored: Vec<String>,
}

/// Downloads the files of the requested version into `dir`.
#[tracing::instrument(skip(config, input))]
pub async fn get<R: Runtime, S: PackageStore>(
    config: &Config<R, S>,
    input: &Input,
    dir: &Path,
) -> Result<DownloadReport> {
    let console = &config.console;
    let envelope = Envelope::new(input.version.clone().unwrap_or_default());

    if input.current_version() == Some(DELETED_VERSION) {
        console.log("Getting special version <DELETED> is a no-op; returning it as is");
        console.out(&Envelope::deleted().to_json()?);
        return Ok(DownloadReport::default());
    }

    let query = input.search_query(true)?;
    let artifacts = config.store.find(&query).await?;
    let filter = GlobFilter::parse(input.params.globs.as_deref())?;

    let (selected, ignored): (Vec<_>, Vec<_>) = artifacts
        .into_iter()
        .partition(|a| filter.matches(&a.filename));

    let mut report = DownloadReport {
        ignored: ignored.into_iter().map(|a| a.filename).collect(),
        ..Default::default()
    };

    if !selected.is_empty() {
        config
            .runtime
            .create_dir_all(dir)
            .with_context(|| format!("Failed to create {}", dir.display()))?;
        console.log(ui::green("Downloading files..."));
    }

    for artifact in &selected {
        match download_one(config, artifact, dir).await {
            Ok(true) => {
                console.log_indent(ui::green(format!("{}: ", artifact.filename)).then("OK"));
                report.downloaded.push(artifact.filename.clone());
            }
            Ok(false) => {
                console.log_indent(
                    ui::green(format!("{}: ", artifact.filename))
                        .then("OK? (checksum verification failed)"),
                );
                report.downloaded.push(artifact.filename.clone());
                report.checksum_mismatch.push(artifact.filename.clone());
            }
            Err(e) => {
                warn!("Download of {} failed: {:#}", artifact.filename, e);
                console.log_indent(ui::red(format!("{}: {:#}", artifact.filename, e)));
                report.failed.push(artifact.filename.clone());
            }
        }
    }

    if !report.ignored.is_empty() {
        console.new_line();
        console.log(ui::green("Ignored:"));
        for filename in &report.ignored {
            console.log_indent(filename);
        }
    }

    console.out(&envelope.to_json()?);
    Ok(report)
}

/// Returns whether the written content matches the store checksum.
async fn download_one<R: Runtime, S: PackageStore>(
    config: &Config<R, S>,
    artifact: &PackageArtifact,
    dir: &Path,
) -> Result<bool> {
    let url = artifact
        .cdn_url
        .as_deref()
        .context("No download URL for this file")?;
    let name = Path::new(&artifact.filename)
        .file_name()
        .context("Invalid file name")?;

    let content = config.store.download(url).await?;
    let target = dir.join(name);
    config.runtime.write(&target, &content)?;
    debug!("Wrote {} bytes to {:?}", content.len(), target);

    let checksum = hex::encode(Sha256::digest(&content));
    Ok(artifact
        .checksum_sha256
        .as_deref()
        .is_some_and(|expected| expected.eq_ignore_ascii_case(&checksum)))
}
