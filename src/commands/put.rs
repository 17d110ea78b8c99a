use anyhow::{Context, Result};
use log::{debug, info, warn};
use std::path::{Path, PathBuf};

use crate::{
    files::{self, GlobFilter, select_files},
    input::{Input, VersionRef},
    lifecycle::{SyncMonitor, SyncOutcome},
    output::{Envelope, determine_package_type, extract_version},
    runtime::Runtime,
    store::{ArtifactRef, Distribution, PackageStore, UploadRequest},
    ui::{self, Styled},
};

use super::config::Config;

/// Uploads the selected files of `dir`, waits for their publication and
/// reports the resulting version.
#[tracing::instrument(skip(config, input))]
pub async fn put<R: Runtime, S: PackageStore>(
    config: &Config<R, S>,
    input: &Input,
    dir: &Path,
) -> Result<VersionRef> {
    let console = &config.console;
    let params = &input.params;

    if let Some(distribution) = input.source.distribution.as_deref() {
        distribution.parse::<Distribution>()?;
    }

    let dir: PathBuf = match params.local_path.as_deref().map(str::trim) {
        Some(local_path) if !local_path.is_empty() => dir.join(local_path),
        _ => dir.to_path_buf(),
    };
    let filter = GlobFilter::parse(params.globs.as_deref())?;
    let selected = select_files(&config.runtime, &dir, &filter)?;
    let filenames: Vec<String> = selected.iter().map(|p| files::file_name(p)).collect();

    console.log(ui::green("Local path:"));
    console.log_indent(dir.display().to_string());
    console.new_line();
    console.log(ui::green("Files:"));
    for filename in &filenames {
        console.log_indent(filename);
    }
    console.new_line();

    let extracted_version = match params.version.as_deref() {
        Some(pattern) => extract_version(pattern, &filenames)?.filter(|v| !v.trim().is_empty()),
        None => None,
    };
    if let Some(version) = &extracted_version {
        console.log(ui::green("Extracted version: ").then(version));
        console.new_line();
    }

    let package_type = determine_package_type(&filenames);
    let request = UploadRequest {
        package_type: package_type.to_string(),
        version: extracted_version.clone(),
        distribution: input.source.distribution.clone(),
        tags: params.tags.clone(),
        republish: params.republish,
    };
    debug!("Upload request: {:?}", request);

    let mut uploaded: Vec<ArtifactRef> = Vec::with_capacity(selected.len());
    for (path, filename) in selected.iter().zip(&filenames) {
        console.log(ui::green("Upload file: ").then(filename));
        match upload_one(config, path, filename, &request).await {
            Ok(Some(artifact_ref)) => {
                console.log_indent(artifact_ref.to_string());
                uploaded.push(artifact_ref);
            }
            Ok(None) => console.log_indent("Upload failed, duplicated raw package?"),
            Err(e) => {
                warn!("Upload of {} failed: {:#}", filename, e);
                console.log_indent(ui::red(format!("Error: {:#}", e)));
            }
        }
    }
    console.new_line();

    let mut version = None;
    if !uploaded.is_empty() {
        console.log(ui::green("Checking synchronization of packages..."));
        let report = SyncMonitor::new(&config.store, config.sync)
            .monitor(&uploaded)
            .await;

        for artifact in &report.artifacts {
            let name = artifact
                .filename
                .clone()
                .unwrap_or_else(|| artifact.artifact.to_string());
            let status: Styled = match &artifact.outcome {
                SyncOutcome::Completed => "OK".into(),
                SyncOutcome::Failed { reason, deleted } => ui::red("Error ")
                    .then(ui::italic(format!(
                        "({})",
                        reason.as_deref().unwrap_or("unknown")
                    )))
                    .then(if *deleted {
                        " (deleted)"
                    } else {
                        " (could not be deleted)"
                    }),
                SyncOutcome::TimedOut => ui::red(format!(
                    "timed out after {} seconds",
                    config.sync.timeout.as_secs()
                )),
                SyncOutcome::Unavailable(e) => ui::red(format!("Error: {}", e)),
            };
            console.log_indent(ui::green(format!("{}: ", name)).then(status));
        }
        info!(
            "{} of {} file(s) synchronized",
            report.count(|o| *o == SyncOutcome::Completed),
            report.artifacts.len()
        );
        version = report.version;
    }

    // Re-submitted raw packages are rejected at once when republish is off, so
    // the version can only come from the file names.
    if version.is_none() && uploaded.is_empty() {
        version = extracted_version;
    }

    let Some(version) = version else {
        console.log(ui::red("No version found"));
        anyhow::bail!("No version found");
    };

    let version_ref = VersionRef {
        version: Some(version),
        distribution: input.source.distribution.clone(),
        package_type: Some(package_type.to_string()),
    };
    console.out(&Envelope::new(version_ref.clone()).to_json()?);
    Ok(version_ref)
}

async fn upload_one<R: Runtime, S: PackageStore>(
    config: &Config<R, S>,
    path: &Path,
    filename: &str,
    request: &UploadRequest,
) -> Result<Option<ArtifactRef>> {
    let content = config
        .runtime
        .read(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    config.store.upload(filename, content, request).await
}
