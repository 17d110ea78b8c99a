use anyhow::Result;
use chrono::{DateTime, Utc};
use log::{info, warn};

use crate::{
    input::Input,
    lifecycle::{Catalog, RetentionDecision, catalog, decide_retention},
    output::Envelope,
    runtime::Runtime,
    store::PackageStore,
    ui,
};

use super::config::Config;

/// Outcome of a purge run.
#[derive(Debug, Default, PartialEq)]
pub struct DeleteSummary {
    pub decision: RetentionDecision,
    /// Files selected for deletion (whether or not `do_delete` was set).
    pub selected: usize,
    /// Files actually removed from the store.
    pub deleted: Vec<String>,
    pub failed: Vec<String>,
}

/// Purges old versions according to the keep-count rule.
///
/// Files are only removed when `do_delete` is set; otherwise the run is a dry run.
#[tracing::instrument(skip(config, input))]
pub async fn delete<R: Runtime, S: PackageStore>(
    config: &Config<R, S>,
    input: &Input,
) -> Result<DeleteSummary> {
    let console = &config.console;
    let params = &input.params;

    let query = input.search_query(true)?;
    let artifacts = config.store.find(&query).await?;
    let catalog = catalog::build(artifacts.iter().cloned());

    let decision = decide_retention(
        &catalog,
        params.keep_last_n,
        input.source.order_by_version(),
        params.keep_last_minor_patches,
    );
    if decision.ordering_inconsistent {
        console.log(ui::yellow(
            "Warning: keep_last_minor_patches should only be used with order_by: version",
        ));
    }

    console.log(
        ui::green("Version(s) detected: ").then(describe_all(&catalog, catalog.keys())),
    );
    console.log(
        ui::green("Version(s) to delete: ").then(describe_all(&catalog, &decision.delete)),
    );
    if !decision.exceptions.is_empty() {
        console.log(
            ui::green("Deletion exception(s) (last minor patches): ")
                .then(describe_all(&catalog, &decision.exceptions)),
        );
    }
    console.new_line();
    if !decision.keep.is_empty() {
        console.log(
            ui::green("Version(s) to keep: ").then(describe_all(&catalog, &decision.keep)),
        );
    }
    console.new_line();

    let mut summary = DeleteSummary::default();
    console.log(ui::green("Packages:"));
    for artifact in &artifacts {
        if !decision.should_delete(&artifact.version) {
            let note = if decision.is_exception(&artifact.version) {
                " (latest minor patch)"
            } else {
                ""
            };
            console.log_indent(format!("keeping {}{}", artifact.filename, note));
            continue;
        }

        summary.selected += 1;
        if !params.do_delete {
            console.log_indent(
                ui::red(format!("deleting {}", artifact.filename))
                    .then(ui::yellow(" (skipped)")),
            );
            continue;
        }

        match config.store.delete(&artifact.self_ref).await {
            Ok(()) => {
                console.log_indent(ui::red(format!("deleting {}", artifact.filename)));
                summary.deleted.push(artifact.filename.clone());
            }
            Err(e) => {
                warn!("Cannot delete {}: {:#}", artifact.self_ref, e);
                console.log(ui::red(format!(
                    "Error while trying to delete {}: {:#}",
                    artifact.self_ref, e
                )));
                summary.failed.push(artifact.filename.clone());
            }
        }
    }

    console.new_line();
    console.log(ui::green(format!("Deleted {} file(s)", summary.deleted.len())));
    info!(
        "{} file(s) selected, {} deleted, {} failed",
        summary.selected,
        summary.deleted.len(),
        summary.failed.len()
    );

    console.out(&Envelope::deleted().to_json()?);
    summary.decision = decision;
    Ok(summary)
}

fn describe_all<'a>(
    catalog: &Catalog,
    versions: impl IntoIterator<Item = &'a String>,
) -> String {
    versions
        .into_iter()
        .map(|v| describe(catalog, v))
        .collect::<Vec<_>>()
        .join(", ")
}

fn describe(catalog: &Catalog, version: &str) -> String {
    let date = catalog
        .get(version)
        .and_then(|a| a.last_uploaded_at())
        .map(format_date)
        .unwrap_or_else(|| "unknown".to_string());
    format!("{} [{}]", version, date)
}

fn format_date(date: DateTime<Utc>) -> String {
    date.format("%Y-%m-%dT%H:%MZ").to_string()
}
