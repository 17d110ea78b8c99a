//! Supervision of the store's asynchronous post-upload synchronization.

use log::{debug, info, warn};
use std::time::Duration;

use crate::store::{ArtifactRef, PackageArtifact, PackageStore, SyncState};

/// Default pause between two status fetches.
pub const SYNC_POLL_INTERVAL: Duration = Duration::from_secs(10);

/// Default ceiling on the time spent waiting for one artifact.
pub const SYNC_TIMEOUT: Duration = Duration::from_secs(300);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncPolicy {
    pub interval: Duration,
    pub timeout: Duration,
}

impl Default for SyncPolicy {
    fn default() -> Self {
        Self {
            interval: SYNC_POLL_INTERVAL,
            timeout: SYNC_TIMEOUT,
        }
    }
}

/// Terminal result of watching one artifact.
#[derive(Debug, Clone, PartialEq)]
pub enum SyncOutcome {
    Completed,
    /// Synchronization failed; the artifact was removed if `deleted` is true.
    Failed {
        reason: Option<String>,
        deleted: bool,
    },
    TimedOut,
    /// The status could not be fetched at all.
    Unavailable(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ArtifactReport {
    pub artifact: ArtifactRef,
    /// Filename as last seen in the store, if any status was fetched.
    pub filename: Option<String>,
    pub outcome: SyncOutcome,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MonitorReport {
    /// Version of the first artifact that reached a terminal state.
    pub version: Option<String>,
    pub artifacts: Vec<ArtifactReport>,
}

impl MonitorReport {
    pub fn count(&self, predicate: impl Fn(&SyncOutcome) -> bool) -> usize {
        self.artifacts.iter().filter(|a| predicate(&a.outcome)).count()
    }
}

/// Polls uploaded artifacts one after another until each one settles.
pub struct SyncMonitor<'a, S: PackageStore + ?Sized> {
    store: &'a S,
    policy: SyncPolicy,
}

impl<'a, S: PackageStore + ?Sized> SyncMonitor<'a, S> {
    pub fn new(store: &'a S, policy: SyncPolicy) -> Self {
        Self { store, policy }
    }

    #[tracing::instrument(skip(self, refs))]
    pub async fn monitor(&self, refs: &[ArtifactRef]) -> MonitorReport {
        let mut report = MonitorReport::default();

        for artifact_ref in refs {
            let (last_seen, outcome) = self.watch(artifact_ref).await;

            if report.version.is_none()
                && let Some(seen) = &last_seen
                && matches!(outcome, SyncOutcome::Completed | SyncOutcome::Failed { .. })
            {
                report.version = Some(seen.version.clone());
            }

            report.artifacts.push(ArtifactReport {
                artifact: artifact_ref.clone(),
                filename: last_seen.map(|a| a.filename),
                outcome,
            });
        }

        report
    }

    async fn watch(&self, artifact_ref: &ArtifactRef) -> (Option<PackageArtifact>, SyncOutcome) {
        let mut artifact = match self.store.fetch_status(artifact_ref).await {
            Ok(artifact) => artifact,
            Err(e) => {
                warn!("Cannot fetch status of {}: {:#}", artifact_ref, e);
                return (None, SyncOutcome::Unavailable(format!("{:#}", e)));
            }
        };

        let mut waited = Duration::ZERO;
        while !artifact.sync_state.is_terminal() {
            if waited + self.policy.interval > self.policy.timeout {
                warn!(
                    "{} timed out after {} seconds",
                    artifact.filename,
                    self.policy.timeout.as_secs()
                );
                return (Some(artifact), SyncOutcome::TimedOut);
            }
            debug!("{} still pending after {:?}", artifact.filename, waited);

            tokio::time::sleep(self.policy.interval).await;
            waited += self.policy.interval;

            artifact = match self.store.fetch_status(artifact_ref).await {
                Ok(artifact) => artifact,
                Err(e) => {
                    warn!("Cannot fetch status of {}: {:#}", artifact_ref, e);
                    return (Some(artifact), SyncOutcome::Unavailable(format!("{:#}", e)));
                }
            };
        }

        if artifact.sync_state == SyncState::Failed {
            warn!(
                "{} failed to synchronize: {}",
                artifact.filename,
                artifact.status_reason.as_deref().unwrap_or("no reason given")
            );
            let deleted = match self.store.delete(artifact_ref).await {
                Ok(()) => true,
                Err(e) => {
                    warn!("Cannot delete {}: {:#}", artifact_ref, e);
                    false
                }
            };
            let reason = artifact.status_reason.clone();
            return (Some(artifact), SyncOutcome::Failed { reason, deleted });
        }

        info!("{} synchronized", artifact.filename);
        (Some(artifact), SyncOutcome::Completed)
    }
}
