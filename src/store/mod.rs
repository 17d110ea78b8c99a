//! Package store abstraction.
//!
//! The lifecycle engine never talks HTTP directly; it works on [`PackageArtifact`]
//! snapshots and reaches the remote repository through the [`PackageStore`]
//! trait. [`CloudsmithStore`] is the production implementation.

mod cloudsmith;
mod query;
mod types;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::fmt;

pub use cloudsmith::{CloudsmithStore, Endpoints};
pub use query::{Distribution, SearchQuery, UploadRequest};

/// Remote publication state of an artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SyncState {
    #[default]
    Pending,
    Completed,
    Failed,
}

impl SyncState {
    /// Derives the state from the store's two flags. A failure wins over completion.
    pub fn from_flags(completed: bool, failed: bool) -> Self {
        if failed {
            SyncState::Failed
        } else if completed {
            SyncState::Completed
        } else {
            SyncState::Pending
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, SyncState::Pending)
    }
}

impl fmt::Display for SyncState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncState::Pending => write!(f, "pending"),
            SyncState::Completed => write!(f, "completed"),
            SyncState::Failed => write!(f, "failed"),
        }
    }
}

/// Locator of an artifact in the store API (its `self_url`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct ArtifactRef(String);

impl ArtifactRef {
    pub fn new(url: impl Into<String>) -> Self {
        ArtifactRef(url.into())
    }

    pub fn url(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ArtifactRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One uploaded file as seen by the store at fetch time.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PackageArtifact {
    pub filename: String,
    pub version: String,
    pub uploaded_at: Option<DateTime<Utc>>,
    pub checksum_sha256: Option<String>,
    pub self_ref: ArtifactRef,
    pub cdn_url: Option<String>,
    pub sync_state: SyncState,
    pub status_reason: Option<String>,
}

impl PackageArtifact {
    /// True when the artifact finished publishing without failure.
    pub fn is_synced(&self) -> bool {
        self.sync_state == SyncState::Completed
    }
}

/// Operations the lifecycle engine needs from a remote package repository.
///
/// Implementations apply their own retry policy to every call.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PackageStore: Send + Sync {
    /// Lists every artifact matching the query, following pagination.
    async fn find(&self, query: &SearchQuery) -> Result<Vec<PackageArtifact>>;

    /// Uploads a file and registers it as a package.
    ///
    /// Returns `None` when the store rejects a duplicated raw package up front.
    async fn upload(
        &self,
        filename: &str,
        content: Vec<u8>,
        request: &UploadRequest,
    ) -> Result<Option<ArtifactRef>>;

    /// Re-fetches the current state of an artifact.
    async fn fetch_status(&self, artifact: &ArtifactRef) -> Result<PackageArtifact>;

    async fn delete(&self, artifact: &ArtifactRef) -> Result<()>;

    /// Downloads artifact content from its CDN URL.
    async fn download(&self, url: &str) -> Result<Vec<u8>>;
}
