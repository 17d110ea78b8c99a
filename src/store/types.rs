use chrono::{DateTime, Utc};
use serde::Deserialize;

use super::{ArtifactRef, PackageArtifact, SyncState};

/// Package resource as returned by the store API.
#[derive(Debug, Clone, Deserialize, Default)]
pub(crate) struct ApiPackage {
    #[serde(default)]
    pub self_url: String,
    #[serde(default)]
    pub is_sync_completed: bool,
    #[serde(default)]
    pub is_sync_failed: bool,
    #[serde(default)]
    pub filename: String,
    pub cdn_url: Option<String>,
    #[serde(default)]
    pub version: String,
    pub checksum_sha256: Option<String>,
    pub status_reason: Option<String>,
    pub uploaded_at: Option<DateTime<Utc>>,
}

impl From<ApiPackage> for PackageArtifact {
    fn from(p: ApiPackage) -> Self {
        PackageArtifact {
            filename: p.filename,
            version: p.version,
            uploaded_at: p.uploaded_at,
            checksum_sha256: p.checksum_sha256,
            self_ref: ArtifactRef::new(p.self_url),
            cdn_url: p.cdn_url,
            sync_state: SyncState::from_flags(p.is_sync_completed, p.is_sync_failed),
            status_reason: p.status_reason,
        }
    }
}

/// Response of the raw file upload endpoint.
#[derive(Debug, Deserialize)]
pub(crate) struct UploadedFile {
    pub identifier: String,
}

/// Response of the package creation endpoint.
#[derive(Debug, Deserialize)]
pub(crate) struct CreatedPackage {
    pub self_url: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_api_package_deserialize() {
        let json = r#"{
            "self_url": "https://api.cloudsmith.io/v1/packages/rabbitmq/concourse-resource-test/IvErs7CXiLLs/",
            "stage_str": "Fully Synchronised",
            "status_reason": null,
            "is_sync_completed": true,
            "is_sync_failed": false,
            "checksum_sha256": "9caade9720a63aa4ad127acbe6cd75c369ee46dfb1ea2d8192fc1225aeb7ba2c",
            "cdn_url": "https://dl.cloudsmith.io/public/rabbitmq/concourse-resource-test/deb/ubuntu/pool/focal/main/e/er/erlang-x11_23.2.7-1_all.deb",
            "epoch": 1,
            "filename": "erlang-x11_23.2.7-1_all.deb",
            "uploaded_at": "2021-03-19T12:58:06.413956Z",
            "version": "1:23.2.7-1"
        }"#;

        let artifact: PackageArtifact = serde_json::from_str::<ApiPackage>(json).unwrap().into();
        assert_eq!(artifact.filename, "erlang-x11_23.2.7-1_all.deb");
        assert_eq!(artifact.version, "1:23.2.7-1");
        assert_eq!(artifact.sync_state, SyncState::Completed);
        assert_eq!(
            artifact.self_ref.url(),
            "https://api.cloudsmith.io/v1/packages/rabbitmq/concourse-resource-test/IvErs7CXiLLs/"
        );
        assert_eq!(
            artifact.uploaded_at.unwrap(),
            Utc.with_ymd_and_hms(2021, 3, 19, 12, 58, 6).unwrap()
                + chrono::Duration::microseconds(413956)
        );
        assert!(artifact.status_reason.is_none());
    }

    #[test]
    fn test_api_package_failed_sync() {
        let json = r#"{
            "self_url": "https://store.test/p/1/",
            "is_sync_completed": false,
            "is_sync_failed": true,
            "status_reason": "Invalid package",
            "filename": "broken.rpm",
            "version": "1.0"
        }"#;

        let artifact: PackageArtifact = serde_json::from_str::<ApiPackage>(json).unwrap().into();
        assert_eq!(artifact.sync_state, SyncState::Failed);
        assert_eq!(artifact.status_reason.as_deref(), Some("Invalid package"));
        assert!(artifact.uploaded_at.is_none());
    }
}
