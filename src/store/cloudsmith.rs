use anyhow::{Context, Result};
use async_trait::async_trait;
use log::{debug, warn};
use reqwest::header::{HeaderMap, HeaderValue, LINK};
use reqwest::{Client, StatusCode, Url};
use sha2::{Digest, Sha256};

use super::types::{ApiPackage, CreatedPackage, UploadedFile};
use super::{ArtifactRef, PackageArtifact, PackageStore, SearchQuery, UploadRequest};
use crate::http::{HttpClient, NonRetryableError, RetryPolicy, check_retryable};

/// Base URLs of the store services.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub upload: String,
    pub api: String,
    pub search: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            upload: "https://upload.cloudsmith.io".to_string(),
            api: "https://api-prd.cloudsmith.io".to_string(),
            search: "https://api.cloudsmith.io".to_string(),
        }
    }
}

impl Endpoints {
    /// Points every service at the same base URL.
    pub fn single(base: &str) -> Self {
        Self {
            upload: base.to_string(),
            api: base.to_string(),
            search: base.to_string(),
        }
    }
}

/// [`PackageStore`] backed by the Cloudsmith REST API.
pub struct CloudsmithStore {
    http: HttpClient,
    organization: String,
    repository: String,
    endpoints: Endpoints,
}

impl CloudsmithStore {
    pub fn new(
        api_key: Option<&str>,
        organization: &str,
        repository: &str,
        endpoints: Endpoints,
        retry: RetryPolicy,
    ) -> Result<Self> {
        let mut headers = HeaderMap::new();
        if let Some(key) = api_key {
            let mut value = HeaderValue::from_str(key).context("Invalid api_key")?;
            value.set_sensitive(true);
            headers.insert("X-Api-Key", value);
        }

        let client = Client::builder()
            .user_agent(concat!("pkgci/", env!("PKGCI_VERSION")))
            .connect_timeout(std::time::Duration::from_secs(60))
            .default_headers(headers)
            .build()?;

        Ok(Self {
            http: HttpClient::new(client, retry),
            organization: organization.to_string(),
            repository: repository.to_string(),
            endpoints,
        })
    }

    /// Builds `{base}/{segments...}` with every segment percent-encoded.
    fn url(&self, base: &str, segments: &[&str]) -> Result<Url> {
        let mut url = Url::parse(base).with_context(|| format!("Invalid base URL: {}", base))?;
        url.path_segments_mut()
            .map_err(|_| anyhow::anyhow!("Base URL cannot have a path: {}", base))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn search_url(&self, query: &SearchQuery) -> Result<Url> {
        let mut url = self.url(
            &self.endpoints.search,
            &["packages", &self.organization, &self.repository, ""],
        )?;
        if let Some(q) = query.to_query_string() {
            debug!("Query: {}", q);
            url.query_pairs_mut().append_pair("query", &q);
        }
        Ok(url)
    }

    #[tracing::instrument(skip(self))]
    async fn fetch_page(&self, url: &Url) -> Result<(Vec<ApiPackage>, Option<String>)> {
        self.http
            .retry_policy()
            .run("Listing packages", || async {
                let response = self
                    .http
                    .inner()
                    .get(url.clone())
                    .send()
                    .await
                    .context("Failed to send request to package store")?;

                let response = response.error_for_status().map_err(check_retryable)?;

                let next = response
                    .headers()
                    .get(LINK)
                    .and_then(|v| v.to_str().ok())
                    .and_then(next_link);

                let packages: Vec<ApiPackage> = response
                    .json()
                    .await
                    .context("Failed to parse package list")?;

                Ok((packages, next))
            })
            .await
    }

    async fn upload_once(
        &self,
        filename: &str,
        content: Vec<u8>,
        request: &UploadRequest,
    ) -> Result<Option<ArtifactRef>> {
        let checksum = hex::encode(Sha256::digest(&content));
        let upload_url = self.url(
            &self.endpoints.upload,
            &[&self.organization, &self.repository, filename],
        )?;

        let response = self
            .http
            .inner()
            .put(upload_url)
            .header("Content-Sha256", checksum)
            .body(content)
            .send()
            .await
            .context("Failed to upload file")?;
        let uploaded: UploadedFile = response
            .error_for_status()
            .map_err(check_retryable)?
            .json()
            .await
            .context("Failed to parse upload response")?;

        let create_url = self.url(
            &self.endpoints.api,
            &[
                "v1",
                "packages",
                &self.organization,
                &self.repository,
                "upload",
                &request.package_type,
                "",
            ],
        )?;
        let body = request.body(&uploaded.identifier);

        let response = self
            .http
            .inner()
            .post(create_url)
            .json(&body)
            .send()
            .await
            .context("Failed to create package")?;
        let status = response.status();
        let text = response.text().await.unwrap_or_default();

        // A duplicated raw package is rejected right away, there is no sync to wait for.
        if status == StatusCode::BAD_REQUEST
            && request.package_type == "raw"
            && !text.contains("\"self_url\"")
            && !request.republish
        {
            debug!("Raw package {} rejected as duplicate: {}", filename, text);
            return Ok(None);
        }

        if status.is_client_error() {
            return Err(NonRetryableError::ClientError(format!(
                "HTTP {} creating package {}: {}",
                status.as_u16(),
                filename,
                text
            ))
            .into());
        }
        if !status.is_success() {
            anyhow::bail!(
                "HTTP {} creating package {}: {}",
                status.as_u16(),
                filename,
                text
            );
        }

        let created: CreatedPackage = serde_json::from_str(&text)
            .with_context(|| format!("Unexpected package creation response: {}", text))?;
        Ok(Some(ArtifactRef::new(created.self_url)))
    }
}

#[async_trait]
impl PackageStore for CloudsmithStore {
    #[tracing::instrument(skip(self))]
    async fn find(&self, query: &SearchQuery) -> Result<Vec<PackageArtifact>> {
        let mut url = self.search_url(query)?;
        let mut artifacts = Vec::new();

        loop {
            let (page, next) = self.fetch_page(&url).await?;
            debug!("Fetched {} package(s) from {}", page.len(), url);
            artifacts.extend(page.into_iter().map(PackageArtifact::from));

            match next {
                Some(next) => {
                    url = Url::parse(&next)
                        .with_context(|| format!("Invalid next page link: {}", next))?
                }
                None => break,
            }
        }

        Ok(artifacts)
    }

    #[tracing::instrument(skip(self, content, request))]
    async fn upload(
        &self,
        filename: &str,
        content: Vec<u8>,
        request: &UploadRequest,
    ) -> Result<Option<ArtifactRef>> {
        self.http
            .retry_policy()
            .run("Uploading file", || {
                self.upload_once(filename, content.clone(), request)
            })
            .await
    }

    #[tracing::instrument(skip(self))]
    async fn fetch_status(&self, artifact: &ArtifactRef) -> Result<PackageArtifact> {
        let package: ApiPackage = self.http.get_json(artifact.url()).await?;
        Ok(package.into())
    }

    #[tracing::instrument(skip(self))]
    async fn delete(&self, artifact: &ArtifactRef) -> Result<()> {
        let status = self
            .http
            .retry_policy()
            .run("Deleting package", || async {
                let response = self
                    .http
                    .inner()
                    .delete(artifact.url())
                    .send()
                    .await
                    .context("Failed to send delete request")?;
                let response = response.error_for_status().map_err(check_retryable)?;
                Ok(response.status())
            })
            .await?;

        if status != StatusCode::NO_CONTENT {
            warn!(
                "Unexpected response deleting {}: HTTP {}",
                artifact,
                status.as_u16()
            );
        }
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn download(&self, url: &str) -> Result<Vec<u8>> {
        self.http.get_bytes(url).await
    }
}

/// Extracts the `rel="next"` target of a `Link` header.
pub(crate) fn next_link(header: &str) -> Option<String> {
    header.split(',').find_map(|link| {
        let mut parts = link.split(';');
        let target = parts.next()?.trim();
        let is_next = parts.any(|p| p.trim() == "rel=\"next\"");
        if is_next {
            target
                .strip_prefix('<')
                .and_then(|t| t.strip_suffix('>'))
                .map(str::to_string)
        } else {
            None
        }
    })
}
