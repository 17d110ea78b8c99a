//! HTTP client with built-in retry logic and error handling.

use anyhow::{Context, Result};
use log::debug;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;

use super::retry::{RetryPolicy, check_retryable};

/// HTTP client with built-in retry logic for store operations.
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
    retry: RetryPolicy,
}

impl HttpClient {
    /// Creates a new HTTP client wrapping the given reqwest Client.
    pub fn new(client: Client, retry: RetryPolicy) -> Self {
        Self { client, retry }
    }

    /// Returns a reference to the underlying reqwest Client.
    pub fn inner(&self) -> &Client {
        &self.client
    }

    /// Returns the retry policy applied to every call.
    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    /// Performs a GET request and deserializes the JSON response.
    /// Automatically retries on transient errors.
    #[tracing::instrument(skip(self))]
    pub async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        debug!("GET JSON from {}...", url);

        self.retry
            .run("GET JSON", || async {
                let response = self
                    .client
                    .get(url)
                    .send()
                    .await
                    .context("Failed to send request")?;

                let response = response.error_for_status().map_err(check_retryable)?;

                let result = response
                    .json::<T>()
                    .await
                    .context("Failed to parse JSON response")?;

                Ok(result)
            })
            .await
    }

    /// Downloads the full body of a URL into memory.
    /// Automatically retries on transient errors.
    #[tracing::instrument(skip(self))]
    pub async fn get_bytes(&self, url: &str) -> Result<Vec<u8>> {
        debug!("Downloading file from {}...", url);

        let bytes = self
            .retry
            .run("Download", || async {
                let response = self
                    .client
                    .get(url)
                    .send()
                    .await
                    .context("Failed to start download request")?;

                let response = response.error_for_status().map_err(check_retryable)?;

                let bytes = response
                    .bytes()
                    .await
                    .context("Failed to read download stream")?;

                Ok(bytes.to_vec())
            })
            .await?;

        debug!(
            "Downloaded {:.2} MB",
            bytes.len() as f64 / (1024.0 * 1024.0)
        );

        Ok(bytes)
    }

    /// Sends a single GET and returns the status code, without retry.
    #[tracing::instrument(skip(self))]
    pub async fn status_of(&self, url: &str) -> Result<StatusCode> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .with_context(|| format!("Failed to reach {}", url))?;
        Ok(response.status())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::NonRetryableError;
    use std::time::Duration;

    fn client() -> HttpClient {
        HttpClient::new(Client::new(), RetryPolicy::new(3, Duration::from_millis(1)))
    }

    #[tokio::test]
    async fn test_get_json_success() {
        let mut server = mockito::Server::new_async().await;
        let url = server.url();

        let mock = server
            .mock("GET", "/test")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"name": "test", "value": 42}"#)
            .create_async()
            .await;

        #[derive(serde::Deserialize, Debug, PartialEq)]
        struct TestResponse {
            name: String,
            value: i32,
        }

        let result: TestResponse = client().get_json(&format!("{}/test", url)).await.unwrap();

        mock.assert_async().await;
        assert_eq!(result.name, "test");
        assert_eq!(result.value, 42);
    }

    #[tokio::test]
    async fn test_get_json_not_found_is_not_retried() {
        let mut server = mockito::Server::new_async().await;
        let url = server.url();

        let mock = server
            .mock("GET", "/test")
            .with_status(404)
            .expect(1)
            .create_async()
            .await;

        let result: Result<serde_json::Value> = client().get_json(&format!("{}/test", url)).await;

        mock.assert_async().await;
        let err = result.unwrap_err();
        assert!(err.downcast_ref::<NonRetryableError>().is_some());
    }

    #[tokio::test]
    async fn test_get_json_server_error_is_retried() {
        let mut server = mockito::Server::new_async().await;
        let url = server.url();

        let mock = server
            .mock("GET", "/test")
            .with_status(503)
            .expect(3)
            .create_async()
            .await;

        let result: Result<serde_json::Value> = client().get_json(&format!("{}/test", url)).await;

        mock.assert_async().await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_get_bytes_success() {
        let mut server = mockito::Server::new_async().await;
        let url = server.url();

        let mock = server
            .mock("GET", "/file.deb")
            .with_status(200)
            .with_body("test content")
            .create_async()
            .await;

        let bytes = client()
            .get_bytes(&format!("{}/file.deb", url))
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(bytes, b"test content");
    }

    #[tokio::test]
    async fn test_status_of_returns_status() {
        let mut server = mockito::Server::new_async().await;
        let url = server.url();

        let _m = server
            .mock("GET", "/")
            .with_status(503)
            .create_async()
            .await;

        let status = client().status_of(&format!("{}/", url)).await.unwrap();
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    }
}
