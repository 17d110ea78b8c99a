use anyhow::Result;

use crate::{
    http::HttpClient,
    ui::{self, Console},
};

/// Endpoint used to check outbound connectivity.
pub const DEFAULT_CONNECTIVITY_URL: &str = "https://www.wikipedia.org/";

/// Fails unless `url` answers with a 2xx status.
#[tracing::instrument(skip(client, console))]
pub async fn check_connectivity(
    client: &HttpClient,
    console: &Console,
    url: &str,
) -> Result<()> {
    console.log(ui::yellow(format!(
        "Starting test sequence, trying to reach {}",
        url
    )));

    match client.status_of(url).await {
        Ok(status) if status.is_success() => {
            console.log(ui::green(format!("Response code is {}", status.as_u16())));
            Ok(())
        }
        Ok(status) => {
            console.log(ui::red(format!("Response code is {}", status.as_u16())));
            anyhow::bail!("Connectivity test failed with HTTP {}", status.as_u16())
        }
        Err(e) => {
            console.log(ui::red(format!("Error during test sequence: {:#}", e)));
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::RetryPolicy;
    use crate::ui::Mode;

    fn client() -> HttpClient {
        HttpClient::new(reqwest::Client::new(), RetryPolicy::default())
    }

    #[tokio::test]
    async fn test_connectivity_success() {
        let mut server = mockito::Server::new_async().await;
        let _m = server.mock("GET", "/").with_status(200).create_async().await;

        let console = Console::new(Mode::GitHubActions);
        let url = format!("{}/", server.url());
        assert!(check_connectivity(&client(), &console, &url).await.is_ok());
    }

    #[tokio::test]
    async fn test_connectivity_failure_status() {
        let mut server = mockito::Server::new_async().await;
        let _m = server.mock("GET", "/").with_status(503).create_async().await;

        let console = Console::new(Mode::GitHubActions);
        let url = format!("{}/", server.url());
        let err = check_connectivity(&client(), &console, &url)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("HTTP 503"));
    }

    #[tokio::test]
    async fn test_connectivity_unreachable() {
        let console = Console::new(Mode::GitHubActions);
        let result = check_connectivity(&client(), &console, "http://127.0.0.1:1/").await;
        assert!(result.is_err());
    }
}
