use anyhow::Result;
use log::debug;

use crate::{
    http::RetryPolicy,
    input::Input,
    lifecycle::SyncPolicy,
    runtime::Runtime,
    store::{CloudsmithStore, Endpoints, PackageStore},
    ui::Console,
};

/// Collaborators shared by every command flow.
pub struct Config<R: Runtime, S: PackageStore> {
    pub runtime: R,
    pub store: S,
    pub console: Console,
    pub sync: SyncPolicy,
}

impl<R: Runtime> Config<R, CloudsmithStore> {
    pub fn new(runtime: R, input: &Input, endpoints: Endpoints, console: Console) -> Result<Self> {
        let source = &input.source;
        if let Some(key) = source.api_key.as_deref()
            && let (Some(head), Some(tail)) = (key.get(..4), key.get(key.len().saturating_sub(4)..))
            && key.len() > 8
        {
            debug!("Using api_key for authentication: {}*********{}", head, tail);
        }

        let store = CloudsmithStore::new(
            source.api_key.as_deref(),
            source.organization()?,
            source.repository()?,
            endpoints,
            RetryPolicy::default(),
        )?;

        Ok(Self {
            runtime,
            store,
            console,
            sync: SyncPolicy::default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::MockRuntime;
    use crate::store::SearchQuery;
    use crate::ui::Mode;
    use mockito::Server;

    #[tokio::test]
    async fn test_config_sends_api_key() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/packages/rabbitmq/erlang/")
            .match_header("x-api-key", "0123456789abcdef")
            .with_status(200)
            .with_body("[]")
            .create_async()
            .await;

        let input = Input::from_json(
            r#"{"source": {"organization": "rabbitmq", "repository": "erlang", "api_key": "0123456789abcdef"}}"#,
        )
        .unwrap();
        let config = Config::new(
            MockRuntime::new(),
            &input,
            Endpoints::single(&server.url()),
            Console::new(Mode::Concourse),
        )
        .unwrap();

        let artifacts = config.store.find(&SearchQuery::default()).await.unwrap();
        mock.assert_async().await;
        assert!(artifacts.is_empty());
        assert_eq!(config.sync, SyncPolicy::default());
    }

    #[test]
    fn test_config_requires_organization_and_repository() {
        let input = Input::from_json(r#"{"source": {"repository": "erlang"}}"#).unwrap();
        let result = Config::new(
            MockRuntime::new(),
            &input,
            Endpoints::default(),
            Console::new(Mode::Concourse),
        );
        assert!(result.is_err());
        assert!(
            result
                .err()
                .unwrap()
                .to_string()
                .contains("organization")
        );
    }
}
