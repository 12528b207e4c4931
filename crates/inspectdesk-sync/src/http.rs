//! HTTP client for the dashboard's read endpoints.

use async_trait::async_trait;
use inspectdesk_core::Endpoint;
use serde_json::Value;
use tracing::info;

use crate::source::{ListSource, SyncError, extract_list};

/// GETs record lists from the dashboard API.
pub struct ListClient {
    client: reqwest::Client,
    base_url: String,
}

impl ListClient {
    /// `base_url` is like `https://api.example.kh`; a trailing slash is dropped.
    pub fn new(base_url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl ListSource for ListClient {
    async fn fetch_list(&self, endpoint: &Endpoint) -> Result<Vec<Value>, SyncError> {
        let url = endpoint.url(&self.base_url);
        info!(url = %url, "fetching list");
        let resp = self.client.get(&url).send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(SyncError::Server {
                status: status.as_u16(),
                body,
            });
        }

        let body: Value = resp.json().await?;
        let items = extract_list(body, &endpoint.list_key)?;
        info!(url = %url, count = items.len(), "fetched list");
        Ok(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn serve(route: &str, response: ResponseTemplate) -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(response)
            .mount(&server)
            .await;
        server
    }

    #[tokio::test]
    async fn documents_come_wrapped_in_date() {
        let server = serve(
            "/doc",
            ResponseTemplate::new(200).set_body_json(json!({"date": [{"id": 1}, {"id": 2}]})),
        )
        .await;
        let client = ListClient::new(&server.uri());
        let items = client
            .fetch_list(&Endpoint::new("/doc", "date"))
            .await
            .unwrap();
        assert_eq!(items.len(), 2);
    }

    #[tokio::test]
    async fn missing_wrapper_is_empty_list() {
        let server = serve(
            "/user",
            ResponseTemplate::new(200).set_body_json(json!({"message": "ok"})),
        )
        .await;
        let client = ListClient::new(&server.uri());
        let items = client
            .fetch_list(&Endpoint::new("/user", "data"))
            .await
            .unwrap();
        assert!(items.is_empty());
    }

    #[tokio::test]
    async fn error_status_is_reported() {
        let server = serve(
            "/fac",
            ResponseTemplate::new(500).set_body_string("database down"),
        )
        .await;
        let client = ListClient::new(&server.uri());
        let err = client
            .fetch_list(&Endpoint::new("/fac", "data"))
            .await
            .unwrap_err();
        match err {
            SyncError::Server { status, body } => {
                assert_eq!(status, 500);
                assert_eq!(body, "database down");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn malformed_body_is_an_error() {
        let server = serve("/fac", ResponseTemplate::new(200).set_body_string("<html>")).await;
        let client = ListClient::new(&server.uri());
        let err = client.fetch_list(&Endpoint::new("/fac", "data")).await;
        assert!(matches!(err, Err(SyncError::Http(_))));
    }

    #[test]
    fn client_trims_trailing_slash() {
        let client = ListClient::new("http://localhost:4000/");
        assert_eq!(client.base_url(), "http://localhost:4000");
    }
}
