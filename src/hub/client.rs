//! Hub REST client
//!
//! A thin pass-through to the hub's REST API. Every request carries the
//! configured bearer token and is bounded by the configured timeout.

use log::debug;
use reqwest::{Client, RequestBuilder};
use serde_json::Value;

use crate::config::HubConfig;
use crate::error::HubError;

const MAX_ERROR_BODY: usize = 200;

#[derive(Debug, Clone)]
pub struct HubClient {
    http: Client,
    base_url: Option<String>,
    token: Option<String>,
    timeout_secs: u64,
}

impl HubClient {
    pub fn from_config(config: &HubConfig) -> Result<Self, HubError> {
        let http = Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| HubError::Request(e.to_string()))?;

        let base_url = config
            .url
            .as_deref()
            .map(|url| url.trim().trim_end_matches('/').to_string())
            .filter(|url| !url.is_empty());

        Ok(Self {
            http,
            base_url,
            token: config.token.clone(),
            timeout_secs: config.request_timeout_secs,
        })
    }

    pub fn is_configured(&self) -> bool {
        self.base_url.is_some()
    }

    /// All entity states
    pub async fn get_states(&self) -> Result<Value, HubError> {
        let url = self.url("/api/states")?;
        self.send(self.http.get(url)).await
    }

    /// One entity's state, e.g. `light.kitchen`
    pub async fn get_state(&self, entity_id: &str) -> Result<Value, HubError> {
        validate_entity_id(entity_id)?;
        let url = self.url(&format!("/api/states/{}", entity_id))?;
        self.send(self.http.get(url)).await
    }

    /// Invoke `domain.service` with `payload` as service data
    pub async fn call_service(
        &self,
        domain: &str,
        service: &str,
        payload: Value,
    ) -> Result<Value, HubError> {
        validate_identifier("domain", domain)?;
        validate_identifier("service", service)?;
        let url = self.url(&format!("/api/services/{}/{}", domain, service))?;

        let payload = if payload.is_null() {
            Value::Object(Default::default())
        } else {
            payload
        };
        self.send(self.http.post(url).json(&payload)).await
    }

    fn url(&self, path: &str) -> Result<String, HubError> {
        let base = self.base_url.as_deref().ok_or(HubError::NotConfigured)?;
        Ok(format!("{}{}", base, path))
    }

    async fn send(&self, request: RequestBuilder) -> Result<Value, HubError> {
        let request = match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        };

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                HubError::Timeout(self.timeout_secs)
            } else {
                HubError::Request(e.without_url().to_string())
            }
        })?;

        let status = response.status();
        debug!("Hub answered {}", status);
        if !status.is_success() {
            let mut body = response.text().await.unwrap_or_default();
            if body.len() > MAX_ERROR_BODY {
                let mut cut = MAX_ERROR_BODY;
                while !body.is_char_boundary(cut) {
                    cut -= 1;
                }
                body.truncate(cut);
            }
            return Err(HubError::Upstream {
                status: status.as_u16(),
                body,
            });
        }

        response.json::<Value>().await.map_err(|e| {
            if e.is_timeout() {
                HubError::Timeout(self.timeout_secs)
            } else {
                HubError::Decode(e.without_url().to_string())
            }
        })
    }
}

fn validate_identifier(kind: &str, value: &str) -> Result<(), HubError> {
    let valid = !value.is_empty()
        && value
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_');
    if valid {
        Ok(())
    } else {
        Err(HubError::InvalidInput(format!("invalid {}: {}", kind, value)))
    }
}

fn validate_entity_id(entity_id: &str) -> Result<(), HubError> {
    match entity_id.split_once('.') {
        Some((domain, object_id)) => {
            validate_identifier("entity_id", domain)?;
            validate_identifier("entity_id", object_id)
        }
        None => Err(HubError::InvalidInput(format!(
            "invalid entity_id: {}",
            entity_id
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn client(url: Option<String>, timeout_secs: u64) -> HubClient {
        HubClient::from_config(&HubConfig {
            url,
            token: Some("secret".into()),
            request_timeout_secs: timeout_secs,
        })
        .unwrap()
    }

    #[test]
    fn identifiers_are_validated() {
        assert!(validate_entity_id("light.kitchen_2").is_ok());
        assert!(validate_entity_id("light").is_err());
        assert!(validate_entity_id("light.../config").is_err());
        assert!(validate_identifier("service", "turn_on").is_ok());
        assert!(validate_identifier("service", "Turn-On").is_err());
        assert!(validate_identifier("service", "").is_err());
    }

    #[tokio::test]
    async fn unconfigured_hub_is_reported() {
        let hub = client(None, 30);
        assert!(!hub.is_configured());
        assert!(matches!(
            hub.get_states().await,
            Err(HubError::NotConfigured)
        ));
    }

    #[tokio::test]
    async fn get_state_sends_bearer_token() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/api/states/light.kitchen")
            .match_header("authorization", "Bearer secret")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"entity_id": "light.kitchen", "state": "on"}"#)
            .create_async()
            .await;

        let hub = client(Some(format!("{}/", server.url())), 30);
        let state = hub.get_state("light.kitchen").await.unwrap();

        assert_eq!(state["state"], "on");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn call_service_posts_payload() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/api/services/light/turn_on")
            .match_body(mockito::Matcher::Json(json!({"entity_id": "light.kitchen"})))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body("[]")
            .create_async()
            .await;

        let hub = client(Some(server.url()), 30);
        let changed = hub
            .call_service("light", "turn_on", json!({"entity_id": "light.kitchen"}))
            .await
            .unwrap();

        assert_eq!(changed, json!([]));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn upstream_errors_keep_status() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api/states/light.nowhere")
            .with_status(404)
            .with_body("Entity not found.")
            .create_async()
            .await;

        let hub = client(Some(server.url()), 30);
        match hub.get_state("light.nowhere").await {
            Err(HubError::Upstream { status, body }) => {
                assert_eq!(status, 404);
                assert_eq!(body, "Entity not found.");
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[tokio::test]
    async fn slow_hub_times_out() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            // Accept and hold the connection without ever answering.
            let (_socket, _) = listener.accept().await.unwrap();
            tokio::time::sleep(std::time::Duration::from_secs(10)).await;
        });

        let hub = client(Some(format!("http://{}", addr)), 1);
        assert!(matches!(
            hub.get_states().await,
            Err(HubError::Timeout(1))
        ));
    }
}
