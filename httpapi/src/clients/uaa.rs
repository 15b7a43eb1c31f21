//! UAA token introspection via `POST /check_token`

use crate::clients::{ClientError, HttpClient};
use crate::identity::{IntrospectionError, TokenIntrospector, User};
use async_trait::async_trait;
use log::debug;

#[derive(Debug, Clone)]
pub struct UaaClient {
    client: HttpClient,
    client_id: String,
    client_secret: String,
}

impl UaaClient {
    pub fn new(
        host: &str,
        skip_ssl_validation: bool,
        client_id: &str,
        client_secret: &str,
    ) -> Result<Self, ClientError> {
        let client = HttpClient::new(host, skip_ssl_validation)?;

        if client_id.is_empty() || client_secret.is_empty() {
            return Err(ClientError::MissingCredentials);
        }

        Ok(Self {
            client,
            client_id: client_id.to_string(),
            client_secret: client_secret.to_string(),
        })
    }
}

#[async_trait]
impl TokenIntrospector for UaaClient {
    /// Ask UAA whether `token` is valid and who it belongs to
    async fn check_token(&self, token: &str) -> Result<User, IntrospectionError> {
        debug!("Checking token against {}", self.client.url("/check_token"));

        let response = self
            .client
            .post("/check_token")
            .basic_auth(&self.client_id, Some(&self.client_secret))
            .form(&[("token", token)])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(IntrospectionError::InvalidStatus(response.status()));
        }

        let body = response.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{basic_auth, body_string, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn check_token_response(user_id: &str, scope: &str, username: &str, email: &str) -> serde_json::Value {
        json!({
            "jti": "3dfec2a647184cd9815db7880dc7c7f0",
            "sub": "59d8c635-e5e8-485e-bfc6-dcbccbe00cc7",
            "scope": [scope],
            "client_id": "cf",
            "cid": "cf",
            "grant_type": "password",
            "user_id": user_id,
            "origin": "uaa",
            "user_name": username,
            "email": email,
            "iat": 1513375807,
            "exp": 1513376407,
            "iss": "https://uaa.example.com/oauth/token",
            "zid": "uaa",
            "aud": ["scim", "cloud_controller", "password", "cf", "uaa", "openid"]
        })
    }

    #[test]
    fn test_new_requires_host() {
        assert!(matches!(
            UaaClient::new("", true, "client_id", "client_secret"),
            Err(ClientError::EmptyHost)
        ));
    }

    #[test]
    fn test_new_requires_credentials() {
        for (id, secret) in [("", "some-secret"), ("some-client", ""), ("", "")] {
            assert!(matches!(
                UaaClient::new("http://some-url.com", true, id, secret),
                Err(ClientError::MissingCredentials)
            ));
        }
    }

    #[tokio::test]
    async fn test_check_token_returns_user() {
        let uaa = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/check_token"))
            .and(basic_auth("client_id", "client_secret"))
            .and(header("content-type", "application/x-www-form-urlencoded"))
            .and(body_string("token=valid-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(check_token_response(
                "abc-123",
                "notifications.write",
                "admin",
                "test@example.com",
            )))
            .expect(1)
            .mount(&uaa)
            .await;

        let client = UaaClient::new(&uaa.uri(), true, "client_id", "client_secret").unwrap();
        let user = client.check_token("valid-token").await.unwrap();

        assert_eq!(
            user,
            User {
                id: "abc-123".to_string(),
                username: "admin".to_string(),
                email: "test@example.com".to_string(),
                scopes: vec!["notifications.write".to_string()],
            }
        );
        uaa.verify().await;
    }

    #[tokio::test]
    async fn test_check_token_non_success_status() {
        let uaa = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/check_token"))
            .respond_with(ResponseTemplate::new(400))
            .mount(&uaa)
            .await;

        let client = UaaClient::new(&uaa.uri(), true, "client_id", "client_secret").unwrap();
        let result = client.check_token("invalid-token").await;
        assert!(matches!(
            result,
            Err(IntrospectionError::InvalidStatus(status)) if status == 400
        ));
    }

    #[tokio::test]
    async fn test_check_token_malformed_body() {
        let uaa = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/check_token"))
            .respond_with(ResponseTemplate::new(200).set_body_string("}"))
            .mount(&uaa)
            .await;

        let client = UaaClient::new(&uaa.uri(), true, "client_id", "client_secret").unwrap();
        let result = client.check_token("valid-token").await;
        assert!(matches!(result, Err(IntrospectionError::Parse(_))));
    }

    #[tokio::test]
    async fn test_check_token_unreachable() {
        let uri = crate::test_utils::closed_port_uri();

        let client = UaaClient::new(&uri, true, "client_id", "client_secret").unwrap();
        let result = client.check_token("valid-token").await;
        assert!(matches!(result, Err(IntrospectionError::Request(_))));
    }
}
