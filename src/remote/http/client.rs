use std::sync::Arc;

use futures::future::BoxFuture;
use reqwest::{Client, Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tracing::debug;

use crate::{
    dto::{
        decisions::Decisions,
        identity::Identity,
        session::{CreatedSession, NewSession, SessionData},
    },
    patch::PatchOperation,
    remote::{
        SessionApi,
        error::{ApiError, ApiResult},
    },
};

use super::config::ApiConfig;

/// [`SessionApi`] implementation speaking JSON over HTTP.
#[derive(Clone)]
pub struct HttpSessionApi {
    client: Client,
    base_url: Arc<str>,
    token: Option<Arc<str>>,
}

impl HttpSessionApi {
    /// Build a client for the configured service.
    pub fn new(config: ApiConfig) -> ApiResult<Self> {
        let client = Client::builder()
            .build()
            .map_err(|source| ApiError::ClientBuilder { source })?;

        Ok(Self {
            client,
            base_url: Arc::<str>::from(config.base_url.trim_end_matches('/')),
            token: config.token.map(Arc::<str>::from),
        })
    }

    fn request(&self, method: Method, path: &str, authenticated: bool) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        let builder = self.client.request(method, url);
        match (&self.token, authenticated) {
            (Some(token), true) => builder.bearer_auth(token.as_ref()),
            _ => builder,
        }
    }

    async fn send<T>(builder: RequestBuilder, path: String) -> ApiResult<T>
    where
        T: DeserializeOwned,
    {
        debug!(%path, "sending session API request");
        let response = builder
            .send()
            .await
            .map_err(|source| ApiError::RequestSend {
                path: path.clone(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::RequestStatus { path, status });
        }

        response
            .json::<T>()
            .await
            .map_err(|source| ApiError::DecodeResponse { path, source })
    }
}

/// Percent-encode a path segment the way browsers' `encodeURIComponent` does.
pub fn encode_uri_component(segment: &str) -> String {
    let mut encoded = String::with_capacity(segment.len());
    for byte in segment.bytes() {
        match byte {
            b'A'..=b'Z'
            | b'a'..=b'z'
            | b'0'..=b'9'
            | b'-'
            | b'_'
            | b'.'
            | b'!'
            | b'~'
            | b'*'
            | b'\''
            | b'('
            | b')' => encoded.push(byte as char),
            other => encoded.push_str(&format!("%{other:02X}")),
        }
    }
    encoded
}

fn session_path(session_id: &str) -> String {
    format!("/sessions/{}", encode_uri_component(session_id))
}

fn decisions_path(session_id: &str, identity: &Identity) -> String {
    format!(
        "{}/decisions/{}",
        session_path(session_id),
        encode_uri_component(identity.as_str())
    )
}

impl SessionApi for HttpSessionApi {
    fn create_session(&self, session: NewSession) -> BoxFuture<'static, ApiResult<CreatedSession>> {
        let path = "/sessions".to_string();
        let builder = self.request(Method::POST, &path, true).json(&session);
        Box::pin(Self::send(builder, path))
    }

    fn fetch_session(&self, session_id: &str) -> BoxFuture<'static, ApiResult<SessionData>> {
        let path = session_path(session_id);
        let builder = self.request(Method::GET, &path, false);
        Box::pin(Self::send(builder, path))
    }

    fn update_session(
        &self,
        session_id: &str,
        operations: Vec<PatchOperation>,
    ) -> BoxFuture<'static, ApiResult<SessionData>> {
        let path = session_path(session_id);
        let builder = self.request(Method::PATCH, &path, true).json(&operations);
        Box::pin(Self::send(builder, path))
    }

    fn fetch_decisions(
        &self,
        session_id: &str,
        identity: &Identity,
    ) -> BoxFuture<'static, ApiResult<Decisions>> {
        let path = decisions_path(session_id, identity);
        let builder = self.request(Method::GET, &path, false);
        Box::pin(Self::send(builder, path))
    }

    fn update_decisions(
        &self,
        session_id: &str,
        identity: &Identity,
        operations: Vec<PatchOperation>,
    ) -> BoxFuture<'static, ApiResult<Decisions>> {
        let path = decisions_path(session_id, identity);
        let builder = self.request(Method::PATCH, &path, false).json(&operations);
        Box::pin(Self::send(builder, path))
    }

    fn send_invite(&self, session_id: &str, identity: &Identity) -> BoxFuture<'static, ApiResult<()>> {
        let path = format!(
            "{}/send-text/{}",
            session_path(session_id),
            encode_uri_component(identity.as_str())
        );
        let builder = self.request(Method::POST, &path, true).json(&json!({}));
        Box::pin(async move {
            Self::send::<Value>(builder, path).await?;
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use std::{
        collections::HashMap,
        sync::{Arc, Mutex},
    };

    use axum::{
        Router,
        extract::State,
        http::{HeaderMap, Method as AxumMethod, StatusCode, Uri, header::AUTHORIZATION},
    };
    use reqwest::StatusCode as ReqwestStatus;
    use serde_json::json;

    use super::*;
    use crate::{dto::session::SessionStatus, patch::PatchOperation};

    #[derive(Debug, Clone, PartialEq)]
    struct Recorded {
        method: String,
        path: String,
        authorization: Option<String>,
        body: String,
    }

    #[derive(Clone, Default)]
    struct FakeService {
        canned: Arc<HashMap<(String, String), (StatusCode, String)>>,
        requests: Arc<Mutex<Vec<Recorded>>>,
    }

    async fn record(
        State(service): State<FakeService>,
        method: AxumMethod,
        uri: Uri,
        headers: HeaderMap,
        body: String,
    ) -> (StatusCode, String) {
        service.requests.lock().unwrap().push(Recorded {
            method: method.to_string(),
            path: uri.path().to_string(),
            authorization: headers
                .get(AUTHORIZATION)
                .and_then(|value| value.to_str().ok())
                .map(str::to_string),
            body,
        });
        service
            .canned
            .get(&(method.to_string(), uri.path().to_string()))
            .cloned()
            .unwrap_or((StatusCode::NOT_FOUND, "{}".into()))
    }

    async fn spawn(
        canned: Vec<(&str, &str, StatusCode, Value)>,
        token: Option<&str>,
    ) -> (HttpSessionApi, FakeService) {
        let service = FakeService {
            canned: Arc::new(
                canned
                    .into_iter()
                    .map(|(method, path, status, body)| {
                        ((method.to_string(), path.to_string()), (status, body.to_string()))
                    })
                    .collect(),
            ),
            requests: Arc::default(),
        };
        let router = Router::new().fallback(record).with_state(service.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });

        let mut config = ApiConfig::new(format!("http://{addr}/"));
        if let Some(token) = token {
            config = config.with_token(token);
        }
        (HttpSessionApi::new(config).unwrap(), service)
    }

    #[test]
    fn encodes_like_encode_uri_component() {
        assert_eq!(encode_uri_component("+15551234567"), "%2B15551234567");
        assert_eq!(encode_uri_component("a b/c"), "a%20b%2Fc");
        assert_eq!(encode_uri_component("abc-_.!~*'()"), "abc-_.!~*'()");
    }

    #[tokio::test]
    async fn fetches_session_without_credentials() {
        let (api, service) = spawn(
            vec![(
                "GET",
                "/sessions/abc123",
                StatusCode::OK,
                json!({
                    "rounds": 1,
                    "timeLimit": 30,
                    "userCount": 2,
                    "owner": "owner-sub",
                    "status": "playing",
                    "categories": { "K": { "1": "Types of Drink" } }
                }),
            )],
            Some("secret"),
        )
        .await;

        let session = api.fetch_session("abc123").await.unwrap();
        assert_eq!(session.status, SessionStatus::Playing);
        assert_eq!(session.categories["K"][&1], "Types of Drink");

        let requests = service.requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].authorization, None);
    }

    #[tokio::test]
    async fn decisions_paths_escape_the_identity() {
        let (api, service) = spawn(
            vec![
                (
                    "GET",
                    "/sessions/abc123/decisions/%2B15551234567",
                    StatusCode::OK,
                    json!({ "responses": { "K": { "1": "Kite" } }, "points": {} }),
                ),
                (
                    "PATCH",
                    "/sessions/abc123/decisions/%2B15551234567",
                    StatusCode::OK,
                    json!({ "responses": { "K": { "1": "Kazoo" } }, "points": {} }),
                ),
            ],
            None,
        )
        .await;
        let identity = Identity::from("+15551234567");

        let fetched = api.fetch_decisions("abc123", &identity).await.unwrap();
        assert_eq!(fetched.responses["K"][&1], "Kite");

        let operations = vec![
            PatchOperation::Test {
                path: "/responses/K/1".into(),
                value: json!("Kite"),
            },
            PatchOperation::Replace {
                path: "/responses/K/1".into(),
                value: json!("Kazoo"),
            },
        ];
        let updated = api
            .update_decisions("abc123", &identity, operations.clone())
            .await
            .unwrap();
        assert_eq!(updated.responses["K"][&1], "Kazoo");

        let requests = service.requests.lock().unwrap();
        assert_eq!(requests[1].method, "PATCH");
        let sent: Vec<PatchOperation> = serde_json::from_str(&requests[1].body).unwrap();
        assert_eq!(sent, operations);
    }

    #[tokio::test]
    async fn owner_calls_carry_the_bearer_token() {
        let (api, service) = spawn(
            vec![
                (
                    "POST",
                    "/sessions",
                    StatusCode::OK,
                    json!({ "sessionId": "xyz789" }),
                ),
                (
                    "POST",
                    "/sessions/xyz789/send-text/%2B15550000002",
                    StatusCode::OK,
                    json!({}),
                ),
            ],
            Some("secret"),
        )
        .await;

        let created = api.create_session(NewSession::default()).await.unwrap();
        assert_eq!(created.session_id, "xyz789");
        api.send_invite("xyz789", &Identity::from("+15550000002"))
            .await
            .unwrap();

        let requests = service.requests.lock().unwrap();
        assert!(
            requests
                .iter()
                .all(|request| request.authorization.as_deref() == Some("Bearer secret"))
        );
        let body: Value = serde_json::from_str(&requests[0].body).unwrap();
        assert_eq!(body["timeLimit"], 75);
        assert_eq!(requests[1].body, "{}");
    }

    #[tokio::test]
    async fn error_statuses_are_reported_with_their_path() {
        let (api, _service) = spawn(Vec::new(), None).await;

        let err = api.fetch_session("gone").await.unwrap_err();
        assert_eq!(err.status(), Some(ReqwestStatus::NOT_FOUND));
        assert!(matches!(
            err,
            ApiError::RequestStatus { ref path, .. } if path == "/sessions/gone"
        ));
    }

    #[tokio::test]
    async fn undecodable_bodies_are_decode_errors() {
        let (api, _service) = spawn(
            vec![("GET", "/sessions/bad", StatusCode::OK, json!({ "status": 7 }))],
            None,
        )
        .await;

        let err = api.fetch_session("bad").await.unwrap_err();
        assert!(matches!(err, ApiError::DecodeResponse { .. }));
    }
}
