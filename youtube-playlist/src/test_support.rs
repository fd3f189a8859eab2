//! Stubs for exercising the OAuth and YouTube HTTP paths without talking to Google.
//!
//! [`StubServer`] is a local HTTP server that records every request it gets and answers each
//! path with canned JSON, so tests can point both the token endpoint and the YouTube API base
//! URL at it and then assert on exactly which calls were made.

use crate::oauth::ClientSecrets;
use crate::prompt::AuthorizationPrompt;
use http::{HeaderMap, Method};
use http_body_util::{BodyExt, Full};
use hyper::body::Bytes;
use hyper::service::service_fn;
use hyper::{Request, Response, body};
use oauth2::basic::{BasicTokenResponse, BasicTokenType};
use oauth2::url::Url;
use oauth2::{
    AccessToken, AuthorizationCode, CsrfToken, EmptyExtraTokenFields, RedirectUrl, RefreshToken,
};
use std::collections::{HashMap, VecDeque};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// A request as seen by the [`StubServer`].
#[derive(Debug, Clone)]
pub(crate) struct RecordedRequest {
    pub(crate) method: Method,
    pub(crate) path: String,
    pub(crate) query: Vec<(String, String)>,
    pub(crate) headers: HeaderMap,
    pub(crate) body: String,
}

impl RecordedRequest {
    pub(crate) fn query_param(&self, name: &str) -> Option<String> {
        self.query
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.clone())
    }

    /// A parameter of an `application/x-www-form-urlencoded` body.
    pub(crate) fn form_param(&self, name: &str) -> Option<String> {
        form_urlencoded::parse(self.body.as_bytes())
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.into_owned())
    }

    pub(crate) fn header(&self, name: &str) -> Option<String> {
        self.headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    }

    pub(crate) fn json(&self) -> serde_json::Value {
        serde_json::from_str(&self.body).expect("request body is JSON")
    }
}

#[derive(Debug, Default)]
struct StubState {
    requests: Vec<RecordedRequest>,
    /// Replies per path. The last reply for a path is repeated for any further requests.
    replies: HashMap<String, VecDeque<(u16, String)>>,
}

/// Local HTTP server with canned replies. See the module docs.
#[derive(Debug, Clone)]
pub(crate) struct StubServer {
    addr: SocketAddr,
    state: Arc<Mutex<StubState>>,
}

impl StubServer {
    pub(crate) async fn start() -> Self {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let state = Arc::new(Mutex::new(StubState::default()));

        let server_state = Arc::clone(&state);
        tokio::spawn(async move {
            while let Ok((conn, _)) = listener.accept().await {
                let state = Arc::clone(&server_state);
                tokio::spawn(async move {
                    let service = service_fn(move |req: Request<body::Incoming>| {
                        let state = Arc::clone(&state);
                        async move { Ok::<_, Infallible>(handle(&state, req).await) }
                    });
                    let _ = hyper::server::conn::http1::Builder::new()
                        .serve_connection(hyper_util::rt::TokioIo::new(conn), service)
                        .await;
                });
            }
        });

        Self { addr, state }
    }

    /// Absolute URL of `path` on this server.
    pub(crate) fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// Queues a reply for requests to `path`.
    pub(crate) fn respond(&self, path: &str, status: u16, body: serde_json::Value) {
        self.state
            .lock()
            .unwrap()
            .replies
            .entry(path.to_string())
            .or_default()
            .push_back((status, body.to_string()));
    }

    pub(crate) fn requests(&self) -> Vec<RecordedRequest> {
        self.state.lock().unwrap().requests.clone()
    }

    pub(crate) fn requests_to(&self, path: &str) -> Vec<RecordedRequest> {
        self.requests()
            .into_iter()
            .filter(|r| r.path == path)
            .collect()
    }
}

async fn handle(
    state: &Mutex<StubState>,
    req: Request<body::Incoming>,
) -> Response<Full<Bytes>> {
    let (parts, body) = req.into_parts();
    let body = body
        .collect()
        .await
        .map(|collected| collected.to_bytes())
        .unwrap_or_default();
    let query = form_urlencoded::parse(parts.uri.query().unwrap_or("").as_bytes())
        .into_owned()
        .collect();
    let path = parts.uri.path().to_string();

    let (status, reply) = {
        let mut state = state.lock().unwrap();
        state.requests.push(RecordedRequest {
            method: parts.method,
            path: path.clone(),
            query,
            headers: parts.headers,
            body: String::from_utf8_lossy(&body).into_owned(),
        });
        let reply = match state.replies.get_mut(&path) {
            Some(replies) if replies.len() > 1 => replies.pop_front(),
            Some(replies) => replies.front().cloned(),
            None => None,
        };
        reply.unwrap_or_else(|| (404, r#"{"error": "no stub reply"}"#.to_string()))
    };

    Response::builder()
        .status(status)
        .header(http::header::CONTENT_TYPE, "application/json")
        .body(Full::from(reply))
        .unwrap()
}

/// Client secrets whose endpoints point at `server`.
pub(crate) fn secrets_for(server: &StubServer) -> ClientSecrets {
    ClientSecrets {
        client_id: "client-id".into(),
        client_secret: "client-secret".into(),
        auth_uri: server.url("/auth"),
        token_uri: server.url("/token"),
    }
}

/// A token as it would have been issued by Google.
pub(crate) fn stored_token(access: &str, refresh: Option<&str>) -> BasicTokenResponse {
    let mut token = BasicTokenResponse::new(
        AccessToken::new(access.to_string()),
        BasicTokenType::Bearer,
        EmptyExtraTokenFields {},
    );
    token.set_expires_in(Some(&Duration::from_secs(3599)));
    token.set_refresh_token(refresh.map(|r| RefreshToken::new(r.to_string())));
    token
}

/// Consent that is granted instantly with a fixed code.
#[derive(Debug)]
pub(crate) struct StaticCodePrompt {
    code: String,
    presented: Vec<Url>,
}

impl StaticCodePrompt {
    pub(crate) fn new(code: &str) -> Self {
        Self {
            code: code.to_string(),
            presented: Vec::new(),
        }
    }

    /// Authorization URLs the user would have been sent to.
    pub(crate) fn presented_urls(&self) -> &[Url] {
        &self.presented
    }
}

impl AuthorizationPrompt for StaticCodePrompt {
    fn redirect_url(&self) -> RedirectUrl {
        RedirectUrl::new("http://127.0.0.1:1".to_string()).unwrap()
    }

    async fn authorization_code(
        &mut self,
        authorize_url: &Url,
        _csrf: &CsrfToken,
    ) -> eyre::Result<AuthorizationCode> {
        self.presented.push(authorize_url.clone());
        Ok(AuthorizationCode::new(self.code.clone()))
    }
}

/// Consent that must never be needed.
#[derive(Debug)]
pub(crate) struct UnreachablePrompt;

impl AuthorizationPrompt for UnreachablePrompt {
    fn redirect_url(&self) -> RedirectUrl {
        RedirectUrl::new("http://127.0.0.1:1".to_string()).unwrap()
    }

    async fn authorization_code(
        &mut self,
        _authorize_url: &Url,
        _csrf: &CsrfToken,
    ) -> eyre::Result<AuthorizationCode> {
        panic!("user should not have been asked to authorize");
    }
}
