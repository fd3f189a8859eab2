//! Interactive user consent for the OAuth authorization flow.
//!
//! Getting an authorization code requires the user to visit a URL and grant access, which
//! happens outside this process. [`AuthorizationPrompt`] abstracts over how that happens:
//!
//! - [`LoopbackPrompt`] opens the browser and catches the redirect on a local HTTP server.
//! - [`ConsolePrompt`] prints the URL and has the user paste back where they ended up, for
//!   machines where no browser can reach this process.

use eyre::Context;
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::service::service_fn;
use hyper::{Request, Response, StatusCode, body};
use oauth2::url::Url;
use oauth2::{AuthorizationCode, CsrfToken, RedirectUrl};
use std::future::Future;
use tokio::io::AsyncBufReadExt;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;

const OAUTH_DONE: &str = include_str!("../oauth_success.html");

/// Gets the user through the consent step of the OAuth flow.
pub trait AuthorizationPrompt {
    /// The redirect URL the authorization server should send the user to after consent.
    fn redirect_url(&self) -> RedirectUrl;

    /// Presents `authorize_url` to the user and returns the authorization code they obtained.
    ///
    /// Implementations that see the `state` parameter of the redirect must check it against
    /// `csrf`.
    fn authorization_code(
        &mut self,
        authorize_url: &Url,
        csrf: &CsrfToken,
    ) -> impl Future<Output = eyre::Result<AuthorizationCode>>;
}

/// Receives the OAuth redirect on a local HTTP server.
///
/// The server binds to a random port on `127.0.0.1` when the prompt is created, so the redirect
/// URL is known before the authorization URL is built. It serves until the first redirect that
/// carries the flow's CSRF state, along with either an authorization code or an error. Requests
/// without that state get a 404 and leave the flow running.
#[derive(Debug)]
pub struct LoopbackPrompt {
    listener: Option<TcpListener>,
    redirect: RedirectUrl,
    open_browser: bool,
}

impl LoopbackPrompt {
    /// Binds the redirect server.
    pub async fn bind() -> eyre::Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .context("bind to localhost")?;
        let addr = listener.local_addr().context("get local address")?;
        let redirect = RedirectUrl::new(format!("http://{}:{}", addr.ip(), addr.port()))
            .context("construct redirect url")?;
        Ok(Self {
            listener: Some(listener),
            redirect,
            open_browser: true,
        })
    }

    /// Only print the authorization URL instead of also opening it in the browser.
    pub fn without_browser(mut self) -> Self {
        self.open_browser = false;
        self
    }
}

impl AuthorizationPrompt for LoopbackPrompt {
    fn redirect_url(&self) -> RedirectUrl {
        self.redirect.clone()
    }

    async fn authorization_code(
        &mut self,
        authorize_url: &Url,
        csrf: &CsrfToken,
    ) -> eyre::Result<AuthorizationCode> {
        let Some(listener) = self.listener.take() else {
            eyre::bail!("loopback redirect server was already used");
        };

        tracing::info!(url = %authorize_url, "asking user to follow OAuth flow");
        eprintln!("Open this URL in your browser to authorize access:\n\n    {authorize_url}\n");
        if self.open_browser {
            if let Err(e) = webbrowser::open(authorize_url.as_str()) {
                tracing::warn!("could not open browser, visit the URL manually: {}", e);
            }
        }

        receive_redirect(listener, csrf.clone()).await
    }
}

/// Accepts connections until one of them delivers the OAuth redirect.
///
/// Browsers may open speculative connections or ask for a favicon, so a single connection is
/// not guaranteed to carry the redirect.
async fn receive_redirect(
    listener: TcpListener,
    csrf: CsrfToken,
) -> eyre::Result<AuthorizationCode> {
    let (got, mut gotten) = mpsc::channel(1);
    loop {
        tokio::select! {
            biased;
            outcome = gotten.recv() => {
                let Some(outcome) = outcome else {
                    eyre::bail!("redirect server exit prematurely");
                };
                return outcome;
            }
            conn = listener.accept() => {
                let (conn, _) = conn.context("accept")?;
                tokio::spawn(serve_redirect(conn, csrf.clone(), got.clone()));
            }
        }
    }
}

async fn serve_redirect(
    conn: TcpStream,
    csrf: CsrfToken,
    got: mpsc::Sender<eyre::Result<AuthorizationCode>>,
) {
    let conn = hyper_util::rt::TokioIo::new(conn);
    let service = service_fn(move |req: Request<body::Incoming>| {
        let csrf = csrf.clone();
        let got = got.clone();
        async move {
            match redirect_outcome(req.uri().query().unwrap_or(""), &csrf) {
                None => Response::builder()
                    .status(StatusCode::NOT_FOUND)
                    .body(Full::<Bytes>::from("not found")),
                Some(Ok(code)) => {
                    let _ = got.send(Ok(code)).await;
                    Response::builder()
                        .header(http::header::CONTENT_TYPE, "text/html; charset=utf-8")
                        .body(Full::<Bytes>::from(OAUTH_DONE))
                }
                Some(Err(e)) => {
                    let message = format!("authorization failed: {e}");
                    let _ = got.send(Err(e)).await;
                    Response::builder()
                        .status(StatusCode::BAD_REQUEST)
                        .body(Full::<Bytes>::from(message))
                }
            }
        }
    });
    if let Err(e) = hyper::server::conn::http1::Builder::new()
        .serve_connection(conn, service)
        .await
    {
        tracing::debug!("redirect server got bad request: {}", e);
    }
}

/// Interprets the query string of an OAuth redirect.
///
/// Returns `None` for requests that don't belong to this flow: anything whose `state` is missing
/// or doesn't match `csrf`. Only a redirect carrying our state can end the flow, with or without
/// an error.
fn redirect_outcome(query: &str, csrf: &CsrfToken) -> Option<eyre::Result<AuthorizationCode>> {
    let mut presented_state = None;
    let mut presented_code = None;
    let mut presented_error = None;
    for (k, v) in form_urlencoded::parse(query.as_bytes()) {
        match &*k {
            "state" => presented_state = Some(v),
            "code" => presented_code = Some(v),
            "error" => presented_error = Some(v),
            _ => {}
        }
    }
    if presented_state.as_deref() != Some(csrf.secret().as_str()) {
        if presented_state.is_some() || presented_code.is_some() || presented_error.is_some() {
            tracing::warn!("ignoring OAuth redirect with missing or invalid csrf token");
        }
        return None;
    }
    if let Some(error) = presented_error {
        return Some(Err(eyre::eyre!("authorization was not granted: {error}")));
    }
    let Some(code) = presented_code else {
        return Some(Err(eyre::eyre!("no authorization code found")));
    };
    Some(Ok(AuthorizationCode::new(code.into_owned())))
}

/// Has the user copy the result of the consent step back into the terminal.
///
/// After granting access, the browser is sent to the redirect URL, which nothing listens on.
/// The user pastes either that full address or just its `code` parameter.
#[derive(Debug, Clone)]
pub struct ConsolePrompt {
    redirect: RedirectUrl,
}

impl Default for ConsolePrompt {
    fn default() -> Self {
        Self {
            redirect: RedirectUrl::new("http://localhost".to_string())
                .expect("static redirect URL is valid"),
        }
    }
}

impl AuthorizationPrompt for ConsolePrompt {
    fn redirect_url(&self) -> RedirectUrl {
        self.redirect.clone()
    }

    async fn authorization_code(
        &mut self,
        authorize_url: &Url,
        csrf: &CsrfToken,
    ) -> eyre::Result<AuthorizationCode> {
        eprintln!("Open this URL in your browser to authorize access:\n\n    {authorize_url}\n");
        eprintln!(
            "After granting access, paste the address your browser was sent to \
            (or just its `code` value) and press enter:"
        );
        let mut line = String::new();
        tokio::io::BufReader::new(tokio::io::stdin())
            .read_line(&mut line)
            .await
            .context("read authorization response from stdin")?;
        parse_pasted_response(&line, csrf)
    }
}

/// Extracts the authorization code from what the user pasted into the console.
fn parse_pasted_response(input: &str, csrf: &CsrfToken) -> eyre::Result<AuthorizationCode> {
    let input = input.trim();
    if input.is_empty() {
        eyre::bail!("no authorization code entered");
    }
    if !input.contains("://") {
        return Ok(AuthorizationCode::new(input.to_string()));
    }
    let url = Url::parse(input).context("parse pasted redirect address")?;
    redirect_outcome(url.query().unwrap_or(""), csrf).unwrap_or_else(|| {
        Err(eyre::eyre!(
            "pasted address is not the redirect of this authorization request"
        ))
    })
}
