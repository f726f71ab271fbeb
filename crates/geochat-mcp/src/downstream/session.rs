//! Form sign-in against the catalogue backend
//!
//! The sign-in page hands out an `XSRF-TOKEN` cookie which must be echoed
//! back in the `X-XSRF-TOKEN` header when posting credentials. The cookies
//! collected along the way become default headers on the transport client.

use geochat_config::SessionAuthConfig;
use indexmap::IndexMap;
use reqwest::StatusCode;
use reqwest::header::{COOKIE, HeaderMap, HeaderValue, SET_COOKIE};
use secrecy::ExposeSecret;

use crate::error::McpError;

const XSRF_COOKIE: &str = "XSRF-TOKEN";
const XSRF_HEADER: &str = "x-xsrf-token";

/// Cookies in the order they were first set; later values replace earlier ones
#[derive(Debug, Default)]
struct CookieJar(IndexMap<String, String>);

impl CookieJar {
    fn absorb(&mut self, headers: &HeaderMap) {
        let pairs = headers
            .get_all(SET_COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .filter_map(|value| value.split(';').next())
            .filter_map(|pair| pair.split_once('='))
            .map(|(name, value)| (name.trim().to_owned(), value.trim().to_owned()));

        self.0.extend(pairs);
    }

    fn xsrf_token(&self) -> Option<&str> {
        self.0.get(XSRF_COOKIE).map(String::as_str)
    }

    fn header_value(&self) -> Option<String> {
        (!self.0.is_empty()).then(|| {
            self.0
                .iter()
                .map(|(name, value)| format!("{name}={value}"))
                .collect::<Vec<_>>()
                .join("; ")
        })
    }
}

/// Sign in and return the headers that carry the resulting session
///
/// # Errors
///
/// `Unauthenticated` when the backend rejects the credentials or issues no
/// session; `Transport` for any other failure
pub async fn sign_in(config: &SessionAuthConfig) -> Result<HeaderMap, McpError> {
    let client = reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .map_err(|e| McpError::Transport(format!("failed to build sign-in client: {e}")))?;

    let mut jar = CookieJar::default();

    let landing = client
        .get(config.sign_in_url.clone())
        .send()
        .await
        .map_err(|e| McpError::Transport(format!("sign-in page unreachable: {e}")))?;
    jar.absorb(landing.headers());

    let mut request = client.post(config.sign_in_url.clone()).form(&[
        ("username", config.username.as_str()),
        ("password", config.password.expose_secret()),
    ]);
    if let Some(cookies) = jar.header_value() {
        request = request.header(COOKIE, cookies);
    }
    if let Some(token) = jar.xsrf_token() {
        request = request.header(XSRF_HEADER, token);
    }

    let response = request
        .send()
        .await
        .map_err(|e| McpError::Transport(format!("sign-in request failed: {e}")))?;

    let status = response.status();
    if matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) {
        return Err(McpError::Unauthenticated(format!(
            "catalogue rejected credentials for '{}'",
            config.username
        )));
    }
    if !(status.is_success() || status.is_redirection()) {
        return Err(McpError::Transport(format!("sign-in returned {status}")));
    }

    jar.absorb(response.headers());

    let Some(cookies) = jar.header_value() else {
        return Err(McpError::Unauthenticated("sign-in issued no session cookie".to_owned()));
    };

    let mut headers = HeaderMap::new();
    let mut cookie_value =
        HeaderValue::from_str(&cookies).map_err(|e| McpError::Transport(format!("invalid session cookie: {e}")))?;
    cookie_value.set_sensitive(true);
    headers.insert(COOKIE, cookie_value);

    if let Some(token) = jar.xsrf_token() {
        let value =
            HeaderValue::from_str(token).map_err(|e| McpError::Transport(format!("invalid XSRF token: {e}")))?;
        headers.insert(XSRF_HEADER, value);
    }

    tracing::info!(user = %config.username, "signed in to catalogue");

    Ok(headers)
}
