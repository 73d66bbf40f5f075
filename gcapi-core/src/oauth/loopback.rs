//! Loopback redirect receiver for desktop and CLI use.

use async_trait::async_trait;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use url::Url;

use super::{AuthorizationCallback, AuthorizationPresenter};
use crate::session::TokenError;

type UrlHandler = Box<dyn Fn(&Url) + Send + Sync>;

/// Presenter that hands the authorization URL to a callback (usually one that
/// prints it or opens a browser) and listens on the redirect URL's port for
/// the provider's redirect.
///
/// The redirect URL must point at `localhost` or `127.0.0.1`.
pub struct LoopbackPresenter {
    on_url: UrlHandler,
}

impl LoopbackPresenter {
    /// Presenter that only logs the URL.
    pub fn new() -> Self {
        Self {
            on_url: Box::new(|url| tracing::info!("Visit {} to authorize", url)),
        }
    }

    /// Call `handler` with the authorization URL once the listener is bound.
    pub fn with_url_handler(handler: impl Fn(&Url) + Send + Sync + 'static) -> Self {
        Self {
            on_url: Box::new(handler),
        }
    }
}

impl Default for LoopbackPresenter {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for LoopbackPresenter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoopbackPresenter").finish_non_exhaustive()
    }
}

#[async_trait]
impl AuthorizationPresenter for LoopbackPresenter {
    async fn present(
        &self,
        authorize_url: &Url,
        redirect_url: &Url,
    ) -> Result<AuthorizationCallback, TokenError> {
        let port = redirect_url
            .port_or_known_default()
            .ok_or_else(|| TokenError::OAuthError {
                message: format!("redirect URL {} has no port", redirect_url),
            })?;

        let addr = format!("127.0.0.1:{}", port);
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|e| TokenError::OAuthError {
                message: format!("failed to bind to {}: {}", addr, e),
            })?;

        tracing::info!("Listening for OAuth callback on {}", addr);
        (self.on_url)(authorize_url);

        loop {
            let (mut socket, _) = listener.accept().await.map_err(|e| TokenError::OAuthError {
                message: format!("failed to accept connection: {}", e),
            })?;

            let mut buffer = [0; 4096];
            let n = socket
                .read(&mut buffer)
                .await
                .map_err(|e| TokenError::OAuthError {
                    message: format!("failed to read request: {}", e),
                })?;

            let request = String::from_utf8_lossy(&buffer[..n]);
            let target = request
                .lines()
                .next()
                .and_then(|line| line.split_whitespace().nth(1));

            match target.and_then(|t| parse_redirect(redirect_url, t)) {
                Some(Redirect::Error(err)) => {
                    let _ = socket.write_all(FAILURE_PAGE).await;
                    return Err(TokenError::OAuthError {
                        message: format!("OAuth provider returned error: {}", err),
                    });
                }
                Some(Redirect::Code(callback)) => {
                    let _ = socket.write_all(SUCCESS_PAGE).await;
                    return Ok(callback);
                }
                None => {
                    // favicon requests and the like
                    let _ = socket
                        .write_all(b"HTTP/1.1 400 Bad Request\r\nConnection: close\r\n\r\n")
                        .await;
                }
            }
        }
    }
}

enum Redirect {
    Code(AuthorizationCallback),
    Error(String),
}

fn parse_redirect(redirect_url: &Url, target: &str) -> Option<Redirect> {
    let url = redirect_url.join(target).ok()?;
    if url.path() != redirect_url.path() {
        return None;
    }

    let mut code = None;
    let mut state = None;
    for (key, value) in url.query_pairs() {
        match key.as_ref() {
            "code" => code = Some(value.into_owned()),
            "state" => state = Some(value.into_owned()),
            "error" => return Some(Redirect::Error(value.into_owned())),
            _ => {}
        }
    }

    code.map(|code| Redirect::Code(AuthorizationCallback { code, state }))
}

const SUCCESS_PAGE: &[u8] = b"HTTP/1.1 200 OK\r\nContent-Type: text/html\r\nConnection: close\r\n\r\n\
    <html><body><h1>Authorization Successful</h1>\
    <p>You can close this window and return to your application.</p></body></html>";

const FAILURE_PAGE: &[u8] = b"HTTP/1.1 200 OK\r\nContent-Type: text/html\r\nConnection: close\r\n\r\n\
    <html><body><h1>Authorization Failed</h1>\
    <p>The provider returned an error.</p></body></html>";

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    fn redirect() -> Url {
        Url::parse("http://localhost:8765/callback").unwrap()
    }

    #[test]
    fn test_parse_redirect_with_code() {
        match parse_redirect(&redirect(), "/callback?code=abc%2B1&state=xyz") {
            Some(Redirect::Code(cb)) => {
                assert_eq!(cb.code, "abc+1");
                assert_eq!(cb.state.as_deref(), Some("xyz"));
            }
            _ => panic!("expected code"),
        }
    }

    #[test]
    fn test_parse_redirect_error_and_noise() {
        assert!(matches!(
            parse_redirect(&redirect(), "/callback?error=access_denied"),
            Some(Redirect::Error(e)) if e == "access_denied"
        ));
        assert!(parse_redirect(&redirect(), "/favicon.ico").is_none());
        assert!(parse_redirect(&redirect(), "/callback").is_none());
    }

    #[tokio::test]
    async fn test_loopback_receives_redirect() {
        // find a free port, then release it for the presenter
        let port = {
            let probe = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            probe.local_addr().unwrap().port()
        };
        let redirect = Url::parse(&format!("http://127.0.0.1:{}/callback", port)).unwrap();
        let authorize = Url::parse("https://example.com/authorize").unwrap();

        let (tx, mut rx) = mpsc::unbounded_channel();
        let presenter = LoopbackPresenter::with_url_handler(move |url| {
            let _ = tx.send(url.clone());
        });

        let redirect_for_task = redirect.clone();
        let handle = tokio::spawn(async move {
            presenter.present(&authorize, &redirect_for_task).await
        });

        let shown = rx.recv().await.unwrap();
        assert_eq!(shown.as_str(), "https://example.com/authorize");

        let mut stream = tokio::net::TcpStream::connect(("127.0.0.1", port)).await.unwrap();
        stream
            .write_all(b"GET /callback?code=the-code&state=s1 HTTP/1.1\r\nHost: localhost\r\n\r\n")
            .await
            .unwrap();

        let callback = handle.await.unwrap().unwrap();
        assert_eq!(callback.code, "the-code");
        assert_eq!(callback.state.as_deref(), Some("s1"));
    }
}
