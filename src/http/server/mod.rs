use std::net::SocketAddr;
use std::sync::Arc;

use tracing::{event, Level};
use warp::Filter;

use crate::core::config::ServerSettings;
use crate::provider::OAuth2Debugger;

mod endpoints;

use endpoints::{callback::callback_endpoint, home::home_endpoint, login::login_endpoint};

use super::encoding::error::handle_reject;

pub const HOME_ROUTE: &str = "/";

#[derive(Debug)]
pub struct Server {
    debugger: Arc<OAuth2Debugger>,
    settings: ServerSettings,
}

impl Server {
    pub fn new(debugger: Arc<OAuth2Debugger>, settings: ServerSettings) -> Self {
        Self { debugger, settings }
    }

    pub fn routes(
        &self,
    ) -> impl Filter<Extract = (impl warp::Reply,), Error = warp::Rejection> + Clone {
        let home = home_endpoint(&self.settings.title, &self.settings.login_route);
        let login = login_endpoint(self.debugger.clone(), &self.settings.login_route);
        let callback = callback_endpoint(self.debugger.clone(), &self.settings.callback_route);

        home.or(login)
            .or(callback)
            .recover(handle_reject)
            .with(warp::log("http-api"))
    }

    pub async fn serve(self) -> Option<()> {
        let addr = SocketAddr::from((self.settings.host, self.settings.port));
        let routes = self.routes();

        let (addr, server) = warp::serve(routes)
            .try_bind_ephemeral(addr)
            .map_err(|e| event!(Level::ERROR, %addr, error = %e, "Failed to bind"))
            .ok()?;

        event!(Level::INFO, "Started on http://localhost:{}", addr.port());
        server.await;

        Some(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{MISSING_CODE_MESSAGE, USER_DENIED_MESSAGE};
    use crate::http::encoding::STATE_COOKIE;
    use crate::provider::exchange::TokenExchanger;
    use crate::auth::{ExchangeError, TokenSet};
    use crate::core::models::ClientConfiguration;
    use crate::core::types::AuthCode;
    use crate::provider::testing::{client_config, RecordingExchanger};
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Mutex;
    use std::time::Instant;
    use std::net::{IpAddr, Ipv4Addr};
    use std::time::Duration;
    use url::Url;
    use warp::http::StatusCode;

    fn settings() -> ServerSettings {
        ServerSettings {
            host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: 8080,
            login_route: "/login".to_string(),
            callback_route: "/auth/callback".to_string(),
            title: "Debug <Provider>".to_string(),
            verify_state: false,
            exchange_timeout: Duration::from_secs(30),
        }
    }

    fn server(exchanger: Arc<dyn TokenExchanger>) -> Server {
        let debugger = OAuth2Debugger::new(client_config(), exchanger);
        Server::new(Arc::new(debugger), settings())
    }

    fn location(res: &warp::http::Response<warp::hyper::body::Bytes>) -> &str {
        res.headers()["location"].to_str().unwrap()
    }

    #[tokio::test]
    async fn home_links_to_login() {
        let routes = server(Arc::new(RecordingExchanger::default())).routes();
        let res = warp::test::request().path("/").reply(&routes).await;

        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(res.headers()["content-type"], "text/html; charset=utf-8");
        let body = std::str::from_utf8(res.body()).unwrap();
        assert!(body.contains(r#"<a href="/login">"#));
        assert!(body.contains("Debug &lt;Provider&gt;"));
    }

    #[tokio::test]
    async fn login_redirects_to_the_provider() {
        let routes = server(Arc::new(RecordingExchanger::default())).routes();
        let res = warp::test::request().path("/login").reply(&routes).await;

        assert_eq!(res.status(), StatusCode::TEMPORARY_REDIRECT);
        let url = Url::parse(location(&res)).unwrap();
        assert_eq!(url.host_str(), Some("provider.test"));
        assert_eq!(url.path(), "/authorize");

        let query: HashMap<String, String> = url.query_pairs().into_owned().collect();
        assert_eq!(query.len(), 4);
        assert_eq!(query["client_id"], "debug-client");
        assert_eq!(query["scope"], "openid email");
        assert_eq!(query["redirect_uri"], "http://localhost:8080/callback");
        assert_eq!(query["response_type"], "code");
        assert!(res.headers().get("set-cookie").is_none());
    }

    #[tokio::test]
    async fn malformed_authorization_endpoint_is_a_server_error() {
        let mut config = client_config();
        config.authorization_endpoint = "::not-a-url::".to_string();
        let debugger = OAuth2Debugger::new(config, Arc::new(RecordingExchanger::default()));
        let routes = Server::new(Arc::new(debugger), settings()).routes();

        let res = warp::test::request().path("/login").reply(&routes).await;
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn callback_returns_the_token_set_as_json() {
        let exchanger = Arc::new(RecordingExchanger::default());
        let routes = server(exchanger.clone()).routes();

        let res = warp::test::request()
            .path("/auth/callback?code=abc123&scope=email")
            .reply(&routes)
            .await;

        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(res.headers()["content-type"], "application/json");
        assert_eq!(
            res.body().as_ref(),
            br#"{"access_token":"tok1","token_type":"Bearer","refresh_token":"ref1","expires_in":1700000000}"#
        );
        assert_eq!(exchanger.codes(), vec!["abc123".to_string()]);
    }

    #[tokio::test]
    async fn denial_gets_the_denial_message() {
        let exchanger = Arc::new(RecordingExchanger::default());
        let routes = server(exchanger.clone()).routes();

        let res = warp::test::request()
            .path("/auth/callback?error=access_denied&error_reason=user_denied")
            .reply(&routes)
            .await;

        assert_eq!(res.status(), StatusCode::FORBIDDEN);
        assert_eq!(res.body().as_ref(), USER_DENIED_MESSAGE.as_bytes());
        assert!(exchanger.codes().is_empty());
    }

    #[tokio::test]
    async fn missing_code_gets_the_generic_message() {
        let routes = server(Arc::new(RecordingExchanger::default())).routes();

        let res = warp::test::request()
            .path("/auth/callback")
            .reply(&routes)
            .await;

        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        assert_eq!(res.body().as_ref(), MISSING_CODE_MESSAGE.as_bytes());
    }

    #[tokio::test]
    async fn failed_exchange_redirects_home_without_a_body() {
        let exchanger = Arc::new(RecordingExchanger::failing());
        let routes = server(exchanger.clone()).routes();

        let res = warp::test::request()
            .path("/auth/callback?code=abc123")
            .reply(&routes)
            .await;

        assert_eq!(res.status(), StatusCode::TEMPORARY_REDIRECT);
        assert_eq!(location(&res), "/");
        assert!(res.body().is_empty());
        assert_eq!(exchanger.codes(), vec!["abc123".to_string()]);
    }

    #[tokio::test]
    async fn unknown_paths_are_not_found() {
        let routes = server(Arc::new(RecordingExchanger::default())).routes();
        let res = warp::test::request().path("/nope").reply(&routes).await;
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn concurrent_logins_get_identical_redirects() {
        let routes = server(Arc::new(RecordingExchanger::default())).routes();
        let (addr, serve) = warp::serve(routes).bind_ephemeral(([127, 0, 0, 1], 0));
        tokio::spawn(serve);

        let client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .unwrap();

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let client = client.clone();
                tokio::spawn(async move {
                    let res = client
                        .get(format!("http://{}/login", addr))
                        .send()
                        .await
                        .unwrap();
                    let location = res.headers()["location"].to_str().unwrap().to_string();
                    (res.status().as_u16(), location)
                })
            })
            .collect();

        let mut locations = Vec::new();
        for handle in handles {
            let (status, location) = handle.await.unwrap();
            assert_eq!(status, 307);
            locations.push(location);
        }

        let expected = Url::parse(&locations[0]).unwrap();
        assert_eq!(expected.query_pairs().count(), 4);
        assert!(locations.iter().all(|l| l == expected.as_str()));
    }

    #[tokio::test]
    async fn state_round_trips_through_the_cookie() {
        let exchanger = Arc::new(RecordingExchanger::default());
        let debugger = OAuth2Debugger::new(client_config(), exchanger.clone())
            .with_state_verification();
        let mut settings = settings();
        settings.verify_state = true;
        let routes = Server::new(Arc::new(debugger), settings).routes();

        let login = warp::test::request().path("/login").reply(&routes).await;
        let cookie = login.headers()["set-cookie"].to_str().unwrap().to_string();
        assert!(cookie.starts_with(STATE_COOKIE));
        assert!(cookie.contains("HttpOnly"));

        let url = Url::parse(location(&login)).unwrap();
        let state = url
            .query_pairs()
            .find(|(k, _)| k == "state")
            .map(|(_, v)| v.into_owned())
            .unwrap();
        let cookie_pair = cookie.split(';').next().unwrap().to_string();

        let forged = warp::test::request()
            .path("/auth/callback?code=abc123&state=forged")
            .header("cookie", cookie_pair.as_str())
            .reply(&routes)
            .await;
        assert_eq!(forged.status(), StatusCode::BAD_REQUEST);
        assert!(exchanger.codes().is_empty());

        let res = warp::test::request()
            .path(&format!("/auth/callback?code=abc123&state={}", state))
            .header("cookie", cookie_pair.as_str())
            .reply(&routes)
            .await;
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(exchanger.codes(), vec!["abc123".to_string()]);
    }

    const STALL: Duration = Duration::from_secs(30);

    /// Sets its flag when dropped.
    struct DropFlag(Arc<AtomicBool>);

    impl Drop for DropFlag {
        fn drop(&mut self) {
            self.0.store(true, Ordering::SeqCst);
        }
    }

    /// Exchanger whose provider never answers in time.
    #[derive(Default)]
    struct StallingExchanger {
        started: Arc<AtomicBool>,
        dropped: Arc<AtomicBool>,
    }

    #[async_trait]
    impl TokenExchanger for StallingExchanger {
        async fn exchange(
            &self,
            _config: &ClientConfiguration,
            _code: &AuthCode,
        ) -> Result<TokenSet, ExchangeError> {
            let _flag = DropFlag(self.dropped.clone());
            self.started.store(true, Ordering::SeqCst);
            tokio::time::sleep(STALL).await;
            Err(ExchangeError::Timeout(STALL))
        }
    }

    async fn wait_for(flag: &AtomicBool, limit: Duration) -> bool {
        let deadline = Instant::now() + limit;
        while Instant::now() < deadline {
            if flag.load(Ordering::SeqCst) {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        flag.load(Ordering::SeqCst)
    }

    #[tokio::test]
    async fn disconnect_aborts_the_exchange() {
        let exchanger = Arc::new(StallingExchanger::default());
        let routes = server(exchanger.clone()).routes();
        let (addr, serve) = warp::serve(routes).bind_ephemeral(([127, 0, 0, 1], 0));
        tokio::spawn(serve);

        let began = Instant::now();
        let request = tokio::spawn(async move {
            reqwest::get(format!("http://{}/auth/callback?code=abc123", addr)).await
        });

        assert!(wait_for(&exchanger.started, Duration::from_secs(5)).await);
        assert!(!exchanger.dropped.load(Ordering::SeqCst));

        request.abort();

        assert!(wait_for(&exchanger.dropped, Duration::from_secs(5)).await);
        assert!(began.elapsed() < STALL);
    }

    #[derive(Clone, Default)]
    struct LogBuffer(Arc<Mutex<Vec<u8>>>);

    impl std::io::Write for LogBuffer {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl LogBuffer {
        fn contents(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
        }
    }

    #[tokio::test]
    async fn requests_are_logged_with_their_full_url() {
        let logs = LogBuffer::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        let routes = server(Arc::new(RecordingExchanger::default())).routes();
        warp::test::request().path("/login").reply(&routes).await;
        warp::test::request()
            .path("/auth/callback?code=abc123&scope=email")
            .reply(&routes)
            .await;

        let logs = logs.contents();
        assert!(logs.contains("url=/login"), "{}", logs);
        assert!(
            logs.contains("url=/auth/callback?code=abc123&scope=email"),
            "{}",
            logs
        );
        assert!(!logs.contains("s3cret"), "{}", logs);
        assert!(!logs.contains("tok1"), "{}", logs);
    }

    #[tokio::test]
    async fn repeated_code_uses_the_first_value() {
        let exchanger = Arc::new(RecordingExchanger::default());
        let routes = server(exchanger.clone()).routes();

        let res = warp::test::request()
            .path("/auth/callback?code=abc123&code=def456")
            .reply(&routes)
            .await;

        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(exchanger.codes(), vec!["abc123".to_string()]);
    }
}
