//! Integration tests for the PassLink login service.
//!
//! Each test spawns a [`LoginHttpService`] on an ephemeral local port and
//! drives it over TCP with `reqwest`. Redirects are never followed so the
//! `302` responses and their cookies stay observable.
//!
//! Run them with:
//! ```text
//! cargo test -p passlink-integration
//! ```

use std::net::SocketAddr;
use std::sync::{Arc, Once};

use anyhow::{Context, Result};
use chrono::{TimeZone, Utc};
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as HttpConnBuilder;
use passlink_auth::{Authenticatable, LinkGenerator, LinkOptions, SignedLink, StaticPrincipalProvider};
use passlink_core::{ManualClock, PassLinkConfig, Secret};
use passlink_http::service::LoginHttpService;
use passlink_http::session::MemorySessionStore;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tracing::warn;

static INIT: Once = Once::new();

/// Instant every test server's clock starts at.
pub const START: i64 = 1_700_000_000;

/// Initialize tracing (once).
fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
            )
            .with_test_writer()
            .init();
    });
}

/// A user known to the test server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestUser {
    /// Identifier placed in the link path.
    pub id: u64,
}

impl Authenticatable for TestUser {
    fn unique_key(&self) -> String {
        self.id.to_string()
    }
}

/// Users registered with every test server.
#[must_use]
pub fn test_users() -> Vec<TestUser> {
    vec![TestUser { id: 1 }, TestUser { id: 2 }]
}

/// Base configuration shared by the tests.
#[must_use]
pub fn test_config() -> PassLinkConfig {
    PassLinkConfig::builder()
        .secret(Secret::parse("base64:aW50ZWdyYXRpb24tc2VjcmV0").expect("valid secret"))
        .build()
}

/// A login service running on an ephemeral port.
#[derive(Debug)]
pub struct TestServer {
    /// `http://127.0.0.1:{port}` of the running server.
    pub base_url: String,
    /// Generator sharing the server's secret and clock.
    pub generator: LinkGenerator,
    /// Clock driving both generation and verification.
    pub clock: Arc<ManualClock>,
    /// Sessions established by the server.
    pub sessions: Arc<MemorySessionStore>,
    handle: JoinHandle<()>,
}

impl TestServer {
    /// Start a server with [`test_config`].
    pub async fn start() -> Result<Self> {
        Self::start_with(test_config()).await
    }

    /// Start a server with the given configuration.
    pub async fn start_with(config: PassLinkConfig) -> Result<Self> {
        init_tracing();

        let config = Arc::new(config);
        let start = Utc
            .timestamp_opt(START, 0)
            .single()
            .context("invalid start instant")?;
        let clock = Arc::new(ManualClock::new(start));
        let sessions = Arc::new(MemorySessionStore::with_clock(clock.clone()));
        let service = LoginHttpService::new(
            Arc::clone(&config),
            Arc::new(StaticPrincipalProvider::new(test_users())),
            Arc::clone(&sessions),
            clock.clone(),
        );

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .context("failed to bind test listener")?;
        let addr: SocketAddr = listener.local_addr()?;

        let handle = tokio::spawn(async move {
            let http = HttpConnBuilder::new(TokioExecutor::new());
            loop {
                let Ok((stream, _)) = listener.accept().await else {
                    continue;
                };
                let conn = http
                    .serve_connection(TokioIo::new(stream), service.clone())
                    .into_owned();
                tokio::spawn(async move {
                    if let Err(e) = conn.await {
                        warn!(error = %e, "test connection error");
                    }
                });
            }
        });

        Ok(Self {
            base_url: format!("http://{addr}"),
            generator: LinkGenerator::new(config, clock.clone()),
            clock,
            sessions,
            handle,
        })
    }

    /// Generate a link for user `id` and return its server-relative form.
    pub fn link(&self, id: u64, options: &LinkOptions) -> Result<SignedLink> {
        Ok(self.generator.generate(&TestUser { id }, options)?)
    }

    /// Absolute URL on this server for a path and query.
    #[must_use]
    pub fn url(&self, path_and_query: &str) -> String {
        format!("{}{path_and_query}", self.base_url)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// A client that never follows redirects.
#[must_use]
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .expect("reqwest client")
}

/// The `name=value` part of a response's `Set-Cookie` header.
#[must_use]
pub fn session_cookie(resp: &reqwest::Response) -> Option<String> {
    resp.headers()
        .get(reqwest::header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .map(str::to_owned)
}

/// The `Location` header of a response.
#[must_use]
pub fn location(resp: &reqwest::Response) -> Option<String> {
    resp.headers()
        .get(reqwest::header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned)
}

mod test_endpoints;
mod test_login;
