//! PassLink Server - passwordless login links over HTTP.
//!
//! This binary serves the login route built on `passlink-http`. Links are
//! signed with `PASSLINK_SECRET`; `--generate <id>` prints one for a known
//! principal so it can be delivered out of band.
//!
//! # Usage
//!
//! ```text
//! PASSLINK_SECRET=base64:c2VjcmV0 PASSLINK_PRINCIPALS_FILE=users.json passlink-server
//! PASSLINK_SECRET=base64:c2VjcmV0 PASSLINK_PRINCIPALS_FILE=users.json passlink-server --generate 42
//! ```
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `PASSLINK_SECRET` | *(required)* | HMAC key, raw or `base64:`-prefixed |
//! | `PASSLINK_PRINCIPALS_FILE` | *(unset)* | JSON array of `{id, name, email}` |
//! | `PASSLINK_TTL_MINUTES` | `30` | Default link lifetime |
//! | `PASSLINK_ROUTE_NAME` | `magic-login` | Login route segment |
//! | `GATEWAY_LISTEN` | `0.0.0.0:8080` | Bind address |
//! | `LOG_LEVEL` | `info` | Log level filter |
//! | `RUST_LOG` | *(unset)* | Fine-grained tracing filter (overrides `LOG_LEVEL`) |

mod principals;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as HttpConnBuilder;
use passlink_auth::{LinkGenerator, LinkOptions, PrincipalProvider, StaticPrincipalProvider};
use passlink_core::{Clock, PassLinkConfig, SystemClock};
use passlink_http::service::{HEALTH_PATH, LoginHttpService};
use passlink_http::session::MemorySessionStore;
use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::principals::{Account, load_provider};

/// Server version reported at startup.
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize the tracing subscriber.
///
/// Uses `RUST_LOG` if set, otherwise falls back to the `LOG_LEVEL` config value.
fn init_tracing(log_level: &str) -> Result<()> {
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        EnvFilter::try_new(log_level)
            .with_context(|| format!("invalid log level filter: {log_level}"))?
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    Ok(())
}

/// The principals file named by `PASSLINK_PRINCIPALS_FILE`, if any.
fn principals_path() -> Option<PathBuf> {
    std::env::var_os("PASSLINK_PRINCIPALS_FILE").map(PathBuf::from)
}

/// The value following `--generate`, if the flag is present.
fn generate_target(args: &[String]) -> Option<Result<&str>> {
    let pos = args.iter().position(|a| a == "--generate")?;
    Some(
        args.get(pos + 1)
            .map(String::as_str)
            .context("--generate requires a principal id"),
    )
}

/// Build a signed login URL for principal `id`.
fn generate_link(
    config: Arc<PassLinkConfig>,
    provider: &StaticPrincipalProvider<Account>,
    id: &str,
) -> Result<String> {
    let account = provider
        .find_by_id(id)
        .with_context(|| format!("unknown principal: {id}"))?;
    let generator = LinkGenerator::new(config, Arc::new(SystemClock));
    let link = generator.generate(&account, &LinkOptions::default())?;
    Ok(link.full_url)
}

/// Run the accept loop, serving connections until a shutdown signal is received.
async fn serve(
    listener: TcpListener,
    service: LoginHttpService<StaticPrincipalProvider<Account>, MemorySessionStore>,
) -> Result<()> {
    let graceful = hyper_util::server::graceful::GracefulShutdown::new();
    let http = HttpConnBuilder::new(TokioExecutor::new());

    let shutdown = async {
        tokio::signal::ctrl_c().await.ok();
        info!("received shutdown signal, draining connections");
    };

    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            result = listener.accept() => {
                let (stream, peer_addr) = match result {
                    Ok(conn) => conn,
                    Err(e) => {
                        warn!(error = %e, "failed to accept connection");
                        continue;
                    }
                };

                let svc = service.clone();
                let conn = http.serve_connection(TokioIo::new(stream), svc);
                let conn = graceful.watch(conn.into_owned());

                tokio::spawn(async move {
                    if let Err(e) = conn.await {
                        error!(peer_addr = %peer_addr, error = %e, "connection error");
                    }
                });
            }

            () = &mut shutdown => {
                info!("shutting down gracefully");
                break;
            }
        }
    }

    graceful.shutdown().await;
    info!("all connections drained, exiting");

    Ok(())
}

/// Probe the health endpoint of a running server.
async fn run_health_check(addr: &str) -> Result<()> {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpStream;

    let stream = TcpStream::connect(addr)
        .await
        .with_context(|| format!("cannot connect to {addr}"))?;

    let (mut reader, mut writer) = stream.into_split();

    let request = format!("GET {HEALTH_PATH} HTTP/1.1\r\nHost: {addr}\r\nConnection: close\r\n\r\n");
    writer.write_all(request.as_bytes()).await?;
    writer.shutdown().await?;

    let mut response = String::new();
    reader.read_to_string(&mut response).await?;

    if response.contains("200 OK") && response.contains("\"status\":\"running\"") {
        Ok(())
    } else {
        anyhow::bail!("unhealthy response from {addr}")
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();
    let config = PassLinkConfig::from_env().context("failed to load configuration")?;

    // Docker HEALTHCHECK.
    if args.iter().any(|a| a == "--health-check") {
        let addr = config.gateway_listen.replace("0.0.0.0", "127.0.0.1");
        let healthy = run_health_check(&addr).await.is_ok();
        std::process::exit(i32::from(!healthy));
    }

    let provider = load_provider(principals_path().as_deref())?;
    let config = Arc::new(config);

    if let Some(target) = generate_target(&args) {
        let url = generate_link(Arc::clone(&config), &provider, target?)?;
        println!("{url}");
        return Ok(());
    }

    init_tracing(&config.log_level)?;

    if provider.is_empty() {
        warn!("no principals loaded, every login link will be rejected");
    }

    info!(
        gateway_listen = %config.gateway_listen,
        route = %config.login_route_prefix(),
        ttl_minutes = config.default_ttl_minutes,
        principals = provider.len(),
        version = VERSION,
        "starting PassLink Server",
    );

    let addr: SocketAddr = config
        .gateway_listen
        .parse()
        .with_context(|| format!("invalid bind address: {}", config.gateway_listen))?;

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let service = LoginHttpService::new(
        Arc::clone(&config),
        Arc::new(provider),
        Arc::new(MemorySessionStore::with_clock(Arc::clone(&clock))),
        clock,
    );

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind to {addr}"))?;

    info!(%addr, "listening for connections");

    serve(listener, service).await
}
