use anyhow::Result;
use axum::http::{header, HeaderValue, Method};
use clap::Parser;
use dotenv::dotenv;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use medtrack::auth::session::SessionStore;
use medtrack::config::{validate_application_settings, validate_smtp_settings, Settings};
use medtrack::frontend::routes::RouteResolver;
use medtrack::mailer::Mailer;
use medtrack::metrics::{self, Metrics};
use medtrack::store::{seed_demo_data, Storage};
use medtrack::web::{create_router, AppState};

#[derive(Parser)]
struct Args {
    /// Load demo accounts (one patient, one doctor) before starting
    #[arg(long)]
    seed: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();

    // Parse command-line arguments
    let args = Args::parse();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let settings = Settings::new().unwrap_or_else(|e| {
        error!("Failed to load configuration: {:?}", e);
        std::process::exit(1);
    });

    info!("Loaded settings: {:?}", settings);

    if let Err(e) = validate_application_settings(&settings) {
        error!("Invalid application settings: {}", e);
        std::process::exit(1);
    }
    if let Err(e) = validate_smtp_settings(&settings) {
        error!("Invalid SMTP settings: {}", e);
        std::process::exit(1);
    }

    // Set up metrics
    let prometheus_handle = metrics::setup_metrics_recorder();
    let app_metrics = Metrics::new(prometheus_handle.clone());

    info!("Prometheus metrics initialized");

    // Initialize in-memory storage
    let storage = Storage::new();
    if args.seed {
        seed_demo_data(&storage)?;
        info!("Demo accounts loaded");
    }

    let sessions = SessionStore::new(settings.session.cookie_name.clone());
    let mailer = Mailer::from_settings(&settings)?;

    let state = Arc::new(AppState {
        storage,
        sessions,
        resolver: RouteResolver::new(),
        mailer,
        metrics: app_metrics,
    });

    let cors = CorsLayer::new()
        .allow_origin(settings.application.cors_allow_origin.parse::<HeaderValue>().unwrap_or_else(|_| {
            HeaderValue::from_static("*")
        }))
        .allow_methods(
            settings.application.cors_allow_methods
                .split(',')
                .map(|s| s.trim().parse::<Method>().unwrap_or(Method::GET))
                .collect::<Vec<Method>>()
        )
        .allow_headers(
            settings.application.cors_allow_headers
                .split(',')
                .map(|s| match s.trim().to_lowercase().as_str() {
                    "content-type" => header::CONTENT_TYPE,
                    "authorization" => header::AUTHORIZATION,
                    _ => header::HeaderName::from_lowercase(s.trim().to_lowercase().as_bytes()).unwrap_or(header::CONTENT_TYPE),
                })
                .collect::<Vec<_>>()
        );

    // Assemble the page router plus the Prometheus exposition endpoint
    let app = create_router(state)
        .route("/metrics", axum::routing::get(move || async move {
            let metrics = prometheus_handle.render();
            (
                [(axum::http::header::CONTENT_TYPE, "text/plain; version=0.0.4")],
                metrics,
            )
        }))
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    info!("Successfully initialized page router");

    // Start the HTTP server
    let addr = SocketAddr::from((
        settings.application.host.parse::<std::net::IpAddr>().unwrap_or_else(|_| "0.0.0.0".parse().unwrap()),
        settings.application.port
    ));
    info!("listening on {}", addr);

    let listener = TcpListener::bind(addr).await?;
    info!("Successfully bound to address: {}", addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("shutdown signal received");
}
