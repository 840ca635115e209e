//! Faultline API Server
//!
//! This is the main entry point for the REST API server. It serves
//! access-filtered issue search over grouped error events:
//! - Organizations, teams, projects, and memberships
//! - Events grouped into issues by fingerprint
//! - Search by affected user email, gated by team access
//! - RESTful API with OpenAPI documentation
//!
//! # Usage
//!
//! ```bash
//! # Start with default settings (0.0.0.0:8080)
//! cargo run
//!
//! # Start on custom host and port
//! cargo run -- --host 127.0.0.1 --port 9090
//!
//! # Start with demo data and a printed session token
//! cargo run -- --demo
//!
//! # Enable debug logging
//! RUST_LOG=debug cargo run
//! ```
//!
//! # Environment Variables
//!
//! - `RUST_LOG`: Logging level (trace, debug, info, warn, error)
//! - `FAULTLINE_HOST`: Server host (default: 0.0.0.0)
//! - `FAULTLINE_PORT`: Server port (default: 8080)
//! - `FAULTLINE_JSON_LOGS`: Enable JSON logging format

use anyhow::Result;
use clap::Parser;
use faultline_api_server::{server::ServerBuilder, state::AppState};
use faultline_core::{EventPayload, EventStore};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Faultline API Server
#[derive(Parser, Debug)]
#[command(
    name = "faultline-server",
    version,
    about = "REST API server for access-filtered issue search",
    long_about = None
)]
struct Args {
    /// Host to bind to
    #[arg(
        short = 'H',
        long,
        default_value = "0.0.0.0",
        env = "FAULTLINE_HOST"
    )]
    host: String,

    /// Port to listen on
    #[arg(
        short = 'p',
        long,
        default_value = "8080",
        env = "FAULTLINE_PORT"
    )]
    port: u16,

    /// Seed demo data and log a ready-to-use session token
    #[arg(long)]
    demo: bool,

    /// Enable JSON logging format
    #[arg(long, env = "FAULTLINE_JSON_LOGS")]
    json_logs: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(
        short = 'l',
        long,
        default_value = "info",
        env = "RUST_LOG"
    )]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Initialize tracing/logging
    init_tracing(&args)?;

    info!("Starting Faultline API server");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    // Initialize application state
    info!("Initializing application state...");
    let state = AppState::new();
    info!("Application state initialized");

    if args.demo {
        let token = seed_demo_data(&state).await?;
        info!("Demo data seeded");
        info!("Demo session token: {}", token);
        info!(
            "Try: curl -H 'Authorization: Bearer {}' \
             'http://{}:{}/api/v1/organizations/acme/issues/search?email=customer@example.com'",
            token, args.host, args.port
        );
    }

    // Build and start server
    let server = ServerBuilder::new()
        .host(&args.host)
        .port(args.port)
        .state(state)
        .build()?;

    info!("API documentation: http://{}:{}/api-docs/", args.host, args.port);
    info!("Health check: http://{}:{}/health", args.host, args.port);
    info!("Metrics: http://{}:{}/metrics", args.host, args.port);
    info!("Press Ctrl+C to shutdown gracefully");

    // Run the server
    if let Err(e) = server.run().await {
        error!("Server error: {:#}", e);
        std::process::exit(1);
    }

    info!("Server shutdown complete");
    Ok(())
}

/// Seed a small demo dataset and return a session token for its member
async fn seed_demo_data(state: &AppState) -> Result<String> {
    let org = state
        .directory
        .create_organization("acme", "Acme", false)?;
    let team = state.directory.create_team(org.id, "backend")?;
    let api = state
        .directory
        .create_project(org.id, "api", "API", &[team.id])?;
    let worker = state
        .directory
        .create_project(org.id, "worker", "Worker", &[team.id])?;

    let user = state.directory.create_user("demo@faultline.dev", "demo");
    let member = state.directory.create_member(org.id, user.id)?;
    state.directory.add_member_team(member.id, team.id, true)?;

    let payloads = [
        (
            api.id,
            EventPayload::new(["db", "connection-reset"])
                .with_message("connection reset by peer")
                .with_user_email("customer@example.com"),
        ),
        (
            api.id,
            EventPayload::new(["db", "connection-reset"])
                .with_message("connection reset by peer")
                .with_user_email("customer@example.com"),
        ),
        (
            worker.id,
            EventPayload::new(["queue", "timeout"])
                .with_message("job timed out after 30s")
                .with_user_email("customer@example.com"),
        ),
    ];

    for (project_id, payload) in payloads {
        state.events.store_event(project_id, payload).await?;
    }

    Ok(state.sessions.issue(user.id))
}

/// Initialize tracing/logging subsystem
fn init_tracing(args: &Args) -> Result<()> {
    let log_level = args.log_level.parse::<tracing::Level>().unwrap_or_else(|_| {
        eprintln!("Invalid log level '{}', using 'info'", args.log_level);
        tracing::Level::INFO
    });

    let default_filter = format!(
        "faultline_api_server={},faultline_search={},faultline_core={},tower_http={}",
        log_level,
        log_level,
        log_level,
        if log_level >= tracing::Level::DEBUG {
            "debug"
        } else {
            "info"
        }
    );

    if args.json_logs {
        // JSON structured logging for production
        let subscriber = tracing_subscriber::registry()
            .with(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| default_filter.into()),
            )
            .with(tracing_subscriber::fmt::layer().json());

        subscriber.init();
    } else {
        // Human-readable logging for development
        let subscriber = tracing_subscriber::registry()
            .with(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| default_filter.into()),
            )
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_thread_names(false)
                    .with_file(true)
                    .with_line_number(true),
            );

        subscriber.init();
    }

    Ok(())
}
