/// Elocute Server - pronunciation analysis over a shared-directory engine
use anyhow::Context;
use axum::{
    http::{HeaderValue, Method},
    Router,
};
use clap::{Parser, Subcommand};
use elocute_core::Language;
use elocute_server::{api, config::ServerConfig, state::AppState};
use std::{
    net::SocketAddr,
    path::{Path, PathBuf},
};
use tokio_util::sync::CancellationToken;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::{DefaultMakeSpan, TraceLayer},
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "elocute-server")]
#[command(about = "Elocute pronunciation analysis server", long_about = None)]
struct Cli {
    /// Configuration file path (defaults to ./config.toml when present)
    #[arg(short, long, global = true, env = "ELOCUTE_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server
    Serve,
    /// Analyze one audio file and print the result as JSON
    Analyze {
        /// Audio file in any format the converter understands
        file: PathBuf,
        /// Language code (en, de, es, fr, jp, ru, zh)
        #[arg(short, long, default_value = "en")]
        lang: String,
        /// Sentence the speaker was asked to read
        #[arg(short, long)]
        text: Option<String>,
    },
    /// Run one orphan sweep over the shared directory and print the report
    Sweep,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "elocute_server=info,elocute_pipeline=info,tower_http=info".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = ServerConfig::load(cli.config.as_deref())?;
    config.validate()?;

    match cli.command {
        Commands::Serve => {
            serve(config).await?;
        }
        Commands::Analyze { file, lang, text } => {
            analyze_file(&config, &file, &lang, text.as_deref()).await?;
        }
        Commands::Sweep => {
            sweep(&config).await?;
        }
    }

    Ok(())
}

async fn serve(config: ServerConfig) -> anyhow::Result<()> {
    tracing::info!("Starting Elocute Server");
    tracing::info!("Host: {}", config.server.host);
    tracing::info!("Port: {}", config.server.port);
    tracing::info!("Shared root: {}", config.shared.root.display());

    let app_state = AppState::from_config(&config);

    // Fail fast on an unusable shared root; a missing converter only degrades
    app_state.pipeline.store().ensure_directories().await?;
    if let Err(e) = app_state.pipeline.transcoder().probe().await {
        tracing::warn!("{}; analysis requests will fail until it is installed", e);
    }

    let shutdown = CancellationToken::new();
    let sweeper = if config.sweeper.enabled {
        let handle = app_state
            .sweeper(&config)
            .spawn(config.sweeper.interval(), shutdown.clone());
        Some(handle)
    } else {
        None
    };

    let app = create_router(app_state, &config)?;

    let addr = SocketAddr::from((
        config.server.host.parse::<std::net::IpAddr>()?,
        config.server.port,
    ));

    tracing::info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    let signal = shutdown.clone();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Shutdown requested");
            signal.cancel();
        })
        .await?;

    shutdown.cancel();
    if let Some(handle) = sweeper {
        let _ = handle.await;
    }

    Ok(())
}

fn create_router(app_state: AppState, config: &ServerConfig) -> anyhow::Result<Router> {
    Ok(api::router(app_state)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::default().include_headers(true)),
        )
        .layer(cors_layer(&config.cors.allowed_origins)?))
}

fn cors_layer(origins: &[String]) -> anyhow::Result<CorsLayer> {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    if origins.iter().any(|o| o == "*") {
        return Ok(layer.allow_origin(Any));
    }

    let origins = origins
        .iter()
        .map(|o| {
            o.parse::<HeaderValue>()
                .with_context(|| format!("invalid CORS origin {:?}", o))
        })
        .collect::<anyhow::Result<Vec<_>>>()?;
    Ok(layer.allow_origin(origins))
}

async fn analyze_file(
    config: &ServerConfig,
    file: &Path,
    lang: &str,
    text: Option<&str>,
) -> anyhow::Result<()> {
    let language: Language = lang.parse()?;
    let audio = tokio::fs::read(file)
        .await
        .with_context(|| format!("reading {}", file.display()))?;

    let state = AppState::from_config(config);
    let result = state.pipeline.run(&audio, language, text).await?;

    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

async fn sweep(config: &ServerConfig) -> anyhow::Result<()> {
    let state = AppState::from_config(config);
    let report = state.sweeper(config).sweep_once().await?;

    println!("Scanned: {}", report.scanned);
    println!("Removed: {}", report.removed);
    Ok(())
}
