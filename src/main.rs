use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use axum_prometheus::PrometheusMetricLayer;
use clap::{Args, Parser, Subcommand};
use metrics_exporter_prometheus::PrometheusHandle;
use priorauth_engine::config::AppConfig;
use priorauth_engine::engine::{
    engine_router, validator_for, DecisionEngine, KeywordEntityExtractor, PriorAuthRequest,
    SpecialtyValidator, StaticConfigStore, INTERNAL_MEDICINE, WEIGHT_LOSS,
};
use priorauth_engine::error::AppError;
use priorauth_engine::telemetry;
use serde_json::json;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::info;

type Engine = DecisionEngine<StaticConfigStore, KeywordEntityExtractor>;

#[derive(Clone)]
struct AppState {
    readiness: Arc<AtomicBool>,
    metrics: PrometheusHandle,
}

#[derive(Parser, Debug)]
#[command(
    name = "Prior-Auth Decision Engine",
    about = "Score prior-authorization requests for medical necessity",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Evaluate a single request from a JSON file and print the decision
    Evaluate(EvaluateArgs),
}

#[derive(Args, Debug, Default)]
struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    port: Option<u16>,
}

#[derive(Args, Debug)]
struct EvaluateArgs {
    /// Path to a JSON file holding a PriorAuthRequest
    #[arg(long)]
    input: PathBuf,
    /// Specialty code (e.g. INTERNAL_MEDICINE, WEIGHT_LOSS)
    #[arg(long, default_value = INTERNAL_MEDICINE)]
    specialty: String,
}

#[tokio::main]
async fn main() {
    if let Err(err) = run_cli().await {
        eprintln!("application error: {err}");
        std::process::exit(1);
    }
}

async fn run_cli() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => run_server(args).await,
        Command::Evaluate(args) => run_evaluate(args),
    }
}

fn build_engine(config: &AppConfig) -> Engine {
    let store = Arc::new(StaticConfigStore::new());
    for specialty in [INTERNAL_MEDICINE, WEIGHT_LOSS] {
        let validator = validator_for(specialty);
        store.insert_base(specialty, validator.default_config());
    }

    DecisionEngine::with_config_ttl(
        store,
        Arc::new(KeywordEntityExtractor),
        config.engine.config_cache_ttl,
    )
}

async fn run_server(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let engine = Arc::new(build_engine(&config));

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(AtomicBool::new(false));
    let state = AppState {
        readiness: readiness_flag.clone(),
        metrics: prometheus_handle,
    };

    let app = Router::new()
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
        .with_state(state)
        .merge(engine_router(engine))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "prior-auth decision engine ready");

    axum::serve(listener, app).await?;
    Ok(())
}

fn run_evaluate(args: EvaluateArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry).ok();

    let raw = std::fs::read_to_string(&args.input)?;
    let request: PriorAuthRequest = serde_json::from_str(&raw)?;

    let engine = build_engine(&config);
    let decision = engine.evaluate(&request, &args.specialty)?;

    println!("{}", serde_json::to_string_pretty(&decision)?);
    Ok(())
}

async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

async fn readiness_endpoint(State(state): State<AppState>) -> impl IntoResponse {
    if state.readiness.load(Ordering::Acquire) {
        (StatusCode::OK, Json(json!({ "status": "ready" })))
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, Json(json!({ "status": "starting" })))
    }
}

async fn metrics_endpoint(State(state): State<AppState>) -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}
