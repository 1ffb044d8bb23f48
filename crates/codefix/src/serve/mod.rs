use crate::prelude::{eprintln, *};
use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use codefix_core::codegen::{BugfixRequest, PostProcess};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tower_http::cors::{Any, CorsLayer};

use crate::gen::ModelOptions;

#[derive(Debug, clap::Parser)]
#[command(name = "serve")]
#[command(about = "HTTP server exposing the generation endpoints")]
pub struct App {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, clap::Subcommand)]
pub enum Commands {
    /// Start the HTTP server
    #[clap(name = "http")]
    Http(HttpOptions),
}

#[derive(Debug, clap::Args)]
pub struct HttpOptions {
    /// Port to listen on
    #[arg(short, long, env = "CODEFIX_PORT", default_value = "5000")]
    port: u16,

    /// Host to bind to
    #[arg(long, env = "CODEFIX_HOST", default_value = "0.0.0.0")]
    host: String,

    /// Model name for code completion
    #[clap(long, env = "CODEFIX_COMPLETION_MODEL", default_value = "codegen-350m")]
    completion_model: String,

    /// Model name for bugfix rewriting
    #[clap(long, env = "CODEFIX_BUGFIX_MODEL", default_value = "codet5p-bugfix")]
    bugfix_model: String,

    #[clap(flatten)]
    model_options: ModelOptions,
}

/// Shared, immutable request-handling state.
pub struct ServeState {
    completion_model: String,
    bugfix_model: String,
    model_options: ModelOptions,
    policy: PostProcess,
    verbose: bool,
}

#[derive(Debug, Deserialize)]
struct GenerateRequest {
    /// Source code payload; a missing field is treated as empty input.
    #[serde(default)]
    code: String,
}

#[derive(Debug, Serialize)]
struct GenerateResponse {
    result: String,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: String,
    upstream: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    upstream_version: Option<String>,
    models: Vec<String>,
}

pub async fn run(app: App, global: crate::Global) -> Result<()> {
    match app.command {
        Commands::Http(options) => run_http(options, global).await,
    }
}

async fn run_http(options: HttpOptions, global: crate::Global) -> Result<()> {
    if global.verbose {
        eprintln!(
            "Starting codefix server on {}:{}...",
            options.host, options.port
        );
    }

    let addr = format!("{}:{}", options.host, options.port);

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let policy = options.model_options.post_process.clone().into();
    let state = Arc::new(ServeState {
        completion_model: options.completion_model,
        bugfix_model: options.bugfix_model,
        model_options: options.model_options,
        policy,
        verbose: global.verbose,
    });

    let app_router = Router::new()
        .route("/completion", post(completion_handler))
        .route("/debugging", post(debugging_handler))
        .route("/health", get(health_handler))
        .layer(cors)
        .with_state(state);

    if global.verbose {
        eprintln!("codefix server listening on http://{}", addr);
        eprintln!("Completion endpoint: http://{}/completion", addr);
        eprintln!("Debugging endpoint: http://{}/debugging", addr);
        eprintln!("Health endpoint: http://{}/health", addr);
    }

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| eyre!("Failed to bind to {}: {}", addr, e))?;

    axum::serve(listener, app_router)
        .await
        .map_err(|e| eyre!("Server error: {e}"))?;

    Ok(())
}

async fn completion_handler(
    State(state): State<Arc<ServeState>>,
    Json(request): Json<GenerateRequest>,
) -> Result<Json<GenerateResponse>, (StatusCode, Json<ErrorResponse>)> {
    let start = Instant::now();

    if state.verbose {
        eprintln!("POST /completion ({} chars)", request.code.len());
    }

    let result = crate::gen::complete_code_data(
        &request.code,
        &state.completion_model,
        &state.model_options,
        state.policy,
    )
    .await
    .map_err(|e| internal_error(Error::Generation(e.to_string())))?;

    if state.verbose {
        eprintln!("Completion generated in {:?}", start.elapsed());
    }

    Ok(Json(GenerateResponse { result }))
}

async fn debugging_handler(
    State(state): State<Arc<ServeState>>,
    Json(request): Json<GenerateRequest>,
) -> Result<Json<GenerateResponse>, (StatusCode, Json<ErrorResponse>)> {
    let start = Instant::now();

    if state.verbose {
        eprintln!("POST /debugging ({} chars)", request.code.len());
    }

    let bugfix_request = BugfixRequest {
        code: request.code,
        context: None,
        files: vec![],
    };

    let result = crate::gen::fix_code_data(
        &bugfix_request,
        &state.bugfix_model,
        &state.model_options,
        state.policy,
    )
    .await
    .map_err(|e| internal_error(Error::Generation(e.to_string())))?;

    if state.verbose {
        eprintln!("Bugfix generated in {:?}", start.elapsed());
    }

    Ok(Json(GenerateResponse { result }))
}

async fn health_handler(State(state): State<Arc<ServeState>>) -> Json<HealthResponse> {
    let client = reqwest::Client::new();
    let base = &state.model_options.ollama_url;

    let (version, models) = futures::join!(
        fetch_upstream_version(&client, base),
        fetch_upstream_models(&client, base)
    );

    let upstream = match &version {
        Ok(_) => "reachable",
        Err(err) => {
            if state.verbose {
                eprintln!("Upstream probe failed: {}", err);
            }
            "unreachable"
        }
    };

    Json(HealthResponse {
        status: "ok".to_string(),
        upstream: upstream.to_string(),
        upstream_version: version.ok(),
        models: models.unwrap_or_default(),
    })
}

fn internal_error(err: Error) -> (StatusCode, Json<ErrorResponse>) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse {
            error: err.to_string(),
        }),
    )
}

async fn fetch_upstream_version(client: &reqwest::Client, base: &str) -> Result<String, Error> {
    #[derive(Deserialize)]
    struct VersionResponse {
        version: String,
    }

    let url = format!("{base}/api/version");
    let response = client
        .get(&url)
        .send()
        .await
        .map_err(|e| Error::Network(e.to_string()))?;

    if !response.status().is_success() {
        return Err(Error::Network(format!("HTTP {}", response.status())));
    }

    let version: VersionResponse = response
        .json()
        .await
        .map_err(|e| Error::Network(e.to_string()))?;

    Ok(version.version)
}

async fn fetch_upstream_models(client: &reqwest::Client, base: &str) -> Result<Vec<String>, Error> {
    #[derive(Deserialize)]
    struct TagsResponse {
        models: Vec<ModelTag>,
    }

    #[derive(Deserialize)]
    struct ModelTag {
        name: String,
    }

    let url = format!("{base}/api/tags");
    let response = client
        .get(&url)
        .send()
        .await
        .map_err(|e| Error::Network(e.to_string()))?;

    if !response.status().is_success() {
        return Err(Error::Network(format!("HTTP {}", response.status())));
    }

    let tags: TagsResponse = response
        .json()
        .await
        .map_err(|e| Error::Network(e.to_string()))?;

    Ok(tags.models.into_iter().map(|m| m.name).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_request_missing_code_defaults_to_empty() {
        let request: GenerateRequest = serde_json::from_str("{}").unwrap();
        assert_eq!(request.code, "");
    }

    #[test]
    fn test_generate_request_reads_code_field() {
        let request: GenerateRequest =
            serde_json::from_str(r#"{"code": "int f() {"}"#).unwrap();
        assert_eq!(request.code, "int f() {");
    }

    #[test]
    fn test_generate_request_ignores_unknown_fields() {
        let request: GenerateRequest =
            serde_json::from_str(r#"{"code": "x", "language": "c"}"#).unwrap();
        assert_eq!(request.code, "x");
    }

    #[test]
    fn test_health_response_shape() {
        let health = HealthResponse {
            status: "ok".to_string(),
            upstream: "unreachable".to_string(),
            upstream_version: None,
            models: vec![],
        };

        let json = serde_json::to_value(&health).unwrap();
        assert_eq!(json["status"], "ok");
        assert_eq!(json["upstream"], "unreachable");
        assert!(json.get("upstream_version").is_none());
    }

    #[test]
    fn test_error_response_shape() {
        let (status, Json(body)) = internal_error(Error::Generation("boom".to_string()));
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body.error, "Generation failed: boom");
    }
}
