//! Servidor web Axum para a filtragem de links de entidades
//!
//! Rotas:
//! - `GET  /health`: estado do servidor e tamanho dos recursos carregados
//! - `POST /score`: score fundido e decisão para uma anotação
//! - `POST /similarity`: similaridades temporal e espacial de uma entidade
//! - `POST /sweep`: calibração completa sobre um conjunto enviado
//! - `GET  /ws`: a mesma calibração, com eventos de progresso em tempo real

use anyhow::Context;
use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use ned_core::{
    calibration::{Calibration, SweepEvent, SweepReport},
    config::{NedConfig, SweepGrid},
    dataset::{parse_dataset, parse_legacy_dataset, Document},
    engine::{score_link, EntitySignals, ScoredLink},
    fusion::FusionWeights,
    NedEngine, NedError, Similarity,
};
use serde::Deserialize;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// Estado compartilhado da aplicação
struct AppState {
    engine: NedEngine,
}

#[derive(Deserialize)]
struct ScoreRequest {
    confidence: f64,
    #[serde(default)]
    temporal: Similarity,
    #[serde(default)]
    spatial: Similarity,
    alpha: f64,
    beta: f64,
    gamma: f64,
    threshold: f64,
}

#[derive(Deserialize)]
struct SimilarityRequest {
    entity: String,
    year: i64,
    #[serde(default)]
    sentence: String,
}

/// Pedido de calibração, por HTTP ou pelo WebSocket
#[derive(Deserialize)]
struct SweepRequest {
    dataset: serde_json::Value,
    #[serde(default)]
    grid: Option<SweepGrid>,
    /// Recalcula as similaridades com os recursos do servidor antes de calibrar
    #[serde(default)]
    enrich: bool,
    /// O conjunto usa `-1` como marcador de similaridade ausente
    #[serde(default)]
    legacy: bool,
}

/// Erro de API convertido em `{"error": ...}`
struct ApiError(StatusCode, String);

impl From<NedError> for ApiError {
    fn from(e: NedError) -> Self {
        let status = match e {
            NedError::Io { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::BAD_REQUEST,
        };
        Self(status, e.to_string())
    }
}

impl From<tokio::task::JoinError> for ApiError {
    fn from(e: tokio::task::JoinError) -> Self {
        Self(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.0, Json(serde_json::json!({ "error": self.1 }))).into_response()
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = NedConfig::from_env();
    let engine = NedEngine::load(&config).context("falha ao carregar os recursos")?;
    let state = Arc::new(AppState { engine });

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/health", get(health_handler))
        .route("/score", post(score_handler))
        .route("/similarity", post(similarity_handler))
        .route("/sweep", post(sweep_handler))
        .route("/ws", get(ws_handler))
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()).layer(cors))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("não foi possível escutar em {}", config.bind_addr))?;
    info!("🚀 Servidor NED iniciado em http://{}", config.bind_addr);
    axum::serve(listener, app).await?;
    Ok(())
}

async fn health_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "temporal_signatures": state.engine.temporal.signatures(),
        "spatial_signatures": state.engine.spatial.signatures(),
    }))
}

/// Fusão de uma anotação isolada (sem acesso aos recursos)
async fn score_handler(Json(req): Json<ScoreRequest>) -> Result<Json<ScoredLink>, ApiError> {
    let weights = FusionWeights::new(req.alpha, req.beta, req.gamma)?;
    Ok(Json(score_link(
        req.confidence,
        req.temporal,
        req.spatial,
        &weights,
        req.threshold,
    )))
}

async fn similarity_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SimilarityRequest>,
) -> Result<Json<EntitySignals>, ApiError> {
    if req.entity.trim().is_empty() {
        return Err(ApiError(StatusCode::BAD_REQUEST, "Entidade vazia".into()));
    }
    Ok(Json(state.engine.signals(req.entity.trim(), req.year, &req.sentence)))
}

/// Documentos e grade de um pedido, já enriquecidos se solicitado
fn prepare(engine: &NedEngine, req: SweepRequest) -> Result<(Vec<Document>, SweepGrid), NedError> {
    let grid = req.grid.unwrap_or_default();
    grid.validate()?;
    let documents = if req.legacy {
        parse_legacy_dataset(req.dataset)?
    } else {
        parse_dataset(req.dataset)?
    };
    let documents = if req.enrich { engine.enrich(&documents) } else { documents };
    Ok((documents, grid))
}

/// Calibração via HTTP POST (sem streaming)
async fn sweep_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SweepRequest>,
) -> Result<Json<SweepReport>, ApiError> {
    let report = tokio::task::spawn_blocking(move || {
        let (documents, grid) = prepare(&state.engine, req)?;
        Calibration::new(&documents).sweep(&grid)
    })
    .await??;
    Ok(Json(report))
}

/// Upgrade HTTP → WebSocket
async fn ws_handler(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_websocket(socket, state))
}

/// Lógica do WebSocket: recebe um pedido de calibração e repassa cada evento
async fn handle_websocket(mut socket: WebSocket, state: Arc<AppState>) {
    info!("WebSocket conectado");

    while let Some(Ok(msg)) = socket.recv().await {
        match msg {
            Message::Text(text) => {
                let req = match serde_json::from_str::<SweepRequest>(&text) {
                    Ok(req) => req,
                    Err(e) => {
                        let event = SweepEvent::Error { message: e.to_string() };
                        if send_event(&mut socket, &event).await.is_err() {
                            return;
                        }
                        continue;
                    }
                };

                // A calibração é síncrona: roda em thread bloqueante e os eventos
                // passam do canal std para um canal tokio
                let (tx_std, rx_std) = std::sync::mpsc::channel::<SweepEvent>();
                let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel::<SweepEvent>();

                let state = Arc::clone(&state);
                let worker = tokio::task::spawn_blocking(move || match prepare(&state.engine, req) {
                    Ok((documents, grid)) => {
                        Calibration::new(&documents).sweep_streaming(&grid, tx_std);
                    }
                    Err(e) => {
                        let _ = tx_std.send(SweepEvent::Error { message: e.to_string() });
                    }
                });
                let forwarder = tokio::task::spawn_blocking(move || {
                    while let Ok(event) = rx_std.recv() {
                        if tx.send(event).is_err() {
                            break;
                        }
                    }
                });

                while let Some(event) = rx.recv().await {
                    if send_event(&mut socket, &event).await.is_err() {
                        warn!("Cliente desconectou durante a calibração");
                        return;
                    }
                }

                if let Err(e) = worker.await {
                    error!("Calibração interrompida: {}", e);
                }
                forwarder.await.ok();
            }
            Message::Close(_) => {
                info!("WebSocket desconectado");
                return;
            }
            Message::Ping(payload) => {
                let _ = socket.send(Message::Pong(payload)).await;
            }
            _ => {}
        }
    }
}

async fn send_event(socket: &mut WebSocket, event: &SweepEvent) -> Result<(), axum::Error> {
    match serde_json::to_string(event) {
        Ok(json) => socket.send(Message::Text(json)).await,
        Err(e) => {
            error!("Falha ao serializar evento: {}", e);
            Ok(())
        }
    }
}
