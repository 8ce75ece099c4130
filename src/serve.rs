//! Purpose: Provide the HTTP/JSON server for folio.
//! Exports: `ServeConfig`, `serve`.
//! Role: Thin axum layer translating verbs/paths into catalog calls.
//! Invariants: Handlers hold no business logic; error kinds map to stable
//! status codes and the JSON error envelope stays additive.
//! Invariants: Loopback-only unless explicitly allowed.

use axum::Json;
use axum::extract::{Path as AxumPath, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use serde::Serialize;
use serde_json::{Value, json};
use std::future::IntoFuture;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::time::Duration;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use folio::api::{Error, ErrorKind, LocalClient, Record};

#[derive(Clone, Debug)]
pub struct ServeConfig {
    pub bind: SocketAddr,
    pub data_dir: PathBuf,
    pub allow_non_loopback: bool,
}

#[derive(Clone)]
struct AppState {
    client: LocalClient,
}

pub async fn serve(config: ServeConfig) -> Result<(), Error> {
    validate_config(&config)?;

    init_tracing();

    let client = LocalClient::new().with_data_dir(&config.data_dir);
    client.init()?;
    let state = Arc::new(AppState { client });

    let app = axum::Router::new()
        .route("/healthz", get(healthz))
        .route("/authors", get(list_authors).post(create_author))
        .route(
            "/authors/:authorId",
            get(get_author).put(update_author).delete(delete_author),
        )
        .route("/books", get(list_books).post(create_book))
        .route(
            "/books/:bookId",
            get(get_book).put(update_book).delete(delete_book),
        )
        .route("/publishers", get(list_publishers).post(create_publisher))
        .route(
            "/publishers/:publisherId",
            get(get_publisher).put(update_publisher).delete(delete_publisher),
        )
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .map_err(|err| {
            Error::new(ErrorKind::Io)
                .with_message("failed to bind server")
                .with_source(err)
        })?;
    tracing::info!(bind = %config.bind, data_dir = %config.data_dir.display(), "serving catalog");

    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();
    let server = axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = shutdown_rx.await;
        })
        .into_future();
    tokio::pin!(server);

    tokio::select! {
        result = &mut server => {
            result.map_err(|err| {
                Error::new(ErrorKind::Io)
                    .with_message("server failed")
                    .with_source(err)
            })?;
        }
        _ = shutdown_signal() => {
            let _ = shutdown_tx.send(());
            match tokio::time::timeout(Duration::from_secs(10), &mut server).await {
                Ok(result) => result.map_err(|err| {
                    Error::new(ErrorKind::Io)
                        .with_message("server failed")
                        .with_source(err)
                })?,
                Err(_) => {
                    return Err(Error::new(ErrorKind::Io).with_message("server shutdown timed out"));
                }
            }
        }
    };
    Ok(())
}

fn is_loopback(ip: IpAddr) -> bool {
    match ip {
        IpAddr::V4(addr) => addr.is_loopback(),
        IpAddr::V6(addr) => addr.is_loopback(),
    }
}

fn validate_config(config: &ServeConfig) -> Result<(), Error> {
    if !is_loopback(config.bind.ip()) && !config.allow_non_loopback {
        return Err(Error::new(ErrorKind::Usage)
            .with_message("non-loopback bind requires explicit opt-in")
            .with_hint("Re-run with --allow-non-loopback or use a loopback address."));
    }
    Ok(())
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .try_init();
}

async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };
    #[cfg(unix)]
    let terminate = async {
        let mut signal = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("install SIGTERM handler");
        signal.recv().await;
    };
    #[cfg(unix)]
    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
    #[cfg(not(unix))]
    ctrl_c.await;
}

async fn healthz() -> Response {
    json_response(json!({ "ok": true }))
}

// Authors

async fn list_authors(State(state): State<Arc<AppState>>) -> Response {
    list_response(state.client.catalog().list_authors())
}

async fn get_author(
    State(state): State<Arc<AppState>>,
    AxumPath(author_id): AxumPath<String>,
) -> Response {
    record_response(state.client.catalog().get_author(&author_id))
}

async fn create_author(State(state): State<Arc<AppState>>, Json(payload): Json<Value>) -> Response {
    created_response(
        Record::from_value(payload).and_then(|record| state.client.catalog().create_author(record)),
    )
}

async fn update_author(
    State(state): State<Arc<AppState>>,
    AxumPath(author_id): AxumPath<String>,
    Json(payload): Json<Value>,
) -> Response {
    record_response(
        Record::from_value(payload)
            .and_then(|partial| state.client.catalog().update_author(&author_id, partial)),
    )
}

async fn delete_author(
    State(state): State<Arc<AppState>>,
    AxumPath(author_id): AxumPath<String>,
) -> Response {
    deleted_response(state.client.catalog().delete_author(&author_id), &author_id)
}

// Books

async fn list_books(State(state): State<Arc<AppState>>) -> Response {
    list_response(state.client.catalog().list_books())
}

async fn get_book(
    State(state): State<Arc<AppState>>,
    AxumPath(book_id): AxumPath<String>,
) -> Response {
    record_response(state.client.catalog().get_book(&book_id))
}

async fn create_book(State(state): State<Arc<AppState>>, Json(payload): Json<Value>) -> Response {
    created_response(
        Record::from_value(payload).and_then(|record| state.client.catalog().create_book(record)),
    )
}

async fn update_book(
    State(state): State<Arc<AppState>>,
    AxumPath(book_id): AxumPath<String>,
    Json(payload): Json<Value>,
) -> Response {
    record_response(
        Record::from_value(payload)
            .and_then(|partial| state.client.catalog().update_book(&book_id, partial)),
    )
}

async fn delete_book(
    State(state): State<Arc<AppState>>,
    AxumPath(book_id): AxumPath<String>,
) -> Response {
    deleted_response(state.client.catalog().delete_book(&book_id), &book_id)
}

// Publishers

async fn list_publishers(State(state): State<Arc<AppState>>) -> Response {
    list_response(state.client.catalog().list_publishers())
}

async fn get_publisher(
    State(state): State<Arc<AppState>>,
    AxumPath(publisher_id): AxumPath<String>,
) -> Response {
    record_response(state.client.catalog().get_publisher(&publisher_id))
}

async fn create_publisher(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<Value>,
) -> Response {
    created_response(
        Record::from_value(payload)
            .and_then(|record| state.client.catalog().create_publisher(record)),
    )
}

async fn update_publisher(
    State(state): State<Arc<AppState>>,
    AxumPath(publisher_id): AxumPath<String>,
    Json(payload): Json<Value>,
) -> Response {
    record_response(
        Record::from_value(payload)
            .and_then(|partial| state.client.catalog().update_publisher(&publisher_id, partial)),
    )
}

async fn delete_publisher(
    State(state): State<Arc<AppState>>,
    AxumPath(publisher_id): AxumPath<String>,
) -> Response {
    deleted_response(
        state.client.catalog().delete_publisher(&publisher_id),
        &publisher_id,
    )
}

// Response envelopes

#[derive(Debug, Serialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    kind: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    hint: Option<String>,
}

fn list_response(result: Result<Vec<Record>, Error>) -> Response {
    match result {
        Ok(records) => json_response(json!(records)),
        Err(err) => error_response(err),
    }
}

fn record_response(result: Result<Record, Error>) -> Response {
    match result {
        Ok(record) => json_response(record.into_value()),
        Err(err) => error_response(err),
    }
}

fn created_response(result: Result<Record, Error>) -> Response {
    match result {
        Ok(record) => (StatusCode::CREATED, Json(record.into_value())).into_response(),
        Err(err) => error_response(err),
    }
}

fn deleted_response(result: Result<(), Error>, id: &str) -> Response {
    match result {
        Ok(()) => json_response(json!({ "deleted": id })),
        Err(err) => error_response(err),
    }
}

fn json_response(payload: Value) -> Response {
    Json(payload).into_response()
}

fn status_for_kind(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::Usage | ErrorKind::Reference => StatusCode::BAD_REQUEST,
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::Conflict => StatusCode::CONFLICT,
        ErrorKind::Corrupt | ErrorKind::Io | ErrorKind::Internal => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

fn error_response(err: Error) -> Response {
    let body = ErrorEnvelope {
        error: ErrorBody {
            kind: format!("{:?}", err.kind()),
            message: err.message().unwrap_or("error").to_string(),
            id: err.id().map(str::to_string),
            hint: err.hint().map(str::to_string),
        },
    };
    (status_for_kind(err.kind()), Json(body)).into_response()
}
