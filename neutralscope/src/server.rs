use std::sync::Arc;

use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use common::{Config, RelayMode};
use rocket::fairing::{Fairing, Info, Kind};
use rocket::fs::{relative, FileServer};
use rocket::http::{Header, Status};
use rocket::request::Request;
use rocket::response::Redirect;
use rocket::serde::json::Json;
use rocket::{catch, catchers, get, options, routes, Build, Response, Rocket, State};
use serde::Serialize;
use serde_json::Value;

use crate::error::{ErrorBody, RelayError};
use crate::relay::Relay;

/// Application state stored inside Rocket managed state.
#[derive(Clone)]
pub struct AppState {
    pub started_at: DateTime<Utc>,
    pub config: Arc<Config>,
    pub relay: Arc<Relay>,
}

impl AppState {
    pub fn new(config: Arc<Config>, relay: Arc<Relay>) -> Self {
        Self {
            started_at: Utc::now(),
            config,
            relay,
        }
    }
}

/// Response structure for `/api/v1/status`.
#[derive(Serialize)]
struct StatusResponse {
    status: &'static str,
    uptime_seconds: i64,
    model: String,
    neutral_mode: RelayMode,
    strict_validation: bool,
}

/// Redirect root to static index.html
#[get("/")]
async fn index_redirect() -> Redirect {
    Redirect::to("/static/index.html")
}

#[get("/health")]
async fn health() -> &'static str {
    "OK"
}

/// Status endpoint returning uptime and the relay settings in effect.
#[get("/api/v1/status")]
async fn status(state: &State<AppState>) -> Json<StatusResponse> {
    let uptime = (Utc::now() - state.started_at).num_seconds();

    Json(StatusResponse {
        status: "ok",
        uptime_seconds: uptime,
        model: state.relay.model().to_string(),
        neutral_mode: state.config.relay.neutral_mode,
        strict_validation: state.config.relay.strict_validation,
    })
}

/// Outcome probabilities for a topic.
#[get("/api/predict?<q>")]
async fn predict(state: &State<AppState>, q: Option<String>) -> Result<Json<Value>, RelayError> {
    state.relay.run(q.as_deref(), RelayMode::Predict).await.map(Json)
}

/// Least-biased article(s) for a topic, in the configured neutral mode.
#[get("/api/neutral?<q>")]
async fn neutral(state: &State<AppState>, q: Option<String>) -> Result<Json<Value>, RelayError> {
    let mode = state.config.relay.neutral_mode;
    state.relay.run(q.as_deref(), mode).await.map(Json)
}

#[get("/api/neutral/pick?<q>")]
async fn neutral_pick(state: &State<AppState>, q: Option<String>) -> Result<Json<Value>, RelayError> {
    state.relay.run(q.as_deref(), RelayMode::NeutralPick).await.map(Json)
}

#[get("/api/neutral/top3?<q>")]
async fn neutral_top3(state: &State<AppState>, q: Option<String>) -> Result<Json<Value>, RelayError> {
    state.relay.run(q.as_deref(), RelayMode::NeutralTop3).await.map(Json)
}

/// CORS preflight for any path
#[options("/<_..>")]
async fn preflight() -> Status {
    Status::NoContent
}

#[catch(404)]
fn not_found() -> Json<ErrorBody> {
    Json(ErrorBody::new("Not found."))
}

#[catch(default)]
fn default_catcher(status: Status, _req: &Request<'_>) -> (Status, Json<ErrorBody>) {
    let message = if status.code >= 500 {
        "Internal server error."
    } else {
        status.reason().unwrap_or("Request failed.")
    };
    (status, Json(ErrorBody::new(message)))
}

/// Allows browser pages from any origin to call the API.
pub struct Cors;

#[rocket::async_trait]
impl Fairing for Cors {
    fn info(&self) -> Info {
        Info {
            name: "CORS headers",
            kind: Kind::Response,
        }
    }

    async fn on_response<'r>(&self, _req: &'r Request<'_>, res: &mut Response<'r>) {
        res.set_header(Header::new("Access-Control-Allow-Origin", "*"));
        res.set_header(Header::new("Access-Control-Allow-Methods", "GET, OPTIONS"));
        res.set_header(Header::new("Access-Control-Allow-Headers", "Content-Type"));
    }
}

/// Assemble the Rocket instance: managed state, API routes, UI files, CORS and catchers.
/// Address and port come from `config.server`.
pub fn build_rocket(state: AppState) -> Rocket<Build> {
    let server = &state.config.server;
    let figment = rocket::Config::figment()
        .merge(("address", server.address.clone()))
        .merge(("port", server.port));

    let static_dir = server
        .static_dir
        .clone()
        .unwrap_or_else(|| relative!("static").to_string());

    rocket::custom(figment)
        .manage(state)
        .attach(Cors)
        .mount(
            "/",
            routes![
                index_redirect,
                health,
                status,
                predict,
                neutral,
                neutral_pick,
                neutral_top3,
                preflight,
            ],
        )
        .mount("/static", FileServer::from(static_dir))
        .register("/", catchers![not_found, default_catcher])
}

/// Launch the HTTP server.
///
/// This function blocks until the Rocket server shuts down (it awaits `rocket.launch().await`)
pub async fn launch_rocket(state: AppState) -> Result<()> {
    tracing::info!(
        address = %state.config.server.address,
        port = state.config.server.port,
        "Starting Rocket HTTP server"
    );
    build_rocket(state)
        .launch()
        .await
        .map_err(|e| anyhow!("Rocket failed: {}", e))?;

    tracing::info!("Rocket HTTP server has shut down");
    Ok(())
}
