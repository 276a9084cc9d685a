use std::{collections::HashMap, sync::Arc};

use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

pub const OPTIMIZATION_PATH: &str = "/api.v4/optimization_problem.php";
pub const GEOCODER_PATH: &str = "/api/geocoder.php";

/// Key accepted by [`app`].
pub const DEMO_API_KEY: &str = "11111111111111111111111111111111";

const STATE_INITIAL: u8 = 1;
const STATE_OPTIMIZED: u8 = 4;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Optimization {
    pub optimization_problem_id: String,
    pub state: u8,
    pub parameters: Map<String, Value>,
    pub addresses: Vec<Value>,
    pub routes: Vec<Route>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Route {
    pub route_id: String,
    pub optimization_problem_id: String,
    pub addresses: Vec<Value>,
}

#[derive(Deserialize)]
pub struct OptimizationInput {
    #[serde(default)]
    pub parameters: Map<String, Value>,
    #[serde(default)]
    pub addresses: Vec<Value>,
}

/// Optimizations in creation order.
pub type Db = Arc<RwLock<Vec<Optimization>>>;

#[derive(Clone)]
struct AppState {
    db: Db,
    api_key: Arc<str>,
}

type Params = Query<HashMap<String, String>>;
type Failure = (StatusCode, Json<Value>);

pub fn app() -> Router {
    app_with_key(DEMO_API_KEY)
}

pub fn app_with_key(api_key: &str) -> Router {
    let state = AppState {
        db: Arc::new(RwLock::new(Vec::new())),
        api_key: Arc::from(api_key),
    };
    Router::new()
        .route(
            OPTIMIZATION_PATH,
            get(get_or_list)
                .post(create_optimization)
                .put(update_optimization)
                .delete(remove_optimization),
        )
        .route(GEOCODER_PATH, get(geocode))
        .with_state(state)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

async fn get_or_list(State(state): State<AppState>, Query(q): Params) -> Result<Json<Value>, Failure> {
    authorize(&state, &q)?;
    let db = state.db.read().await;

    if let Some(id) = q.get("optimization_problem_id") {
        let found = db.iter().find(|o| &o.optimization_problem_id == id).ok_or_else(not_found)?;
        return Ok(Json(to_json(found)));
    }

    let states = match q.get("state") {
        Some(raw) => Some(parse_states(raw)?),
        None => None,
    };
    let offset = parse_number(&q, "offset")?.unwrap_or(0);
    let limit = parse_number(&q, "limit")?.unwrap_or(usize::MAX);

    let matching: Vec<&Optimization> = db
        .iter()
        .filter(|o| states.as_ref().map_or(true, |states| states.contains(&o.state)))
        .collect();
    let page: Vec<Value> = matching.iter().skip(offset).take(limit).map(|o| to_json(o)).collect();

    Ok(Json(json!({
        "optimizations": page,
        "totalRecords": matching.len(),
    })))
}

async fn create_optimization(
    State(state): State<AppState>,
    Query(q): Params,
    Json(input): Json<OptimizationInput>,
) -> Result<Json<Value>, Failure> {
    authorize(&state, &q)?;
    let id = Uuid::new_v4().simple().to_string().to_uppercase();
    let mut optimization = Optimization {
        optimization_problem_id: id,
        state: STATE_INITIAL,
        parameters: input.parameters,
        addresses: input.addresses,
        routes: Vec::new(),
    };
    solve(&mut optimization);
    let body = to_json(&optimization);
    state.db.write().await.push(optimization);
    Ok(Json(body))
}

async fn update_optimization(
    State(state): State<AppState>,
    Query(q): Params,
    Json(input): Json<OptimizationInput>,
) -> Result<Json<Value>, Failure> {
    authorize(&state, &q)?;
    let id = q
        .get("optimization_problem_id")
        .ok_or_else(|| failure(StatusCode::BAD_REQUEST, "optimization_problem_id is required"))?;
    let mut db = state.db.write().await;
    let optimization = db
        .iter_mut()
        .find(|o| &o.optimization_problem_id == id)
        .ok_or_else(not_found)?;

    optimization.parameters.extend(input.parameters);
    if !input.addresses.is_empty() {
        optimization.addresses = input.addresses;
    }
    if q.get("reoptimize").map(String::as_str) == Some("1") {
        solve(optimization);
    }
    Ok(Json(to_json(optimization)))
}

async fn remove_optimization(State(state): State<AppState>, Query(q): Params) -> Result<Json<Value>, Failure> {
    authorize(&state, &q)?;
    let id = q
        .get("optimization_problem_id")
        .ok_or_else(|| failure(StatusCode::BAD_REQUEST, "optimization_problem_id is required"))?;
    let mut db = state.db.write().await;
    let before = db.len();
    db.retain(|o| &o.optimization_problem_id != id);
    if db.len() == before {
        return Err(not_found());
    }
    Ok(Json(json!({"status": true, "removed": before - db.len()})))
}

/// Answers `addresses=A||B||` with one `<destination>` per slot, empty slots
/// included, at made-up but deterministic coordinates.
async fn geocode(State(state): State<AppState>, Query(q): Params) -> Result<impl IntoResponse, Failure> {
    authorize(&state, &q)?;
    if q.get("format").map(String::as_str) != Some("xml") {
        return Err(failure(StatusCode::BAD_REQUEST, "only format=xml is supported"));
    }
    let addresses = q.get("addresses").map(String::as_str).unwrap_or_default();
    let mut xml = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<destinations>\n");
    for (i, address) in address_slots(addresses).into_iter().enumerate() {
        let step = i as f64 / 100.0;
        xml.push_str(&format!(
            "  <destination destination=\"{}\" lat=\"{:.6}\" lng=\"{:.6}\" type=\"street\"/>\n",
            escape_attribute(address),
            40.7 + step,
            -74.0 + step,
        ));
    }
    xml.push_str("</destinations>\n");
    Ok(([(header::CONTENT_TYPE, "application/xml; charset=utf-8")], xml))
}

/// Slots of a `||`-terminated address list. Only the final delimiter is a
/// terminator; empty slots before it are kept so positions line up.
fn address_slots(raw: &str) -> Vec<&str> {
    let raw = raw.strip_suffix("||").unwrap_or(raw);
    if raw.is_empty() {
        return Vec::new();
    }
    raw.split("||").collect()
}

/// Every address becomes a stop of a single route, in submission order.
fn solve(optimization: &mut Optimization) {
    if optimization.addresses.is_empty() {
        optimization.state = STATE_INITIAL;
        optimization.routes.clear();
        return;
    }
    optimization.state = STATE_OPTIMIZED;
    optimization.routes = vec![Route {
        route_id: Uuid::new_v4().simple().to_string().to_uppercase(),
        optimization_problem_id: optimization.optimization_problem_id.clone(),
        addresses: optimization.addresses.clone(),
    }];
}

fn authorize(state: &AppState, q: &HashMap<String, String>) -> Result<(), Failure> {
    match q.get("api_key") {
        Some(key) if key.as_str() == &*state.api_key => Ok(()),
        _ => Err(failure(StatusCode::UNAUTHORIZED, "Authentication failed")),
    }
}

fn parse_states(raw: &str) -> Result<Vec<u8>, Failure> {
    raw.split(',')
        .map(|code| {
            code.trim()
                .parse::<u8>()
                .map_err(|_| failure(StatusCode::BAD_REQUEST, "state must be a list of numeric codes"))
        })
        .collect()
}

fn parse_number(q: &HashMap<String, String>, key: &str) -> Result<Option<usize>, Failure> {
    q.get(key)
        .map(|raw| {
            raw.parse()
                .map_err(|_| failure(StatusCode::BAD_REQUEST, &format!("{key} must be a number")))
        })
        .transpose()
}

fn to_json(optimization: &Optimization) -> Value {
    serde_json::to_value(optimization).unwrap_or(Value::Null)
}

fn escape_attribute(raw: &str) -> String {
    raw.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn failure(status: StatusCode, message: &str) -> Failure {
    (status, Json(json!({"errors": [message]})))
}

fn not_found() -> Failure {
    failure(StatusCode::NOT_FOUND, "Optimization not found")
}
