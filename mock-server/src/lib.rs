use std::{
    collections::{BTreeMap, BTreeSet, HashMap},
    sync::Arc,
};

use axum::{
    body::Bytes,
    extract::{Path, Request, State},
    http::{header, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Map, Value};
use tokio::{net::TcpListener, sync::RwLock};
use tracing::{debug, info, warn};
use uuid::Uuid;

pub const API_PREFIX: &str = "/api/as/v1";

const SCHEMA_TYPES: [&str; 4] = ["text", "number", "date", "geolocation"];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EngineKind {
    Default,
    Meta,
}

impl EngineKind {
    fn as_str(self) -> &'static str {
        match self {
            EngineKind::Default => "default",
            EngineKind::Meta => "meta",
        }
    }
}

#[derive(Clone, Debug)]
pub struct Engine {
    pub name: String,
    pub kind: EngineKind,
    pub language: Option<String>,
    pub source_engines: Vec<String>,
    pub documents: BTreeMap<String, Value>,
    pub schema: Map<String, Value>,
    pub synonym_sets: BTreeMap<String, Vec<String>>,
    pub search_settings: Option<Value>,
    pub api_logs: Vec<Value>,
    pub clicks: Vec<Value>,
}

impl Engine {
    fn new(name: String, kind: EngineKind) -> Self {
        Self {
            name,
            kind,
            language: None,
            source_engines: Vec::new(),
            documents: BTreeMap::new(),
            schema: Map::new(),
            synonym_sets: BTreeMap::new(),
            search_settings: None,
            api_logs: Vec::new(),
            clicks: Vec::new(),
        }
    }

    fn describe(&self, engines: &HashMap<String, Engine>) -> Value {
        let document_count = documents_of(engines, self).len();
        match self.kind {
            EngineKind::Default => json!({
                "name": self.name,
                "type": self.kind.as_str(),
                "language": self.language,
                "document_count": document_count,
            }),
            EngineKind::Meta => json!({
                "name": self.name,
                "type": self.kind.as_str(),
                "source_engines": self.source_engines,
                "document_count": document_count,
            }),
        }
    }

    /// Every text field gets weight 1 until settings are replaced.
    fn default_search_settings(&self) -> Value {
        let search_fields: Map<String, Value> = self
            .schema
            .iter()
            .filter(|(_, kind)| kind.as_str() == Some("text"))
            .map(|(field, _)| (field.clone(), json!({"weight": 1})))
            .collect();
        json!({"search_fields": search_fields, "boosts": {}, "result_fields": {}})
    }

    fn log_request(&mut self, endpoint: &str, body: &Value) {
        self.api_logs.push(json!({
            "request_id": Uuid::new_v4().to_string(),
            "full_request_path": format!("{API_PREFIX}/engines/{}/{endpoint}", self.name),
            "http_method": "GET",
            "status": 200,
            "request_body": body,
        }));
    }
}

pub struct AppState {
    api_key: String,
    engines: RwLock<HashMap<String, Engine>>,
}

pub type SharedState = Arc<AppState>;

/// Error response in the service's `{"errors": [..]}` shape.
#[derive(Debug)]
pub struct ApiFailure(StatusCode, Vec<String>);

impl ApiFailure {
    fn bad_request(message: impl Into<String>) -> Self {
        Self(StatusCode::BAD_REQUEST, vec![message.into()])
    }

    fn not_found(message: impl Into<String>) -> Self {
        Self(StatusCode::NOT_FOUND, vec![message.into()])
    }
}

impl IntoResponse for ApiFailure {
    fn into_response(self) -> Response {
        (self.0, Json(json!({ "errors": self.1 }))).into_response()
    }
}

type HandlerResult<T = Json<Value>> = Result<T, ApiFailure>;

pub fn app(api_key: &str) -> Router {
    let state: SharedState = Arc::new(AppState {
        api_key: api_key.to_string(),
        engines: RwLock::new(HashMap::new()),
    });
    let api = Router::new()
        .route("/engines", get(list_engines).post(create_engine))
        .route("/engines/{engine}", get(get_engine).delete(destroy_engine))
        .route(
            "/engines/{engine}/documents",
            get(get_documents)
                .post(index_documents)
                .patch(update_documents)
                .delete(destroy_documents),
        )
        .route("/engines/{engine}/documents/list", get(list_documents))
        .route("/engines/{engine}/schema", get(get_schema).post(update_schema))
        .route(
            "/engines/{engine}/synonyms",
            get(list_synonym_sets).post(create_synonym_set),
        )
        .route(
            "/engines/{engine}/synonyms/{id}",
            get(get_synonym_set)
                .put(update_synonym_set)
                .delete(destroy_synonym_set),
        )
        .route("/engines/{engine}/search", get(search))
        .route("/engines/{engine}/multi_search", get(multi_search))
        .route("/engines/{engine}/query_suggestion", get(query_suggestion))
        .route("/engines/{engine}/click", post(click))
        .route(
            "/engines/{engine}/source_engines",
            post(add_source_engines).delete(remove_source_engines),
        )
        .route(
            "/engines/{engine}/search_settings",
            get(get_search_settings).put(update_search_settings),
        )
        .route(
            "/engines/{engine}/search_settings/reset",
            post(reset_search_settings),
        )
        .route("/engines/{engine}/logs/api", get(get_api_logs))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_api_key))
        .with_state(state);
    Router::new().nest(API_PREFIX, api)
}

pub async fn run(listener: TcpListener, api_key: &str) -> Result<(), std::io::Error> {
    axum::serve(listener, app(api_key)).await
}

async fn require_api_key(State(state): State<SharedState>, request: Request, next: Next) -> Response {
    let expected = format!("Bearer {}", state.api_key);
    let presented = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok());
    if presented != Some(expected.as_str()) {
        warn!(path = %request.uri().path(), "rejected request with invalid api key");
        return ApiFailure(StatusCode::UNAUTHORIZED, vec!["Invalid credentials".to_string()])
            .into_response();
    }
    next.run(request).await
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// GET and DELETE bodies are optional; an empty body reads as `null`.
fn parse_body(body: &Bytes) -> HandlerResult<Value> {
    if body.is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_slice(body).map_err(|e| ApiFailure::bad_request(format!("Invalid JSON: {e}")))
}

fn string_list(value: &Value, what: &str) -> HandlerResult<Vec<String>> {
    value
        .as_array()
        .and_then(|items| {
            items
                .iter()
                .map(|item| item.as_str().map(str::to_string))
                .collect::<Option<Vec<_>>>()
        })
        .ok_or_else(|| ApiFailure::bad_request(format!("{what} must be an array of strings")))
}

fn find_engine<'a>(engines: &'a HashMap<String, Engine>, name: &str) -> HandlerResult<&'a Engine> {
    engines
        .get(name)
        .ok_or_else(|| ApiFailure::not_found(format!("Could not find engine {name}.")))
}

fn find_engine_mut<'a>(
    engines: &'a mut HashMap<String, Engine>,
    name: &str,
) -> HandlerResult<&'a mut Engine> {
    engines
        .get_mut(name)
        .ok_or_else(|| ApiFailure::not_found(format!("Could not find engine {name}.")))
}

/// Documents visible through an engine: its own, or the union of its
/// sources for a meta engine.
fn documents_of(engines: &HashMap<String, Engine>, engine: &Engine) -> Vec<Value> {
    match engine.kind {
        EngineKind::Default => engine.documents.values().cloned().collect(),
        EngineKind::Meta => engine
            .source_engines
            .iter()
            .filter_map(|source| engines.get(source))
            .flat_map(|source| source.documents.values().cloned())
            .collect(),
    }
}

fn page_params(options: &Value) -> (usize, usize) {
    let page = options.get("page");
    let read = |key: &str, default: u64| {
        page.and_then(|p| p.get(key))
            .and_then(Value::as_u64)
            .unwrap_or(default)
            .max(1) as usize
    };
    (read("current", 1), read("size", 20))
}

fn paginate(items: Vec<Value>, options: &Value) -> Value {
    let (current, size) = page_params(options);
    let total_results = items.len();
    let results: Vec<Value> = items
        .into_iter()
        .skip((current - 1) * size)
        .take(size)
        .collect();
    json!({
        "meta": {
            "page": {
                "current": current,
                "size": size,
                "total_pages": total_results.div_ceil(size),
                "total_results": total_results,
            }
        },
        "results": results,
    })
}

fn is_valid_field_name(name: &str) -> bool {
    !name.is_empty()
        && !name.starts_with('_')
        && name
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
}

fn document_id(document: &Map<String, Value>) -> Option<String> {
    match document.get("id") {
        Some(Value::String(id)) => Some(id.clone()),
        Some(Value::Number(id)) => Some(id.to_string()),
        _ => None,
    }
}

fn document_errors(document: &Value) -> Vec<String> {
    let Some(fields) = document.as_object() else {
        return vec!["Document must be an object".to_string()];
    };
    fields
        .keys()
        .filter(|name| !is_valid_field_name(name))
        .map(|name| format!("Invalid field name: {name}"))
        .collect()
}

fn matches_query(document: &Value, needle: &str) -> bool {
    if needle.is_empty() {
        return true;
    }
    let contains = |value: &Value| {
        value
            .as_str()
            .is_some_and(|text| text.to_lowercase().contains(needle))
    };
    document.as_object().is_some_and(|fields| {
        fields.values().any(|value| match value {
            Value::Array(items) => items.iter().any(contains),
            other => contains(other),
        })
    })
}

/// Search results wrap every field value as `{"raw": value}`.
fn search_result(document: &Value) -> Value {
    let fields: Map<String, Value> = document
        .as_object()
        .map(|fields| {
            fields
                .iter()
                .map(|(name, value)| (name.clone(), json!({ "raw": value })))
                .collect()
        })
        .unwrap_or_default();
    Value::Object(fields)
}

fn run_search(engines: &HashMap<String, Engine>, engine: &Engine, options: &Value) -> HandlerResult<Value> {
    if !options.is_object() {
        return Err(ApiFailure::bad_request("Search options must be an object"));
    }
    let needle = options
        .get("query")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_lowercase();
    let hits: Vec<Value> = documents_of(engines, engine)
        .iter()
        .filter(|document| matches_query(document, &needle))
        .map(search_result)
        .collect();
    let mut page = paginate(hits, options);
    page["meta"]["request_id"] = json!(Uuid::new_v4().to_string());
    Ok(page)
}

// ---------------------------------------------------------------------------
// Engines
// ---------------------------------------------------------------------------

async fn list_engines(State(state): State<SharedState>, body: Bytes) -> HandlerResult {
    let options = parse_body(&body)?;
    let engines = state.engines.read().await;
    let mut names: Vec<&String> = engines.keys().collect();
    names.sort();
    let described = names
        .into_iter()
        .map(|name| engines[name].describe(&engines))
        .collect();
    Ok(Json(paginate(described, &options)))
}

async fn create_engine(State(state): State<SharedState>, body: Bytes) -> HandlerResult {
    let payload = parse_body(&body)?;
    let name = payload
        .get("name")
        .and_then(Value::as_str)
        .filter(|name| !name.is_empty())
        .ok_or_else(|| ApiFailure::bad_request("Name is required"))?
        .to_string();
    let kind = match payload.get("type").and_then(Value::as_str) {
        None | Some("default") => EngineKind::Default,
        Some("meta") => EngineKind::Meta,
        Some(other) => return Err(ApiFailure::bad_request(format!("Invalid engine type: {other}"))),
    };

    let mut engines = state.engines.write().await;
    if engines.contains_key(&name) {
        return Err(ApiFailure(
            StatusCode::CONFLICT,
            vec!["Name is already taken".to_string()],
        ));
    }

    let mut engine = Engine::new(name.clone(), kind);
    engine.language = payload
        .get("language")
        .and_then(Value::as_str)
        .map(str::to_string);
    if kind == EngineKind::Meta {
        let sources = string_list(
            payload.get("source_engines").unwrap_or(&Value::Null),
            "source_engines",
        )?;
        for source in &sources {
            find_engine(&engines, source)
                .map_err(|_| ApiFailure::bad_request(format!("Source engine {source} does not exist")))?;
        }
        engine.source_engines = sources;
    }

    info!(engine = %name, kind = kind.as_str(), "created engine");
    let described = engine.describe(&engines);
    engines.insert(name, engine);
    Ok(Json(described))
}

async fn get_engine(State(state): State<SharedState>, Path(name): Path<String>) -> HandlerResult {
    let engines = state.engines.read().await;
    let engine = find_engine(&engines, &name)?;
    Ok(Json(engine.describe(&engines)))
}

async fn destroy_engine(State(state): State<SharedState>, Path(name): Path<String>) -> HandlerResult {
    let mut engines = state.engines.write().await;
    engines
        .remove(&name)
        .ok_or_else(|| ApiFailure::not_found(format!("Could not find engine {name}.")))?;
    info!(engine = %name, "destroyed engine");
    Ok(Json(json!({ "deleted": true })))
}

// ---------------------------------------------------------------------------
// Documents
// ---------------------------------------------------------------------------

async fn get_documents(
    State(state): State<SharedState>,
    Path(name): Path<String>,
    body: Bytes,
) -> HandlerResult {
    let ids = string_list(&parse_body(&body)?, "Document ids")?;
    let engines = state.engines.read().await;
    let engine = find_engine(&engines, &name)?;
    let visible = documents_of(&engines, engine);
    let found = ids
        .iter()
        .map(|id| {
            visible
                .iter()
                .find(|document| document.get("id").and_then(Value::as_str) == Some(id.as_str()))
                .cloned()
                .unwrap_or(Value::Null)
        })
        .collect();
    Ok(Json(Value::Array(found)))
}

async fn list_documents(
    State(state): State<SharedState>,
    Path(name): Path<String>,
    body: Bytes,
) -> HandlerResult {
    let options = parse_body(&body)?;
    let engines = state.engines.read().await;
    let engine = find_engine(&engines, &name)?;
    Ok(Json(paginate(documents_of(&engines, engine), &options)))
}

async fn index_documents(
    State(state): State<SharedState>,
    Path(name): Path<String>,
    body: Bytes,
) -> HandlerResult {
    let payload = parse_body(&body)?;
    let documents = payload
        .as_array()
        .ok_or_else(|| ApiFailure::bad_request("Request body must be an array of documents"))?;

    let mut engines = state.engines.write().await;
    let engine = find_engine_mut(&mut engines, &name)?;
    if engine.kind == EngineKind::Meta {
        return Err(ApiFailure::bad_request("Cannot index documents into a meta engine"));
    }

    let statuses = documents
        .iter()
        .map(|document| {
            let errors = document_errors(document);
            let Some(fields) = document.as_object().filter(|_| errors.is_empty()) else {
                let id = document.as_object().and_then(document_id);
                return json!({ "id": id, "errors": errors });
            };
            let id = document_id(fields).unwrap_or_else(|| format!("doc-{}", Uuid::new_v4().simple()));
            let mut stored = fields.clone();
            stored.insert("id".to_string(), json!(id));
            for field in stored.keys().filter(|field| *field != "id") {
                engine
                    .schema
                    .entry(field.clone())
                    .or_insert_with(|| json!("text"));
            }
            engine.documents.insert(id.clone(), Value::Object(stored));
            json!({ "id": id, "errors": [] })
        })
        .collect();
    debug!(engine = %name, count = documents.len(), "indexed documents");
    Ok(Json(Value::Array(statuses)))
}

async fn update_documents(
    State(state): State<SharedState>,
    Path(name): Path<String>,
    body: Bytes,
) -> HandlerResult {
    let payload = parse_body(&body)?;
    let documents = payload
        .as_array()
        .ok_or_else(|| ApiFailure::bad_request("Request body must be an array of documents"))?;

    let mut engines = state.engines.write().await;
    let engine = find_engine_mut(&mut engines, &name)?;
    let statuses = documents
        .iter()
        .map(|document| {
            let Some(fields) = document.as_object() else {
                return json!({ "id": null, "errors": ["Document must be an object"] });
            };
            let Some(id) = document_id(fields) else {
                return json!({ "id": null, "errors": ["Missing required key 'id'"] });
            };
            let mut errors = document_errors(document);
            match engine.documents.get_mut(&id) {
                Some(Value::Object(stored)) if errors.is_empty() => {
                    for (field, value) in fields.iter().filter(|(field, _)| *field != "id") {
                        stored.insert(field.clone(), value.clone());
                    }
                }
                Some(_) => {}
                None => errors.push("Document does not exist".to_string()),
            }
            json!({ "id": id, "errors": errors })
        })
        .collect();
    Ok(Json(Value::Array(statuses)))
}

async fn destroy_documents(
    State(state): State<SharedState>,
    Path(name): Path<String>,
    body: Bytes,
) -> HandlerResult {
    let ids = string_list(&parse_body(&body)?, "Document ids")?;
    let mut engines = state.engines.write().await;
    let engine = find_engine_mut(&mut engines, &name)?;
    let results = ids
        .into_iter()
        .map(|id| {
            let deleted = engine.documents.remove(&id).is_some();
            json!({ "id": id, "deleted": deleted })
        })
        .collect();
    Ok(Json(Value::Array(results)))
}

// ---------------------------------------------------------------------------
// Schema
// ---------------------------------------------------------------------------

async fn get_schema(State(state): State<SharedState>, Path(name): Path<String>) -> HandlerResult {
    let engines = state.engines.read().await;
    let engine = find_engine(&engines, &name)?;
    Ok(Json(Value::Object(engine.schema.clone())))
}

async fn update_schema(
    State(state): State<SharedState>,
    Path(name): Path<String>,
    body: Bytes,
) -> HandlerResult {
    let payload = parse_body(&body)?;
    let fields = payload
        .as_object()
        .ok_or_else(|| ApiFailure::bad_request("Schema must be an object"))?;
    let invalid: Vec<String> = fields
        .iter()
        .filter(|(_, kind)| !kind.as_str().is_some_and(|k| SCHEMA_TYPES.contains(&k)))
        .map(|(field, _)| format!("Invalid type for field {field}"))
        .collect();
    if !invalid.is_empty() {
        return Err(ApiFailure(StatusCode::BAD_REQUEST, invalid));
    }

    let mut engines = state.engines.write().await;
    let engine = find_engine_mut(&mut engines, &name)?;
    engine.schema.extend(fields.clone());
    Ok(Json(Value::Object(engine.schema.clone())))
}

// ---------------------------------------------------------------------------
// Synonym sets
// ---------------------------------------------------------------------------

fn synonym_terms(payload: &Value) -> HandlerResult<Vec<String>> {
    let terms = string_list(payload.get("synonyms").unwrap_or(&Value::Null), "synonyms")?;
    if terms.len() < 2 {
        return Err(ApiFailure::bad_request(
            "Synonym sets must contain at least two terms",
        ));
    }
    Ok(terms)
}

async fn list_synonym_sets(
    State(state): State<SharedState>,
    Path(name): Path<String>,
    body: Bytes,
) -> HandlerResult {
    let options = parse_body(&body)?;
    let engines = state.engines.read().await;
    let engine = find_engine(&engines, &name)?;
    let sets = engine
        .synonym_sets
        .iter()
        .map(|(id, synonyms)| json!({ "id": id, "synonyms": synonyms }))
        .collect();
    Ok(Json(paginate(sets, &options)))
}

async fn get_synonym_set(
    State(state): State<SharedState>,
    Path((name, id)): Path<(String, String)>,
) -> HandlerResult {
    let engines = state.engines.read().await;
    let engine = find_engine(&engines, &name)?;
    let synonyms = engine
        .synonym_sets
        .get(&id)
        .ok_or_else(|| ApiFailure::not_found(format!("Synonym set {id} not found")))?;
    Ok(Json(json!({ "id": id, "synonyms": synonyms })))
}

async fn create_synonym_set(
    State(state): State<SharedState>,
    Path(name): Path<String>,
    body: Bytes,
) -> HandlerResult {
    let terms = synonym_terms(&parse_body(&body)?)?;
    let mut engines = state.engines.write().await;
    let engine = find_engine_mut(&mut engines, &name)?;
    let id = format!("syn-{}", Uuid::new_v4().simple());
    engine.synonym_sets.insert(id.clone(), terms.clone());
    Ok(Json(json!({ "id": id, "synonyms": terms })))
}

async fn update_synonym_set(
    State(state): State<SharedState>,
    Path((name, id)): Path<(String, String)>,
    body: Bytes,
) -> HandlerResult {
    let terms = synonym_terms(&parse_body(&body)?)?;
    let mut engines = state.engines.write().await;
    let engine = find_engine_mut(&mut engines, &name)?;
    let existing = engine
        .synonym_sets
        .get_mut(&id)
        .ok_or_else(|| ApiFailure::not_found(format!("Synonym set {id} not found")))?;
    *existing = terms.clone();
    Ok(Json(json!({ "id": id, "synonyms": terms })))
}

async fn destroy_synonym_set(
    State(state): State<SharedState>,
    Path((name, id)): Path<(String, String)>,
) -> HandlerResult {
    let mut engines = state.engines.write().await;
    let engine = find_engine_mut(&mut engines, &name)?;
    engine
        .synonym_sets
        .remove(&id)
        .ok_or_else(|| ApiFailure::not_found(format!("Synonym set {id} not found")))?;
    Ok(Json(json!({ "deleted": true })))
}

// ---------------------------------------------------------------------------
// Search
// ---------------------------------------------------------------------------

async fn search(
    State(state): State<SharedState>,
    Path(name): Path<String>,
    body: Bytes,
) -> HandlerResult {
    let options = parse_body(&body)?;
    let mut engines = state.engines.write().await;
    let result = run_search(&engines, find_engine(&engines, &name)?, &options)?;
    find_engine_mut(&mut engines, &name)?.log_request("search", &options);
    Ok(Json(result))
}

async fn multi_search(
    State(state): State<SharedState>,
    Path(name): Path<String>,
    body: Bytes,
) -> HandlerResult {
    let payload = parse_body(&body)?;
    let queries = payload
        .get("queries")
        .and_then(Value::as_array)
        .ok_or_else(|| ApiFailure::bad_request("queries must be an array"))?;

    let mut engines = state.engines.write().await;
    let engine = find_engine(&engines, &name)?;
    let results = queries
        .iter()
        .map(|options| run_search(&engines, engine, options))
        .collect::<HandlerResult<Vec<Value>>>()?;
    find_engine_mut(&mut engines, &name)?.log_request("multi_search", &payload);
    Ok(Json(Value::Array(results)))
}

async fn query_suggestion(
    State(state): State<SharedState>,
    Path(name): Path<String>,
    body: Bytes,
) -> HandlerResult {
    let options = parse_body(&body)?;
    let prefix = options
        .get("query")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_lowercase();
    let size = options
        .get("size")
        .and_then(Value::as_u64)
        .unwrap_or(5) as usize;

    let engines = state.engines.read().await;
    let engine = find_engine(&engines, &name)?;
    let mut words = BTreeSet::new();
    for document in documents_of(&engines, engine) {
        let Some(fields) = document.as_object() else {
            continue;
        };
        for (_, value) in fields.iter().filter(|(field, _)| *field != "id") {
            let Some(text) = value.as_str() else {
                continue;
            };
            words.extend(
                text.split(|c: char| !c.is_alphanumeric())
                    .map(str::to_lowercase)
                    .filter(|word| !word.is_empty() && word.starts_with(&prefix)),
            );
        }
    }
    let suggestions: Vec<Value> = words
        .into_iter()
        .take(size)
        .map(|word| json!({ "suggestion": word }))
        .collect();
    Ok(Json(json!({
        "meta": { "request_id": Uuid::new_v4().to_string() },
        "results": { "documents": suggestions },
    })))
}

async fn click(
    State(state): State<SharedState>,
    Path(name): Path<String>,
    body: Bytes,
) -> HandlerResult<StatusCode> {
    let payload = parse_body(&body)?;
    for key in ["query", "document_id"] {
        if payload.get(key).and_then(Value::as_str).is_none() {
            return Err(ApiFailure::bad_request(format!("Missing required key '{key}'")));
        }
    }
    let mut engines = state.engines.write().await;
    find_engine_mut(&mut engines, &name)?.clicks.push(payload);
    Ok(StatusCode::OK)
}

// ---------------------------------------------------------------------------
// Meta engine sources
// ---------------------------------------------------------------------------

async fn add_source_engines(
    State(state): State<SharedState>,
    Path(name): Path<String>,
    body: Bytes,
) -> HandlerResult {
    let sources = string_list(&parse_body(&body)?, "Source engines")?;
    let mut engines = state.engines.write().await;
    for source in &sources {
        let engine = find_engine(&engines, source)?;
        if engine.kind == EngineKind::Meta {
            return Err(ApiFailure::bad_request(format!(
                "Source engine {source} is a meta engine"
            )));
        }
    }
    let engine = find_engine_mut(&mut engines, &name)?;
    if engine.kind != EngineKind::Meta {
        return Err(ApiFailure::bad_request(format!("{name} is not a meta engine")));
    }
    for source in sources {
        if !engine.source_engines.contains(&source) {
            engine.source_engines.push(source);
        }
    }
    let engine = find_engine(&engines, &name)?;
    Ok(Json(engine.describe(&engines)))
}

async fn remove_source_engines(
    State(state): State<SharedState>,
    Path(name): Path<String>,
    body: Bytes,
) -> HandlerResult {
    let sources = string_list(&parse_body(&body)?, "Source engines")?;
    let mut engines = state.engines.write().await;
    let engine = find_engine_mut(&mut engines, &name)?;
    if engine.kind != EngineKind::Meta {
        return Err(ApiFailure::bad_request(format!("{name} is not a meta engine")));
    }
    engine.source_engines.retain(|source| !sources.contains(source));
    let engine = find_engine(&engines, &name)?;
    Ok(Json(engine.describe(&engines)))
}

// ---------------------------------------------------------------------------
// Search settings and logs
// ---------------------------------------------------------------------------

async fn get_search_settings(
    State(state): State<SharedState>,
    Path(name): Path<String>,
) -> HandlerResult {
    let engines = state.engines.read().await;
    let engine = find_engine(&engines, &name)?;
    let settings = engine
        .search_settings
        .clone()
        .unwrap_or_else(|| engine.default_search_settings());
    Ok(Json(settings))
}

async fn update_search_settings(
    State(state): State<SharedState>,
    Path(name): Path<String>,
    body: Bytes,
) -> HandlerResult {
    let settings = parse_body(&body)?;
    if !settings.is_object() {
        return Err(ApiFailure::bad_request("Search settings must be an object"));
    }
    let mut engines = state.engines.write().await;
    let engine = find_engine_mut(&mut engines, &name)?;
    engine.search_settings = Some(settings.clone());
    Ok(Json(settings))
}

async fn reset_search_settings(
    State(state): State<SharedState>,
    Path(name): Path<String>,
) -> HandlerResult {
    let mut engines = state.engines.write().await;
    let engine = find_engine_mut(&mut engines, &name)?;
    engine.search_settings = None;
    Ok(Json(engine.default_search_settings()))
}

async fn get_api_logs(
    State(state): State<SharedState>,
    Path(name): Path<String>,
    body: Bytes,
) -> HandlerResult {
    let options = parse_body(&body)?;
    let engines = state.engines.read().await;
    let engine = find_engine(&engines, &name)?;
    Ok(Json(paginate(engine.api_logs.clone(), &options)))
}
