use crate::{ApiError, ApiResult, AppState};
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use contactdir_core::{EntryDetail, EntryLink, EntryView};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};
use utoipa::ToSchema;

#[derive(Serialize, Deserialize, ToSchema)]
pub struct ServiceItem {
    pub id: String,
    pub endpoint: String,
    #[schema(value_type = Object)]
    pub payload: Value,
}

impl From<EntryView> for ServiceItem {
    fn from(view: EntryView) -> Self {
        Self {
            id: view.id,
            endpoint: view.endpoint,
            payload: view.payload,
        }
    }
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct ServiceLink {
    pub id: String,
    pub endpoint: String,
}

impl From<EntryLink> for ServiceLink {
    fn from(link: EntryLink) -> Self {
        Self {
            id: link.id,
            endpoint: link.endpoint,
        }
    }
}

// -------- Health --------

#[derive(Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    pub ok: bool,
    pub version: String,
    pub services: usize,
}

/// Liveness probe
#[utoipa::path(
    get,
    path = "/healthz",
    responses((status = 200, description = "Service is up", body = HealthResponse))
)]
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        ok: true,
        version: env!("CARGO_PKG_VERSION").to_string(),
        services: state.directory.len(),
    })
}

// -------- List --------

/// All contact microservices in insertion order
#[utoipa::path(
    get,
    path = "/api/contact/list",
    tag = "contact",
    responses(
        (status = 200, description = "Ordered directory listing", body = [ServiceItem]),
        (status = 401, description = "Missing or invalid bearer token")
    )
)]
pub async fn list_services(State(state): State<AppState>) -> Json<Vec<ServiceItem>> {
    Json(
        state
            .directory
            .to_sequence()
            .into_iter()
            .map(ServiceItem::from)
            .collect(),
    )
}

// -------- Get payload --------

/// Payload of a single contact microservice
#[utoipa::path(
    get,
    path = "/api/contact/{id}",
    tag = "contact",
    params(("id" = String, Path, description = "Service identifier")),
    responses(
        (status = 200, description = "Service payload as stored"),
        (status = 401, description = "Missing or invalid bearer token"),
        (status = 404, description = "Service not found")
    )
)]
pub async fn get_service(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    debug!("Looking up service {}", id);
    state
        .directory
        .find(&id)
        .map(|entry| Json(entry.payload))
        .ok_or_else(|| not_found(&id))
}

// -------- Detail with navigation --------

#[derive(Serialize, Deserialize, ToSchema)]
pub struct ServiceDetailResponse {
    pub service: ServiceItem,
    pub prev_service: Option<ServiceLink>,
    pub next_service: Option<ServiceLink>,
}

impl From<EntryDetail> for ServiceDetailResponse {
    fn from(detail: EntryDetail) -> Self {
        Self {
            service: detail.service.into(),
            prev_service: detail.prev_service.map(ServiceLink::from),
            next_service: detail.next_service.map(ServiceLink::from),
        }
    }
}

/// Service detail with previous/next navigation links
#[utoipa::path(
    get,
    path = "/contact/{id}",
    tag = "contact",
    params(("id" = String, Path, description = "Service identifier")),
    responses(
        (status = 200, description = "Service and its neighbors", body = ServiceDetailResponse),
        (status = 404, description = "Service not found")
    )
)]
pub async fn service_detail(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<ServiceDetailResponse>> {
    state
        .directory
        .detail(&id)
        .map(|detail| Json(ServiceDetailResponse::from(detail)))
        .ok_or_else(|| not_found(&id))
}

// -------- Register --------

#[derive(Serialize, Deserialize, ToSchema)]
pub struct AddServiceRequest {
    pub id: Option<String>,
    pub endpoint: Option<String>,
    /// Service payload; `payload` is accepted as an alias.
    #[serde(alias = "payload")]
    #[schema(value_type = Option<Object>)]
    pub data: Option<Value>,
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct AddServiceResponse {
    pub message: String,
    pub service: ServiceLink,
    pub total_services: usize,
}

/// Ids that collide with the fixed `/api/contact/list` and `/api/contact/add` routes.
const RESERVED_IDS: [&str; 2] = ["list", "add"];

/// Register a new contact microservice at the end of the directory
#[utoipa::path(
    post,
    path = "/api/contact/add",
    tag = "contact",
    request_body = AddServiceRequest,
    responses(
        (status = 201, description = "Service registered", body = AddServiceResponse),
        (status = 400, description = "Missing required fields, malformed body or reserved id"),
        (status = 401, description = "Missing or invalid bearer token"),
        (status = 409, description = "Duplicate id rejected by policy")
    )
)]
pub async fn add_service(
    State(state): State<AppState>,
    body: Result<Json<AddServiceRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<AddServiceResponse>)> {
    let Json(req) = body?;
    let (Some(id), Some(endpoint), Some(data)) = (
        req.id.filter(|s| !s.is_empty()),
        req.endpoint.filter(|s| !s.is_empty()),
        req.data.filter(is_present),
    ) else {
        return Err(ApiError::Validation(
            "Missing required fields: id, endpoint, data".into(),
        ));
    };
    if RESERVED_IDS.contains(&id.as_str()) {
        warn!("Rejected reserved service id {}", id);
        return Err(ApiError::Validation(format!(
            "Service id '{}' is reserved by the API",
            id
        )));
    }

    let outcome = state.directory.append(id, endpoint, data)?;
    info!(
        total = outcome.total_services,
        "Registered service {} at {}", outcome.service.id, outcome.service.endpoint
    );

    Ok((
        StatusCode::CREATED,
        Json(AddServiceResponse {
            message: "Microservice added successfully".to_string(),
            service: outcome.service.into(),
            total_services: outcome.total_services,
        }),
    ))
}

// -------- Replace payload --------

#[derive(Serialize, Deserialize, ToSchema)]
pub struct ReplacePayloadRequest {
    #[serde(alias = "data")]
    #[schema(value_type = Object)]
    pub payload: Value,
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct ReplacePayloadResponse {
    pub message: String,
    pub service: ServiceLink,
}

/// Replace the payload of an existing service in place
#[utoipa::path(
    put,
    path = "/api/contact/{id}",
    tag = "contact",
    params(("id" = String, Path, description = "Service identifier")),
    request_body = ReplacePayloadRequest,
    responses(
        (status = 200, description = "Payload replaced", body = ReplacePayloadResponse),
        (status = 400, description = "Malformed body"),
        (status = 401, description = "Missing or invalid bearer token"),
        (status = 404, description = "Service not found")
    )
)]
pub async fn replace_service_payload(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<ReplacePayloadRequest>, JsonRejection>,
) -> ApiResult<Json<ReplacePayloadResponse>> {
    let Json(req) = body?;
    let service = state
        .directory
        .replace_payload(&id, req.payload)
        .ok_or_else(|| not_found(&id))?;
    info!("Replaced payload of service {}", service.id);

    Ok(Json(ReplacePayloadResponse {
        message: "Payload replaced successfully".to_string(),
        service: service.into(),
    }))
}

fn not_found(id: &str) -> ApiError {
    ApiError::NotFound(format!("Service {} not found", id))
}

/// Empty strings, objects and arrays, `null`, `false` and zero count as missing.
fn is_present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
        Value::Number(n) => n.as_f64() != Some(0.0),
    }
}
