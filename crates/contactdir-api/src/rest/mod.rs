pub mod handlers;

use axum::Json;
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::health,
        handlers::list_services,
        handlers::get_service,
        handlers::service_detail,
        handlers::add_service,
        handlers::replace_service_payload,
    ),
    components(
        schemas(
            handlers::HealthResponse,
            handlers::ServiceItem,
            handlers::ServiceLink,
            handlers::ServiceDetailResponse,
            handlers::AddServiceRequest,
            handlers::AddServiceResponse,
            handlers::ReplacePayloadRequest,
            handlers::ReplacePayloadResponse,
        )
    ),
    tags(
        (name = "contact", description = "Contact microservice directory")
    )
)]
pub struct ApiDoc;

pub async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
