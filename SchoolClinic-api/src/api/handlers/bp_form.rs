use std::sync::Arc;

use axum::{
    extract::{Json, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tracing::{error, info, instrument, warn};
use validator::Validate;

use school_clinic_domain::services::{create_default_bp_form_service, BpFormServiceError, BpFormServiceTrait};

use crate::entities::bp_form::{
    convert_to_domain_form_request, convert_to_domain_reading_request, convert_to_public_classification,
    convert_to_public_form, BpFormResponse, ClassificationResponse, ClassifyRequest, CreateBpFormRequest,
    CreateBpReadingRequest, ListFormsQuery,
};
use crate::entities::common::ErrorResponse;

/// Service type for dependency injection
pub type BpFormServiceRef = Arc<dyn BpFormServiceTrait + Send + Sync>;

/// Create a default service for the handlers to use
pub fn create_service() -> BpFormServiceRef {
    Arc::new(create_default_bp_form_service())
}

/// Map a service error onto the public error shape
fn error_response(err: BpFormServiceError) -> Response {
    match err {
        BpFormServiceError::ValidationError(msg) => {
            warn!("Invalid BP form request: {}", msg);
            ErrorResponse::validation_error(&msg, None).into_response()
        }
        BpFormServiceError::NotFound(msg) => {
            info!("BP form not found: {}", msg);
            ErrorResponse::not_found("BP form").into_response()
        }
        BpFormServiceError::CapacityExceeded(msg) => {
            warn!("BP form is full: {}", msg);
            ErrorResponse::conflict(&msg).into_response()
        }
        BpFormServiceError::RepositoryError(msg) => {
            error!("BP form repository error: {}", msg);
            ErrorResponse::internal_error().into_response()
        }
    }
}

fn validate<T: Validate>(request: &T) -> Result<(), Response> {
    request.validate().map_err(|errors| {
        warn!("Request failed validation: {}", errors);
        ErrorResponse::validation_error("Invalid request", serde_json::to_value(&errors).ok()).into_response()
    })
}

/// Classify a blood pressure string without storing it
#[utoipa::path(
    post,
    path = "/api/v1/bp/classify",
    request_body = ClassifyRequest,
    responses(
        (status = 200, description = "Classification of the reading, degraded when it is not a reading", body = ClassificationResponse),
    ),
    tag = "bp_forms"
)]
#[instrument(skip(service))]
pub async fn classify_blood_pressure(
    State(service): State<BpFormServiceRef>,
    Json(request): Json<ClassifyRequest>,
) -> impl IntoResponse {
    let classification = service.classify(&request.blood_pressure);
    (StatusCode::OK, Json(convert_to_public_classification(classification)))
}

/// Open a new BP form for a patient
#[utoipa::path(
    post,
    path = "/api/v1/bp-forms",
    request_body = CreateBpFormRequest,
    responses(
        (status = 201, description = "BP form created", body = BpFormResponse),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "bp_forms"
)]
#[instrument(skip(service, request))]
pub async fn create_bp_form(
    State(service): State<BpFormServiceRef>,
    Json(request): Json<CreateBpFormRequest>,
) -> Result<impl IntoResponse, Response> {
    validate(&request)?;
    let form = service
        .create_form(convert_to_domain_form_request(request))
        .await
        .map_err(error_response)?;

    info!("BP form created with ID: {}", form.id);
    Ok((StatusCode::CREATED, Json(convert_to_public_form(form))))
}

/// List the BP forms of one patient
#[utoipa::path(
    get,
    path = "/api/v1/bp-forms",
    params(ListFormsQuery),
    responses(
        (status = 200, description = "BP forms of the patient", body = [BpFormResponse]),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "bp_forms"
)]
#[instrument(skip(service))]
pub async fn list_bp_forms(
    State(service): State<BpFormServiceRef>,
    Query(query): Query<ListFormsQuery>,
) -> Result<impl IntoResponse, Response> {
    let forms = service.list_forms(&query.patient_id).await.map_err(error_response)?;
    let forms: Vec<BpFormResponse> = forms.into_iter().map(convert_to_public_form).collect();
    Ok((StatusCode::OK, Json(forms)))
}

/// Get a BP form with its readings and overall status
#[utoipa::path(
    get,
    path = "/api/v1/bp-forms/{id}",
    params(
        ("id" = String, Path, description = "BP form ID")
    ),
    responses(
        (status = 200, description = "BP form found", body = BpFormResponse),
        (status = 400, description = "Malformed ID", body = ErrorResponse),
        (status = 404, description = "BP form not found", body = ErrorResponse),
    ),
    tag = "bp_forms"
)]
#[instrument(skip(service))]
pub async fn get_bp_form(
    State(service): State<BpFormServiceRef>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, Response> {
    let form = service.get_form(&id).await.map_err(error_response)?;
    Ok((StatusCode::OK, Json(convert_to_public_form(form))))
}

/// Classify a reading and append it to a form
#[utoipa::path(
    post,
    path = "/api/v1/bp-forms/{id}/readings",
    params(
        ("id" = String, Path, description = "BP form ID")
    ),
    request_body = CreateBpReadingRequest,
    responses(
        (status = 201, description = "Reading added, returns the updated form", body = BpFormResponse),
        (status = 400, description = "Malformed blood pressure", body = ErrorResponse),
        (status = 404, description = "BP form not found", body = ErrorResponse),
        (status = 409, description = "BP form already holds the maximum number of readings", body = ErrorResponse),
    ),
    tag = "bp_forms"
)]
#[instrument(skip(service, request))]
pub async fn add_bp_reading(
    State(service): State<BpFormServiceRef>,
    Path(id): Path<String>,
    Json(request): Json<CreateBpReadingRequest>,
) -> Result<impl IntoResponse, Response> {
    validate(&request)?;
    let form = service
        .add_reading(&id, convert_to_domain_reading_request(request))
        .await
        .map_err(error_response)?;

    info!("Reading added to BP form {}, status {}", form.id, form.status);
    Ok((StatusCode::CREATED, Json(convert_to_public_form(form))))
}

/// Delete a BP form and its readings
#[utoipa::path(
    delete,
    path = "/api/v1/bp-forms/{id}",
    params(
        ("id" = String, Path, description = "BP form ID")
    ),
    responses(
        (status = 204, description = "BP form deleted"),
        (status = 404, description = "BP form not found", body = ErrorResponse),
    ),
    tag = "bp_forms"
)]
#[instrument(skip(service))]
pub async fn delete_bp_form(
    State(service): State<BpFormServiceRef>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, Response> {
    service.delete_form(&id).await.map_err(error_response)?;
    Ok(StatusCode::NO_CONTENT)
}
