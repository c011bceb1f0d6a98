use std::sync::Arc;

use axum::{
    extract::{Json, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tracing::{error, info, instrument, warn};
use validator::Validate;

use school_clinic_domain::services::{
    create_default_dental_chart_service, DentalChartServiceError, DentalChartServiceTrait,
};

use crate::entities::common::ErrorResponse;
use crate::entities::dental::{
    convert_to_domain_patch_request, convert_to_domain_record_request, convert_to_public_record, dental_layout,
    CreateDentalRecordRequest, DentalLayoutResponse, DentalRecordResponse, ShapesResponse, ToothPatchRequest,
};

/// Service type for dependency injection
pub type DentalChartServiceRef = Arc<dyn DentalChartServiceTrait + Send + Sync>;

/// Create a default service for the handlers to use
pub fn create_service() -> DentalChartServiceRef {
    Arc::new(create_default_dental_chart_service())
}

fn error_response(err: DentalChartServiceError) -> Response {
    match err {
        DentalChartServiceError::ValidationError(msg) => {
            warn!("Invalid dental chart request: {}", msg);
            ErrorResponse::validation_error(&msg, None).into_response()
        }
        DentalChartServiceError::NotFound(msg) => {
            info!("Dental record not found: {}", msg);
            ErrorResponse::not_found("dental record").into_response()
        }
        DentalChartServiceError::Conflict(msg) => {
            warn!("Dental chart edit refused: {}", msg);
            ErrorResponse::conflict(&msg).into_response()
        }
        DentalChartServiceError::RepositoryError(msg) => {
            error!("Dental record repository error: {}", msg);
            ErrorResponse::internal_error().into_response()
        }
    }
}

/// Open a dental record with an empty chart
#[utoipa::path(
    post,
    path = "/api/v1/dental-records",
    request_body = CreateDentalRecordRequest,
    responses(
        (status = 201, description = "Dental record created", body = DentalRecordResponse),
        (status = 400, description = "Invalid request", body = ErrorResponse),
    ),
    tag = "dental"
)]
#[instrument(skip(service, request))]
pub async fn create_dental_record(
    State(service): State<DentalChartServiceRef>,
    Json(request): Json<CreateDentalRecordRequest>,
) -> Result<impl IntoResponse, Response> {
    if let Err(errors) = request.validate() {
        return Err(ErrorResponse::validation_error("Invalid request", serde_json::to_value(&errors).ok()).into_response());
    }

    let record = service
        .create_record(convert_to_domain_record_request(request))
        .await
        .map_err(error_response)?;

    info!("Dental record created with ID: {}", record.id);
    Ok((StatusCode::CREATED, Json(convert_to_public_record(record))))
}

/// Get a dental record with its chart
#[utoipa::path(
    get,
    path = "/api/v1/dental-records/{id}",
    params(
        ("id" = String, Path, description = "Dental record ID")
    ),
    responses(
        (status = 200, description = "Dental record found", body = DentalRecordResponse),
        (status = 404, description = "Dental record not found", body = ErrorResponse),
    ),
    tag = "dental"
)]
#[instrument(skip(service))]
pub async fn get_dental_record(
    State(service): State<DentalChartServiceRef>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, Response> {
    let record = service.get_record(&id).await.map_err(error_response)?;
    Ok((StatusCode::OK, Json(convert_to_public_record(record))))
}

/// Annotate one tooth of a dental record
#[utoipa::path(
    put,
    path = "/api/v1/dental-records/{id}/teeth/{number}",
    params(
        ("id" = String, Path, description = "Dental record ID"),
        ("number" = u8, Path, description = "Tooth number, e.g. 14 or 65")
    ),
    request_body = ToothPatchRequest,
    responses(
        (status = 200, description = "Tooth updated, returns the whole record", body = DentalRecordResponse),
        (status = 400, description = "Unknown tooth number or symbol", body = ErrorResponse),
        (status = 404, description = "Dental record not found", body = ErrorResponse),
        (status = 409, description = "Stored chart does not decode and cannot be edited", body = ErrorResponse),
    ),
    tag = "dental"
)]
#[instrument(skip(service, request))]
pub async fn upsert_tooth(
    State(service): State<DentalChartServiceRef>,
    Path((id, number)): Path<(String, u8)>,
    Json(request): Json<ToothPatchRequest>,
) -> Result<impl IntoResponse, Response> {
    if let Err(errors) = request.validate() {
        return Err(ErrorResponse::validation_error("Invalid request", serde_json::to_value(&errors).ok()).into_response());
    }

    let record = service
        .upsert_tooth(&id, number, convert_to_domain_patch_request(request))
        .await
        .map_err(error_response)?;
    Ok((StatusCode::OK, Json(convert_to_public_record(record))))
}

/// Drawing primitives for every annotated tooth of a record
#[utoipa::path(
    get,
    path = "/api/v1/dental-records/{id}/shapes",
    params(
        ("id" = String, Path, description = "Dental record ID")
    ),
    responses(
        (status = 200, description = "Shape plans keyed by tooth number", body = ShapesResponse),
        (status = 404, description = "Dental record not found", body = ErrorResponse),
    ),
    tag = "dental"
)]
#[instrument(skip(service))]
pub async fn get_dental_shapes(
    State(service): State<DentalChartServiceRef>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, Response> {
    let shapes = service.shapes(&id).await.map_err(error_response)?;
    let response = ShapesResponse {
        record_id: id,
        teeth: shapes.into_iter().map(|(number, plan)| (number.to_string(), plan)).collect(),
    };
    Ok((StatusCode::OK, Json(response)))
}

/// Fixed chart layout and symbol legend
#[utoipa::path(
    get,
    path = "/api/v1/dental/layout",
    responses(
        (status = 200, description = "Tooth rows of both dentitions", body = DentalLayoutResponse),
    ),
    tag = "dental"
)]
pub async fn get_dental_layout() -> Json<DentalLayoutResponse> {
    Json(dental_layout())
}
