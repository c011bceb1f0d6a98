use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Configure Swagger UI endpoints
pub fn configure_swagger_routes() -> SwaggerUi {
    SwaggerUi::new("/api-docs").url("/api-docs/openapi.json", ApiDoc::openapi())
}

// API Documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        // Health endpoints
        crate::api::handlers::health::health_check,

        // BP form endpoints
        crate::api::handlers::bp_form::classify_blood_pressure,
        crate::api::handlers::bp_form::create_bp_form,
        crate::api::handlers::bp_form::list_bp_forms,
        crate::api::handlers::bp_form::get_bp_form,
        crate::api::handlers::bp_form::add_bp_reading,
        crate::api::handlers::bp_form::delete_bp_form,

        // Dental endpoints
        crate::api::handlers::dental_chart::create_dental_record,
        crate::api::handlers::dental_chart::get_dental_record,
        crate::api::handlers::dental_chart::upsert_tooth,
        crate::api::handlers::dental_chart::get_dental_shapes,
        crate::api::handlers::dental_chart::get_dental_layout
    ),
    components(
        schemas(
            // Entities
            crate::entities::common::ErrorResponse,
            crate::entities::bp_form::BpReadingResponse,
            crate::entities::bp_form::BpFormResponse,
            crate::entities::bp_form::ClassifyRequest,
            crate::entities::bp_form::ClassificationResponse,
            crate::entities::bp_form::CreateBpFormRequest,
            crate::entities::bp_form::CreateBpReadingRequest,
            crate::entities::dental::ToothAnnotationResponse,
            crate::entities::dental::DentalRecordResponse,
            crate::entities::dental::CreateDentalRecordRequest,
            crate::entities::dental::ToothPatchRequest,
            crate::entities::dental::ShapesResponse,
            crate::entities::dental::DentitionRows,
            crate::entities::dental::SymbolLegendEntry,
            crate::entities::dental::DentalLayoutResponse,

            // Health handlers
            crate::api::handlers::health::HealthResponse,
            crate::api::handlers::health::ComponentStatus,
            crate::api::handlers::health::ComponentHealthStatus,

            // Domain value types that appear in responses
            school_clinic_domain::entities::bp_form::Tier,
            school_clinic_domain::entities::dental_chart::Design,
            school_clinic_domain::entities::dental_chart::Dentition,
            school_clinic_domain::entities::dental_chart::SymbolGroup,
            school_clinic_domain::entities::dental_chart::ToothNumber,
            school_clinic_domain::services::tooth_geometry::ShapePlan,
            school_clinic_domain::services::tooth_geometry::ToothStyle,
            school_clinic_domain::services::tooth_geometry::Primitive
        )
    ),
    tags(
        (name = "health", description = "Health check endpoint"),
        (name = "bp_forms", description = "Blood pressure triage and BP form endpoints"),
        (name = "dental", description = "Dental chart records and drawing geometry")
    ),
    info(
        title = "SchoolClinic API",
        version = "0.1.0",
        description = "Clinic records for a school health office: BP triage and dental charts",
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        ),
    ),
    servers(
        (url = "/", description = "Local development server")
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_doc_generation() {
        let openapi = ApiDoc::openapi();

        assert_eq!(openapi.info.title, "SchoolClinic API");
        assert_eq!(openapi.info.version, "0.1.0");

        let tags = openapi.tags.as_ref().expect("tags should be defined");
        assert!(tags.iter().any(|tag| tag.name == "bp_forms"));
        assert!(tags.iter().any(|tag| tag.name == "dental"));

        let paths = &openapi.paths.paths;
        for path in [
            "/health",
            "/api/v1/bp/classify",
            "/api/v1/bp-forms",
            "/api/v1/bp-forms/{id}",
            "/api/v1/bp-forms/{id}/readings",
            "/api/v1/dental-records",
            "/api/v1/dental-records/{id}",
            "/api/v1/dental-records/{id}/teeth/{number}",
            "/api/v1/dental-records/{id}/shapes",
            "/api/v1/dental/layout",
        ] {
            assert!(paths.contains_key(path), "missing path {}", path);
        }
    }

    #[test]
    fn test_schemas_include_domain_types() {
        let openapi = ApiDoc::openapi();
        let schemas = &openapi.components.as_ref().expect("components").schemas;
        assert!(schemas.contains_key("ShapePlan"));
        assert!(schemas.contains_key("Tier"));
        assert!(schemas.contains_key("ErrorResponse"));
    }
}
