use std::sync::Arc;

use axum::{
    extract::{Json, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::{NaiveDate, NaiveTime};
use school_clinic_domain::testing::{create_failing_bp_form_service, create_mock_bp_form_service};

use super::body_json;
use crate::api::handlers::bp_form::{
    add_bp_reading, classify_blood_pressure, create_bp_form, delete_bp_form, get_bp_form, list_bp_forms,
    BpFormServiceRef,
};
use crate::entities::bp_form::{ClassifyRequest, CreateBpFormRequest, CreateBpReadingRequest, ListFormsQuery};

fn service() -> BpFormServiceRef {
    Arc::new(create_mock_bp_form_service())
}

fn reading(day: u32, hour: u32, blood_pressure: &str) -> CreateBpReadingRequest {
    CreateBpReadingRequest {
        date: NaiveDate::from_ymd_opt(2024, 5, day).expect("valid date"),
        time: NaiveTime::from_hms_opt(hour, 0, 0).expect("valid time"),
        blood_pressure: blood_pressure.to_string(),
        has_signature: true,
    }
}

async fn open_form(service: &BpFormServiceRef, patient_id: &str) -> String {
    let response = create_bp_form(
        State(service.clone()),
        Json(CreateBpFormRequest {
            patient_id: patient_id.to_string(),
        }),
    )
    .await
    .into_response();
    assert_eq!(response.status(), StatusCode::CREATED);

    let body = body_json(response).await;
    body["id"].as_str().expect("form id").to_string()
}

#[tokio::test]
async fn test_classify_critical_reading() {
    let response = classify_blood_pressure(
        State(service()),
        Json(ClassifyRequest {
            blood_pressure: "185/95".to_string(),
        }),
    )
    .await
    .into_response();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["tier"], "Critical");
    assert_eq!(body["severity"], 4);
    assert_eq!(body["advisory"], "Hypertensive Crisis: Seek emergency care!");
    assert_eq!(body["remark"], "Critical - Immediate medical attention required");
}

#[tokio::test]
async fn test_classify_incomplete_reading() {
    let response = classify_blood_pressure(
        State(service()),
        Json(ClassifyRequest {
            blood_pressure: "120/".to_string(),
        }),
    )
    .await
    .into_response();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert!(body.get("tier").is_none());
    assert_eq!(body["advisory"], "");
    assert_eq!(body["remark"], "No BP recorded");
}

#[tokio::test]
async fn test_classify_degrades_overlong_input() {
    let response = classify_blood_pressure(
        State(service()),
        Json(ClassifyRequest {
            blood_pressure: "1200/800".to_string(),
        }),
    )
    .await
    .into_response();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert!(body.get("tier").is_none());
    assert_eq!(body["remark"], "No BP recorded");
}

#[tokio::test]
async fn test_create_form_requires_patient() {
    let response = create_bp_form(
        State(service()),
        Json(CreateBpFormRequest {
            patient_id: String::new(),
        }),
    )
    .await
    .into_response();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_readings_are_ordered_and_rolled_up() {
    let service = service();
    let id = open_form(&service, "student-17").await;

    let response = add_bp_reading(State(service.clone()), Path(id.clone()), Json(reading(2, 8, "150/95")))
        .await
        .into_response();
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    assert_eq!(body["status"], "Elevated BP");
    assert_eq!(body["readings"][0]["remarks"], "High BP - Consider medication or lifestyle changes");

    // An earlier reading lands in front
    let response = add_bp_reading(State(service.clone()), Path(id.clone()), Json(reading(1, 9, "115/75")))
        .await
        .into_response();
    let body = body_json(response).await;
    assert_eq!(body["readings"][0]["blood_pressure"], "115/75");
    assert_eq!(body["readings"][1]["blood_pressure"], "150/95");
    assert_eq!(body["is_full"], false);

    let response = get_bp_form(State(service), Path(id)).await.into_response();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "Elevated BP");
    assert_eq!(body["readings"].as_array().map(Vec::len), Some(2));
}

#[tokio::test]
async fn test_empty_reading_is_saved_as_incomplete() {
    let service = service();
    let id = open_form(&service, "student-3").await;

    let response = add_bp_reading(State(service), Path(id), Json(reading(1, 8, "")))
        .await
        .into_response();

    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    assert_eq!(body["readings"][0]["remarks"], "No BP recorded");
    assert_eq!(body["status"], "Stable");
}

#[tokio::test]
async fn test_malformed_reading_is_rejected() {
    let service = service();
    let id = open_form(&service, "student-3").await;

    let response = add_bp_reading(State(service), Path(id), Json(reading(1, 8, "12a/80")))
        .await
        .into_response();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_eighth_reading_conflicts() {
    let service = service();
    let id = open_form(&service, "student-8").await;

    for day in 1..=7 {
        let response = add_bp_reading(State(service.clone()), Path(id.clone()), Json(reading(day, 8, "120/70")))
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    let response = add_bp_reading(State(service.clone()), Path(id.clone()), Json(reading(8, 8, "120/70")))
        .await
        .into_response();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let body = body_json(get_bp_form(State(service), Path(id)).await.into_response()).await;
    assert_eq!(body["readings"].as_array().map(Vec::len), Some(7));
    assert_eq!(body["is_full"], true);
}

#[tokio::test]
async fn test_unknown_and_malformed_ids() {
    let service = service();

    let response = get_bp_form(State(service.clone()), Path("6a3b1f0e-8a9e-4c55-9d2e-3f1c2b7a9e10".to_string()))
        .await
        .into_response();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = get_bp_form(State(service), Path("not-a-uuid".to_string()))
        .await
        .into_response();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_list_and_delete_forms() {
    let service = service();
    let first = open_form(&service, "student-5").await;
    open_form(&service, "student-5").await;
    open_form(&service, "student-6").await;

    let query = ListFormsQuery {
        patient_id: "student-5".to_string(),
    };
    let body = body_json(list_bp_forms(State(service.clone()), Query(query)).await.into_response()).await;
    assert_eq!(body.as_array().map(Vec::len), Some(2));

    let response = delete_bp_form(State(service.clone()), Path(first.clone()))
        .await
        .into_response();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = get_bp_form(State(service), Path(first)).await.into_response();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_repository_failure_is_internal_error() {
    let service: BpFormServiceRef = Arc::new(create_failing_bp_form_service());

    let response = create_bp_form(
        State(service),
        Json(CreateBpFormRequest {
            patient_id: "student-1".to_string(),
        }),
    )
    .await
    .into_response();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = body_json(response).await;
    assert_eq!(body["error"], "internal_error");
}
