use std::collections::HashSet;

use assert_matches::assert_matches;
use chrono::Duration;
use axum::extract::{Extension, Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use axum_extra::TypedHeader;
use headers::Authorization;
use serde_json::json;
use uuid::Uuid;
use wiremock::matchers::{method, path, query_param, query_param_is_missing};
use wiremock::{Mock, MockServer, ResponseTemplate};

use appointment_cell::handlers::{
    book_appointment, cancel_appointment, list_appointments, AppointmentQueryParams,
    AppointmentScope,
};
use appointment_cell::models::BookAppointmentRequest;
use shared_models::error::AppError;
use shared_utils::clinic_time;
use shared_utils::test_utils::{JwtTestUtils, MockDbResponses, TestConfig, TestUser};

fn booking_request(user: &TestUser, doctor_id: Uuid, date: &str, time: &str) -> BookAppointmentRequest {
    serde_json::from_value(json!({
        "date": date,
        "time": time,
        "doctor_id": doctor_id,
        "user_id": user.id,
        "patient_name": user.name,
    }))
    .expect("request should deserialize")
}

#[tokio::test]
async fn booking_a_free_slot_returns_created() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_db_url(&mock_server.uri());
    let user = TestUser::default();
    let token = JwtTestUtils::create_test_token(&user, &config.jwt_secret, Some(24));
    let doctor_id = Uuid::new_v4();

    // No existing booking on the slot
    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("doctor_id", format!("eq.{}", doctor_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([
            MockDbResponses::appointment_row(
                &Uuid::new_v4().to_string(),
                &user.id,
                &doctor_id.to_string(),
                "2030-06-15",
                "09:00",
            )
        ])))
        .mount(&mock_server)
        .await;

    let request = booking_request(&user, doctor_id, "2030-06-15", "09:00");

    let result = book_appointment(
        State(config.to_arc()),
        TypedHeader(Authorization::bearer(&token).unwrap()),
        Extension(user.to_auth_user()),
        Json(request),
    )
    .await;

    let (status, Json(body)) = result.expect("booking should succeed");
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["time"], "09:00");
    assert_eq!(body["date"], "2030-06-15");
    assert_eq!(body["user_id"], user.id);
}

#[tokio::test]
async fn booking_normalizes_single_digit_hours() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_db_url(&mock_server.uri());
    let user = TestUser::default();
    let token = JwtTestUtils::create_test_token(&user, &config.jwt_secret, Some(24));
    let doctor_id = Uuid::new_v4();

    // The availability check must see the canonical form, not "9:00"
    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("time", "eq.09:00"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([
            MockDbResponses::appointment_row(
                &Uuid::new_v4().to_string(),
                &user.id,
                &doctor_id.to_string(),
                "2030-06-15",
                "09:00",
            )
        ])))
        .mount(&mock_server)
        .await;

    let request = booking_request(&user, doctor_id, "2030-06-15", "9:00");

    let result = book_appointment(
        State(config.to_arc()),
        TypedHeader(Authorization::bearer(&token).unwrap()),
        Extension(user.to_auth_user()),
        Json(request),
    )
    .await;

    let (status, Json(body)) = result.expect("booking should succeed");
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["time"], "09:00");
}

#[tokio::test]
async fn booking_an_occupied_slot_is_a_conflict() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_db_url(&mock_server.uri());
    let user = TestUser::default();
    let token = JwtTestUtils::create_test_token(&user, &config.jwt_secret, Some(24));
    let doctor_id = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockDbResponses::appointment_row(
                &Uuid::new_v4().to_string(),
                &Uuid::new_v4().to_string(),
                &doctor_id.to_string(),
                "2030-06-15",
                "09:00",
            )
        ])))
        .mount(&mock_server)
        .await;

    let request = booking_request(&user, doctor_id, "2030-06-15", "09:00");

    let result = book_appointment(
        State(config.to_arc()),
        TypedHeader(Authorization::bearer(&token).unwrap()),
        Extension(user.to_auth_user()),
        Json(request),
    )
    .await;

    assert_matches!(result.unwrap_err(), AppError::Conflict(_));
}

#[tokio::test]
async fn losing_the_insert_race_is_a_conflict() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_db_url(&mock_server.uri());
    let user = TestUser::default();
    let token = JwtTestUtils::create_test_token(&user, &config.jwt_secret, Some(24));
    let doctor_id = Uuid::new_v4();

    // The slot looks free at check time
    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    // but a concurrent booking trips the unique constraint on insert
    Mock::given(method("POST"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(409).set_body_json(
            MockDbResponses::error_response("duplicate key value violates unique constraint"),
        ))
        .mount(&mock_server)
        .await;

    let request = booking_request(&user, doctor_id, "2030-06-15", "09:00");

    let result = book_appointment(
        State(config.to_arc()),
        TypedHeader(Authorization::bearer(&token).unwrap()),
        Extension(user.to_auth_user()),
        Json(request),
    )
    .await;

    assert_matches!(result.unwrap_err(), AppError::Conflict(_));
}

#[tokio::test]
async fn booking_in_the_past_is_rejected() {
    let config = TestConfig::default();
    let user = TestUser::default();
    let token = JwtTestUtils::create_test_token(&user, &config.jwt_secret, Some(24));

    let request = booking_request(&user, Uuid::new_v4(), "2020-01-01", "09:00");

    let result = book_appointment(
        State(config.to_arc()),
        TypedHeader(Authorization::bearer(&token).unwrap()),
        Extension(user.to_auth_user()),
        Json(request),
    )
    .await;

    assert_matches!(result.unwrap_err(), AppError::ValidationError(_));
}

#[tokio::test]
async fn booking_for_another_patient_requires_admin() {
    let config = TestConfig::default();
    let user = TestUser::default();
    let other = TestUser::default();
    let token = JwtTestUtils::create_test_token(&user, &config.jwt_secret, Some(24));

    let request = booking_request(&other, Uuid::new_v4(), "2030-06-15", "09:00");

    let result = book_appointment(
        State(config.to_arc()),
        TypedHeader(Authorization::bearer(&token).unwrap()),
        Extension(user.to_auth_user()),
        Json(request),
    )
    .await;

    assert_matches!(result.unwrap_err(), AppError::Auth(_));
}

#[tokio::test]
async fn cancelling_an_appointment_deletes_it() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_db_url(&mock_server.uri());
    let user = TestUser::default();
    let token = JwtTestUtils::create_test_token(&user, &config.jwt_secret, Some(24));
    let appointment_id = Uuid::new_v4();

    Mock::given(method("DELETE"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("id", format!("eq.{}", appointment_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockDbResponses::appointment_row(
                &appointment_id.to_string(),
                &user.id,
                &Uuid::new_v4().to_string(),
                "2030-06-15",
                "09:00",
            )
        ])))
        .mount(&mock_server)
        .await;

    let result = cancel_appointment(
        State(config.to_arc()),
        TypedHeader(Authorization::bearer(&token).unwrap()),
        Extension(user.to_auth_user()),
        Path(appointment_id),
    )
    .await;

    let Json(body) = result.expect("cancellation should succeed");
    assert_eq!(body["message"], "Appointment deleted");
}

#[tokio::test]
async fn cancelling_a_missing_appointment_is_not_found() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_db_url(&mock_server.uri());
    let user = TestUser::default();
    let token = JwtTestUtils::create_test_token(&user, &config.jwt_secret, Some(24));

    Mock::given(method("DELETE"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    let result = cancel_appointment(
        State(config.to_arc()),
        TypedHeader(Authorization::bearer(&token).unwrap()),
        Extension(user.to_auth_user()),
        Path(Uuid::new_v4()),
    )
    .await;

    assert_matches!(result.unwrap_err(), AppError::NotFound(_));
}

#[tokio::test]
async fn listing_returns_the_users_appointments() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_db_url(&mock_server.uri());
    let user = TestUser::default();
    let token = JwtTestUtils::create_test_token(&user, &config.jwt_secret, Some(24));
    let user_id: Uuid = user.id.parse().unwrap();

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("user_id", format!("eq.{}", user.id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockDbResponses::appointment_row(
                &Uuid::new_v4().to_string(),
                &user.id,
                &Uuid::new_v4().to_string(),
                "2030-06-20",
                "14:00",
            ),
            MockDbResponses::appointment_row(
                &Uuid::new_v4().to_string(),
                &user.id,
                &Uuid::new_v4().to_string(),
                "2030-06-15",
                "09:00",
            ),
        ])))
        .mount(&mock_server)
        .await;

    let result = list_appointments(
        State(config.to_arc()),
        TypedHeader(Authorization::bearer(&token).unwrap()),
        Extension(user.to_auth_user()),
        Query(AppointmentQueryParams {
            user_id,
            scope: None,
        }),
    )
    .await;

    let Json(body) = result.expect("listing should succeed");
    let rows = body.as_array().expect("response should be an array");
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["date"], "2030-06-20");
    assert_eq!(rows[1]["date"], "2030-06-15");
}

#[tokio::test]
async fn listing_another_patients_appointments_requires_admin() {
    let config = TestConfig::default();
    let user = TestUser::default();
    let token = JwtTestUtils::create_test_token(&user, &config.jwt_secret, Some(24));

    let result = list_appointments(
        State(config.to_arc()),
        TypedHeader(Authorization::bearer(&token).unwrap()),
        Extension(user.to_auth_user()),
        Query(AppointmentQueryParams {
            user_id: Uuid::new_v4(),
            scope: None,
        }),
    )
    .await;

    assert_matches!(result.unwrap_err(), AppError::Auth(_));
}

#[tokio::test]
async fn upcoming_scope_filters_from_today() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_db_url(&mock_server.uri());
    let user = TestUser::default();
    let token = JwtTestUtils::create_test_token(&user, &config.jwt_secret, Some(24));
    let user_id: Uuid = user.id.parse().unwrap();

    let today = clinic_time::today_in_clinic_tz();
    let next_week = (today + Duration::days(7)).format("%Y-%m-%d").to_string();

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("date", format!("gte.{}", today.format("%Y-%m-%d"))))
        .and(query_param("order", "date.asc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockDbResponses::appointment_row(
                &Uuid::new_v4().to_string(),
                &user.id,
                &Uuid::new_v4().to_string(),
                &next_week,
                "09:00",
            ),
        ])))
        .mount(&mock_server)
        .await;

    let result = list_appointments(
        State(config.to_arc()),
        TypedHeader(Authorization::bearer(&token).unwrap()),
        Extension(user.to_auth_user()),
        Query(AppointmentQueryParams {
            user_id,
            scope: Some(AppointmentScope::Upcoming),
        }),
    )
    .await;

    let Json(body) = result.expect("listing should succeed");
    let rows = body.as_array().expect("response should be an array");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["date"], next_week);
}

#[tokio::test]
async fn upcoming_and_past_partition_the_full_listing() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_db_url(&mock_server.uri());
    let user = TestUser::default();
    let token = JwtTestUtils::create_test_token(&user, &config.jwt_secret, Some(24));
    let user_id: Uuid = user.id.parse().unwrap();
    let doctor_id = Uuid::new_v4().to_string();

    let today = clinic_time::today_in_clinic_tz();
    let day = |offset: i64| (today + Duration::days(offset)).format("%Y-%m-%d").to_string();
    let row = |id: &str, date: &str| MockDbResponses::appointment_row(id, &user.id, &doctor_id, date, "09:00");

    // Today belongs to the upcoming half; everything strictly before is past.
    let upcoming_ids = [Uuid::new_v4().to_string(), Uuid::new_v4().to_string()];
    let past_ids = [Uuid::new_v4().to_string(), Uuid::new_v4().to_string()];

    let upcoming_rows = json!([
        row(&upcoming_ids[0], &day(0)),
        row(&upcoming_ids[1], &day(5)),
    ]);
    let past_rows = json!([
        row(&past_ids[0], &day(-1)),
        row(&past_ids[1], &day(-30)),
    ]);

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("date", format!("gte.{}", today.format("%Y-%m-%d"))))
        .respond_with(ResponseTemplate::new(200).set_body_json(&upcoming_rows))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("date", format!("lt.{}", today.format("%Y-%m-%d"))))
        .respond_with(ResponseTemplate::new(200).set_body_json(&past_rows))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .and(query_param_is_missing("date"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            row(&upcoming_ids[1], &day(5)),
            row(&upcoming_ids[0], &day(0)),
            row(&past_ids[0], &day(-1)),
            row(&past_ids[1], &day(-30)),
        ])))
        .mount(&mock_server)
        .await;

    let ids_for = |scope: Option<AppointmentScope>| {
        let config = config.to_arc();
        let token = token.clone();
        let auth_user = user.to_auth_user();
        async move {
            let result = list_appointments(
                State(config),
                TypedHeader(Authorization::bearer(&token).unwrap()),
                Extension(auth_user),
                Query(AppointmentQueryParams { user_id, scope }),
            )
            .await;

            let Json(body) = result.expect("listing should succeed");
            body.as_array()
                .expect("response should be an array")
                .iter()
                .map(|row| row["id"].as_str().unwrap().to_string())
                .collect::<HashSet<String>>()
        }
    };

    let all = ids_for(None).await;
    let upcoming = ids_for(Some(AppointmentScope::Upcoming)).await;
    let past = ids_for(Some(AppointmentScope::Past)).await;

    // Disjoint and exhaustive: the two halves tile the full listing.
    assert!(upcoming.is_disjoint(&past));
    let union: HashSet<String> = upcoming.union(&past).cloned().collect();
    assert_eq!(union, all);
    assert_eq!(upcoming.len() + past.len(), all.len());
}
