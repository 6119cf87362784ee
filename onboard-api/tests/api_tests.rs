/// Router-level tests for the Onboard API
///
/// Tests without `#[ignore]` never reach the database and run anywhere.
/// The ignored ones need DATABASE_URL:
/// cargo test -p onboard-api --test api_tests -- --ignored --test-threads=1

mod common;

use axum::http::{header, StatusCode};
use common::{Part, TestApp};
use onboard_shared::auth::jwt::{JwtIssuer, TokenSigner};
use serde_json::{json, Value};
use uuid::Uuid;

const MAX_BODY: usize = 32 * 1024 * 1024;

fn fields_of(body: &Value) -> Vec<String> {
    body["details"]
        .as_array()
        .map(|details| {
            details
                .iter()
                .filter_map(|d| d["field"].as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}

#[tokio::test]
async fn test_protected_routes_require_token() {
    let app = common::offline_app(MAX_BODY);

    for (method, uri) in [
        ("GET", "/api/profile"),
        ("PUT", "/api/profile"),
        ("GET", "/api/companies"),
        ("GET", "/api/companies/00000000-0000-0000-0000-000000000000"),
        ("DELETE", "/api/companies/00000000-0000-0000-0000-000000000000"),
    ] {
        let response = app.send(common::json_request(method, uri, None, None)).await;
        let (status, body) = common::read_json(response).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED, "{method} {uri}");
        assert_eq!(body["error"], "unauthorized");
    }
}

#[tokio::test]
async fn test_malformed_and_foreign_tokens_rejected() {
    let app = common::offline_app(MAX_BODY);

    let foreign = JwtIssuer::new("some-other-secret-that-is-32-bytes-long")
        .issue(Uuid::new_v4(), "a@b.com")
        .unwrap();

    for token in ["not-a-jwt", foreign.as_str()] {
        let response = app
            .send(common::json_request("GET", "/api/companies", Some(token), None))
            .await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    let request = axum::http::Request::builder()
        .uri("/api/companies")
        .header(header::AUTHORIZATION, "Basic dXNlcjpwYXNz")
        .body(axum::body::Body::empty())
        .unwrap();
    assert_eq!(app.send(request).await.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_expired_token_rejected() {
    let app = common::offline_app(MAX_BODY);

    let expired = JwtIssuer::with_ttl(common::SECRET, chrono::Duration::minutes(-5))
        .issue(Uuid::new_v4(), "a@b.com")
        .unwrap();

    let response = app
        .send(common::json_request("GET", "/api/profile", Some(&expired), None))
        .await;
    let (status, body) = common::read_json(response).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Token expired");
}

#[tokio::test]
async fn test_register_missing_parts() {
    let app = common::offline_app(MAX_BODY);

    let response = app
        .send(common::register_request(&[Part::Text("termsAccepted", "true".to_string())]))
        .await;
    let (status, body) = common::read_json(response).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");
    assert_eq!(fields_of(&body), vec!["company", "user"]);
}

#[tokio::test]
async fn test_register_invalid_json_part() {
    let app = common::offline_app(MAX_BODY);
    let (_, user) = common::unique_payloads();

    let response = app
        .send(common::register_request(&[
            Part::Text("company", "{not json".to_string()),
            Part::Text("user", user.to_string()),
            Part::Text("termsAccepted", "true".to_string()),
        ]))
        .await;
    let (status, body) = common::read_json(response).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(fields_of(&body), vec!["company"]);
}

#[tokio::test]
async fn test_register_validation_names_fields() {
    let app = common::offline_app(MAX_BODY);
    let (mut company, mut user) = common::unique_payloads();
    company["address"]["zipCode"] = json!("  ");
    user["email"] = json!("not-an-email");

    let response = app
        .send(common::register_request(&common::registration_parts(&company, &user, "false")))
        .await;
    let (status, body) = common::read_json(response).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        fields_of(&body),
        vec!["company.address.zip_code", "terms_accepted", "user.email"]
    );
    assert_eq!(
        std::fs::read_dir(app.uploads.path()).unwrap().count(),
        0,
        "nothing may be written for a rejected registration"
    );
}

#[tokio::test]
async fn test_register_rejects_unusable_file_name() {
    let app = common::offline_app(MAX_BODY);
    let (company, user) = common::unique_payloads();

    let mut parts = common::registration_parts(&company, &user, "true");
    parts.push(Part::File {
        field: "document_scan",
        file_name: "..",
        content_type: Some("application/pdf"),
        data: b"%PDF-1.7".to_vec(),
    });

    let response = app.send(common::register_request(&parts)).await;
    let (status, body) = common::read_json(response).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");
    assert_eq!(fields_of(&body), vec!["document_scan"]);
    assert_eq!(std::fs::read_dir(app.uploads.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn test_register_rejects_values_wider_than_columns() {
    let app = common::offline_app(MAX_BODY);
    let (mut company, user) = common::unique_payloads();
    company["companyName"] = json!("N".repeat(300));
    company["taxId"] = json!("T".repeat(200));

    let response = app
        .send(common::register_request(&common::registration_parts(&company, &user, "true")))
        .await;
    let (status, body) = common::read_json(response).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(fields_of(&body), vec!["company.name", "company.tax_id"]);
}

#[tokio::test]
async fn test_register_body_over_limit_is_413() {
    let app = common::offline_app(1024);
    let (company, user) = common::unique_payloads();

    let mut parts = common::registration_parts(&company, &user, "true");
    parts.push(Part::File {
        field: "document_license",
        file_name: "license.pdf",
        content_type: Some("application/pdf"),
        data: vec![b'x'; 8 * 1024],
    });

    let response = app.send(common::register_request(&parts)).await;
    let (status, body) = common::read_json(response).await;

    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(body["error"], "payload_too_large");
}

#[tokio::test]
async fn test_login_validation() {
    let app = common::offline_app(MAX_BODY);

    let response = app
        .send(common::json_request(
            "POST",
            "/api/login",
            None,
            Some(json!({ "email": "nope", "password": "" })),
        ))
        .await;
    let (status, body) = common::read_json(response).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(fields_of(&body), vec!["email", "password"]);
}

#[tokio::test]
async fn test_health_reports_degraded_without_database() {
    let app = common::offline_app(MAX_BODY);

    let response = app.send(common::json_request("GET", "/health", None, None)).await;
    assert!(response.headers().get(header::X_CONTENT_TYPE_OPTIONS).is_some());

    let (status, body) = common::read_json(response).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "degraded");
    assert_eq!(body["database"], "disconnected");
}

#[tokio::test]
async fn test_unknown_route_is_404() {
    let app = common::offline_app(MAX_BODY);
    let response = app.send(common::json_request("GET", "/api/nothing", None, None)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// Database-backed flows

async fn register(
    app: &TestApp,
    company: &Value,
    user: &Value,
    files: Vec<Part<'static>>,
) -> (StatusCode, Value) {
    let mut parts = common::registration_parts(company, user, "true");
    parts.extend(files);
    common::read_json(app.send(common::register_request(&parts)).await).await
}

#[tokio::test]
#[ignore]
async fn test_register_then_use_token() {
    let app = common::database_app().await;
    let (company, user) = common::unique_payloads();

    let (status, body) = register(
        &app,
        &company,
        &user,
        vec![Part::File {
            field: "document_license",
            file_name: "license.pdf",
            content_type: Some("application/pdf"),
            data: b"%PDF-1.7 test".to_vec(),
        }],
    )
    .await;

    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["message"], "Registration successful");
    assert!(body.get("warning").is_none());
    assert!(body["user"].get("password_hash").is_none());
    assert_eq!(body["company"]["tax_id"], company["taxId"]);
    assert_eq!(body["company"]["address"]["zip_code"], "62701");
    assert_eq!(body["company"]["documents"][0]["file_name"], "license.pdf");
    assert_eq!(body["company"]["documents"][0]["file_size"], 13);

    let token = body["token"].as_str().unwrap().to_string();
    let company_id = body["company"]["id"].as_str().unwrap().to_string();

    let (status, profile) = common::read_json(
        app.send(common::json_request("GET", "/api/profile", Some(&token), None))
            .await,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(profile["company"]["id"], company_id.as_str());

    let (status, detail) = common::read_json(
        app.send(common::json_request(
            "GET",
            &format!("/api/companies/{}", company_id),
            Some(&token),
            None,
        ))
        .await,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(detail["documents"].as_array().unwrap().len(), 1);
}

#[tokio::test]
#[ignore]
async fn test_duplicate_registration_is_409() {
    let app = common::database_app().await;
    let (company, user) = common::unique_payloads();

    let (status, _) = register(&app, &company, &user, Vec::new()).await;
    assert_eq!(status, StatusCode::CREATED);

    let (_, other_user) = common::unique_payloads();
    let (status, body) = register(&app, &company, &other_user, Vec::new()).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["message"].as_str().unwrap().contains("tax_id"));

    let (other_company, _) = common::unique_payloads();
    let (status, body) = register(&app, &other_company, &user, Vec::new()).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["message"].as_str().unwrap().contains("email"));
}

#[tokio::test]
#[ignore]
async fn test_login_and_profile_update() {
    let app = common::database_app().await;
    let (company, user) = common::unique_payloads();
    register(&app, &company, &user, Vec::new()).await;

    let (status, _) = common::read_json(
        app.send(common::json_request(
            "POST",
            "/api/login",
            None,
            Some(json!({ "email": user["email"], "password": "wrong password" })),
        ))
        .await,
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, login) = common::read_json(
        app.send(common::json_request(
            "POST",
            "/api/login",
            None,
            Some(json!({ "email": user["email"].as_str().unwrap().to_uppercase(), "password": user["password"] })),
        ))
        .await,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let token = login["token"].as_str().unwrap().to_string();

    let (status, updated) = common::read_json(
        app.send(common::json_request(
            "PUT",
            "/api/profile",
            Some(&token),
            Some(json!({ "jobTitle": " CEO " })),
        ))
        .await,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["job_title"], "CEO");
    assert_eq!(updated["first_name"], "Ada");

    let (status, _) = common::read_json(
        app.send(common::json_request(
            "PUT",
            "/api/profile",
            Some(&token),
            Some(json!({ "phone": "   " })),
        ))
        .await,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
#[ignore]
async fn test_listing_and_delete_permissions() {
    let app = common::database_app().await;

    let (company_a, user_a) = common::unique_payloads();
    let (_, body_a) = register(&app, &company_a, &user_a, Vec::new()).await;
    let token_a = body_a["token"].as_str().unwrap().to_string();
    let id_a = body_a["company"]["id"].as_str().unwrap().to_string();

    let (company_b, mut user_b) = common::unique_payloads();
    user_b["role"] = json!("employee");
    let (_, body_b) = register(&app, &company_b, &user_b, Vec::new()).await;
    let token_b = body_b["token"].as_str().unwrap().to_string();
    let id_b = body_b["company"]["id"].as_str().unwrap().to_string();

    let name = company_a["companyName"].as_str().unwrap();
    let (status, list) = common::read_json(
        app.send(common::json_request(
            "GET",
            &format!("/api/companies?search={}&limit=5", name.replace(' ', "%20")),
            Some(&token_b),
            None,
        ))
        .await,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list["total"], 1);
    assert_eq!(list["limit"], 5);
    assert_eq!(list["page"], 1);
    assert_eq!(list["companies"][0]["users"][0]["email"], user_a["email"]);

    // Not an admin of A
    let delete_a_as_b = common::json_request("DELETE", &format!("/api/companies/{}", id_a), Some(&token_b), None);
    assert_eq!(app.send(delete_a_as_b).await.status(), StatusCode::FORBIDDEN);

    // Member of B but only an employee
    let delete_b_as_b = common::json_request("DELETE", &format!("/api/companies/{}", id_b), Some(&token_b), None);
    assert_eq!(app.send(delete_b_as_b).await.status(), StatusCode::FORBIDDEN);

    let delete_a = common::json_request("DELETE", &format!("/api/companies/{}", id_a), Some(&token_a), None);
    assert_eq!(app.send(delete_a).await.status(), StatusCode::NO_CONTENT);

    let get_a = common::json_request("GET", &format!("/api/companies/{}", id_a), Some(&token_b), None);
    assert_eq!(app.send(get_a).await.status(), StatusCode::NOT_FOUND);

    // The soft delete also removed the admin; a repeat is still a 404
    let delete_again = common::json_request("DELETE", &format!("/api/companies/{}", id_a), Some(&token_a), None);
    assert_eq!(app.send(delete_again).await.status(), StatusCode::NOT_FOUND);
}
