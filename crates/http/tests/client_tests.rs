//! Integration tests for the hrdesk HTTP client

use hrdesk_core::{ActivationRequest, LoginRequest, ProfileUpdateRequest, RefreshRequest};
use hrdesk_http::client::HrClient;
use hrdesk_http::client::error::ClientError;
use hrdesk_http::client::interceptor::{EnvelopeInterceptor, LogNotifier};
use hrdesk_http::client::users::UserQuery;
use serde_json::json;
use std::sync::Arc;
use wiremock::matchers::{body_json, header, method, path, query_param, query_param_is_missing};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_client_builder() {
    let client = HrClient::builder()
        .base_url("http://localhost:8080/")
        .build()
        .unwrap();

    assert_eq!(client.base_url(), "http://localhost:8080");
}

#[tokio::test]
async fn test_client_builder_requires_base_url() {
    let result = HrClient::builder().build();
    assert!(matches!(result, Err(ClientError::Configuration(_))));
}

#[tokio::test]
async fn test_login_maps_camel_case_token() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .and(body_json(json!({"email": "hr@acme.test", "password": "s3cret"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "token": "access-1",
            "tokenType": "bearer",
            "expiresIn": 3600,
            "refresh_token": "refresh-1",
            "user": {"id": 1, "firstName": "Nadia", "roles": ["ADMIN"]}
        })))
        .mount(&mock_server)
        .await;

    let client = HrClient::new(mock_server.uri()).unwrap();
    let response = client
        .login(&LoginRequest {
            email: "hr@acme.test".into(),
            password: "s3cret".into(),
        })
        .await
        .unwrap();

    assert_eq!(response.token.access_token, "access-1");
    assert_eq!(response.token.expires_in, Some(3600));
    assert_eq!(response.token.refresh_token.as_deref(), Some("refresh-1"));
    assert_eq!(response.token.bearer().as_deref(), Some("Bearer access-1"));
    assert!(response.user.unwrap().has_role("admin"));
}

#[tokio::test]
async fn test_refresh_sends_refresh_token() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/auth/refresh"))
        .and(body_json(json!({"refresh_token": "refresh-1"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "access-2",
            "token_type": "Bearer",
            "expires_in": 900
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = HrClient::new(mock_server.uri()).unwrap();
    let token = client
        .refresh(&RefreshRequest {
            refresh_token: Some("refresh-1".into()),
        })
        .await
        .unwrap();

    assert_eq!(token.access_token, "access-2");
    assert_eq!(token.expires_in, Some(900));
}

#[tokio::test]
async fn test_status_mapping() {
    let mock_server = MockServer::start().await;

    for (status, id) in [(400, 1), (401, 2), (403, 3), (404, 4), (500, 5)] {
        Mock::given(method("GET"))
            .and(path(format!("/api/users/{id}")))
            .respond_with(ResponseTemplate::new(status).set_body_string("nope"))
            .mount(&mock_server)
            .await;
    }

    let client = HrClient::new(mock_server.uri()).unwrap();

    assert!(matches!(
        client.get_user(1).await,
        Err(ClientError::BadRequest(_))
    ));
    let unauthorized = client.get_user(2).await.unwrap_err();
    assert!(unauthorized.is_auth_rejected());
    assert_eq!(unauthorized.status(), Some(401));
    assert!(client.get_user(3).await.unwrap_err().is_auth_rejected());
    assert!(matches!(
        client.get_user(4).await,
        Err(ClientError::NotFound(_))
    ));
    assert!(matches!(
        client.get_user(5).await,
        Err(ClientError::ServerError { status: 500, .. })
    ));
}

#[tokio::test]
async fn test_list_users_query() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/users"))
        .and(query_param("page", "2"))
        .and(query_param("size", "25"))
        .and(query_param("search", "ben"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "content": [{
                "id": 9,
                "firstName": "Sami",
                "lastName": "Ben Ali",
                "email": "sami@acme.test",
                "registrationPending": true
            }],
            "totalElements": 51,
            "totalPages": 3,
            "size": 25,
            "number": 2
        })))
        .mount(&mock_server)
        .await;

    let client = HrClient::new(mock_server.uri()).unwrap();
    let page = client
        .list_users(&UserQuery {
            page: 2,
            size: 25,
            search: Some("ben".into()),
        })
        .await
        .unwrap();

    assert_eq!(page.total_elements, 51);
    assert_eq!(page.content.len(), 1);
    assert_eq!(page.content[0].status(), hrdesk_core::UserStatus::Pending);
}

#[tokio::test]
async fn test_user_stats_and_actions() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/users/stats"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "pending": 2, "active": 40, "disabled": 3, "locked": 1
        })))
        .mount(&mock_server)
        .await;

    for action in ["disable", "enable", "reset-password"] {
        Mock::given(method("POST"))
            .and(path(format!("/api/users/7/{action}")))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&mock_server)
            .await;
    }
    for action in ["approve-registration", "reject-registration"] {
        Mock::given(method("POST"))
            .and(path(format!("/api/auth/{action}/8")))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&mock_server)
            .await;
    }

    let client = HrClient::new(mock_server.uri()).unwrap();

    let stats = client.user_stats().await.unwrap();
    assert_eq!(stats.active, 40);

    client.disable_user(7).await.unwrap();
    client.enable_user(7).await.unwrap();
    client.reset_password(7).await.unwrap();
    client.approve_registration(8).await.unwrap();
    client.reject_registration(8).await.unwrap();
}

#[tokio::test]
async fn test_update_user_and_profile() {
    let mock_server = MockServer::start().await;

    Mock::given(method("PUT"))
        .and(path("/api/users/7"))
        .and(body_json(json!({"jobTitle": "Payroll lead"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 7,
            "firstName": "Lina",
            "lastName": "Trabelsi",
            "email": "lina@acme.test",
            "jobTitle": "Payroll lead",
            "enabled": true,
            "active": true,
            "createdAt": "2024-03-01T09:30:00"
        })))
        .mount(&mock_server)
        .await;

    Mock::given(method("PATCH"))
        .and(path("/api/users/7/profile"))
        .and(body_json(json!({"phone": "+216 20 000 000"})))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = HrClient::new(mock_server.uri()).unwrap();

    let details = client
        .update_user(7, &json!({"jobTitle": "Payroll lead"}))
        .await
        .unwrap();
    assert_eq!(details.summary.job_title.as_deref(), Some("Payroll lead"));
    assert!(details.created_at.is_some());

    client
        .update_profile(
            7,
            &ProfileUpdateRequest {
                phone: Some("+216 20 000 000".into()),
                ..ProfileUpdateRequest::default()
            },
        )
        .await
        .unwrap();
}

#[tokio::test]
async fn test_activation_endpoints() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/auth/validate-activation-token/tok-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "valid": true,
            "email": "new@acme.test",
            "firstName": "Youssef"
        })))
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/auth/activate"))
        .and(body_json(json!({
            "token": "tok-1",
            "username": "youssef",
            "newPassword": "Passw0rd!",
            "confirmPassword": "Passw0rd!"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "message": "Account activated"
        })))
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/auth/resend-activation"))
        .and(query_param("email", "new@acme.test"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "message": "Email sent"
        })))
        .mount(&mock_server)
        .await;

    let client = HrClient::new(mock_server.uri()).unwrap();

    let status = client.validate_activation_token("tok-1").await.unwrap();
    assert!(status.valid);
    assert_eq!(status.email.as_deref(), Some("new@acme.test"));

    let activated = client
        .activate_account(&ActivationRequest::new("tok-1", "youssef", "Passw0rd!"))
        .await
        .unwrap();
    assert_eq!(activated.message.as_deref(), Some("Account activated"));

    let resent = client
        .resend_activation_email("new@acme.test")
        .await
        .unwrap();
    assert_eq!(resent.message.as_deref(), Some("Email sent"));
}

#[tokio::test]
async fn test_menu_unwraps_envelope() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/auth/me/menu"))
        .and(query_param_is_missing("page"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "menu": [
                {"route": "/users", "name": "Users", "type": "link", "icon": "people"},
                {"route": "/settings", "name": "Settings", "children": [
                    {"route": "/settings/roles", "name": "Roles"}
                ]}
            ]
        })))
        .mount(&mock_server)
        .await;

    let client = HrClient::new(mock_server.uri()).unwrap();
    let menu = client.menu().await.unwrap();

    assert_eq!(menu.len(), 2);
    assert_eq!(menu[0].kind.as_deref(), Some("link"));
    assert_eq!(menu[1].children[0].route, "/settings/roles");
}

#[tokio::test]
async fn test_envelope_error_fails_call() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/users/stats"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "code": 42,
            "msg": "Statistics unavailable"
        })))
        .mount(&mock_server)
        .await;

    let client = HrClient::builder()
        .base_url(mock_server.uri())
        .interceptor(Arc::new(EnvelopeInterceptor::new(Arc::new(LogNotifier))))
        .build()
        .unwrap();

    let err = client.user_stats().await.unwrap_err();
    assert!(matches!(err, ClientError::Api { code: 42, ref message } if message == "Statistics unavailable"));
}

#[tokio::test]
async fn test_logout_sends_empty_object() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/auth/logout"))
        .and(header("content-type", "application/json"))
        .and(body_json(json!({})))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = HrClient::new(mock_server.uri()).unwrap();
    client.logout().await.unwrap();
}
