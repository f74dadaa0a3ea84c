use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    routing::post,
    Router,
};
use serde_json::{json, Value as JsonValue};
use tower::ServiceExt;
use uuid::Uuid;

use quizroom_backend::dto::auth_dto::RegisterRequest;
use quizroom_backend::error::Error;
use quizroom_backend::models::user::Role;
use quizroom_backend::AppState;

async fn setup_state() -> AppState {
    dotenvy::dotenv().ok();
    std::env::set_var("SERVER_ADDRESS", "127.0.0.1:0");
    std::env::set_var("JWT_SECRET", "test_secret_key");
    std::env::set_var("TOKEN_TTL_HOURS", "2");
    std::env::set_var("API_RPS", "100");
    std::env::set_var("PUBLIC_RPS", "100");
    std::env::set_var("ATTEMPT_SWEEP_INTERVAL_SECS", "60");
    let _ = quizroom_backend::config::init_config();

    let pool = quizroom_backend::database::pool::create_pool()
        .await
        .expect("pool");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("migrations");
    AppState::new(pool)
}

fn auth_router(state: AppState) -> Router {
    Router::new()
        .route("/api/login", post(quizroom_backend::routes::auth::login))
        .route("/api/register", post(quizroom_backend::routes::auth::register))
        .with_state(state)
}

async fn post_json(app: &Router, uri: &str, body: JsonValue) -> (StatusCode, JsonValue) {
    let req = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = to_bytes(resp.into_body(), 1024 * 1024).await.unwrap();
    let body: JsonValue = serde_json::from_slice(&bytes).unwrap_or(JsonValue::Null);
    (status, body)
}

#[tokio::test]
async fn login_checks_credentials_and_role() {
    let state = setup_state().await;
    let app = auth_router(state.clone());
    let email = format!("login_{}@example.com", Uuid::new_v4());

    let (status, _body) = post_json(
        &app,
        "/api/register",
        json!({
            "name": "Student One",
            "email": email,
            "password": "hunter2hunter2",
            "role": "student",
            "roll": "21CS042",
        }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    // Correct credentials against the student dashboard.
    let (status, body) = post_json(
        &app,
        "/api/login",
        json!({ "email": email, "password": "hunter2hunter2", "role": "student" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["token"].as_str().is_some());
    assert_eq!(body["user"]["email"], email.as_str());
    assert!(body["user"].get("password_hash").is_none());

    // Same credentials, wrong dashboard.
    let (status, _body) = post_json(
        &app,
        "/api/login",
        json!({ "email": email, "password": "hunter2hunter2", "role": "teacher" }),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // Wrong password.
    let (status, _body) = post_json(
        &app,
        "/api/login",
        json!({ "email": email, "password": "wrong-password", "role": "student" }),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn duplicate_email_conflicts() {
    let state = setup_state().await;
    let app = auth_router(state.clone());
    let email = format!("dup_{}@example.com", Uuid::new_v4());
    let payload = json!({
        "name": "First",
        "email": email,
        "password": "hunter2hunter2",
        "role": "teacher",
    });

    let (status, _body) = post_json(&app, "/api/register", payload.clone()).await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, _body) = post_json(&app, "/api/register", payload).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn admin_accounts_cannot_self_register() {
    let state = setup_state().await;
    let app = auth_router(state);
    let (status, _body) = post_json(
        &app,
        "/api/register",
        json!({
            "name": "Mallory",
            "email": format!("admin_{}@example.com", Uuid::new_v4()),
            "password": "hunter2hunter2",
            "role": "admin",
        }),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn reset_password_rotates_credentials() {
    let state = setup_state().await;
    let user = state
        .user_service
        .create_user(RegisterRequest {
            name: "Reset Me".to_string(),
            email: format!("reset_{}@example.com", Uuid::new_v4()),
            password: "old-password-1".to_string(),
            role: Role::Student,
            roll: None,
        })
        .await
        .unwrap();

    let new_password = state.user_service.reset_password(user.id).await.unwrap();
    assert_eq!(new_password.len(), 8);

    let err = state
        .user_service
        .authenticate(&user.email, "old-password-1", Role::Student)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Unauthorized(_)));

    let logged_in = state
        .user_service
        .authenticate(&user.email, &new_password, Role::Student)
        .await
        .unwrap();
    assert_eq!(logged_in.id, user.id);
}

#[tokio::test]
async fn enrollment_join_and_leave() {
    let state = setup_state().await;
    let tag = Uuid::new_v4();
    let teacher = state
        .user_service
        .create_user(RegisterRequest {
            name: "Teacher".to_string(),
            email: format!("t_{}@example.com", tag),
            password: "hunter2hunter2".to_string(),
            role: Role::Teacher,
            roll: None,
        })
        .await
        .unwrap();
    let student = state
        .user_service
        .create_user(RegisterRequest {
            name: "Student".to_string(),
            email: format!("s_{}@example.com", tag),
            password: "hunter2hunter2".to_string(),
            role: Role::Student,
            roll: Some("21CS001".to_string()),
        })
        .await
        .unwrap();
    let code = format!("HIS-{}", tag.simple());
    let subject = state
        .subject_service
        .create_subject(teacher.id, "History", &code)
        .await
        .unwrap();

    let err = state
        .enrollment_service
        .join_by_code(student.id, "NO-SUCH-CODE")
        .await
        .unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));

    let joined = state
        .enrollment_service
        .join_by_code(student.id, &code)
        .await
        .unwrap();
    assert_eq!(joined.id, subject.id);

    let err = state
        .enrollment_service
        .join_by_code(student.id, &code)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Conflict(_)));

    let subjects = state
        .enrollment_service
        .joined_subjects(student.id)
        .await
        .unwrap();
    assert_eq!(subjects.len(), 1);
    assert_eq!(subjects[0].teacher_name, teacher.name);

    state
        .enrollment_service
        .leave_subject(student.id, subject.id)
        .await
        .unwrap();
    let err = state
        .enrollment_service
        .leave_subject(student.id, subject.id)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));
}
