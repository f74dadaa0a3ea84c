use chrono::Utc;
use uuid::Uuid;

use quizroom_backend::dto::auth_dto::RegisterRequest;
use quizroom_backend::error::Error;
use quizroom_backend::models::quiz::Quiz;
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

async fn seed_subject(state: &AppState) -> Uuid {
    let tag = Uuid::new_v4();
    let teacher = state
        .user_service
        .create_user(RegisterRequest {
            name: "Teacher".to_string(),
            email: format!("teacher_{}@example.com", tag),
            password: "hunter2hunter2".to_string(),
            role: Role::Teacher,
            roll: None,
        })
        .await
        .expect("teacher");
    state
        .subject_service
        .create_subject(teacher.id, "Maths", &format!("MAT-{}", tag.simple()))
        .await
        .expect("subject")
        .id
}

fn empty_quiz(is_active: bool) -> Quiz {
    Quiz {
        id: Uuid::new_v4(),
        questions: Vec::new(),
        created_at: Utc::now(),
        time_limit_minutes: 5,
        is_active,
    }
}

#[tokio::test]
async fn module_lifecycle_preserves_siblings() {
    let state = setup_state().await;
    let subject_id = seed_subject(&state).await;

    let algebra = state
        .module_service
        .add_module(subject_id, "Algebra")
        .await
        .unwrap();
    let geometry = state
        .module_service
        .add_module(subject_id, "Geometry")
        .await
        .unwrap();
    let calculus = state
        .module_service
        .add_module(subject_id, "Calculus")
        .await
        .unwrap();

    state
        .module_service
        .rename_module(subject_id, geometry.id, "Euclidean Geometry")
        .await
        .unwrap();
    state
        .module_service
        .delete_module(subject_id, algebra.id)
        .await
        .unwrap();

    let subject = state.subject_service.get_subject(subject_id).await.unwrap();
    let modules = subject.module_list();
    assert_eq!(modules.len(), 2);
    assert_eq!(modules[0].id, geometry.id);
    assert_eq!(modules[0].name, "Euclidean Geometry");
    assert_eq!(modules[1].id, calculus.id);
}

#[tokio::test]
async fn appended_quizzes_accumulate_and_land_inactive() {
    let state = setup_state().await;
    let subject_id = seed_subject(&state).await;
    let module = state
        .module_service
        .add_module(subject_id, "Trigonometry")
        .await
        .unwrap();

    let first = state
        .module_service
        .append_quiz(subject_id, module.id, empty_quiz(false))
        .await
        .unwrap();
    // Even a quiz submitted as active is stored inactive.
    let second = state
        .module_service
        .append_quiz(subject_id, module.id, empty_quiz(true))
        .await
        .unwrap();
    assert!(!second.is_active);

    let subject = state.subject_service.get_subject(subject_id).await.unwrap();
    let modules = subject.module_list();
    let quizzes = &modules[0].quizzes;
    assert_eq!(quizzes.len(), 2);
    assert_eq!(modules[0].current_quiz().unwrap().id, second.id);
    assert_eq!(quizzes[0].id, first.id);
    assert!(quizzes.iter().all(|q| !q.is_active));
}

#[tokio::test]
async fn toggle_round_trips_is_active() {
    let state = setup_state().await;
    let subject_id = seed_subject(&state).await;
    let module = state
        .module_service
        .add_module(subject_id, "Statistics")
        .await
        .unwrap();
    let quiz = state
        .module_service
        .append_quiz(subject_id, module.id, empty_quiz(false))
        .await
        .unwrap();

    let on = state
        .module_service
        .toggle_quiz_active(subject_id, module.id, quiz.id)
        .await
        .unwrap();
    assert!(on);
    let off = state
        .module_service
        .toggle_quiz_active(subject_id, module.id, quiz.id)
        .await
        .unwrap();
    assert!(!off);
}

#[tokio::test]
async fn missing_targets_are_not_found() {
    let state = setup_state().await;
    let subject_id = seed_subject(&state).await;
    let module = state
        .module_service
        .add_module(subject_id, "Logic")
        .await
        .unwrap();

    let err = state
        .module_service
        .add_module(Uuid::new_v4(), "Orphan")
        .await
        .unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));

    let err = state
        .module_service
        .rename_module(subject_id, Uuid::new_v4(), "Nope")
        .await
        .unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));

    let err = state
        .module_service
        .toggle_quiz_active(subject_id, module.id, Uuid::new_v4())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));
}

#[tokio::test]
async fn stale_version_writes_are_rejected() {
    let state = setup_state().await;
    let subject_id = seed_subject(&state).await;

    let before = state.subject_service.get_subject(subject_id).await.unwrap();
    // Another writer lands first.
    state
        .module_service
        .add_module(subject_id, "Sets")
        .await
        .unwrap();

    // A write based on the stale version matches no rows.
    let result = sqlx::query(
        "UPDATE subjects SET modules = '[]'::jsonb, version = version + 1 \
         WHERE id = $1 AND version = $2",
    )
    .bind(subject_id)
    .bind(before.version)
    .execute(&state.pool)
    .await
    .unwrap();
    assert_eq!(result.rows_affected(), 0);

    // The concurrent module survived.
    let after = state.subject_service.get_subject(subject_id).await.unwrap();
    assert_eq!(after.module_list().len(), 1);
    assert_eq!(after.version, before.version + 1);
}
