use axum::{
    routing::{get, post, put},
    Router,
};
use quizroom_backend::middleware::rate_limit::{new_rps_state, rps_middleware};
use quizroom_backend::{
    config::{get_config, init_config},
    database::pool::create_pool,
    middleware, routes, AppState,
};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    init_config()?;
    let config = get_config();

    let pool = create_pool().await?;
    sqlx::migrate!("./migrations").run(&pool).await?;

    let app_state = AppState::new(pool);

    // In-process attempt timers die with the process; the sweeper finalizes
    // whatever they left behind.
    {
        let state = app_state.clone();
        let interval = Duration::from_secs(config.attempt_sweep_interval_secs);
        tokio::spawn(async move {
            loop {
                if let Err(e) = state.attempt_service.expire_overdue().await {
                    tracing::error!("Attempt sweeper error: {:?}", e);
                }
                tokio::time::sleep(interval).await;
            }
        });
    }

    let base_routes = Router::new().route("/health", get(routes::health::health));

    let auth_api = Router::new()
        .route("/api/login", post(routes::auth::login))
        .route("/api/register", post(routes::auth::register))
        .layer(axum::middleware::from_fn_with_state(
            new_rps_state(config.public_rps),
            rps_middleware,
        ));

    let admin_api = Router::new()
        .route(
            "/api/users",
            get(routes::admin::list_users).post(routes::admin::create_user),
        )
        .route(
            "/api/users/:id",
            get(routes::admin::get_user)
                .put(routes::admin::update_user)
                .delete(routes::admin::delete_user),
        )
        .route(
            "/api/users/:id/reset-password",
            post(routes::admin::reset_password),
        )
        .route("/api/stats", get(routes::admin::dashboard_stats))
        .layer(axum::middleware::from_fn(middleware::auth::require_admin))
        .layer(axum::middleware::from_fn_with_state(
            new_rps_state(config.api_rps),
            rps_middleware,
        ));

    let teacher_api = Router::new()
        .route("/api/subjects", post(routes::subject::create_subject))
        .route(
            "/api/subjects/:id",
            get(routes::subject::list_teacher_subjects)
                .put(routes::subject::update_subject)
                .delete(routes::subject::delete_subject),
        )
        .route(
            "/api/subjects/:id/modules",
            post(routes::subject::add_module),
        )
        .route(
            "/api/subjects/:id/modules/:module_id",
            put(routes::subject::rename_module).delete(routes::subject::delete_module),
        )
        .route(
            "/api/subjects/:id/modules/:module_id/quizzes/:quiz_id/toggle",
            put(routes::subject::toggle_quiz),
        )
        .route("/api/quizzes", post(routes::subject::create_quiz))
        .route(
            "/api/scores/subject/:subject_id",
            get(routes::report::scores_for_subject),
        )
        .route(
            "/api/reports/subject/:subject_id",
            get(routes::report::subject_report),
        )
        .layer(axum::middleware::from_fn(middleware::auth::require_teacher))
        .layer(axum::middleware::from_fn_with_state(
            new_rps_state(config.api_rps),
            rps_middleware,
        ));

    let student_api = Router::new()
        .route("/api/subjects", get(routes::student::list_subjects))
        .route("/api/students/join", post(routes::student::join_subject))
        .route("/api/students/leave", post(routes::student::leave_subject))
        .route(
            "/api/students/:student_id/subjects",
            get(routes::student::joined_subjects),
        )
        .route("/api/attempts", post(routes::student::begin_attempt))
        .route(
            "/api/attempts/:attempt_id/submit",
            post(routes::student::submit_attempt),
        )
        .layer(axum::middleware::from_fn(middleware::auth::require_student))
        .layer(axum::middleware::from_fn_with_state(
            new_rps_state(config.api_rps),
            rps_middleware,
        ));

    let shared_api = Router::new()
        .route(
            "/api/subjects/details/:subject_id",
            get(routes::subject::get_subject_details),
        )
        .route(
            "/api/scores/student/:student_id",
            get(routes::report::scores_for_student),
        )
        .route(
            "/api/reports/student/:student_id",
            get(routes::report::student_report),
        )
        .route(
            "/api/account/change-password",
            post(routes::auth::change_password),
        )
        .layer(axum::middleware::from_fn(middleware::auth::require_auth))
        .layer(axum::middleware::from_fn_with_state(
            new_rps_state(config.api_rps),
            rps_middleware,
        ));

    let app = base_routes
        .merge(auth_api)
        .merge(admin_api)
        .merge(teacher_api)
        .merge(student_api)
        .merge(shared_api)
        .with_state(app_state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = config.server_address.parse()?;
    info!("Server listening on {}", addr);
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
