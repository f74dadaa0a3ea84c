pub mod config;
pub mod database;
pub mod dto;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod utils;

use crate::services::{
    attempt_service::AttemptService, enrollment_service::EnrollmentService,
    module_service::ModuleService, report_service::ReportService,
    subject_service::SubjectService, user_service::UserService,
};
use sqlx::PgPool;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub user_service: UserService,
    pub subject_service: SubjectService,
    pub module_service: ModuleService,
    pub attempt_service: AttemptService,
    pub report_service: ReportService,
    pub enrollment_service: EnrollmentService,
}

impl AppState {
    pub fn new(pool: PgPool) -> Self {
        let user_service = UserService::new(pool.clone());
        let subject_service = SubjectService::new(pool.clone());
        let module_service = ModuleService::new(pool.clone());
        let attempt_service = AttemptService::new(pool.clone());
        let report_service = ReportService::new(pool.clone());
        let enrollment_service = EnrollmentService::new(pool.clone());

        Self {
            pool,
            user_service,
            subject_service,
            module_service,
            attempt_service,
            report_service,
            enrollment_service,
        }
    }
}
