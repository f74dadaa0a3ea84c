pub mod attempt_service;
pub mod enrollment_service;
pub mod module_service;
pub mod report_service;
pub mod subject_service;
pub mod user_service;
