use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use sqlx::FromRow;
use uuid::Uuid;

use crate::models::module::Module;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Subject {
    pub id: Uuid,
    pub name: String,
    pub code: String,
    pub teacher_id: Uuid,
    pub modules: JsonValue,
    pub version: i64,
    pub created_at: DateTime<Utc>,
}

impl Subject {
    pub fn module_list(&self) -> Vec<Module> {
        serde_json::from_value(self.modules.clone()).unwrap_or_default()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct SubjectWithTeacher {
    pub id: Uuid,
    pub name: String,
    pub code: String,
    pub teacher_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct JoinedSubject {
    pub id: Uuid,
    pub name: String,
    pub code: String,
    pub teacher_name: String,
    pub modules: JsonValue,
}
