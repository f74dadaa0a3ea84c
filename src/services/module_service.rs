use crate::error::{Error, Result};
use crate::models::module::Module;
use crate::models::quiz::Quiz;
use serde_json::Value as JsonValue;
use sqlx::PgPool;
use uuid::Uuid;

/// Applies structural edits to the module list embedded in a subject row.
///
/// Every mutation is a read-modify-write over the whole `modules` JSONB
/// column, guarded by the subject's `version` token: a write whose base
/// version went stale is rejected with a conflict instead of silently
/// overwriting a sibling edit.
#[derive(Clone)]
pub struct ModuleService {
    pool: PgPool,
}

struct SubjectDocument {
    modules: Vec<Module>,
    version: i64,
}

impl ModuleService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn load_document(&self, subject_id: Uuid) -> Result<SubjectDocument> {
        let row: Option<(JsonValue, i64)> =
            sqlx::query_as("SELECT modules, version FROM subjects WHERE id = $1")
                .bind(subject_id)
                .fetch_optional(&self.pool)
                .await?;
        let (modules_json, version) =
            row.ok_or_else(|| Error::NotFound(format!("Subject {} not found", subject_id)))?;
        let modules: Vec<Module> = serde_json::from_value(modules_json)?;
        Ok(SubjectDocument { modules, version })
    }

    async fn store_document(
        &self,
        subject_id: Uuid,
        modules: &[Module],
        base_version: i64,
    ) -> Result<()> {
        let modules_json = serde_json::to_value(modules)?;
        let result = sqlx::query(
            "UPDATE subjects SET modules = $1, version = version + 1 \
             WHERE id = $2 AND version = $3",
        )
        .bind(modules_json)
        .bind(subject_id)
        .bind(base_version)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            tracing::warn!(
                subject_id = %subject_id,
                base_version,
                "Stale subject write rejected"
            );
            return Err(Error::Conflict(
                "Subject was modified concurrently; reload and retry".to_string(),
            ));
        }
        Ok(())
    }

    pub async fn add_module(&self, subject_id: Uuid, name: &str) -> Result<Module> {
        let mut doc = self.load_document(subject_id).await?;
        let module = Module {
            id: Uuid::new_v4(),
            name: name.to_string(),
            quizzes: Vec::new(),
        };
        doc.modules.push(module.clone());
        self.store_document(subject_id, &doc.modules, doc.version)
            .await?;
        Ok(module)
    }

    pub async fn rename_module(
        &self,
        subject_id: Uuid,
        module_id: Uuid,
        new_name: &str,
    ) -> Result<()> {
        let mut doc = self.load_document(subject_id).await?;
        rename_module_in(&mut doc.modules, module_id, new_name)?;
        self.store_document(subject_id, &doc.modules, doc.version)
            .await
    }

    pub async fn delete_module(&self, subject_id: Uuid, module_id: Uuid) -> Result<()> {
        let mut doc = self.load_document(subject_id).await?;
        delete_module_from(&mut doc.modules, module_id)?;
        self.store_document(subject_id, &doc.modules, doc.version)
            .await
    }

    /// Appends a quiz to a module's history. The quiz lands inactive no
    /// matter what the caller set; activation is a separate, deliberate
    /// toggle.
    pub async fn append_quiz(
        &self,
        subject_id: Uuid,
        module_id: Uuid,
        mut quiz: Quiz,
    ) -> Result<Quiz> {
        quiz.is_active = false;
        let mut doc = self.load_document(subject_id).await?;
        append_quiz_to(&mut doc.modules, module_id, quiz.clone())?;
        self.store_document(subject_id, &doc.modules, doc.version)
            .await?;
        Ok(quiz)
    }

    /// Flips `is_active` on the matching quiz; returns the new state.
    pub async fn toggle_quiz_active(
        &self,
        subject_id: Uuid,
        module_id: Uuid,
        quiz_id: Uuid,
    ) -> Result<bool> {
        let mut doc = self.load_document(subject_id).await?;
        let now_active = toggle_quiz_in(&mut doc.modules, module_id, quiz_id)?;
        self.store_document(subject_id, &doc.modules, doc.version)
            .await?;
        Ok(now_active)
    }
}

fn find_module<'a>(modules: &'a mut [Module], module_id: Uuid) -> Result<&'a mut Module> {
    modules
        .iter_mut()
        .find(|m| m.id == module_id)
        .ok_or_else(|| Error::NotFound(format!("Module {} not found", module_id)))
}

fn rename_module_in(modules: &mut [Module], module_id: Uuid, new_name: &str) -> Result<()> {
    let module = find_module(modules, module_id)?;
    module.name = new_name.to_string();
    Ok(())
}

fn delete_module_from(modules: &mut Vec<Module>, module_id: Uuid) -> Result<()> {
    let before = modules.len();
    modules.retain(|m| m.id != module_id);
    if modules.len() == before {
        return Err(Error::NotFound(format!("Module {} not found", module_id)));
    }
    Ok(())
}

fn append_quiz_to(modules: &mut [Module], module_id: Uuid, quiz: Quiz) -> Result<()> {
    let module = find_module(modules, module_id)?;
    module.quizzes.push(quiz);
    Ok(())
}

fn toggle_quiz_in(modules: &mut [Module], module_id: Uuid, quiz_id: Uuid) -> Result<bool> {
    let module = find_module(modules, module_id)?;
    let quiz = module
        .quizzes
        .iter_mut()
        .find(|q| q.id == quiz_id)
        .ok_or_else(|| Error::NotFound(format!("Quiz {} not found", quiz_id)))?;
    quiz.is_active = !quiz.is_active;
    Ok(quiz.is_active)
}
