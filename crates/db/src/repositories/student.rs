use sqlx::{sqlite::SqliteRow, Row};

use cursus_core::domain::student::Student;

use super::{RepositoryError, StudentRepository};
use crate::DbPool;

pub struct SqlStudentRepository {
    pool: DbPool,
}

impl SqlStudentRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl StudentRepository for SqlStudentRepository {
    async fn find_by_code(&self, code: &str) -> Result<Option<Student>, RepositoryError> {
        let row = sqlx::query(
            "SELECT code_permanent, nom, prenom, programme, statut
             FROM etudiant
             WHERE code_permanent = ?",
        )
        .bind(code)
        .fetch_optional(&self.pool)
        .await?;

        row.map(student_from_row).transpose()
    }
}

fn student_from_row(row: SqliteRow) -> Result<Student, RepositoryError> {
    Ok(Student {
        code_permanent: row.try_get("code_permanent")?,
        nom: row.try_get("nom")?,
        prenom: row.try_get("prenom")?,
        programme: row.try_get("programme")?,
        statut: row.try_get("statut")?,
    })
}
