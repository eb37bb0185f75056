use sqlx::{sqlite::SqliteRow, Row};

use cursus_core::domain::course::{Course, Sigle};
use cursus_core::domain::curriculum::{CurriculumEntry, Offering};
use cursus_core::domain::term::Term;

use super::course::{course_from_row, offering_from_row};
use super::{CurriculumRepository, OfferingRepository, RepositoryError};
use crate::DbPool;

pub struct SqlCurriculumRepository {
    pool: DbPool,
}

impl SqlCurriculumRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl CurriculumRepository for SqlCurriculumRepository {
    async fn find_entry(
        &self,
        programme: &str,
        sigle: &Sigle,
    ) -> Result<Option<CurriculumEntry>, RepositoryError> {
        let row = sqlx::query(
            "SELECT programme, sigle, trimestre_plan
             FROM plan_formation
             WHERE programme = ? AND sigle = ?",
        )
        .bind(programme)
        .bind(sigle.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(entry_from_row).transpose()
    }

    async fn list_courses(&self, programme: &str) -> Result<Vec<Course>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT c.sigle, c.titre, c.credits, c.departement, c.contenu, c.objectifs,
                    c.prealables
             FROM plan_formation p
             JOIN cours c ON c.sigle = p.sigle
             WHERE p.programme = ?
             ORDER BY c.sigle ASC",
        )
        .bind(programme)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(course_from_row).collect()
    }
}

pub struct SqlOfferingRepository {
    pool: DbPool,
}

impl SqlOfferingRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl OfferingRepository for SqlOfferingRepository {
    async fn find_for_term(
        &self,
        sigle: &Sigle,
        term: &Term,
    ) -> Result<Option<Offering>, RepositoryError> {
        let row = sqlx::query(
            "SELECT sigle, trimestre, groupe, jour, heure, local, enseignant
             FROM horaire
             WHERE sigle = ? AND trimestre = ?
             ORDER BY groupe ASC
             LIMIT 1",
        )
        .bind(sigle.as_str())
        .bind(term.label())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(offering_from_row).transpose()
    }
}

fn entry_from_row(row: SqliteRow) -> Result<CurriculumEntry, RepositoryError> {
    let sigle_raw = row.try_get::<String, _>("sigle")?;
    let sigle = Sigle::parse(&sigle_raw).map_err(|error| {
        RepositoryError::Decode(format!("invalid sigle in `plan_formation`: {error}"))
    })?;

    Ok(CurriculumEntry {
        programme: row.try_get("programme")?,
        sigle,
        trimestre_plan: row.try_get("trimestre_plan")?,
    })
}
