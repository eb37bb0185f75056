use chrono::{DateTime, Utc};
use sqlx::{sqlite::SqliteRow, Row};

use cursus_core::domain::course::Sigle;
use cursus_core::domain::enrollment::{Enrollment, EnrollmentId, EnrollmentStatus, NewEnrollment};
use cursus_core::domain::student::ActiveEnrollment;
use cursus_core::domain::term::Term;

use super::{EnrollmentRepository, RepositoryError};
use crate::DbPool;

const ENROLLMENT_COLUMNS: &str = "id, code_permanent, programme, trimestre_plan, sigle, \
     trimestre, annee, statut, date_inscription, note_finale";

pub struct SqlEnrollmentRepository {
    pool: DbPool,
}

impl SqlEnrollmentRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl EnrollmentRepository for SqlEnrollmentRepository {
    async fn list_active(&self, code: &str) -> Result<Vec<ActiveEnrollment>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT i.id, i.code_permanent, i.programme, i.trimestre_plan, i.sigle,
                    i.trimestre, i.annee, i.statut, i.date_inscription, i.note_finale,
                    c.titre, c.credits
             FROM inscription i
             JOIN cours c ON c.sigle = i.sigle
             WHERE i.code_permanent = ? AND i.statut = 'inscrit'
             ORDER BY i.date_inscription ASC, i.sigle ASC",
        )
        .bind(code)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| {
                let enrollment = enrollment_from_row(&row)?;
                Ok(ActiveEnrollment {
                    enrollment,
                    titre: row.try_get("titre")?,
                    credits: row.try_get("credits")?,
                })
            })
            .collect()
    }

    async fn list_graded(&self, code: &str) -> Result<Vec<Enrollment>, RepositoryError> {
        let rows = sqlx::query(&format!(
            "SELECT {ENROLLMENT_COLUMNS}
             FROM inscription
             WHERE code_permanent = ? AND note_finale IS NOT NULL
             ORDER BY date_inscription ASC"
        ))
        .bind(code)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(enrollment_from_row).collect()
    }

    async fn find_active_for_course(
        &self,
        code: &str,
        sigle: &Sigle,
        term: Option<&Term>,
    ) -> Result<Vec<Enrollment>, RepositoryError> {
        let rows = if let Some(term) = term {
            sqlx::query(&format!(
                "SELECT {ENROLLMENT_COLUMNS}
                 FROM inscription
                 WHERE code_permanent = ? AND sigle = ? AND statut = 'inscrit'
                   AND trimestre = ? AND annee = ?
                 ORDER BY date_inscription ASC"
            ))
            .bind(code)
            .bind(sigle.as_str())
            .bind(term.label())
            .bind(term.year)
            .fetch_all(&self.pool)
            .await?
        } else {
            sqlx::query(&format!(
                "SELECT {ENROLLMENT_COLUMNS}
                 FROM inscription
                 WHERE code_permanent = ? AND sigle = ? AND statut = 'inscrit'
                 ORDER BY date_inscription ASC"
            ))
            .bind(code)
            .bind(sigle.as_str())
            .fetch_all(&self.pool)
            .await?
        };

        rows.iter().map(enrollment_from_row).collect()
    }

    async fn create(&self, enrollment: NewEnrollment) -> Result<Enrollment, RepositoryError> {
        let enrollment = enrollment.into_enrollment();

        let result = sqlx::query(
            "INSERT INTO inscription (
                id,
                code_permanent,
                programme,
                trimestre_plan,
                sigle,
                trimestre,
                annee,
                statut,
                date_inscription,
                note_finale
             ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&enrollment.id.0)
        .bind(&enrollment.code_permanent)
        .bind(&enrollment.programme)
        .bind(enrollment.trimestre_plan.as_deref())
        .bind(enrollment.sigle.as_str())
        .bind(enrollment.trimestre.label())
        .bind(enrollment.annee)
        .bind(enrollment.statut.as_str())
        .bind(enrollment.date_inscription.to_rfc3339())
        .bind(enrollment.note_finale)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(enrollment),
            Err(sqlx::Error::Database(db_error)) if db_error.is_unique_violation() => {
                Err(RepositoryError::Conflict(format!(
                    "active enrollment already exists for {} in {}",
                    enrollment.sigle,
                    enrollment.trimestre.label()
                )))
            }
            Err(error) => Err(error.into()),
        }
    }

    async fn delete(&self, id: &EnrollmentId) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM inscription WHERE id = ?")
            .bind(&id.0)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}

fn enrollment_from_row(row: &SqliteRow) -> Result<Enrollment, RepositoryError> {
    let sigle_raw = row.try_get::<String, _>("sigle")?;
    let sigle = Sigle::parse(&sigle_raw).map_err(|error| {
        RepositoryError::Decode(format!("invalid sigle in `inscription`: {error}"))
    })?;

    let statut_raw = row.try_get::<String, _>("statut")?;
    let statut = EnrollmentStatus::parse(&statut_raw).ok_or_else(|| {
        RepositoryError::Decode(format!("unknown enrollment status `{statut_raw}`"))
    })?;

    let trimestre_raw = row.try_get::<String, _>("trimestre")?;
    let trimestre = Term::parse(&trimestre_raw, None).map_err(|error| {
        RepositoryError::Decode(format!("invalid trimestre `{trimestre_raw}`: {error}"))
    })?;

    Ok(Enrollment {
        id: EnrollmentId(row.try_get("id")?),
        code_permanent: row.try_get("code_permanent")?,
        programme: row.try_get("programme")?,
        trimestre_plan: row.try_get("trimestre_plan")?,
        sigle,
        trimestre,
        annee: row.try_get("annee")?,
        statut,
        date_inscription: parse_timestamp("date_inscription", row.try_get("date_inscription")?)?,
        note_finale: row.try_get("note_finale")?,
    })
}

fn parse_timestamp(column: &str, value: String) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(&value).map(|timestamp| timestamp.with_timezone(&Utc)).map_err(
        |error| {
            RepositoryError::Decode(format!("invalid timestamp in `{column}`: `{value}` ({error})"))
        },
    )
}
