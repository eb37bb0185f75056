use sqlx::{sqlite::SqliteRow, Row};

use cursus_core::domain::course::{Course, Sigle};
use cursus_core::domain::curriculum::Offering;

use super::{CourseMatch, CourseRepository, CourseSearchFilter, RepositoryError};
use crate::DbPool;

pub struct SqlCourseRepository {
    pool: DbPool,
}

impl SqlCourseRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl CourseRepository for SqlCourseRepository {
    async fn find_by_sigle(&self, sigle: &Sigle) -> Result<Option<Course>, RepositoryError> {
        let row = sqlx::query(
            "SELECT sigle, titre, credits, departement, contenu, objectifs, prealables
             FROM cours
             WHERE sigle = ?",
        )
        .bind(sigle.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(course_from_row).transpose()
    }

    async fn search(
        &self,
        filter: &CourseSearchFilter,
    ) -> Result<Vec<CourseMatch>, RepositoryError> {
        let criteria = filter.criteria.trim();
        let department_prefix = filter.department_prefix.as_deref();

        if let Some(term) = &filter.term {
            let rows = sqlx::query(
                "SELECT c.sigle, c.titre, c.credits, c.departement, c.contenu, c.objectifs,
                        c.prealables,
                        h.trimestre, h.groupe, h.jour, h.heure, h.local, h.enseignant
                 FROM cours c
                 JOIN horaire h ON h.sigle = c.sigle
                 WHERE h.trimestre = ?1
                   AND (c.titre LIKE '%' || ?2 || '%'
                        OR c.departement LIKE '%' || ?2 || '%'
                        OR c.sigle LIKE '%' || ?2 || '%'
                        OR c.contenu LIKE '%' || ?2 || '%'
                        OR c.objectifs LIKE '%' || ?2 || '%'
                        OR (?3 IS NOT NULL AND c.sigle LIKE ?3 || '%'))
                 ORDER BY c.departement ASC, c.sigle ASC, h.groupe ASC",
            )
            .bind(term.label())
            .bind(criteria)
            .bind(department_prefix)
            .fetch_all(&self.pool)
            .await?;

            // A course with several groups in the term matches once; the
            // first group stands in for the schedule annotation.
            let mut matches: Vec<CourseMatch> = Vec::new();
            for row in rows {
                let course = course_from_row_prefixed(&row)?;
                if matches.iter().any(|existing| existing.course.sigle == course.sigle) {
                    continue;
                }
                let offering = offering_from_row(&row)?;
                matches.push(CourseMatch { course, offering: Some(offering) });
            }
            return Ok(matches);
        }

        let rows = sqlx::query(
            "SELECT sigle, titre, credits, departement, contenu, objectifs, prealables
             FROM cours
             WHERE (titre LIKE '%' || ?1 || '%'
                    OR departement LIKE '%' || ?1 || '%'
                    OR sigle LIKE '%' || ?1 || '%'
                    OR contenu LIKE '%' || ?1 || '%'
                    OR objectifs LIKE '%' || ?1 || '%'
                    OR (?2 IS NOT NULL AND sigle LIKE ?2 || '%'))
             ORDER BY departement ASC, sigle ASC",
        )
        .bind(criteria)
        .bind(department_prefix)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| course_from_row(row).map(|course| CourseMatch { course, offering: None }))
            .collect()
    }
}

pub(crate) fn course_from_row(row: SqliteRow) -> Result<Course, RepositoryError> {
    course_from_row_prefixed(&row)
}

fn course_from_row_prefixed(row: &SqliteRow) -> Result<Course, RepositoryError> {
    let sigle_raw = row.try_get::<String, _>("sigle")?;
    let sigle = Sigle::parse(&sigle_raw)
        .map_err(|error| RepositoryError::Decode(format!("invalid sigle in `cours`: {error}")))?;

    Ok(Course {
        sigle,
        titre: row.try_get("titre")?,
        credits: row.try_get("credits")?,
        departement: row.try_get("departement")?,
        contenu: row.try_get("contenu")?,
        objectifs: row.try_get("objectifs")?,
        prealables: row.try_get("prealables")?,
    })
}

pub(crate) fn offering_from_row(row: &SqliteRow) -> Result<Offering, RepositoryError> {
    let sigle_raw = row.try_get::<String, _>("sigle")?;
    let sigle = Sigle::parse(&sigle_raw).map_err(|error| {
        RepositoryError::Decode(format!("invalid sigle in `horaire`: {error}"))
    })?;

    Ok(Offering {
        sigle,
        trimestre: row.try_get("trimestre")?,
        groupe: row.try_get("groupe")?,
        jour: row.try_get("jour")?,
        heure: row.try_get("heure")?,
        local: row.try_get("local")?,
        enseignant: row.try_get("enseignant")?,
    })
}
