use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use cursus_core::domain::course::{Course, Sigle};
use cursus_core::domain::curriculum::{CurriculumEntry, Offering};
use cursus_core::domain::enrollment::{Enrollment, EnrollmentId, EnrollmentStatus, NewEnrollment};
use cursus_core::domain::student::{ActiveEnrollment, Student};
use cursus_core::domain::term::Term;

use super::{
    CourseMatch, CourseRepository, CourseSearchFilter, CurriculumRepository, EnrollmentRepository,
    OfferingRepository, RepositoryError, StudentRepository,
};

#[derive(Default)]
pub struct InMemoryStudentRepository {
    students: RwLock<HashMap<String, Student>>,
}

impl InMemoryStudentRepository {
    pub async fn insert(&self, student: Student) {
        let mut students = self.students.write().await;
        students.insert(student.code_permanent.clone(), student);
    }
}

#[async_trait::async_trait]
impl StudentRepository for InMemoryStudentRepository {
    async fn find_by_code(&self, code: &str) -> Result<Option<Student>, RepositoryError> {
        let students = self.students.read().await;
        Ok(students.get(code).cloned())
    }
}

#[derive(Default)]
struct CatalogState {
    courses: Vec<Course>,
    curriculum: Vec<CurriculumEntry>,
    offerings: Vec<Offering>,
}

/// Read-only academic reference data: courses, curricula, and offerings in
/// one store, mirroring the SQL repositories' filter semantics.
#[derive(Default)]
pub struct InMemoryAcademicCatalog {
    state: RwLock<CatalogState>,
}

impl InMemoryAcademicCatalog {
    pub async fn add_course(&self, course: Course) {
        let mut state = self.state.write().await;
        state.courses.push(course);
    }

    pub async fn add_curriculum_entry(
        &self,
        programme: &str,
        sigle: &Sigle,
        trimestre_plan: Option<&str>,
    ) {
        let mut state = self.state.write().await;
        state.curriculum.push(CurriculumEntry {
            programme: programme.to_string(),
            sigle: sigle.clone(),
            trimestre_plan: trimestre_plan.map(str::to_string),
        });
    }

    pub async fn add_offering(&self, offering: Offering) {
        let mut state = self.state.write().await;
        state.offerings.push(offering);
    }

    async fn course(&self, sigle: &Sigle) -> Option<Course> {
        let state = self.state.read().await;
        state.courses.iter().find(|course| &course.sigle == sigle).cloned()
    }
}

fn matches_criteria(course: &Course, criteria: &str, department_prefix: Option<&str>) -> bool {
    let needle = criteria.trim().to_lowercase();
    let haystacks =
        [&course.titre, &course.departement, &course.sigle.0, &course.contenu, &course.objectifs];
    if haystacks.iter().any(|field| field.to_lowercase().contains(&needle)) {
        return true;
    }
    department_prefix
        .is_some_and(|prefix| course.sigle.as_str().starts_with(&prefix.to_uppercase()))
}

#[async_trait::async_trait]
impl CourseRepository for InMemoryAcademicCatalog {
    async fn find_by_sigle(&self, sigle: &Sigle) -> Result<Option<Course>, RepositoryError> {
        Ok(self.course(sigle).await)
    }

    async fn search(
        &self,
        filter: &CourseSearchFilter,
    ) -> Result<Vec<CourseMatch>, RepositoryError> {
        let state = self.state.read().await;
        let mut matches: Vec<CourseMatch> = Vec::new();

        for course in &state.courses {
            if !matches_criteria(course, &filter.criteria, filter.department_prefix.as_deref()) {
                continue;
            }

            match &filter.term {
                Some(term) => {
                    let offering = state
                        .offerings
                        .iter()
                        .find(|offering| {
                            offering.sigle == course.sigle && offering.trimestre == term.label()
                        })
                        .cloned();
                    if let Some(offering) = offering {
                        matches.push(CourseMatch {
                            course: course.clone(),
                            offering: Some(offering),
                        });
                    }
                }
                None => matches.push(CourseMatch { course: course.clone(), offering: None }),
            }
        }

        matches.sort_by(|a, b| {
            (a.course.departement.as_str(), a.course.sigle.as_str())
                .cmp(&(b.course.departement.as_str(), b.course.sigle.as_str()))
        });
        Ok(matches)
    }
}

#[async_trait::async_trait]
impl CurriculumRepository for InMemoryAcademicCatalog {
    async fn find_entry(
        &self,
        programme: &str,
        sigle: &Sigle,
    ) -> Result<Option<CurriculumEntry>, RepositoryError> {
        let state = self.state.read().await;
        Ok(state
            .curriculum
            .iter()
            .find(|entry| entry.programme == programme && &entry.sigle == sigle)
            .cloned())
    }

    async fn list_courses(&self, programme: &str) -> Result<Vec<Course>, RepositoryError> {
        let state = self.state.read().await;
        let mut courses: Vec<Course> = state
            .curriculum
            .iter()
            .filter(|entry| entry.programme == programme)
            .filter_map(|entry| {
                state.courses.iter().find(|course| course.sigle == entry.sigle).cloned()
            })
            .collect();
        courses.sort_by(|a, b| a.sigle.as_str().cmp(b.sigle.as_str()));
        Ok(courses)
    }
}

#[async_trait::async_trait]
impl OfferingRepository for InMemoryAcademicCatalog {
    async fn find_for_term(
        &self,
        sigle: &Sigle,
        term: &Term,
    ) -> Result<Option<Offering>, RepositoryError> {
        let state = self.state.read().await;
        Ok(state
            .offerings
            .iter()
            .find(|offering| &offering.sigle == sigle && offering.trimestre == term.label())
            .cloned())
    }
}

/// In-memory enrollment store with the same conflict semantics as the SQL
/// implementation; the catalog supplies the course join for `list_active`.
pub struct InMemoryEnrollmentRepository {
    catalog: Arc<InMemoryAcademicCatalog>,
    rows: RwLock<Vec<Enrollment>>,
}

impl InMemoryEnrollmentRepository {
    pub fn new(catalog: Arc<InMemoryAcademicCatalog>) -> Self {
        Self { catalog, rows: RwLock::new(Vec::new()) }
    }

    pub async fn insert(&self, enrollment: Enrollment) {
        let mut rows = self.rows.write().await;
        rows.push(enrollment);
    }

    pub async fn count(&self) -> usize {
        self.rows.read().await.len()
    }
}

#[async_trait::async_trait]
impl EnrollmentRepository for InMemoryEnrollmentRepository {
    async fn list_active(&self, code: &str) -> Result<Vec<ActiveEnrollment>, RepositoryError> {
        let rows = self.rows.read().await;
        let mut active = Vec::new();
        for enrollment in rows.iter() {
            if enrollment.code_permanent != code
                || enrollment.statut != EnrollmentStatus::Enrolled
            {
                continue;
            }
            let course = self.catalog.course(&enrollment.sigle).await.ok_or_else(|| {
                RepositoryError::Decode(format!(
                    "enrollment references unknown course `{}`",
                    enrollment.sigle
                ))
            })?;
            active.push(ActiveEnrollment {
                enrollment: enrollment.clone(),
                titre: course.titre,
                credits: course.credits,
            });
        }
        Ok(active)
    }

    async fn list_graded(&self, code: &str) -> Result<Vec<Enrollment>, RepositoryError> {
        let rows = self.rows.read().await;
        Ok(rows
            .iter()
            .filter(|enrollment| {
                enrollment.code_permanent == code && enrollment.note_finale.is_some()
            })
            .cloned()
            .collect())
    }

    async fn find_active_for_course(
        &self,
        code: &str,
        sigle: &Sigle,
        term: Option<&Term>,
    ) -> Result<Vec<Enrollment>, RepositoryError> {
        let rows = self.rows.read().await;
        Ok(rows
            .iter()
            .filter(|enrollment| {
                enrollment.code_permanent == code
                    && &enrollment.sigle == sigle
                    && enrollment.statut == EnrollmentStatus::Enrolled
                    && term.map_or(true, |term| {
                        enrollment.trimestre == *term && enrollment.annee == term.year
                    })
            })
            .cloned()
            .collect())
    }

    async fn create(&self, enrollment: NewEnrollment) -> Result<Enrollment, RepositoryError> {
        let mut rows = self.rows.write().await;
        let duplicate = rows.iter().any(|existing| {
            existing.code_permanent == enrollment.code_permanent
                && existing.sigle == enrollment.sigle
                && existing.trimestre == enrollment.trimestre
                && existing.annee == enrollment.trimestre.year
                && existing.statut == EnrollmentStatus::Enrolled
        });
        if duplicate {
            return Err(RepositoryError::Conflict(format!(
                "active enrollment already exists for {} in {}",
                enrollment.sigle,
                enrollment.trimestre.label()
            )));
        }

        let enrollment = enrollment.into_enrollment();
        rows.push(enrollment.clone());
        Ok(enrollment)
    }

    async fn delete(&self, id: &EnrollmentId) -> Result<(), RepositoryError> {
        let mut rows = self.rows.write().await;
        rows.retain(|enrollment| &enrollment.id != id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::Utc;

    use cursus_core::domain::course::{Course, Sigle};
    use cursus_core::domain::curriculum::Offering;
    use cursus_core::domain::enrollment::NewEnrollment;
    use cursus_core::domain::term::{Season, Term};

    use crate::repositories::{
        CourseRepository, CourseSearchFilter, EnrollmentRepository, RepositoryError,
    };

    use super::{InMemoryAcademicCatalog, InMemoryEnrollmentRepository};

    fn course(sigle: &str, titre: &str, departement: &str) -> Course {
        Course {
            sigle: Sigle::parse(sigle).expect("sigle"),
            titre: titre.to_string(),
            credits: 3.0,
            departement: departement.to_string(),
            contenu: String::new(),
            objectifs: String::new(),
            prealables: String::new(),
        }
    }

    fn offering(sigle: &str, trimestre: &str) -> Offering {
        Offering {
            sigle: Sigle::parse(sigle).expect("sigle"),
            trimestre: trimestre.to_string(),
            groupe: "01".to_string(),
            jour: None,
            heure: None,
            local: None,
            enseignant: None,
        }
    }

    #[tokio::test]
    async fn empty_criteria_returns_every_course_ordered() {
        let catalog = InMemoryAcademicCatalog::default();
        catalog.add_course(course("MTH1000", "Mathématiques discrètes", "Mathématiques")).await;
        catalog.add_course(course("INF1062", "Organisation des ordinateurs", "Informatique")).await;
        catalog.add_course(course("INF1000", "Programmation I", "Informatique")).await;

        let matches =
            catalog.search(&CourseSearchFilter::default()).await.expect("search all courses");
        let sigles: Vec<&str> =
            matches.iter().map(|entry| entry.course.sigle.as_str()).collect();
        assert_eq!(sigles, vec!["INF1000", "INF1062", "MTH1000"]);
    }

    #[tokio::test]
    async fn term_filter_keeps_only_offered_courses_with_schedule() {
        let catalog = InMemoryAcademicCatalog::default();
        catalog.add_course(course("INF1000", "Programmation I", "Informatique")).await;
        catalog.add_course(course("INF1062", "Organisation des ordinateurs", "Informatique")).await;
        catalog.add_offering(offering("INF1062", "Automne 2025")).await;

        let matches = catalog
            .search(&CourseSearchFilter {
                criteria: String::new(),
                department_prefix: None,
                term: Some(Term::new(Season::Autumn, 2025)),
            })
            .await
            .expect("search");

        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].course.sigle.as_str(), "INF1062");
        assert!(matches[0].offering.is_some());
    }

    #[tokio::test]
    async fn duplicate_create_conflicts_like_sql_backend() {
        let catalog = Arc::new(InMemoryAcademicCatalog::default());
        catalog.add_course(course("INF1062", "Organisation des ordinateurs", "Informatique")).await;
        let repo = InMemoryEnrollmentRepository::new(catalog);

        let new_row = || NewEnrollment {
            code_permanent: "TREJ12345678".to_string(),
            programme: "7316".to_string(),
            trimestre_plan: None,
            sigle: Sigle::parse("INF1062").expect("sigle"),
            trimestre: Term::new(Season::Autumn, 2025),
            date_inscription: Utc::now(),
        };

        repo.create(new_row()).await.expect("first create");
        assert!(matches!(repo.create(new_row()).await, Err(RepositoryError::Conflict(_))));
        assert_eq!(repo.count().await, 1);
    }
}
