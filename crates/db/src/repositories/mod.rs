use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use cursus_core::domain::course::{Course, Sigle};
use cursus_core::domain::curriculum::{CurriculumEntry, Offering};
use cursus_core::domain::enrollment::{Enrollment, EnrollmentId, NewEnrollment};
use cursus_core::domain::student::{ActiveEnrollment, Student};
use cursus_core::domain::term::Term;

pub mod course;
pub mod curriculum;
pub mod enrollment;
pub mod memory;
pub mod student;

pub use course::SqlCourseRepository;
pub use curriculum::{SqlCurriculumRepository, SqlOfferingRepository};
pub use enrollment::SqlEnrollmentRepository;
pub use memory::{
    InMemoryAcademicCatalog, InMemoryEnrollmentRepository, InMemoryStudentRepository,
};
pub use student::SqlStudentRepository;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
    /// Storage-level uniqueness rejection; the registration flow reports
    /// this as an already-enrolled outcome.
    #[error("conflict: {0}")]
    Conflict(String),
}

/// Free-text course search. `criteria` is matched as a substring against
/// title, department, sigle, content, and objectives; an optional
/// department-prefix guess widens the match; an optional term restricts
/// results to courses actually offered then.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CourseSearchFilter {
    pub criteria: String,
    pub department_prefix: Option<String>,
    pub term: Option<Term>,
}

/// A search hit, annotated with the matching offering when the search was
/// term-restricted.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CourseMatch {
    pub course: Course,
    pub offering: Option<Offering>,
}

#[async_trait]
pub trait StudentRepository: Send + Sync {
    async fn find_by_code(&self, code: &str) -> Result<Option<Student>, RepositoryError>;
}

#[async_trait]
pub trait CourseRepository: Send + Sync {
    async fn find_by_sigle(&self, sigle: &Sigle) -> Result<Option<Course>, RepositoryError>;

    async fn search(
        &self,
        filter: &CourseSearchFilter,
    ) -> Result<Vec<CourseMatch>, RepositoryError>;
}

#[async_trait]
pub trait CurriculumRepository: Send + Sync {
    async fn find_entry(
        &self,
        programme: &str,
        sigle: &Sigle,
    ) -> Result<Option<CurriculumEntry>, RepositoryError>;

    async fn list_courses(&self, programme: &str) -> Result<Vec<Course>, RepositoryError>;
}

#[async_trait]
pub trait OfferingRepository: Send + Sync {
    async fn find_for_term(
        &self,
        sigle: &Sigle,
        term: &Term,
    ) -> Result<Option<Offering>, RepositoryError>;
}

#[async_trait]
pub trait EnrollmentRepository: Send + Sync {
    /// Active enrollments joined with their course for title and credits.
    async fn list_active(&self, code: &str) -> Result<Vec<ActiveEnrollment>, RepositoryError>;

    /// Enrollments carrying a final grade, for prerequisite checks.
    async fn list_graded(&self, code: &str) -> Result<Vec<Enrollment>, RepositoryError>;

    /// Active enrollments for one course, optionally restricted to a term.
    async fn find_active_for_course(
        &self,
        code: &str,
        sigle: &Sigle,
        term: Option<&Term>,
    ) -> Result<Vec<Enrollment>, RepositoryError>;

    async fn create(&self, enrollment: NewEnrollment) -> Result<Enrollment, RepositoryError>;

    async fn delete(&self, id: &EnrollmentId) -> Result<(), RepositoryError>;
}
