use std::sync::Arc;

use cursus_db::repositories::{
    CourseRepository, CurriculumRepository, EnrollmentRepository, OfferingRepository,
    SqlCourseRepository, SqlCurriculumRepository, SqlEnrollmentRepository, SqlOfferingRepository,
    SqlStudentRepository, StudentRepository,
};
use cursus_db::DbPool;

/// The storage collaborator as the pipeline sees it: one handle per
/// repository, trait objects so tests can plug the in-memory backends.
#[derive(Clone)]
pub struct Storage {
    pub students: Arc<dyn StudentRepository>,
    pub courses: Arc<dyn CourseRepository>,
    pub curriculum: Arc<dyn CurriculumRepository>,
    pub offerings: Arc<dyn OfferingRepository>,
    pub enrollments: Arc<dyn EnrollmentRepository>,
}

impl Storage {
    pub fn sql(pool: DbPool) -> Self {
        Self {
            students: Arc::new(SqlStudentRepository::new(pool.clone())),
            courses: Arc::new(SqlCourseRepository::new(pool.clone())),
            curriculum: Arc::new(SqlCurriculumRepository::new(pool.clone())),
            offerings: Arc::new(SqlOfferingRepository::new(pool.clone())),
            enrollments: Arc::new(SqlEnrollmentRepository::new(pool)),
        }
    }
}
