use std::sync::Arc;

use tracing::{debug, warn};

use cursus_core::domain::student::StudentContext;
use cursus_db::repositories::{EnrollmentRepository, StudentRepository};

use crate::errors::AgentError;

/// Builds the per-request academic context. Read-only and uncached: every
/// request reloads, so a write in the same conversation is always visible.
pub struct ContextResolver {
    students: Arc<dyn StudentRepository>,
    enrollments: Arc<dyn EnrollmentRepository>,
}

impl ContextResolver {
    pub fn new(
        students: Arc<dyn StudentRepository>,
        enrollments: Arc<dyn EnrollmentRepository>,
    ) -> Self {
        Self { students, enrollments }
    }

    /// An unknown permanent code degrades to no context rather than
    /// failing the request; handlers that need one report it themselves.
    pub async fn resolve(&self, code: &str) -> Result<Option<StudentContext>, AgentError> {
        let Some(student) = self.students.find_by_code(code).await? else {
            warn!(
                event_name = "agent.context.student_not_found",
                code_permanent = code,
                "permanent code does not match any student"
            );
            return Ok(None);
        };

        let active_enrollments = self.enrollments.list_active(code).await?;
        let context = StudentContext::new(student, active_enrollments);
        debug!(
            event_name = "agent.context.resolved",
            code_permanent = code,
            active_courses = context.active_enrollments.len(),
            total_credits = context.total_credits,
            "academic context resolved"
        );

        Ok(Some(context))
    }
}
