use cursus_core::domain::student::StudentContext;

use crate::errors::AgentError;
use crate::outcome::EnrollmentsOutcome;

/// Both handlers are pure projections of the already-resolved context; no
/// further storage access happens here.

pub fn view_enrollments(
    context: Option<&StudentContext>,
) -> Result<EnrollmentsOutcome, AgentError> {
    let context = context.ok_or(AgentError::NoStudentContext)?;
    Ok(EnrollmentsOutcome {
        active: context.active_enrollments.clone(),
        total_credits: context.total_credits,
    })
}

pub fn student_info(context: Option<&StudentContext>) -> Result<StudentContext, AgentError> {
    context.cloned().ok_or(AgentError::NoStudentContext)
}
