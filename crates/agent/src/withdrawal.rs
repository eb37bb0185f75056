use chrono::{DateTime, Utc};
use tracing::info;

use cursus_core::config::RegistrationConfig;
use cursus_core::domain::course::Sigle;
use cursus_core::domain::enrollment::Enrollment;
use cursus_core::domain::intent::IntentParameters;
use cursus_core::domain::student::StudentContext;
use cursus_core::domain::term::Term;
use cursus_core::errors::ValidationFailure;

use crate::errors::AgentError;
use crate::outcome::{BatchOutcome, CourseOutcome};
use crate::params::{optional_term, required_sigles};
use crate::storage::Storage;

/// Locates the enrollment matching each requested course, applies the
/// withdrawal-window rule, and deletes the row. Several matching
/// enrollments without a term to pick by is an explicit failure; nothing
/// is ever deleted on a guess.
pub struct WithdrawalHandler {
    storage: Storage,
    settings: RegistrationConfig,
}

/// Days between enrollment creation and `now`, truncated to whole days.
/// Withdrawal is allowed up to and including the window's last day.
pub fn days_enrolled(date_inscription: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    (now - date_inscription).num_days()
}

pub fn window_expired(date_inscription: DateTime<Utc>, now: DateTime<Utc>, window_days: i64) -> bool {
    days_enrolled(date_inscription, now) > window_days
}

impl WithdrawalHandler {
    pub fn new(storage: Storage, settings: RegistrationConfig) -> Self {
        Self { storage, settings }
    }

    pub async fn execute(
        &self,
        parameters: &IntentParameters,
        context: Option<&StudentContext>,
    ) -> Result<BatchOutcome, AgentError> {
        let context = context.ok_or(AgentError::NoStudentContext)?;
        let sigles = required_sigles(parameters)?;
        let term = optional_term(parameters)?;

        let mut results = Vec::with_capacity(sigles.len());
        for raw_sigle in sigles {
            results.push(self.withdraw_one(context, raw_sigle, term.as_ref()).await?);
        }

        let outcome = BatchOutcome::new(
            context.student.code_permanent.clone(),
            term.map(|term| term.label()),
            results,
        );
        info!(
            event_name = "agent.withdrawal.completed",
            code_permanent = %context.student.code_permanent,
            succeeded = outcome.succeeded,
            failed = outcome.failed,
            "withdrawal batch processed"
        );
        Ok(outcome)
    }

    async fn withdraw_one(
        &self,
        context: &StudentContext,
        raw_sigle: &str,
        term: Option<&Term>,
    ) -> Result<CourseOutcome, AgentError> {
        let display = raw_sigle.trim().to_ascii_uppercase();
        let Ok(sigle) = Sigle::parse(raw_sigle) else {
            return Ok(CourseOutcome::failed(
                display.clone(),
                ValidationFailure::CourseNotFound { sigle: display },
            ));
        };

        let code = &context.student.code_permanent;
        let matches =
            self.storage.enrollments.find_active_for_course(code, &sigle, term).await?;

        let enrollment = match matches.as_slice() {
            [] => {
                return Ok(CourseOutcome::failed(
                    sigle.as_str(),
                    ValidationFailure::EnrollmentNotFound { sigle: sigle.0.clone() },
                ));
            }
            [single] => single.clone(),
            several => {
                // Only reachable without a term filter; require the student
                // to disambiguate instead of deleting an arbitrary row.
                return Ok(CourseOutcome::failed(
                    sigle.as_str(),
                    ValidationFailure::AmbiguousEnrollment {
                        sigle: sigle.0.clone(),
                        count: several.len(),
                    },
                ));
            }
        };

        let now = Utc::now();
        if window_expired(enrollment.date_inscription, now, self.settings.withdrawal_window_days) {
            return Ok(CourseOutcome::failed(
                sigle.as_str(),
                ValidationFailure::WithdrawalWindowExpired {
                    sigle: sigle.0.clone(),
                    days_elapsed: days_enrolled(enrollment.date_inscription, now),
                    window_days: self.settings.withdrawal_window_days,
                },
            ));
        }

        self.delete_and_describe(&sigle, enrollment).await
    }

    async fn delete_and_describe(
        &self,
        sigle: &Sigle,
        enrollment: Enrollment,
    ) -> Result<CourseOutcome, AgentError> {
        self.storage.enrollments.delete(&enrollment.id).await?;
        info!(
            event_name = "agent.withdrawal.deleted",
            code_permanent = %enrollment.code_permanent,
            sigle = %sigle,
            trimestre = %enrollment.trimestre,
            inscription_id = %enrollment.id.0,
            "enrollment deleted"
        );

        // The course row may have left the catalog since enrollment; the
        // confirmation then falls back to the sigle alone.
        let course = self.storage.courses.find_by_sigle(sigle).await?;
        let (titre, credits) = match course {
            Some(course) => (course.titre, course.credits),
            None => (sigle.0.clone(), 0.0),
        };

        let message = format!(
            "Désinscription confirmée du cours {} — {} ({} crédits, {})",
            sigle,
            titre,
            credits,
            enrollment.trimestre.label()
        );
        Ok(CourseOutcome::succeeded(sigle.as_str(), titre, credits, None, message))
    }
}
