use std::collections::HashSet;

use chrono::Utc;
use tracing::info;

use cursus_core::config::RegistrationConfig;
use cursus_core::domain::course::Sigle;
use cursus_core::domain::enrollment::NewEnrollment;
use cursus_core::domain::intent::IntentParameters;
use cursus_core::domain::student::StudentContext;
use cursus_core::domain::term::Term;
use cursus_core::errors::ValidationFailure;

use crate::errors::AgentError;
use crate::outcome::{BatchOutcome, CourseOutcome};
use crate::params::{required_sigles, required_term};
use crate::storage::Storage;

/// Runs the registration rule chain for each requested course and creates
/// the enrollment row on success. Rules are checked in order and the
/// first failing one decides the course's outcome; a failure never aborts
/// the rest of the batch.
pub struct RegistrationHandler {
    storage: Storage,
    settings: RegistrationConfig,
}

impl RegistrationHandler {
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
        let term = required_term(parameters)?;

        let mut results = Vec::with_capacity(sigles.len());
        for raw_sigle in sigles {
            // Fully sequential: each course's checks and write complete
            // before the next course starts, so a sigle repeated in the
            // same request hits the duplicate check on its second pass.
            results.push(self.register_one(context, raw_sigle, &term).await?);
        }

        let outcome = BatchOutcome::new(
            context.student.code_permanent.clone(),
            Some(term.label()),
            results,
        );
        info!(
            event_name = "agent.registration.completed",
            code_permanent = %context.student.code_permanent,
            trimestre = %term,
            succeeded = outcome.succeeded,
            failed = outcome.failed,
            "registration batch processed"
        );
        Ok(outcome)
    }

    async fn register_one(
        &self,
        context: &StudentContext,
        raw_sigle: &str,
        term: &Term,
    ) -> Result<CourseOutcome, AgentError> {
        let display = raw_sigle.trim().to_ascii_uppercase();
        let Ok(sigle) = Sigle::parse(raw_sigle) else {
            return Ok(CourseOutcome::failed(
                display.clone(),
                ValidationFailure::CourseNotFound { sigle: display },
            ));
        };

        let Some(course) = self.storage.courses.find_by_sigle(&sigle).await? else {
            return Ok(CourseOutcome::failed(
                sigle.as_str(),
                ValidationFailure::CourseNotFound { sigle: sigle.0.clone() },
            ));
        };

        let programme = &context.student.programme;
        let Some(entry) = self.storage.curriculum.find_entry(programme, &sigle).await? else {
            return Ok(CourseOutcome::failed(
                sigle.as_str(),
                ValidationFailure::NotInProgram { sigle: sigle.0.clone(), programme: programme.clone() },
            ));
        };

        if self.storage.offerings.find_for_term(&sigle, term).await?.is_none() {
            return Ok(CourseOutcome::failed(
                sigle.as_str(),
                ValidationFailure::NotOfferedThisTerm { sigle: sigle.0.clone(), trimestre: term.label() },
            ));
        }

        let code = &context.student.code_permanent;
        let duplicates =
            self.storage.enrollments.find_active_for_course(code, &sigle, Some(term)).await?;
        if !duplicates.is_empty() {
            return Ok(CourseOutcome::failed(
                sigle.as_str(),
                ValidationFailure::AlreadyEnrolled { sigle: sigle.0.clone(), trimestre: term.label() },
            ));
        }

        let required = course.prerequisite_sigles();
        if !required.is_empty() {
            let graded = self.storage.enrollments.list_graded(code).await?;
            let passed: HashSet<&str> = graded
                .iter()
                .filter(|enrollment| enrollment.is_passing(self.settings.passing_grade))
                .map(|enrollment| enrollment.sigle.as_str())
                .collect();
            let missing: Vec<String> = required
                .iter()
                .filter(|prerequisite| !passed.contains(prerequisite.as_str()))
                .map(|prerequisite| prerequisite.0.clone())
                .collect();
            if !missing.is_empty() {
                return Ok(CourseOutcome::failed(
                    sigle.as_str(),
                    ValidationFailure::PrerequisitesMissing { sigle: sigle.0.clone(), missing },
                ));
            }
        }

        let created = self
            .storage
            .enrollments
            .create(NewEnrollment {
                code_permanent: code.clone(),
                programme: programme.clone(),
                trimestre_plan: entry.trimestre_plan,
                sigle: sigle.clone(),
                trimestre: *term,
                date_inscription: Utc::now(),
            })
            .await;

        match created {
            Ok(enrollment) => {
                info!(
                    event_name = "agent.registration.enrolled",
                    code_permanent = %code,
                    sigle = %sigle,
                    trimestre = %term,
                    inscription_id = %enrollment.id.0,
                    "enrollment created"
                );
                let message = format!(
                    "Inscription confirmée au cours {} — {} ({} crédits) pour {}",
                    sigle,
                    course.titre,
                    course.credits,
                    term.label()
                );
                Ok(CourseOutcome::succeeded(
                    sigle.as_str(),
                    course.titre,
                    course.credits,
                    Some(enrollment.id.0),
                    message,
                ))
            }
            // The storage uniqueness backstop: a concurrent request won the
            // race between our duplicate check and this insert.
            Err(cursus_db::repositories::RepositoryError::Conflict(_)) => {
                Ok(CourseOutcome::failed(
                    sigle.as_str(),
                    ValidationFailure::AlreadyEnrolled { sigle: sigle.0.clone(), trimestre: term.label() },
                ))
            }
            Err(error) => Err(error.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::Utc;

    use cursus_core::config::RegistrationConfig;
    use cursus_core::domain::course::{Course, Sigle};
    use cursus_core::domain::curriculum::Offering;
    use cursus_core::domain::enrollment::{Enrollment, EnrollmentId, EnrollmentStatus};
    use cursus_core::domain::intent::IntentParameters;
    use cursus_core::domain::student::{Student, StudentContext};
    use cursus_core::domain::term::{Season, Term};
    use cursus_core::errors::ValidationFailure;
    use cursus_db::repositories::{
        InMemoryAcademicCatalog, InMemoryEnrollmentRepository, InMemoryStudentRepository,
    };

    use crate::errors::AgentError;
    use crate::storage::Storage;

    use super::RegistrationHandler;

    struct Fixture {
        handler: RegistrationHandler,
        enrollments: Arc<InMemoryEnrollmentRepository>,
        context: StudentContext,
    }

    fn settings() -> RegistrationConfig {
        RegistrationConfig {
            withdrawal_window_days: 30,
            passing_grade: 50.0,
            default_recommendations: 4,
        }
    }

    fn course(sigle: &str, prealables: &str) -> Course {
        Course {
            sigle: Sigle::parse(sigle).expect("sigle"),
            titre: format!("Cours {sigle}"),
            credits: 3.0,
            departement: "Informatique".to_string(),
            contenu: String::new(),
            objectifs: String::new(),
            prealables: prealables.to_string(),
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

    fn graded_enrollment(code: &str, sigle: &str, grade: f64) -> Enrollment {
        Enrollment {
            id: EnrollmentId(format!("insc-{sigle}")),
            code_permanent: code.to_string(),
            programme: "7316".to_string(),
            trimestre_plan: None,
            sigle: Sigle::parse(sigle).expect("sigle"),
            trimestre: Term::new(Season::Winter, 2025),
            annee: 2025,
            statut: EnrollmentStatus::Completed,
            date_inscription: Utc::now(),
            note_finale: Some(grade),
        }
    }

    async fn fixture() -> Fixture {
        let catalog = Arc::new(InMemoryAcademicCatalog::default());
        catalog.add_course(course("INF1062", "")).await;
        catalog.add_course(course("INF2010", "INF1000, MTH1000")).await;
        catalog.add_course(course("PHY1001", "")).await;
        catalog.add_course(course("INF1000", "")).await;
        catalog.add_course(course("MTH1000", "")).await;

        let sigle = |value: &str| Sigle::parse(value).expect("sigle");
        catalog.add_curriculum_entry("7316", &sigle("INF1062"), Some("Automne 2025")).await;
        catalog.add_curriculum_entry("7316", &sigle("INF2010"), Some("Hiver 2026")).await;
        catalog.add_curriculum_entry("7316", &sigle("INF1000"), None).await;
        catalog.add_curriculum_entry("7316", &sigle("MTH1000"), None).await;

        catalog.add_offering(offering("INF1062", "Automne 2025")).await;
        catalog.add_offering(offering("INF2010", "Automne 2025")).await;
        catalog.add_offering(offering("INF1000", "Automne 2025")).await;

        let enrollments = Arc::new(InMemoryEnrollmentRepository::new(catalog.clone()));
        let students = Arc::new(InMemoryStudentRepository::default());
        let student = Student {
            code_permanent: "TREJ12345678".to_string(),
            nom: "Tremblay".to_string(),
            prenom: "Julie".to_string(),
            programme: "7316".to_string(),
            statut: "actif".to_string(),
        };
        students.insert(student.clone()).await;

        let storage = Storage {
            students,
            courses: catalog.clone(),
            curriculum: catalog.clone(),
            offerings: catalog,
            enrollments: enrollments.clone(),
        };

        Fixture {
            handler: RegistrationHandler::new(storage, settings()),
            enrollments,
            context: StudentContext::new(student, Vec::new()),
        }
    }

    fn parameters(sigles: &[&str], trimestre: &str) -> IntentParameters {
        IntentParameters {
            sigles_cours: sigles.iter().map(|sigle| sigle.to_string()).collect(),
            trimestre: Some(trimestre.to_string()),
            ..IntentParameters::default()
        }
    }

    #[tokio::test]
    async fn registers_a_valid_course() {
        let fixture = fixture().await;
        let outcome = fixture
            .handler
            .execute(&parameters(&["INF1062"], "Automne 2025"), Some(&fixture.context))
            .await
            .expect("execute");

        assert_eq!(outcome.succeeded, 1);
        assert_eq!(outcome.failed, 0);
        let result = &outcome.results[0];
        assert!(result.success);
        assert_eq!(result.sigle, "INF1062");
        assert!(result.inscription_id.is_some());
        assert_eq!(fixture.enrollments.count().await, 1);
    }

    #[tokio::test]
    async fn course_outside_program_is_rejected_without_a_row() {
        let fixture = fixture().await;
        let outcome = fixture
            .handler
            .execute(&parameters(&["PHY1001"], "Automne 2025"), Some(&fixture.context))
            .await
            .expect("execute");

        assert_eq!(outcome.failed, 1);
        assert!(matches!(
            outcome.results[0].failure,
            Some(ValidationFailure::NotInProgram { .. })
        ));
        assert_eq!(fixture.enrollments.count().await, 0);
    }

    #[tokio::test]
    async fn repeated_registration_is_already_enrolled_idempotently() {
        let fixture = fixture().await;
        let request = parameters(&["INF1062"], "Automne 2025");

        let first = fixture
            .handler
            .execute(&request, Some(&fixture.context))
            .await
            .expect("first execute");
        assert_eq!(first.succeeded, 1);

        for _ in 0..2 {
            let repeat = fixture
                .handler
                .execute(&request, Some(&fixture.context))
                .await
                .expect("repeat execute");
            assert_eq!(repeat.failed, 1);
            assert!(matches!(
                repeat.results[0].failure,
                Some(ValidationFailure::AlreadyEnrolled { .. })
            ));
        }
        assert_eq!(fixture.enrollments.count().await, 1);
    }

    #[tokio::test]
    async fn missing_prerequisite_lists_only_the_unmet_codes() {
        let fixture = fixture().await;
        fixture
            .enrollments
            .insert(graded_enrollment("TREJ12345678", "INF1000", 72.0))
            .await;

        let outcome = fixture
            .handler
            .execute(&parameters(&["INF2010"], "Automne 2025"), Some(&fixture.context))
            .await
            .expect("execute");

        let failure = outcome.results[0].failure.clone().expect("failure");
        assert_eq!(
            failure,
            ValidationFailure::PrerequisitesMissing {
                sigle: "INF2010".to_string(),
                missing: vec!["MTH1000".to_string()],
            }
        );
    }

    #[tokio::test]
    async fn failing_grade_does_not_satisfy_a_prerequisite() {
        let fixture = fixture().await;
        fixture
            .enrollments
            .insert(graded_enrollment("TREJ12345678", "INF1000", 45.0))
            .await;
        fixture
            .enrollments
            .insert(graded_enrollment("TREJ12345678", "MTH1000", 88.0))
            .await;

        let outcome = fixture
            .handler
            .execute(&parameters(&["INF2010"], "Automne 2025"), Some(&fixture.context))
            .await
            .expect("execute");

        let failure = outcome.results[0].failure.clone().expect("failure");
        assert_eq!(
            failure,
            ValidationFailure::PrerequisitesMissing {
                sigle: "INF2010".to_string(),
                missing: vec!["INF1000".to_string()],
            }
        );
    }

    #[tokio::test]
    async fn batch_failures_do_not_abort_other_courses() {
        let fixture = fixture().await;
        let outcome = fixture
            .handler
            .execute(
                &parameters(&["ZZZ9999", "PHY1001", "INF1062"], "Automne 2025"),
                Some(&fixture.context),
            )
            .await
            .expect("execute");

        assert_eq!(outcome.results.len(), 3);
        assert_eq!(outcome.succeeded, 1);
        assert_eq!(outcome.failed, 2);
        assert!(matches!(
            outcome.results[0].failure,
            Some(ValidationFailure::CourseNotFound { .. })
        ));
        assert!(outcome.results[2].success);
    }

    #[tokio::test]
    async fn course_not_offered_in_requested_term_is_rejected() {
        let fixture = fixture().await;
        let outcome = fixture
            .handler
            .execute(&parameters(&["INF1062"], "Hiver 2026"), Some(&fixture.context))
            .await
            .expect("execute");

        assert!(matches!(
            outcome.results[0].failure,
            Some(ValidationFailure::NotOfferedThisTerm { .. })
        ));
    }

    #[tokio::test]
    async fn registration_requires_student_context() {
        let fixture = fixture().await;
        let error = fixture
            .handler
            .execute(&parameters(&["INF1062"], "Automne 2025"), None)
            .await
            .err()
            .expect("should fail");
        assert!(matches!(error, AgentError::NoStudentContext));
    }

    #[tokio::test]
    async fn registration_requires_a_term() {
        let fixture = fixture().await;
        let request = IntentParameters {
            sigles_cours: vec!["INF1062".to_string()],
            ..IntentParameters::default()
        };
        let error = fixture
            .handler
            .execute(&request, Some(&fixture.context))
            .await
            .err()
            .expect("should fail");
        assert!(matches!(error, AgentError::MissingParameter { name: "trimestre" }));
    }
}
