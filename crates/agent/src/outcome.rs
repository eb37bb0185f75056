use serde::{Deserialize, Serialize};

use cursus_core::domain::course::Course;
use cursus_core::domain::student::{ActiveEnrollment, StudentContext};
use cursus_core::errors::ValidationFailure;
use cursus_db::repositories::CourseMatch;

/// Result of one course within a registration or withdrawal batch. A
/// failing rule is data here, never an error.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CourseOutcome {
    pub sigle: String,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub titre: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credits: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inscription_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<ValidationFailure>,
    pub message: String,
}

impl CourseOutcome {
    pub fn succeeded(
        sigle: impl Into<String>,
        titre: impl Into<String>,
        credits: f64,
        inscription_id: Option<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            sigle: sigle.into(),
            success: true,
            titre: Some(titre.into()),
            credits: Some(credits),
            inscription_id,
            failure: None,
            message: message.into(),
        }
    }

    pub fn failed(sigle: impl Into<String>, failure: ValidationFailure) -> Self {
        let message = failure.reason();
        Self {
            sigle: sigle.into(),
            success: false,
            titre: None,
            credits: None,
            inscription_id: None,
            failure: Some(failure),
            message,
        }
    }
}

/// Aggregate of a per-course batch; failures never abort the batch, so
/// the vector always has one entry per requested course.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BatchOutcome {
    pub code_permanent: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trimestre: Option<String>,
    pub results: Vec<CourseOutcome>,
    pub succeeded: usize,
    pub failed: usize,
}

impl BatchOutcome {
    pub fn new(
        code_permanent: impl Into<String>,
        trimestre: Option<String>,
        results: Vec<CourseOutcome>,
    ) -> Self {
        let succeeded = results.iter().filter(|outcome| outcome.success).count();
        let failed = results.len() - succeeded;
        Self { code_permanent: code_permanent.into(), trimestre, results, succeeded, failed }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SearchOutcome {
    pub criteria: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trimestre: Option<String>,
    pub matches: Vec<CourseMatch>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RecommendationOutcome {
    pub programme: String,
    /// Size of the program's curriculum, before the slice.
    pub available: usize,
    pub courses: Vec<Course>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EnrollmentsOutcome {
    pub active: Vec<ActiveEnrollment>,
    pub total_credits: f64,
}

/// Exhaustive, action-keyed operation result. The formatter matches on
/// this, so adding an action is a compile-time obligation everywhere.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "operation", rename_all = "snake_case")]
pub enum OperationOutcome {
    Registration(BatchOutcome),
    Withdrawal(BatchOutcome),
    Search(SearchOutcome),
    Recommendation(RecommendationOutcome),
    Enrollments(EnrollmentsOutcome),
    StudentInfo(StudentContext),
}
