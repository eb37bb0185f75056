use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::course::Sigle;
use crate::domain::term::Term;

/// Passing grade threshold: a graded enrollment at or above this value
/// counts as a completed course for prerequisite purposes.
pub const DEFAULT_PASSING_GRADE: f64 = 50.0;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EnrollmentId(pub String);

impl EnrollmentId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnrollmentStatus {
    Enrolled,
    Completed,
    Withdrawn,
}

impl EnrollmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Enrolled => "inscrit",
            Self::Completed => "termine",
            Self::Withdrawn => "abandonne",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "inscrit" => Some(Self::Enrolled),
            "termine" => Some(Self::Completed),
            "abandonne" => Some(Self::Withdrawn),
            _ => None,
        }
    }
}

/// The one mutable row of the system. Created on successful registration,
/// deleted on successful withdrawal.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Enrollment {
    pub id: EnrollmentId,
    pub code_permanent: String,
    pub programme: String,
    /// Nominal term from the curriculum entry, when known.
    pub trimestre_plan: Option<String>,
    pub sigle: Sigle,
    pub trimestre: Term,
    pub annee: i32,
    pub statut: EnrollmentStatus,
    pub date_inscription: DateTime<Utc>,
    pub note_finale: Option<f64>,
}

impl Enrollment {
    pub fn is_passing(&self, passing_grade: f64) -> bool {
        self.note_finale.is_some_and(|grade| grade >= passing_grade)
    }
}

/// Insert payload for a new registration.
#[derive(Clone, Debug, PartialEq)]
pub struct NewEnrollment {
    pub code_permanent: String,
    pub programme: String,
    pub trimestre_plan: Option<String>,
    pub sigle: Sigle,
    pub trimestre: Term,
    pub date_inscription: DateTime<Utc>,
}

impl NewEnrollment {
    pub fn into_enrollment(self) -> Enrollment {
        Enrollment {
            id: EnrollmentId::generate(),
            annee: self.trimestre.year,
            code_permanent: self.code_permanent,
            programme: self.programme,
            trimestre_plan: self.trimestre_plan,
            sigle: self.sigle,
            trimestre: self.trimestre,
            statut: EnrollmentStatus::Enrolled,
            date_inscription: self.date_inscription,
            note_finale: None,
        }
    }
}
