use serde::{Deserialize, Serialize};

/// Per-course validation outcome data. These are business results, not
/// errors: a failing rule is captured in the course's result row and the
/// batch continues with the next course.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ValidationFailure {
    CourseNotFound {
        sigle: String,
    },
    NotInProgram {
        sigle: String,
        programme: String,
    },
    NotOfferedThisTerm {
        sigle: String,
        trimestre: String,
    },
    AlreadyEnrolled {
        sigle: String,
        trimestre: String,
    },
    PrerequisitesMissing {
        sigle: String,
        missing: Vec<String>,
    },
    EnrollmentNotFound {
        sigle: String,
    },
    AmbiguousEnrollment {
        sigle: String,
        count: usize,
    },
    WithdrawalWindowExpired {
        sigle: String,
        days_elapsed: i64,
        window_days: i64,
    },
}

impl ValidationFailure {
    /// User-facing reason, in the language of the student-facing responses.
    pub fn reason(&self) -> String {
        match self {
            Self::CourseNotFound { sigle } => {
                format!("Le cours {sigle} est introuvable dans le répertoire des cours")
            }
            Self::NotInProgram { sigle, programme } => {
                format!(
                    "Le cours {sigle} ne fait pas partie du plan de formation du programme {programme}"
                )
            }
            Self::NotOfferedThisTerm { sigle, trimestre } => {
                format!("Le cours {sigle} n'est pas offert au trimestre {trimestre}")
            }
            Self::AlreadyEnrolled { sigle, trimestre } => {
                format!("Vous êtes déjà inscrit au cours {sigle} pour le trimestre {trimestre}")
            }
            Self::PrerequisitesMissing { sigle, missing } => {
                format!("Préalables non satisfaits pour {sigle} : {}", missing.join(", "))
            }
            Self::EnrollmentNotFound { sigle } => {
                format!("Aucune inscription active trouvée pour le cours {sigle}")
            }
            Self::AmbiguousEnrollment { sigle, count } => {
                format!(
                    "{count} inscriptions actives correspondent au cours {sigle}, veuillez préciser le trimestre"
                )
            }
            Self::WithdrawalWindowExpired { sigle, days_elapsed, window_days } => {
                format!(
                    "Le délai de désinscription de {window_days} jours est dépassé pour {sigle} ({days_elapsed} jours depuis l'inscription)"
                )
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::ValidationFailure;

    #[test]
    fn enrollment_not_found_reason_starts_with_expected_sentence() {
        let reason =
            ValidationFailure::EnrollmentNotFound { sigle: "INF1062".to_string() }.reason();
        assert!(reason.starts_with("Aucune inscription"));
        assert!(reason.contains("INF1062"));
    }

    #[test]
    fn prerequisites_reason_lists_missing_codes() {
        let reason = ValidationFailure::PrerequisitesMissing {
            sigle: "INF2010".to_string(),
            missing: vec!["MTH1000".to_string()],
        }
        .reason();
        assert!(reason.contains("INF2010"));
        assert!(reason.contains("MTH1000"));
    }

    #[test]
    fn failures_serialize_with_kind_tag() {
        let json = serde_json::to_value(ValidationFailure::AlreadyEnrolled {
            sigle: "INF1062".to_string(),
            trimestre: "Automne 2025".to_string(),
        })
        .expect("serialize");
        assert_eq!(json["kind"], "already_enrolled");
        assert_eq!(json["sigle"], "INF1062");
    }
}
