use serde::{Deserialize, Serialize};

use crate::domain::enrollment::Enrollment;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Student {
    /// Permanent code, stable across terms.
    pub code_permanent: String,
    pub nom: String,
    pub prenom: String,
    pub programme: String,
    pub statut: String,
}

impl Student {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.prenom, self.nom)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Program {
    pub code: String,
    pub libelle: String,
}

/// An active enrollment joined with the course it points at, so the
/// context carries title and credit value without further lookups.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ActiveEnrollment {
    pub enrollment: Enrollment,
    pub titre: String,
    pub credits: f64,
}

/// Derived academic context for one request. Built fresh every time;
/// never cached across requests, so writes are immediately visible.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StudentContext {
    pub student: Student,
    pub active_enrollments: Vec<ActiveEnrollment>,
    pub total_credits: f64,
}

impl StudentContext {
    pub fn new(student: Student, active_enrollments: Vec<ActiveEnrollment>) -> Self {
        let total_credits = active_enrollments.iter().map(|entry| entry.credits).sum();
        Self { student, active_enrollments, total_credits }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use crate::domain::course::Sigle;
    use crate::domain::enrollment::{Enrollment, EnrollmentId, EnrollmentStatus};
    use crate::domain::term::{Season, Term};

    use super::{ActiveEnrollment, Student, StudentContext};

    fn student() -> Student {
        Student {
            code_permanent: "TREJ12345678".to_string(),
            nom: "Tremblay".to_string(),
            prenom: "Julie".to_string(),
            programme: "7316".to_string(),
            statut: "actif".to_string(),
        }
    }

    fn active(sigle: &str, credits: f64) -> ActiveEnrollment {
        ActiveEnrollment {
            enrollment: Enrollment {
                id: EnrollmentId(format!("enr-{sigle}")),
                code_permanent: "TREJ12345678".to_string(),
                programme: "7316".to_string(),
                trimestre_plan: None,
                sigle: Sigle::parse(sigle).expect("sigle"),
                trimestre: Term::new(Season::Autumn, 2025),
                annee: 2025,
                statut: EnrollmentStatus::Enrolled,
                date_inscription: Utc::now(),
                note_finale: None,
            },
            titre: format!("Cours {sigle}"),
            credits,
        }
    }

    #[test]
    fn total_credits_is_the_sum_of_active_courses() {
        let context =
            StudentContext::new(student(), vec![active("INF1062", 3.0), active("MAT1600", 4.0)]);
        assert_eq!(context.total_credits, 7.0);
    }

    #[test]
    fn empty_context_has_zero_credits() {
        let context = StudentContext::new(student(), Vec::new());
        assert_eq!(context.total_credits, 0.0);
        assert!(context.active_enrollments.is_empty());
    }
}
