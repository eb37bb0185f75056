use serde::{Deserialize, Serialize};

use crate::domain::course::Sigle;

/// One (program, course) pairing of a plan of study.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurriculumEntry {
    pub programme: String,
    pub sigle: Sigle,
    /// Term in which the plan nominally places the course.
    pub trimestre_plan: Option<String>,
}

/// A scheduled instance of a course in a specific term.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Offering {
    pub sigle: Sigle,
    /// Normalized term label, e.g. `Automne 2025`.
    pub trimestre: String,
    pub groupe: String,
    pub jour: Option<String>,
    pub heure: Option<String>,
    pub local: Option<String>,
    pub enseignant: Option<String>,
}

impl Offering {
    /// One-line schedule summary for display, skipping absent fields.
    pub fn schedule_line(&self) -> String {
        let mut parts = vec![format!("groupe {}", self.groupe)];
        if let Some(jour) = &self.jour {
            parts.push(jour.clone());
        }
        if let Some(heure) = &self.heure {
            parts.push(heure.clone());
        }
        if let Some(local) = &self.local {
            parts.push(format!("local {local}"));
        }
        if let Some(enseignant) = &self.enseignant {
            parts.push(format!("avec {enseignant}"));
        }
        parts.join(", ")
    }
}

#[cfg(test)]
mod tests {
    use crate::domain::course::Sigle;

    use super::Offering;

    #[test]
    fn schedule_line_skips_absent_fields() {
        let offering = Offering {
            sigle: Sigle::parse("INF1062").expect("sigle"),
            trimestre: "Automne 2025".to_string(),
            groupe: "01".to_string(),
            jour: Some("Lundi".to_string()),
            heure: None,
            local: Some("A-1750".to_string()),
            enseignant: None,
        };
        assert_eq!(offering.schedule_line(), "groupe 01, Lundi, local A-1750");
    }
}
