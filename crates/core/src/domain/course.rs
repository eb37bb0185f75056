use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Course code: three letters followed by four digits (`INF1062`).
/// Stored uppercase; parsing normalizes case.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Sigle(pub String);

#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("sigle invalide `{0}` (attendu: 3 lettres suivies de 4 chiffres)")]
pub struct SigleError(pub String);

impl Sigle {
    pub fn parse(value: &str) -> Result<Self, SigleError> {
        let trimmed = value.trim();
        if is_sigle_shaped(trimmed) {
            Ok(Self(trimmed.to_ascii_uppercase()))
        } else {
            Err(SigleError(trimmed.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Department prefix, the three leading letters (`INF` for `INF1062`).
    pub fn department_prefix(&self) -> &str {
        &self.0[..3]
    }
}

impl std::fmt::Display for Sigle {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(&self.0)
    }
}

fn is_sigle_shaped(value: &str) -> bool {
    let bytes = value.as_bytes();
    bytes.len() == 7
        && bytes[..3].iter().all(u8::is_ascii_alphabetic)
        && bytes[3..].iter().all(u8::is_ascii_digit)
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Course {
    pub sigle: Sigle,
    pub titre: String,
    pub credits: f64,
    pub departement: String,
    pub contenu: String,
    pub objectifs: String,
    /// Free-text prerequisite expression; course codes are extracted with
    /// [`Course::prerequisite_sigles`].
    pub prealables: String,
}

impl Course {
    /// Extracts the course codes required by the prerequisite expression.
    /// The column holds comma-separated codes in practice but tolerates
    /// prose (`"INF1000 et MAT1000"`); any sigle-shaped token counts,
    /// duplicates are dropped, order is preserved.
    pub fn prerequisite_sigles(&self) -> Vec<Sigle> {
        let mut sigles = Vec::new();
        for token in self.prealables.split(|c: char| !c.is_ascii_alphanumeric()) {
            if let Ok(sigle) = Sigle::parse(token) {
                if !sigles.contains(&sigle) {
                    sigles.push(sigle);
                }
            }
        }
        sigles
    }
}

#[cfg(test)]
mod tests {
    use super::{Course, Sigle};

    fn course(prealables: &str) -> Course {
        Course {
            sigle: Sigle::parse("INF2010").expect("sigle"),
            titre: "Structures de données".to_string(),
            credits: 3.0,
            departement: "Informatique".to_string(),
            contenu: String::new(),
            objectifs: String::new(),
            prealables: prealables.to_string(),
        }
    }

    #[test]
    fn parses_and_normalizes_case() {
        let sigle = Sigle::parse("inf1062").expect("parse");
        assert_eq!(sigle.as_str(), "INF1062");
        assert_eq!(sigle.department_prefix(), "INF");
    }

    #[test]
    fn rejects_malformed_codes() {
        assert!(Sigle::parse("INF106").is_err());
        assert!(Sigle::parse("INFO1062").is_err());
        assert!(Sigle::parse("1062INF").is_err());
        assert!(Sigle::parse("").is_err());
    }

    #[test]
    fn extracts_comma_separated_prerequisites() {
        let sigles = course("INF1000, MTH1000").prerequisite_sigles();
        assert_eq!(
            sigles,
            vec![Sigle::parse("INF1000").expect("a"), Sigle::parse("MTH1000").expect("b")]
        );
    }

    #[test]
    fn tolerates_prose_and_duplicates() {
        let sigles = course("INF1000 et inf1000, ou MAT1600 (recommandé)").prerequisite_sigles();
        assert_eq!(
            sigles,
            vec![Sigle::parse("INF1000").expect("a"), Sigle::parse("MAT1600").expect("b")]
        );
    }

    #[test]
    fn empty_expression_has_no_prerequisites() {
        assert!(course("").prerequisite_sigles().is_empty());
    }
}
