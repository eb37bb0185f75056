use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Academic season. Labels are the French forms used across the
/// registration data (`horaire.trimestre`, `inscription.trimestre`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Season {
    Autumn,
    Winter,
    Summer,
}

impl Season {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Autumn => "Automne",
            Self::Winter => "Hiver",
            Self::Summer => "Été",
        }
    }

    /// Accepts the French season names plus common unaccented and English
    /// aliases seen in free-text requests.
    pub fn parse(value: &str) -> Option<Self> {
        match normalize_token(value).as_str() {
            "automne" | "autumn" | "fall" => Some(Self::Autumn),
            "hiver" | "winter" => Some(Self::Winter),
            "ete" | "summer" => Some(Self::Summer),
            _ => None,
        }
    }
}

/// A trimester: season plus calendar year, e.g. `Automne 2025`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Term {
    pub season: Season,
    pub year: i32,
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum TermError {
    #[error("trimestre vide")]
    Empty,
    #[error("saison inconnue dans `{0}`")]
    UnknownSeason(String),
    #[error("année manquante pour le trimestre `{0}`")]
    MissingYear(String),
    #[error("année invalide dans `{0}`")]
    InvalidYear(String),
}

impl Term {
    pub fn new(season: Season, year: i32) -> Self {
        Self { season, year }
    }

    /// Canonical label stored in `horaire.trimestre` and shown to students.
    pub fn label(&self) -> String {
        format!("{} {}", self.season.label(), self.year)
    }

    /// Parses a term label such as `"Automne 2025"`. When the label carries
    /// no year (`"Automne"`), `fallback_year` supplies it.
    pub fn parse(value: &str, fallback_year: Option<i32>) -> Result<Self, TermError> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(TermError::Empty);
        }

        let mut words = trimmed.split_whitespace();
        let season_word = words.next().ok_or(TermError::Empty)?;
        let season = Season::parse(season_word)
            .ok_or_else(|| TermError::UnknownSeason(trimmed.to_string()))?;

        match words.next() {
            Some(year_word) => {
                let year = year_word
                    .parse::<i32>()
                    .map_err(|_| TermError::InvalidYear(trimmed.to_string()))?;
                Ok(Self { season, year })
            }
            None => fallback_year
                .map(|year| Self { season, year })
                .ok_or_else(|| TermError::MissingYear(trimmed.to_string())),
        }
    }
}

impl std::fmt::Display for Term {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{} {}", self.season.label(), self.year)
    }
}

fn normalize_token(value: &str) -> String {
    value
        .trim()
        .chars()
        .filter(|character| character.is_alphabetic())
        .flat_map(|character| match character {
            'é' | 'è' | 'ê' | 'É' | 'È' | 'Ê' => vec!['e'],
            other => other.to_lowercase().collect(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{Season, Term, TermError};

    #[test]
    fn parses_full_french_label() {
        let term = Term::parse("Automne 2025", None).expect("parse");
        assert_eq!(term, Term::new(Season::Autumn, 2025));
        assert_eq!(term.label(), "Automne 2025");
    }

    #[test]
    fn parses_accented_and_unaccented_summer() {
        assert_eq!(Term::parse("Été 2026", None).expect("accented").season, Season::Summer);
        assert_eq!(Term::parse("ete 2026", None).expect("unaccented").season, Season::Summer);
    }

    #[test]
    fn english_aliases_normalize_to_french_labels() {
        let term = Term::parse("fall 2025", None).expect("parse");
        assert_eq!(term.label(), "Automne 2025");
        assert_eq!(Term::parse("winter 2026", None).expect("parse").label(), "Hiver 2026");
    }

    #[test]
    fn season_without_year_uses_fallback() {
        let term = Term::parse("Hiver", Some(2026)).expect("parse");
        assert_eq!(term, Term::new(Season::Winter, 2026));
    }

    #[test]
    fn season_without_year_and_no_fallback_fails() {
        assert_eq!(
            Term::parse("Hiver", None),
            Err(TermError::MissingYear("Hiver".to_string()))
        );
    }

    #[test]
    fn unknown_season_is_rejected() {
        assert!(matches!(Term::parse("Printemps 2025", None), Err(TermError::UnknownSeason(_))));
    }
}
