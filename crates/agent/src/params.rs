use cursus_core::domain::intent::IntentParameters;
use cursus_core::domain::term::Term;

use crate::errors::AgentError;

pub(crate) fn required_sigles(parameters: &IntentParameters) -> Result<&[String], AgentError> {
    if parameters.sigles_cours.is_empty() {
        return Err(AgentError::MissingParameter { name: "sigles_cours" });
    }
    Ok(&parameters.sigles_cours)
}

/// Term for operations that apply to the whole batch. The year may come
/// inline (`"Automne 2025"`) or through the separate `annee` parameter.
pub(crate) fn required_term(parameters: &IntentParameters) -> Result<Term, AgentError> {
    match optional_term(parameters)? {
        Some(term) => Ok(term),
        None => Err(AgentError::MissingParameter { name: "trimestre" }),
    }
}

pub(crate) fn optional_term(parameters: &IntentParameters) -> Result<Option<Term>, AgentError> {
    let Some(raw) = parameters.trimestre.as_deref() else {
        return Ok(None);
    };

    let fallback_year = parameters.annee.and_then(|year| i32::try_from(year).ok());
    Term::parse(raw, fallback_year)
        .map(Some)
        .map_err(|error| AgentError::InvalidParameter {
            name: "trimestre",
            message: error.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use cursus_core::domain::intent::IntentParameters;
    use cursus_core::domain::term::{Season, Term};

    use crate::errors::AgentError;

    use super::{optional_term, required_sigles, required_term};

    #[test]
    fn missing_sigles_is_a_request_level_failure() {
        let error = required_sigles(&IntentParameters::default()).err().expect("should fail");
        assert!(matches!(error, AgentError::MissingParameter { name: "sigles_cours" }));
    }

    #[test]
    fn inline_year_wins_over_annee_parameter() {
        let parameters = IntentParameters {
            trimestre: Some("Automne 2025".to_string()),
            annee: Some(2031),
            ..IntentParameters::default()
        };
        assert_eq!(required_term(&parameters).expect("term"), Term::new(Season::Autumn, 2025));
    }

    #[test]
    fn annee_parameter_completes_a_bare_season() {
        let parameters = IntentParameters {
            trimestre: Some("Hiver".to_string()),
            annee: Some(2026),
            ..IntentParameters::default()
        };
        assert_eq!(required_term(&parameters).expect("term"), Term::new(Season::Winter, 2026));
    }

    #[test]
    fn unparseable_term_is_an_invalid_parameter() {
        let parameters = IntentParameters {
            trimestre: Some("Printemps 2025".to_string()),
            ..IntentParameters::default()
        };
        let error = optional_term(&parameters).err().expect("should fail");
        assert!(matches!(error, AgentError::InvalidParameter { name: "trimestre", .. }));
    }

    #[test]
    fn absent_term_is_fine_when_optional() {
        assert_eq!(optional_term(&IntentParameters::default()).expect("ok"), None);
    }
}
