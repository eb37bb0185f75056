use serde::{Deserialize, Deserializer, Serialize};

/// The six actions the understanding collaborator may select. Wire names
/// are the French tokens the extraction prompt enumerates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IntentAction {
    #[serde(rename = "INSCRIRE_COURS")]
    Register,
    #[serde(rename = "DESINSCRIRE_COURS")]
    Withdraw,
    #[serde(rename = "VOIR_COURS")]
    ViewEnrollments,
    #[serde(rename = "CHERCHER_COURS")]
    Search,
    #[serde(rename = "RECOMMANDER_COURS")]
    Recommend,
    #[serde(rename = "INFO_ETUDIANT")]
    StudentInfo,
}

impl IntentAction {
    pub fn wire_name(&self) -> &'static str {
        match self {
            Self::Register => "INSCRIRE_COURS",
            Self::Withdraw => "DESINSCRIRE_COURS",
            Self::ViewEnrollments => "VOIR_COURS",
            Self::Search => "CHERCHER_COURS",
            Self::Recommend => "RECOMMANDER_COURS",
            Self::StudentInfo => "INFO_ETUDIANT",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_uppercase().as_str() {
            "INSCRIRE_COURS" => Some(Self::Register),
            "DESINSCRIRE_COURS" => Some(Self::Withdraw),
            "VOIR_COURS" => Some(Self::ViewEnrollments),
            "CHERCHER_COURS" => Some(Self::Search),
            "RECOMMANDER_COURS" => Some(Self::Recommend),
            "INFO_ETUDIANT" => Some(Self::StudentInfo),
            _ => None,
        }
    }
}

/// Action-specific parameters, all optional: the language model fills in
/// what the message mentions and omits the rest. Numeric fields tolerate
/// being quoted, a frequent model quirk.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct IntentParameters {
    #[serde(default)]
    pub code_permanent: Option<String>,
    #[serde(default, deserialize_with = "string_or_list")]
    pub sigles_cours: Vec<String>,
    #[serde(default)]
    pub trimestre: Option<String>,
    #[serde(default, deserialize_with = "lenient_opt_i64")]
    pub annee: Option<i64>,
    #[serde(default, deserialize_with = "lenient_opt_i64")]
    pub nombre_cours: Option<i64>,
    #[serde(default)]
    pub criteres_recherche: Option<String>,
}

impl IntentParameters {
    /// Collapses blank strings to `None` so downstream checks only have to
    /// test presence.
    pub fn normalized(mut self) -> Self {
        self.code_permanent = self.code_permanent.filter(|value| !value.trim().is_empty());
        self.trimestre = self.trimestre.filter(|value| !value.trim().is_empty());
        self.criteres_recherche =
            self.criteres_recherche.filter(|value| !value.trim().is_empty());
        self.sigles_cours.retain(|value| !value.trim().is_empty());
        self
    }
}

/// A typed intent as produced by the understanding collaborator.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Intent {
    pub action: IntentAction,
    pub confidence: f64,
    pub parameters: IntentParameters,
    pub rationale: String,
}

/// Raw JSON payload emitted by the extraction prompt, French keys as-is.
#[derive(Clone, Debug, Deserialize)]
pub struct IntentPayload {
    pub action: String,
    #[serde(default, alias = "confidence")]
    pub confiance: f64,
    #[serde(default)]
    pub parametres: IntentParameters,
    #[serde(default, alias = "rationale")]
    pub raisonnement: String,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum LenientNumber {
    Integer(i64),
    Float(f64),
    Text(String),
}

fn lenient_opt_i64<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<LenientNumber>::deserialize(deserializer)?;
    Ok(value.and_then(|number| match number {
        LenientNumber::Integer(integer) => Some(integer),
        LenientNumber::Float(float) => Some(float as i64),
        LenientNumber::Text(text) => text.trim().parse::<i64>().ok(),
    }))
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StringOrList {
    One(String),
    Many(Vec<String>),
}

fn string_or_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<StringOrList>::deserialize(deserializer)?;
    Ok(match value {
        None => Vec::new(),
        Some(StringOrList::One(single)) => vec![single],
        Some(StringOrList::Many(many)) => many,
    })
}

#[cfg(test)]
mod tests {
    use super::{IntentAction, IntentPayload};

    #[test]
    fn action_wire_names_round_trip() {
        for action in [
            IntentAction::Register,
            IntentAction::Withdraw,
            IntentAction::ViewEnrollments,
            IntentAction::Search,
            IntentAction::Recommend,
            IntentAction::StudentInfo,
        ] {
            assert_eq!(IntentAction::parse(action.wire_name()), Some(action));
        }
        assert_eq!(IntentAction::parse("ANNULER_SESSION"), None);
    }

    #[test]
    fn action_parse_is_case_and_whitespace_tolerant() {
        assert_eq!(IntentAction::parse(" inscrire_cours "), Some(IntentAction::Register));
    }

    #[test]
    fn payload_deserializes_typical_model_output() {
        let payload: IntentPayload = serde_json::from_str(
            r#"{
                "action": "INSCRIRE_COURS",
                "confiance": 0.95,
                "parametres": {
                    "sigles_cours": ["INF1062", "MAT1600"],
                    "trimestre": "Automne 2025"
                },
                "raisonnement": "L'étudiant demande une inscription"
            }"#,
        )
        .expect("deserialize");

        assert_eq!(payload.action, "INSCRIRE_COURS");
        assert_eq!(payload.confiance, 0.95);
        assert_eq!(payload.parametres.sigles_cours, vec!["INF1062", "MAT1600"]);
        assert_eq!(payload.parametres.trimestre.as_deref(), Some("Automne 2025"));
    }

    #[test]
    fn payload_tolerates_quoted_numbers_and_single_sigle() {
        let payload: IntentPayload = serde_json::from_str(
            r#"{
                "action": "DESINSCRIRE_COURS",
                "parametres": {
                    "sigles_cours": "INF1062",
                    "annee": "2025",
                    "nombre_cours": "4"
                }
            }"#,
        )
        .expect("deserialize");

        assert_eq!(payload.parametres.sigles_cours, vec!["INF1062"]);
        assert_eq!(payload.parametres.annee, Some(2025));
        assert_eq!(payload.parametres.nombre_cours, Some(4));
    }

    #[test]
    fn normalization_drops_blank_fields() {
        let payload: IntentPayload = serde_json::from_str(
            r#"{
                "action": "CHERCHER_COURS",
                "parametres": {
                    "trimestre": "  ",
                    "criteres_recherche": "programmation",
                    "sigles_cours": ["", "INF1062"]
                }
            }"#,
        )
        .expect("deserialize");

        let parameters = payload.parametres.normalized();
        assert!(parameters.trimestre.is_none());
        assert_eq!(parameters.criteres_recherche.as_deref(), Some("programmation"));
        assert_eq!(parameters.sigles_cours, vec!["INF1062"]);
    }
}
