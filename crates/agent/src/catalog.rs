use tracing::debug;

use cursus_core::config::RegistrationConfig;
use cursus_core::domain::intent::IntentParameters;
use cursus_core::domain::student::StudentContext;
use cursus_db::repositories::CourseSearchFilter;

use crate::errors::AgentError;
use crate::outcome::{RecommendationOutcome, SearchOutcome};
use crate::params::optional_term;
use crate::storage::Storage;

/// Common ways students describe a field of study, mapped to the
/// department code prefix used in sigles. The guess only widens the OR'd
/// text filter; it never excludes anything.
const DEPARTMENT_SYNONYMS: &[(&str, &[&str])] = &[
    ("INF", &["informatique", "programmation", "logiciel", "ordinateur", "computer", "programming", "software"]),
    ("MTH", &["mathématiques", "mathematiques", "math", "algèbre", "algebre", "calcul"]),
    ("PHY", &["physique", "physics"]),
    ("COM", &["communication", "rédaction", "redaction"]),
];

pub fn department_guess(criteria: &str) -> Option<String> {
    let needle = criteria.to_lowercase();
    DEPARTMENT_SYNONYMS
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|keyword| needle.contains(keyword)))
        .map(|(prefix, _)| (*prefix).to_string())
}

pub struct SearchHandler {
    storage: Storage,
}

impl SearchHandler {
    pub fn new(storage: Storage) -> Self {
        Self { storage }
    }

    /// No student context needed: searching the catalog is anonymous.
    pub async fn execute(
        &self,
        parameters: &IntentParameters,
    ) -> Result<SearchOutcome, AgentError> {
        let criteria =
            parameters.criteres_recherche.as_deref().unwrap_or_default().trim().to_string();
        let term = optional_term(parameters)?;
        let department_prefix = department_guess(&criteria);

        debug!(
            event_name = "agent.search.executing",
            criteria = %criteria,
            department_prefix = department_prefix.as_deref().unwrap_or("-"),
            trimestre = term.map(|term| term.label()).as_deref().unwrap_or("-"),
            "searching course catalog"
        );

        let matches = self
            .storage
            .courses
            .search(&CourseSearchFilter { criteria: criteria.clone(), department_prefix, term })
            .await?;

        Ok(SearchOutcome { criteria, trimestre: term.map(|term| term.label()), matches })
    }
}

/// Suggests courses from the student's own curriculum. Deliberately a
/// naive slice of the plan, not a ranking: prerequisite-readiness and
/// term availability are not consulted.
pub struct RecommendationHandler {
    storage: Storage,
    settings: RegistrationConfig,
}

impl RecommendationHandler {
    pub fn new(storage: Storage, settings: RegistrationConfig) -> Self {
        Self { storage, settings }
    }

    pub async fn execute(
        &self,
        parameters: &IntentParameters,
        context: Option<&StudentContext>,
    ) -> Result<RecommendationOutcome, AgentError> {
        let context = context.ok_or(AgentError::NoStudentContext)?;

        let desired = parameters
            .nombre_cours
            .and_then(|count| usize::try_from(count).ok())
            .filter(|count| *count > 0)
            .unwrap_or(self.settings.default_recommendations);

        let programme = context.student.programme.clone();
        let curriculum = self.storage.curriculum.list_courses(&programme).await?;
        let available = curriculum.len();
        let courses = curriculum.into_iter().take(desired).collect();

        Ok(RecommendationOutcome { programme, available, courses })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use cursus_core::config::RegistrationConfig;
    use cursus_core::domain::course::{Course, Sigle};
    use cursus_core::domain::curriculum::Offering;
    use cursus_core::domain::intent::IntentParameters;
    use cursus_core::domain::student::{Student, StudentContext};
    use cursus_db::repositories::{
        InMemoryAcademicCatalog, InMemoryEnrollmentRepository, InMemoryStudentRepository,
    };

    use crate::errors::AgentError;
    use crate::storage::Storage;

    use super::{department_guess, RecommendationHandler, SearchHandler};

    fn course(sigle: &str, titre: &str, departement: &str) -> Course {
        Course {
            sigle: Sigle::parse(sigle).expect("sigle"),
            titre: titre.to_string(),
            credits: 3.0,
            departement: departement.to_string(),
            contenu: String::new(),
            objectifs: String::new(),
            prealables: String::new(),
        }
    }

    async fn storage() -> (Storage, Arc<InMemoryAcademicCatalog>) {
        let catalog = Arc::new(InMemoryAcademicCatalog::default());
        catalog.add_course(course("INF1000", "Programmation I", "Informatique")).await;
        catalog.add_course(course("INF1062", "Organisation des ordinateurs", "Informatique")).await;
        catalog.add_course(course("MTH1000", "Mathématiques discrètes", "Mathématiques")).await;
        catalog.add_course(course("PHY1001", "Mécanique classique", "Physique")).await;

        let sigle = |value: &str| Sigle::parse(value).expect("sigle");
        catalog.add_curriculum_entry("7316", &sigle("INF1000"), None).await;
        catalog.add_curriculum_entry("7316", &sigle("INF1062"), None).await;
        catalog.add_curriculum_entry("7316", &sigle("MTH1000"), None).await;

        catalog
            .add_offering(Offering {
                sigle: sigle("INF1062"),
                trimestre: "Automne 2025".to_string(),
                groupe: "01".to_string(),
                jour: Some("Mardi".to_string()),
                heure: Some("9h30-12h30".to_string()),
                local: Some("A-1750".to_string()),
                enseignant: None,
            })
            .await;

        let enrollments = Arc::new(InMemoryEnrollmentRepository::new(catalog.clone()));
        let storage = Storage {
            students: Arc::new(InMemoryStudentRepository::default()),
            courses: catalog.clone(),
            curriculum: catalog.clone(),
            offerings: catalog.clone(),
            enrollments,
        };
        (storage, catalog)
    }

    fn context() -> StudentContext {
        StudentContext::new(
            Student {
                code_permanent: "TREJ12345678".to_string(),
                nom: "Tremblay".to_string(),
                prenom: "Julie".to_string(),
                programme: "7316".to_string(),
                statut: "actif".to_string(),
            },
            Vec::new(),
        )
    }

    fn settings() -> RegistrationConfig {
        RegistrationConfig {
            withdrawal_window_days: 30,
            passing_grade: 50.0,
            default_recommendations: 4,
        }
    }

    #[test]
    fn synonyms_map_to_department_prefixes() {
        assert_eq!(department_guess("cours de programmation"), Some("INF".to_string()));
        assert_eq!(department_guess("computer science"), Some("INF".to_string()));
        assert_eq!(department_guess("algèbre avancée"), Some("MTH".to_string()));
        assert_eq!(department_guess("histoire de l'art"), None);
    }

    #[tokio::test]
    async fn empty_criteria_without_term_returns_everything() {
        let (storage, _) = storage().await;
        let handler = SearchHandler::new(storage);

        let outcome =
            handler.execute(&IntentParameters::default()).await.expect("execute search");
        assert_eq!(outcome.matches.len(), 4);

        // Ordered by department, then sigle.
        let sigles: Vec<&str> =
            outcome.matches.iter().map(|entry| entry.course.sigle.as_str()).collect();
        assert_eq!(sigles, vec!["INF1000", "INF1062", "MTH1000", "PHY1001"]);
    }

    #[tokio::test]
    async fn synonym_criteria_find_department_courses() {
        let (storage, _) = storage().await;
        let handler = SearchHandler::new(storage);

        let outcome = handler
            .execute(&IntentParameters {
                criteres_recherche: Some("cours de programmation".to_string()),
                ..IntentParameters::default()
            })
            .await
            .expect("execute search");

        let sigles: Vec<&str> =
            outcome.matches.iter().map(|entry| entry.course.sigle.as_str()).collect();
        assert!(sigles.contains(&"INF1062"), "prefix guess should widen the match: {sigles:?}");
        assert!(sigles.contains(&"INF1000"));
    }

    #[tokio::test]
    async fn term_restricted_search_carries_schedule_metadata() {
        let (storage, _) = storage().await;
        let handler = SearchHandler::new(storage);

        let outcome = handler
            .execute(&IntentParameters {
                trimestre: Some("Automne 2025".to_string()),
                ..IntentParameters::default()
            })
            .await
            .expect("execute search");

        assert_eq!(outcome.matches.len(), 1);
        assert_eq!(outcome.trimestre.as_deref(), Some("Automne 2025"));
        let offering = outcome.matches[0].offering.as_ref().expect("offering annotation");
        assert_eq!(offering.local.as_deref(), Some("A-1750"));
    }

    #[tokio::test]
    async fn recommendation_slices_the_curriculum() {
        let (storage, _) = storage().await;
        let handler = RecommendationHandler::new(storage, settings());

        let outcome = handler
            .execute(
                &IntentParameters { nombre_cours: Some(2), ..IntentParameters::default() },
                Some(&context()),
            )
            .await
            .expect("execute recommendation");

        assert_eq!(outcome.available, 3);
        assert_eq!(outcome.courses.len(), 2);
        assert_eq!(outcome.programme, "7316");
    }

    #[tokio::test]
    async fn recommendation_defaults_to_configured_count() {
        let (storage, _) = storage().await;
        let handler = RecommendationHandler::new(storage, settings());

        let outcome = handler
            .execute(&IntentParameters::default(), Some(&context()))
            .await
            .expect("execute recommendation");
        assert_eq!(outcome.courses.len(), 3, "plan smaller than the default count");
    }

    #[tokio::test]
    async fn recommendation_requires_context() {
        let (storage, _) = storage().await;
        let handler = RecommendationHandler::new(storage, settings());

        let error =
            handler.execute(&IntentParameters::default(), None).await.err().expect("should fail");
        assert!(matches!(error, AgentError::NoStudentContext));
    }
}
