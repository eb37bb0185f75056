use cursus_core::domain::student::StudentContext;

use crate::outcome::{
    BatchOutcome, EnrollmentsOutcome, OperationOutcome, RecommendationOutcome, SearchOutcome,
};

/// Search results beyond this many are summarized as a remainder count.
const SEARCH_DISPLAY_LIMIT: usize = 10;

/// Template renderers, one per action. Pure functions of the structured
/// outcome; the optional LLM paraphrase layers on top of (and falls back
/// to) this output.
pub fn render(outcome: &OperationOutcome, context: Option<&StudentContext>) -> String {
    match outcome {
        OperationOutcome::Registration(batch) => render_registration(batch),
        OperationOutcome::Withdrawal(batch) => render_withdrawal(batch),
        OperationOutcome::Search(search) => render_search(search),
        OperationOutcome::Recommendation(recommendation) => {
            render_recommendation(recommendation, context)
        }
        OperationOutcome::Enrollments(enrollments) => render_enrollments(enrollments),
        OperationOutcome::StudentInfo(student_context) => render_student_info(student_context),
    }
}

pub fn render_registration(batch: &BatchOutcome) -> String {
    render_batch(batch, "Inscriptions réussies", "Inscriptions refusées")
}

pub fn render_withdrawal(batch: &BatchOutcome) -> String {
    render_batch(batch, "Désinscriptions réussies", "Désinscriptions refusées")
}

fn render_batch(batch: &BatchOutcome, success_header: &str, failure_header: &str) -> String {
    if batch.results.is_empty() {
        return "Aucun cours n'a été traité.".to_string();
    }

    let mut lines = Vec::new();
    let successes: Vec<_> = batch.results.iter().filter(|result| result.success).collect();
    let failures: Vec<_> = batch.results.iter().filter(|result| !result.success).collect();

    if !successes.is_empty() {
        lines.push(format!("{success_header} ({}) :", successes.len()));
        for result in &successes {
            let titre = result.titre.as_deref().unwrap_or(&result.sigle);
            match result.credits {
                Some(credits) => lines.push(format!(
                    "- {} — {} ({} crédits)",
                    result.sigle,
                    titre,
                    format_credits(credits)
                )),
                None => lines.push(format!("- {} — {}", result.sigle, titre)),
            }
        }
    }

    if !failures.is_empty() {
        if !lines.is_empty() {
            lines.push(String::new());
        }
        lines.push(format!("{failure_header} ({}) :", failures.len()));
        for result in &failures {
            lines.push(format!("- {} : {}", result.sigle, result.message));
        }
    }

    lines.join("\n")
}

pub fn render_search(search: &SearchOutcome) -> String {
    if search.matches.is_empty() {
        return "Aucun cours ne correspond à votre recherche.".to_string();
    }

    let total = search.matches.len();
    let header = match (&search.trimestre, total) {
        (Some(trimestre), 1) => format!("1 cours trouvé pour {trimestre} :"),
        (Some(trimestre), _) => format!("{total} cours trouvés pour {trimestre} :"),
        (None, 1) => "1 cours trouvé :".to_string(),
        (None, _) => format!("{total} cours trouvés :"),
    };

    let mut lines = vec![header];
    for entry in search.matches.iter().take(SEARCH_DISPLAY_LIMIT) {
        lines.push(format!(
            "- {} — {} ({} crédits, {})",
            entry.course.sigle,
            entry.course.titre,
            format_credits(entry.course.credits),
            entry.course.departement
        ));
        if let Some(offering) = &entry.offering {
            lines.push(format!("  Horaire : {}", offering.schedule_line()));
        }
    }

    if total > SEARCH_DISPLAY_LIMIT {
        lines.push(format!("… et {} autres cours", total - SEARCH_DISPLAY_LIMIT));
    }

    lines.join("\n")
}

pub fn render_recommendation(
    recommendation: &RecommendationOutcome,
    context: Option<&StudentContext>,
) -> String {
    if recommendation.courses.is_empty() {
        return "Aucun cours à recommander pour le moment.".to_string();
    }

    let programme = context
        .map(|context| context.student.programme.clone())
        .unwrap_or_else(|| recommendation.programme.clone());

    let mut lines = vec![format!("Cours suggérés du programme {programme} :")];
    for (position, course) in recommendation.courses.iter().enumerate() {
        lines.push(format!(
            "{}. {} — {} ({} crédits)",
            position + 1,
            course.sigle,
            course.titre,
            format_credits(course.credits)
        ));
    }
    lines.push(format!(
        "{} cours proposés sur {} disponibles dans votre programme.",
        recommendation.courses.len(),
        recommendation.available
    ));

    lines.join("\n")
}

pub fn render_enrollments(enrollments: &EnrollmentsOutcome) -> String {
    if enrollments.active.is_empty() {
        return "Aucune inscription active pour le moment.".to_string();
    }

    let mut lines = vec!["Vos cours actuels :".to_string()];
    for entry in &enrollments.active {
        lines.push(format!(
            "- {} — {} ({} crédits, {})",
            entry.enrollment.sigle,
            entry.titre,
            format_credits(entry.credits),
            entry.enrollment.trimestre.label()
        ));
    }
    lines.push(format!("Total : {} crédits", format_credits(enrollments.total_credits)));

    lines.join("\n")
}

pub fn render_student_info(context: &StudentContext) -> String {
    let mut lines = vec![
        "Dossier étudiant :".to_string(),
        format!("Nom : {}", context.student.full_name()),
        format!("Code permanent : {}", context.student.code_permanent),
        format!("Programme : {}", context.student.programme),
        format!("Statut : {}", context.student.statut),
    ];

    if context.active_enrollments.is_empty() {
        lines.push("Aucune inscription active pour le moment.".to_string());
    } else {
        lines.push(format!(
            "Cours actifs : {} ({} crédits)",
            context.active_enrollments.len(),
            format_credits(context.total_credits)
        ));
    }

    lines.join("\n")
}

fn format_credits(credits: f64) -> String {
    if credits.fract() == 0.0 {
        format!("{credits:.0}")
    } else {
        format!("{credits}")
    }
}
