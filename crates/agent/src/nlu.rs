use std::sync::Arc;

use async_trait::async_trait;

use cursus_core::config::NluConfig;
use cursus_core::domain::intent::{Intent, IntentAction, IntentPayload};
use cursus_core::domain::student::StudentContext;

use crate::errors::NluError;
use crate::llm::{CompletionOptions, LlmClient};
use crate::outcome::OperationOutcome;

/// Converts a free-text student message into a typed [`Intent`].
#[async_trait]
pub trait IntentAnalyzer: Send + Sync {
    async fn infer(
        &self,
        message: &str,
        context: Option<&StudentContext>,
    ) -> Result<Intent, NluError>;
}

/// Optional paraphrase of the structured result. When it fails, the
/// caller keeps the template renderer's output.
#[async_trait]
pub trait ResponseSynthesizer: Send + Sync {
    async fn render(
        &self,
        intent: &Intent,
        outcome: &OperationOutcome,
        context: Option<&StudentContext>,
    ) -> anyhow::Result<String>;
}

pub struct LlmIntentAnalyzer {
    client: Arc<dyn LlmClient>,
    options: CompletionOptions,
}

impl LlmIntentAnalyzer {
    pub fn new(client: Arc<dyn LlmClient>, config: &NluConfig) -> Self {
        Self {
            client,
            options: CompletionOptions {
                temperature: config.temperature,
                max_tokens: config.max_tokens,
            },
        }
    }
}

#[async_trait]
impl IntentAnalyzer for LlmIntentAnalyzer {
    async fn infer(
        &self,
        message: &str,
        context: Option<&StudentContext>,
    ) -> Result<Intent, NluError> {
        let prompt = extraction_prompt(message, context);
        let completion = self
            .client
            .complete(&prompt, self.options)
            .await
            .map_err(NluError::Transport)?;

        let block = extract_json_block(&completion).ok_or_else(|| {
            NluError::MalformedResponse("no JSON object in model output".to_string())
        })?;

        let payload: IntentPayload = serde_json::from_str(block)
            .map_err(|error| NluError::MalformedResponse(error.to_string()))?;

        let action = IntentAction::parse(&payload.action)
            .ok_or_else(|| NluError::UnknownAction(payload.action.clone()))?;

        Ok(Intent {
            action,
            confidence: payload.confiance,
            parameters: payload.parametres.normalized(),
            rationale: payload.raisonnement,
        })
    }
}

pub struct LlmResponseSynthesizer {
    client: Arc<dyn LlmClient>,
    options: CompletionOptions,
}

impl LlmResponseSynthesizer {
    pub fn new(client: Arc<dyn LlmClient>, config: &NluConfig) -> Self {
        Self {
            client,
            options: CompletionOptions {
                temperature: config.answer_temperature,
                max_tokens: config.max_tokens,
            },
        }
    }
}

#[async_trait]
impl ResponseSynthesizer for LlmResponseSynthesizer {
    async fn render(
        &self,
        intent: &Intent,
        outcome: &OperationOutcome,
        context: Option<&StudentContext>,
    ) -> anyhow::Result<String> {
        let prompt = synthesis_prompt(intent, outcome, context)?;
        let completion = self.client.complete(&prompt, self.options).await?;
        Ok(completion.trim().to_string())
    }
}

fn extraction_prompt(message: &str, context: Option<&StudentContext>) -> String {
    let mut prompt = format!(
        r#"Tu es un assistant d'inscription académique pour une université. Analyse cette demande d'étudiant et détermine l'action à effectuer.

Actions disponibles:
- INSCRIRE_COURS: L'étudiant veut s'inscrire à des cours
- DESINSCRIRE_COURS: L'étudiant veut se désinscrire de cours
- VOIR_COURS: L'étudiant veut voir ses cours actuels
- CHERCHER_COURS: L'étudiant veut chercher des cours disponibles
- RECOMMANDER_COURS: L'étudiant veut des suggestions de cours pour son programme
- INFO_ETUDIANT: L'étudiant veut voir ses informations

Message de l'étudiant: "{message}"
"#
    );

    if let Some(context) = context {
        let summary = serde_json::json!({
            "code_permanent": context.student.code_permanent,
            "programme": context.student.programme,
            "cours_actifs": context.active_enrollments.len(),
            "total_credits": context.total_credits,
        });
        prompt.push_str(&format!("Contexte: {summary}\n"));
    }

    prompt.push_str(
        r#"
Réponds uniquement en JSON avec cette structure:
{
  "action": "NOM_ACTION",
  "confiance": 0.95,
  "parametres": {
    "code_permanent": "code si mentionné",
    "nombre_cours": 4,
    "sigles_cours": ["liste des sigles si mentionnés"],
    "trimestre": "trimestre si mentionné",
    "annee": 2025,
    "criteres_recherche": "critères additionnels"
  },
  "raisonnement": "pourquoi cette action a été choisie"
}"#,
    );

    prompt
}

fn synthesis_prompt(
    intent: &Intent,
    outcome: &OperationOutcome,
    context: Option<&StudentContext>,
) -> anyhow::Result<String> {
    let intent_json = serde_json::to_string_pretty(intent)?;
    let outcome_json = serde_json::to_string_pretty(outcome)?;

    let mut prompt = format!(
        r#"Génère une réponse amicale et naturelle en français pour l'étudiant.

Intention analysée: {intent_json}
Résultats de l'opération: {outcome_json}
"#
    );

    if let Some(context) = context {
        prompt.push_str(&format!(
            "Étudiant: {} (programme {})\n",
            context.student.full_name(),
            context.student.programme
        ));
    }

    prompt.push_str(
        r#"
Crée une réponse qui:
- Confirme ce qui a été fait
- Mentionne les détails spécifiques (noms de cours, crédits, etc.)
- Est encourageante et professionnelle
- Inclut des conseils ou prochaines étapes si pertinent
- Sonne comme un conseiller pédagogique serviable"#,
    );

    Ok(prompt)
}

/// The model is asked for bare JSON but tends to wrap it in chatter; keep
/// everything between the first `{` and the last `}`.
fn extract_json_block(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end >= start).then(|| &text[start..=end])
}
