use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use cursus_core::config::RegistrationConfig;
use cursus_core::domain::intent::{Intent, IntentAction};
use cursus_core::domain::student::StudentContext;

use crate::catalog::{RecommendationHandler, SearchHandler};
use crate::context::ContextResolver;
use crate::errors::AgentError;
use crate::format;
use crate::nlu::{IntentAnalyzer, ResponseSynthesizer};
use crate::outcome::OperationOutcome;
use crate::profile;
use crate::registration::RegistrationHandler;
use crate::storage::Storage;
use crate::withdrawal::WithdrawalHandler;

const FAILURE_RESPONSE: &str =
    "Désolé, j'ai rencontré une erreur en traitant votre demande. Veuillez réessayer.";

/// Envelope returned to every caller; failures are data here, never a
/// raised error.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ResponseEnvelope {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub intent: Option<Intent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub results: Option<OperationOutcome>,
    pub response: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub timestamp: DateTime<Utc>,
}

/// Top-level request orchestrator: infer intent, resolve context,
/// dispatch on the action enum, render. The action match is exhaustive;
/// an action token the understanding collaborator invents dies earlier,
/// at intent parsing.
pub struct AgentRuntime {
    analyzer: Arc<dyn IntentAnalyzer>,
    synthesizer: Option<Arc<dyn ResponseSynthesizer>>,
    resolver: ContextResolver,
    registration: RegistrationHandler,
    withdrawal: WithdrawalHandler,
    search: SearchHandler,
    recommendation: RecommendationHandler,
}

impl AgentRuntime {
    pub fn new(
        analyzer: Arc<dyn IntentAnalyzer>,
        synthesizer: Option<Arc<dyn ResponseSynthesizer>>,
        storage: Storage,
        settings: RegistrationConfig,
    ) -> Self {
        Self {
            analyzer,
            synthesizer,
            resolver: ContextResolver::new(storage.students.clone(), storage.enrollments.clone()),
            registration: RegistrationHandler::new(storage.clone(), settings.clone()),
            withdrawal: WithdrawalHandler::new(storage.clone(), settings.clone()),
            search: SearchHandler::new(storage.clone()),
            recommendation: RecommendationHandler::new(storage, settings),
        }
    }

    pub async fn process(&self, message: &str, code_permanent: Option<&str>) -> ResponseEnvelope {
        match self.process_inner(message, code_permanent).await {
            Ok(envelope) => envelope,
            Err(error) => {
                error!(
                    event_name = "agent.request_failed",
                    error = %error,
                    "request converted to failure envelope"
                );
                ResponseEnvelope {
                    success: false,
                    intent: None,
                    results: None,
                    response: FAILURE_RESPONSE.to_string(),
                    error: Some(error.to_string()),
                    timestamp: Utc::now(),
                }
            }
        }
    }

    async fn process_inner(
        &self,
        message: &str,
        code_permanent: Option<&str>,
    ) -> Result<ResponseEnvelope, AgentError> {
        let intent = self.analyzer.infer(message, None).await?;
        info!(
            event_name = "agent.intent_inferred",
            action = intent.action.wire_name(),
            confidence = intent.confidence,
            "intent inferred from message"
        );

        // The caller-supplied identity wins; a code the student spelled
        // out in the message is the fallback.
        let code = code_permanent.or(intent.parameters.code_permanent.as_deref());
        let context = match code {
            Some(code) => self.resolver.resolve(code).await?,
            None => None,
        };

        let outcome = self.dispatch(&intent, context.as_ref()).await?;
        let response = self.render_response(&intent, &outcome, context.as_ref()).await;

        Ok(ResponseEnvelope {
            success: true,
            intent: Some(intent),
            results: Some(outcome),
            response,
            error: None,
            timestamp: Utc::now(),
        })
    }

    async fn dispatch(
        &self,
        intent: &Intent,
        context: Option<&StudentContext>,
    ) -> Result<OperationOutcome, AgentError> {
        let parameters = &intent.parameters;
        Ok(match intent.action {
            IntentAction::Register => OperationOutcome::Registration(
                self.registration.execute(parameters, context).await?,
            ),
            IntentAction::Withdraw => {
                OperationOutcome::Withdrawal(self.withdrawal.execute(parameters, context).await?)
            }
            IntentAction::Search => {
                OperationOutcome::Search(self.search.execute(parameters).await?)
            }
            IntentAction::Recommend => OperationOutcome::Recommendation(
                self.recommendation.execute(parameters, context).await?,
            ),
            IntentAction::ViewEnrollments => {
                OperationOutcome::Enrollments(profile::view_enrollments(context)?)
            }
            IntentAction::StudentInfo => {
                OperationOutcome::StudentInfo(profile::student_info(context)?)
            }
        })
    }

    async fn render_response(
        &self,
        intent: &Intent,
        outcome: &OperationOutcome,
        context: Option<&StudentContext>,
    ) -> String {
        let template = format::render(outcome, context);

        let Some(synthesizer) = &self.synthesizer else {
            return template;
        };

        match synthesizer.render(intent, outcome, context).await {
            Ok(text) if !text.trim().is_empty() => text,
            Ok(_) => template,
            Err(error) => {
                warn!(
                    event_name = "agent.synthesis_failed",
                    error = %error,
                    "response synthesis failed, using template output"
                );
                template
            }
        }
    }
}
