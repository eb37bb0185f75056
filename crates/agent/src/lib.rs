//! Inscription agent - LLM-fronted course-registration pipeline
//!
//! This crate is the "brain" of the cursus system - the agent that:
//! - Extracts a structured intent from a student's free-text message
//! - Resolves the student's academic context (program, active enrollments)
//! - Dispatches to one of six operation handlers
//! - Runs the business-rule validators before touching enrollment state
//! - Renders a French natural-language summary of the structured result
//!
//! # Architecture
//!
//! The agent follows a constrained pipeline:
//! 1. **Intent Extraction** (`nlu`) - Parse NL → typed `Intent`
//! 2. **Context Resolution** (`context`) - Load student + active enrollments
//! 3. **Dispatch + Validation** (`registration`, `withdrawal`, `catalog`,
//!    `profile`) - Sequential rule chains, per-course outcomes
//! 4. **Response Rendering** (`format`, optionally `nlu::ResponseSynthesizer`)
//!
//! # Safety Principle
//!
//! The LLM is strictly a translator. It NEVER decides registration outcomes:
//! existence, program membership, offerings, duplicates, and prerequisites
//! are deterministic checks against storage, and every mutation happens in
//! the validators, not in model output.

pub mod catalog;
pub mod context;
pub mod errors;
pub mod format;
pub mod llm;
pub mod nlu;
pub mod outcome;
mod params;
pub mod profile;
pub mod registration;
pub mod runtime;
pub mod storage;
pub mod withdrawal;

pub use errors::{AgentError, NluError};
pub use llm::{CompletionOptions, LlmClient, OllamaClient};
pub use nlu::{IntentAnalyzer, LlmIntentAnalyzer, LlmResponseSynthesizer, ResponseSynthesizer};
pub use outcome::{
    BatchOutcome, CourseOutcome, EnrollmentsOutcome, OperationOutcome, RecommendationOutcome,
    SearchOutcome,
};
pub use runtime::{AgentRuntime, ResponseEnvelope};
pub use storage::Storage;
