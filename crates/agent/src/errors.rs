use thiserror::Error;

use cursus_db::repositories::RepositoryError;

/// Failures of the understanding collaborator. All of them abort the
/// request and surface as the generic failure envelope.
#[derive(Debug, Error)]
pub enum NluError {
    #[error("nlu transport failure: {0}")]
    Transport(#[source] anyhow::Error),
    #[error("nlu returned an unparseable payload: {0}")]
    MalformedResponse(String),
    #[error("nlu selected an unknown action `{0}`")]
    UnknownAction(String),
}

/// Request-level pipeline failures. Per-course business failures never
/// take this path; they are recorded in the batch outcome instead.
#[derive(Debug, Error)]
pub enum AgentError {
    #[error("un code permanent valide est requis pour cette opération")]
    NoStudentContext,
    #[error("paramètre manquant: {name}")]
    MissingParameter { name: &'static str },
    #[error("paramètre invalide `{name}`: {message}")]
    InvalidParameter { name: &'static str, message: String },
    #[error(transparent)]
    Nlu(#[from] NluError),
    #[error(transparent)]
    Storage(#[from] RepositoryError),
}
