use thiserror::Error;

/// Failure reported by one of the shell's external collaborators.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CollaboratorError {
    #[error("session is not authenticated")]
    Unauthenticated,
    #[error("menu request failed: {0}")]
    Transport(String),
    #[error("page pool unavailable: {0}")]
    PagePool(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoadError {
    #[error("failed to fetch menu tree: {0}")]
    Fetch(#[source] CollaboratorError),
}

/// Anything that stops the guard from reaching a decision. The guard turns
/// these into a denied navigation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GuardError {
    #[error("page pool did not become ready: {0}")]
    PagePool(#[source] CollaboratorError),
    #[error(transparent)]
    Load(#[from] LoadError),
}
