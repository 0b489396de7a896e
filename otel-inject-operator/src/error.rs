//! Error types for the reconcilers

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("kubernetes error: {0}")]
    Kube(#[from] kube::Error),

    #[error(transparent)]
    Inject(#[from] otel_inject::InjectError),

    /// A watched object without a namespace, which only happens for malformed objects.
    #[error("{kind} {name} has no namespace")]
    MissingNamespace { kind: &'static str, name: String },

    #[error("{kind} has no name")]
    MissingName { kind: &'static str },
}

impl Error {
    /// The object is gone; there is nothing left to reconcile.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::Kube(kube::Error::Api(response)) if response.code == 404)
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, Error::Kube(kube::Error::Api(response)) if response.code == 409)
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
