use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Kubernetes API error: {0}")]
    Kube(#[from] kube::Error),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Generated child object does not match the key it was generated for.
    #[error("Malformed child {kind} {key}: {reason}")]
    MalformedChild {
        kind: String,
        key: String,
        reason: String,
    },
}

impl Error {
    /// Whether the dispatcher should retry the reconciliation after a backoff.
    ///
    /// A malformed child, or one the API server rejects as invalid (422),
    /// would be produced again unchanged on every retry.
    pub fn is_transient(&self) -> bool {
        match self {
            Error::Kube(kube::Error::Api(e)) => e.code != 422,
            Error::Kube(_) => true,
            Error::MalformedChild { .. } | Error::InvalidConfig(_) => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
