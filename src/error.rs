use thiserror::Error;

/// Malformed network data, detected before any solve attempt.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ModelError {
    #[error("case contains no buses")]
    Empty,

    #[error("system MVA base must be positive and finite: {0}")]
    BaseMva(f64),

    #[error("bus {0} is defined more than once")]
    DuplicateBus(usize),

    #[error("{element} {index} references undefined bus {bus}")]
    UnknownBus {
        element: &'static str,
        index: usize,
        bus: usize,
    },

    #[error("case has no slack bus")]
    NoSlack,

    #[error("case has more than one slack bus: {0:?}")]
    MultipleSlack(Vec<usize>),
}

#[derive(Debug, Error)]
pub enum HelmError {
    #[error(transparent)]
    Model(#[from] ModelError),

    /// The embedding operator could not be factorized (islanded buses or
    /// an inconsistent classification). Retrying reproduces the same
    /// structure so the run is abandoned.
    #[error("embedding operator factorization failed: {0}")]
    Factorization(String),
}
