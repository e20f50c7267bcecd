use thiserror::Error;

#[derive(Error, Debug)]
pub enum ModelError {
    #[error("model expects {expected} parameters but the host supplied {found}")]
    ParameterCount { expected: usize, found: usize },
    #[error("parameter setter failed: {0}")]
    Setter(#[source] Box<dyn std::error::Error + Send + Sync>),
    #[error("parameter `{name}` must be finite and non-negative, got {value}")]
    InvalidParameter { name: &'static str, value: f64 },
    #[error("model has {expected} equations but the host declared {found}")]
    EquationCount { expected: usize, found: usize },
    #[error("{which} vector has length {found}, expected {expected}")]
    StateLength {
        which: &'static str,
        expected: usize,
        found: usize,
    },
    #[error("total population S + I + R is {0}, it must be positive")]
    DegeneratePopulation(f64),
    #[error("invalid run configuration: {0}")]
    InvalidRun(String),
    #[error("integration failed: {0}")]
    Integration(String),
    #[error("non-finite state at t = {time}")]
    NonFiniteState { time: f64 },
}
