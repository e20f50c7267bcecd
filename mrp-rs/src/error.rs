use std::io;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum MrpError {
    #[error("no input on stdin")]
    EmptyInput,
    #[error("unsupported environment file {0}: expected a .json or .toml extension")]
    UnsupportedFormat(PathBuf),
    #[error("model declares {expected} parameters but the host has {found}")]
    ParameterCount { expected: usize, found: usize },
    #[error("missing parameter `{0}` in input")]
    MissingParameter(String),
    #[error("parameter `{name}` is not a number: {value}")]
    InvalidParameter { name: String, value: String },
    #[error("failed to deserialize input: {0}")]
    Input(#[source] serde_json::Error),
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid TOML: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}
