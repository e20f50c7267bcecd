use serde::Serialize;
use sir_mrp::{Environment, MrpError};

use crate::driver::{Method, RunConfig};
use crate::model::SirModel;
use crate::output::{Summary, Trajectory};
use crate::parameters::{PARAMETER_NAMES, ParameterSetter, Parameters};

/// Parameter setter backed by the input section of an MRP environment.
pub struct EnvironmentParameters<'a, I> {
    env: &'a Environment<I>,
}

impl<'a, I> EnvironmentParameters<'a, I> {
    pub fn new(env: &'a Environment<I>) -> Self {
        Self { env }
    }
}

impl<I> ParameterSetter for EnvironmentParameters<'_, I> {
    type Error = MrpError;

    fn set_parameters(&mut self, declared: usize, buffer: &mut [f64]) -> Result<usize, MrpError> {
        if declared != PARAMETER_NAMES.len() {
            return Err(MrpError::ParameterCount {
                expected: declared,
                found: PARAMETER_NAMES.len(),
            });
        }
        self.env.fill_parameters(&PARAMETER_NAMES, buffer)
    }
}

/// Run metadata written next to the trajectory.
#[derive(Debug, Serialize)]
pub struct RunManifest {
    pub input_digest: String,
    pub seed: u64,
    pub replicate: u64,
    pub parameters: Parameters,
    pub basic_reproduction_number: f64,
    pub method: Method,
    pub samples: usize,
    pub evaluations: u32,
    pub summary: Option<Summary>,
}

impl RunManifest {
    pub fn new<I>(
        env: &Environment<I>,
        model: &SirModel,
        config: &RunConfig,
        trajectory: &Trajectory,
    ) -> Self {
        Self {
            input_digest: env.input_digest(),
            seed: env.seed,
            replicate: env.replicate,
            parameters: *model.parameters(),
            basic_reproduction_number: model.parameters().basic_reproduction_number(),
            method: config.method,
            samples: trajectory.len(),
            evaluations: trajectory.evaluations,
            summary: trajectory.summary(),
        }
    }
}
